//! Batched dispatch of a raw template to a recipient list.
//!
//! Recipients are split into consecutive batches. Every member of a batch gets
//! the same rendered message (one shared `To:`/`Cc:` line listing the whole
//! batch) but is sent an individual copy. One mail session serves the whole
//! dispatch, and a failed send never stops the remaining recipients.

mod batch;
mod dispatcher;
mod sender;
mod types;

pub use batch::partition_batches;
pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, MailDispatcher};
pub use sender::extract_from_address;
pub use types::{
    DeliveryStatus, DispatchError, DispatchRequest, DispatchResult, RecipientOutcome,
};
