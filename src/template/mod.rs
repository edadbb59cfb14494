//! Raw email template resolution.
//!
//! A template is plain RFC 5322 text (headers, blank line, body) with three kinds
//! of bracketed tokens:
//! - `[D=>FORMAT]`: current UTC time, strftime-style FORMAT
//! - `[KEY]`: value of the variable KEY (case-insensitive)
//! - `To: [*to]` / `Cc: [*to]` at the start of a line: addresses of the current batch
//!
//! Resolution is total. Tokens that cannot be resolved (bad date format, unknown
//! key, empty batch) stay in the output as literal text.
//!
//! # Example
//!
//! ```ignore
//! let variables = json!({ "name": "Alice" });
//! let message = render_message(
//!     "To: [*to]\nSubject: Hi [NAME]\n\nSent [D=>%Y-%m-%d]",
//!     variables.as_object().unwrap(),
//!     &["alice@example.com"],
//! );
//! ```

mod date;
mod header;
mod variables;

pub use date::{format_timestamp, resolve_date_tokens};
pub use header::resolve_recipient_header;
pub use variables::{normalize_key, resolve_variables, stringify_value, Variables};

/// Render a template for one batch: date tokens, then variables, then the recipient header.
pub fn render_message<S: AsRef<str>>(template: &str, variables: &Variables, batch: &[S]) -> String {
    let rendered = resolve_date_tokens(template);
    let rendered = resolve_variables(&rendered, variables);
    resolve_recipient_header(&rendered, batch)
}
