use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::template::Variables;
use crate::transport::TransportError;

/// Errors that abort a whole dispatch. Per-recipient failures are not errors here,
/// they are recorded as [`DeliveryStatus::Error`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail server authentication failed: {0}")]
    Auth(String),
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(msg) => DispatchError::Transport(msg),
            TransportError::Auth(msg) => DispatchError::Auth(msg),
        }
    }
}

/// One template sent to a list of recipients in batches
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub template: String,
    pub recipients: Vec<String>,
    pub variables: Variables,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl DispatchRequest {
    /// Request with no variables, batches of one and no delay
    pub fn new(template: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            template: template.into(),
            recipients,
            variables: Variables::new(),
            batch_size: 1,
            inter_batch_delay: Duration::ZERO,
        }
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Batch size; anything below 1 is treated as 1
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    /// Check the request before any transport is contacted
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.template.is_empty() {
            return Err(DispatchError::Validation(
                "Missing raw email content.".to_string(),
            ));
        }

        if self.recipients.is_empty() {
            return Err(DispatchError::Validation(
                "Missing recipient list.".to_string(),
            ));
        }

        Ok(())
    }
}

/// Outcome of one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Error(String),
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

// Serialized as the flat status string clients already expect ("sent", "error: ...")
impl Serialize for DeliveryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-recipient entry of a dispatch result
#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub email: String,
    pub status: DeliveryStatus,
}

/// Outcomes of a dispatch, one per recipient in request order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DispatchResult {
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchResult {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_sent()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}
