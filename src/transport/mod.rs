//! Mail transport capability.
//!
//! The dispatcher never talks SMTP directly. It opens one [`MailSession`] through a
//! [`MailTransport`] per dispatch and hands each rendered message to
//! [`MailSession::send`]. `SmtpTransport` is the production implementation; tests
//! plug in recording transports.

mod smtp;

pub use smtp::SmtpTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SmtpConfig;

/// Failure to establish or authenticate a session. Fatal for a dispatch.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Failure to hand one message to the server. Recorded per recipient.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct SendError {
    pub reason: String,
}

impl SendError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Factory for mail sessions
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Connect to the server and complete the handshake (including TLS).
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError>;

    /// Transport name for logging
    fn name(&self) -> &'static str;
}

/// One open connection to a mail server, used strictly sequentially
#[async_trait]
pub trait MailSession: Send {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransportError>;

    /// Send raw message bytes. `from` of `None` sends with an empty reverse path.
    async fn send(&mut self, from: Option<&str>, to: &str, message: &[u8]) -> Result<(), SendError>;

    /// Best-effort shutdown. Errors are swallowed by implementations.
    async fn close(&mut self);
}
