//! SMTP transport using lettre's low-level async connection.
//!
//! One TCP connection is opened per session and reused for every message. With
//! `use_tls` the connection is wrapped in TLS immediately; otherwise STARTTLS is
//! attempted when the server advertises it and the session carries on in plain
//! text if the upgrade is not possible.

use std::time::Duration;

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;
use tracing::{debug, info, warn};

use super::{MailSession, MailTransport, SendError, TransportError};
use crate::config::SmtpConfig;

const AUTH_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// Production [`MailTransport`] talking SMTP
#[derive(Debug, Clone, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError> {
        let hello_name = ClientId::Domain(config.hello_name.clone());
        let timeout = Some(Duration::from_secs(config.timeout_secs));

        let implicit_tls = if config.use_tls {
            Some(tls_parameters(&config.host)?)
        } else {
            None
        };

        debug!(
            host = %config.host,
            port = config.port,
            use_tls = config.use_tls,
            "Opening SMTP connection"
        );

        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (config.host.as_str(), config.port),
            timeout,
            &hello_name,
            implicit_tls,
            None,
        )
        .await
        .map_err(|e| {
            TransportError::Connect(format!("{}:{}: {}", config.host, config.port, e))
        })?;

        if !config.use_tls && connection.can_starttls() {
            match tls_parameters(&config.host) {
                Ok(params) => {
                    if let Err(e) = connection.starttls(params, &hello_name).await {
                        warn!(host = %config.host, error = %e, "STARTTLS failed, continuing without TLS");
                    }
                }
                Err(e) => {
                    warn!(host = %config.host, error = %e, "Cannot prepare STARTTLS, continuing without TLS");
                }
            }
        }

        info!(host = %config.host, port = config.port, "SMTP connection established");

        Ok(Box::new(SmtpSession {
            connection,
            host: config.host.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }
}

fn tls_parameters(host: &str) -> Result<TlsParameters, TransportError> {
    TlsParameters::new(host.to_string())
        .map_err(|e| TransportError::Connect(format!("TLS setup for {}: {}", host, e)))
}

struct SmtpSession {
    connection: AsyncSmtpConnection,
    host: String,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransportError> {
        let credentials = Credentials::new(username.to_string(), password.to_string());

        self.connection
            .auth(AUTH_MECHANISMS, &credentials)
            .await
            .map_err(|e| TransportError::Auth(e.to_string()))?;

        debug!(host = %self.host, username = %username, "SMTP authentication succeeded");
        Ok(())
    }

    async fn send(&mut self, from: Option<&str>, to: &str, message: &[u8]) -> Result<(), SendError> {
        let envelope = build_envelope(from, to)?;

        self.connection
            .send(&envelope, message)
            .await
            .map(|_| ())
            .map_err(|e| SendError::new(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.connection.quit().await {
            debug!(host = %self.host, error = %e, "SMTP QUIT failed, dropping connection");
        }
    }
}

/// Build the SMTP envelope; addresses the transport cannot parse fail this recipient only.
fn build_envelope(from: Option<&str>, to: &str) -> Result<Envelope, SendError> {
    let sender = match from {
        Some(from) => Some(
            from.parse::<Address>()
                .map_err(|e| SendError::new(format!("invalid sender address '{}': {}", from, e)))?,
        ),
        None => None,
    };

    let recipient = to
        .parse::<Address>()
        .map_err(|e| SendError::new(format!("invalid recipient address '{}': {}", to, e)))?;

    Envelope::new(sender, vec![recipient]).map_err(|e| SendError::new(e.to_string()))
}
