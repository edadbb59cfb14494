use std::sync::Arc;

use crate::config::Settings;
use crate::dispatch::MailDispatcher;
use crate::transport::{MailTransport, SmtpTransport};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MailDispatcher>,
}

impl AppState {
    /// State backed by the SMTP transport
    pub fn new(settings: Settings) -> Self {
        Self::with_transport(settings, Arc::new(SmtpTransport::new()))
    }

    /// State with a custom mail transport
    pub fn with_transport(settings: Settings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            dispatcher: Arc::new(MailDispatcher::new(transport, settings.smtp)),
        }
    }
}
