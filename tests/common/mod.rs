//! In-memory mail transport shared by the integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use raw_mail_dispatch::config::SmtpConfig;
use raw_mail_dispatch::transport::{MailSession, MailTransport, SendError, TransportError};

/// A message handed to the transport
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub from: Option<String>,
    pub to: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct TransportLog {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub auths: Mutex<Vec<(String, String)>>,
    pub sent: Mutex<Vec<SentMessage>>,
}

impl TransportLog {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Transport that records everything and fails on demand
#[derive(Default)]
pub struct RecordingTransport {
    pub log: Arc<TransportLog>,
    pub fail_open: bool,
    pub fail_auth: bool,
    pub reject: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject sends to these recipients with a 550
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self {
            reject: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn failing_auth() -> Self {
        Self {
            fail_auth: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn open(&self, config: &SmtpConfig) -> Result<Box<dyn MailSession>, TransportError> {
        self.log.opens.fetch_add(1, Ordering::SeqCst);

        if self.fail_open {
            return Err(TransportError::Connect(format!(
                "{}:{}: connection refused",
                config.host, config.port
            )));
        }

        Ok(Box::new(RecordingSession {
            log: self.log.clone(),
            fail_auth: self.fail_auth,
            reject: self.reject.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct RecordingSession {
    log: Arc<TransportLog>,
    fail_auth: bool,
    reject: HashSet<String>,
}

#[async_trait]
impl MailSession for RecordingSession {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), TransportError> {
        self.log
            .auths
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));

        if self.fail_auth {
            return Err(TransportError::Auth("535 5.7.8 bad credentials".to_string()));
        }
        Ok(())
    }

    async fn send(&mut self, from: Option<&str>, to: &str, message: &[u8]) -> Result<(), SendError> {
        if self.reject.contains(to) {
            return Err(SendError::new(format!("550 mailbox unavailable: {}", to)));
        }

        self.log.sent.lock().unwrap().push(SentMessage {
            from: from.map(str::to_string),
            to: to.to_string(),
            body: String::from_utf8_lossy(message).into_owned(),
        });
        Ok(())
    }

    async fn close(&mut self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: "mail.test".to_string(),
        port: 2525,
        default_sender: Some("default@co.com".to_string()),
        ..Default::default()
    }
}

pub fn recipients(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|a| a.to_string()).collect()
}
