use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::metrics::DispatchMetrics;
use crate::template::render_message;
use crate::transport::{MailSession, MailTransport};

use super::batch::partition_batches;
use super::sender::extract_from_address;
use super::types::{DeliveryStatus, DispatchError, DispatchRequest, DispatchResult, RecipientOutcome};

/// Statistics for the mail dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Dispatch calls that ran to completion
    pub dispatches: AtomicU64,
    /// Dispatch calls aborted by validation, connection or authentication errors
    pub aborted: AtomicU64,
    /// Batches processed
    pub batches: AtomicU64,
    /// Messages accepted by the server
    pub sent: AtomicU64,
    /// Per-recipient send failures
    pub failed: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub dispatches: u64,
    pub aborted: u64,
    pub batches: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Renders a template per batch and sends it to every recipient over one mail session
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    smtp: Arc<SmtpConfig>,
    stats: DispatcherStats,
}

impl MailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, smtp: SmtpConfig) -> Self {
        Self {
            transport,
            smtp: Arc::new(smtp),
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run [`dispatch`](Self::dispatch) on its own task.
    ///
    /// The dispatch keeps going and closes its session even if the returned handle
    /// is dropped, e.g. when an HTTP client disconnects during an inter-batch delay.
    pub fn spawn_dispatch(
        self: &Arc<Self>,
        request: DispatchRequest,
    ) -> JoinHandle<Result<DispatchResult, DispatchError>> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(request).await })
    }

    /// Send `request.template` to every recipient, batch by batch.
    ///
    /// Validation happens before the transport is touched. A session is then opened
    /// once and closed once, whatever happens in between. Connection and
    /// authentication failures abort the call; a failed send only marks that
    /// recipient and the loop moves on.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, request),
        fields(
            dispatch_id = %Uuid::new_v4(),
            recipients = request.recipients.len(),
            batch_size = request.batch_size
        )
    )]
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResult, DispatchError> {
        let started = Instant::now();

        if let Err(e) = request.validate() {
            tracing::debug!(error = %e, "Rejecting dispatch request");
            self.record_abort("validation_error");
            return Err(e);
        }

        let mut session = match self.transport.open(&self.smtp).await {
            Ok(session) => session,
            Err(e) => {
                let err = DispatchError::from(e);
                tracing::error!(
                    transport = self.transport.name(),
                    host = %self.smtp.host,
                    port = self.smtp.port,
                    error = %err,
                    "Failed to open mail session"
                );
                self.record_abort("transport_error");
                return Err(err);
            }
        };

        let result = self.run(session.as_mut(), &request).await;
        session.close().await;

        DispatchMetrics::record_duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                self.stats.dispatches.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_outcome("completed");
                tracing::info!(
                    sent = outcome.sent(),
                    failed = outcome.failed(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Dispatch completed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Dispatch aborted");
                self.record_abort(match e {
                    DispatchError::Auth(_) => "auth_error",
                    DispatchError::Transport(_) => "transport_error",
                    DispatchError::Validation(_) => "validation_error",
                });
            }
        }

        result
    }

    /// Authenticate and walk the batches on an open session
    async fn run(
        &self,
        session: &mut dyn MailSession,
        request: &DispatchRequest,
    ) -> Result<DispatchResult, DispatchError> {
        if let Some((username, password)) = self.smtp.credentials() {
            session.authenticate(username, password).await?;
        }

        let fallback_sender = self.smtp.fallback_sender();
        let batches = partition_batches(&request.recipients, request.batch_size);
        let batch_count = batches.len();
        let mut result = DispatchResult {
            outcomes: Vec::with_capacity(request.recipients.len()),
        };

        for (index, batch) in batches.into_iter().enumerate() {
            tracing::debug!(batch = index + 1, of = batch_count, size = batch.len(), "Sending batch");

            for recipient in batch {
                // Rendered per recipient so date tokens are read fresh for every message
                let message = render_message(&request.template, &request.variables, batch);
                let from = extract_from_address(&message, fallback_sender);

                let status = match session
                    .send(from.as_deref(), recipient, message.as_bytes())
                    .await
                {
                    Ok(()) => {
                        self.stats.sent.fetch_add(1, Ordering::Relaxed);
                        DispatchMetrics::record_sent();
                        tracing::debug!(to = %recipient, from = ?from, "Message sent");
                        DeliveryStatus::Sent
                    }
                    Err(e) => {
                        self.stats.failed.fetch_add(1, Ordering::Relaxed);
                        DispatchMetrics::record_failed();
                        tracing::warn!(to = %recipient, error = %e, "Failed to send message");
                        DeliveryStatus::Error(e.reason)
                    }
                };

                result.outcomes.push(RecipientOutcome {
                    email: recipient.clone(),
                    status,
                });
            }

            self.stats.batches.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_batch();

            if index + 1 < batch_count && !request.inter_batch_delay.is_zero() {
                tracing::debug!(
                    delay_ms = request.inter_batch_delay.as_millis() as u64,
                    "Waiting before next batch"
                );
                tokio::time::sleep(request.inter_batch_delay).await;
            }
        }

        Ok(result)
    }

    fn record_abort(&self, outcome: &str) {
        self.stats.aborted.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::record_outcome(outcome);
    }
}
