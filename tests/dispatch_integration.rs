//! Dispatcher integration tests
//!
//! These drive `MailDispatcher` end to end against an in-memory transport:
//! rendering, batching, sender extraction, failure isolation and session lifetime.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use raw_mail_dispatch::config::SmtpConfig;
use raw_mail_dispatch::dispatch::{DeliveryStatus, DispatchError, DispatchRequest, MailDispatcher};
use raw_mail_dispatch::template::Variables;

use common::{recipients, smtp_config, RecordingTransport};

fn build_dispatcher(transport: RecordingTransport, smtp: SmtpConfig) -> (MailDispatcher, Arc<common::TransportLog>) {
    let log = transport.log.clone();
    (MailDispatcher::new(Arc::new(transport), smtp), log)
}

fn vars(value: serde_json::Value) -> Variables {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_end_to_end_batch_of_one() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let request = DispatchRequest::new(
        "From: [F]\nTo: [*to]\n\n[D=>%Y]",
        recipients(&["x@co.com", "y@co.com"]),
    )
    .variables(vars(json!({ "F": "a@co.com" })))
    .batch_size(1);

    let result = assert_ok!(dispatcher.dispatch(request).await);
    let year = Utc::now().format("%Y").to_string();

    assert_eq!(result.outcomes.len(), 2);
    assert!(result.outcomes.iter().all(|o| o.status == DeliveryStatus::Sent));

    let sent = log.sent();
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0].to, "x@co.com");
    assert_eq!(sent[0].from.as_deref(), Some("a@co.com"));
    assert!(sent[0].body.contains("To: x@co.com\n"));
    assert!(sent[0].body.ends_with(&year));

    assert_eq!(sent[1].to, "y@co.com");
    assert!(sent[1].body.contains("To: y@co.com\n"));
    assert!(sent[1].body.ends_with(&year));

    assert_eq!(log.opens(), 1);
    assert_eq!(log.closes(), 1);
}

#[tokio::test]
async fn test_batch_members_share_recipient_header() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let request = DispatchRequest::new(
        "From: Team <team@co.com>\nTo: [*to]\nCc: [*to]\n\nHello",
        recipients(&["a@co.com", "b@co.com", "c@co.com", "d@co.com", "e@co.com"]),
    )
    .batch_size(2);

    let result = assert_ok!(dispatcher.dispatch(request).await);
    let emails: Vec<&str> = result.outcomes.iter().map(|o| o.email.as_str()).collect();
    assert_eq!(emails, vec!["a@co.com", "b@co.com", "c@co.com", "d@co.com", "e@co.com"]);

    let sent = log.sent();
    let to_lines: Vec<&str> = sent.iter().map(|m| m.body.lines().nth(1).unwrap()).collect();
    assert_eq!(
        to_lines,
        vec![
            "To: a@co.com, b@co.com",
            "To: a@co.com, b@co.com",
            "To: c@co.com, d@co.com",
            "To: c@co.com, d@co.com",
            "To: e@co.com",
        ]
    );
    assert!(sent[4].body.contains("Cc: e@co.com\n"));
    assert!(sent.iter().all(|m| m.from.as_deref() == Some("team@co.com")));

    // One session for all three batches
    assert_eq!(log.opens(), 1);
    assert_eq!(log.closes(), 1);
}

#[tokio::test]
async fn test_send_failure_is_isolated() {
    let (dispatcher, log) = build_dispatcher(
        RecordingTransport::rejecting(&["bad@co.com"]),
        smtp_config(),
    );

    let request = DispatchRequest::new(
        "Subject: hi\n\nbody",
        recipients(&["one@co.com", "bad@co.com", "three@co.com"]),
    )
    .batch_size(3);

    let result = assert_ok!(dispatcher.dispatch(request).await);

    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(result.outcomes[0].email, "one@co.com");
    assert_eq!(result.outcomes[0].status, DeliveryStatus::Sent);
    assert_eq!(result.outcomes[1].email, "bad@co.com");
    assert_eq!(
        result.outcomes[1].status.to_string(),
        "error: 550 mailbox unavailable: bad@co.com"
    );
    assert_eq!(result.outcomes[2].email, "three@co.com");
    assert_eq!(result.outcomes[2].status, DeliveryStatus::Sent);
    assert_eq!(result.sent(), 2);
    assert_eq!(result.failed(), 1);

    assert_eq!(log.sent().len(), 2);

    let stats = dispatcher.stats();
    assert_eq!(stats.dispatches, 1);
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.batches, 1);
}

#[tokio::test]
async fn test_missing_from_uses_default_sender() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let request = DispatchRequest::new("Subject: no sender\n\nbody", recipients(&["a@co.com"]));
    assert_ok!(dispatcher.dispatch(request).await);

    assert_eq!(log.sent()[0].from.as_deref(), Some("default@co.com"));
}

#[tokio::test]
async fn test_validation_happens_before_transport() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let err = assert_err!(dispatcher.dispatch(DispatchRequest::new("", recipients(&["a@co.com"]))).await);
    assert!(matches!(err, DispatchError::Validation(_)));

    let err = assert_err!(dispatcher.dispatch(DispatchRequest::new("Subject: x", vec![])).await);
    assert_eq!(err.to_string(), "Missing recipient list.");

    assert_eq!(log.opens(), 0);
    assert_eq!(dispatcher.stats().aborted, 2);
}

#[tokio::test]
async fn test_open_failure_is_fatal() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::failing_open(), smtp_config());

    let request = DispatchRequest::new("Subject: x", recipients(&["a@co.com", "b@co.com"]));
    let err = assert_err!(dispatcher.dispatch(request).await);

    assert!(matches!(err, DispatchError::Transport(_)));
    assert!(err.to_string().contains("mail.test:2525"));
    assert!(log.sent().is_empty());
    assert_eq!(log.closes(), 0);
}

#[tokio::test]
async fn test_auth_failure_is_fatal_and_closes_session() {
    let smtp = SmtpConfig {
        username: Some("user@co.com".to_string()),
        password: Some("secret".to_string()),
        ..smtp_config()
    };
    let (dispatcher, log) = build_dispatcher(RecordingTransport::failing_auth(), smtp);

    let request = DispatchRequest::new("Subject: x", recipients(&["a@co.com"]));
    let err = assert_err!(dispatcher.dispatch(request).await);

    assert!(matches!(err, DispatchError::Auth(_)));
    assert!(log.sent().is_empty());
    assert_eq!(log.opens(), 1);
    assert_eq!(log.closes(), 1);
}

#[tokio::test]
async fn test_authenticates_only_with_credentials() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());
    assert_ok!(dispatcher.dispatch(DispatchRequest::new("x", recipients(&["a@co.com"]))).await);
    assert!(log.auths.lock().unwrap().is_empty());

    let smtp = SmtpConfig {
        username: Some("user@co.com".to_string()),
        password: Some("secret".to_string()),
        default_sender: None,
        ..smtp_config()
    };
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp);
    assert_ok!(dispatcher.dispatch(DispatchRequest::new("x", recipients(&["a@co.com"]))).await);

    assert_eq!(
        log.auths.lock().unwrap().clone(),
        vec![("user@co.com".to_string(), "secret".to_string())]
    );
    // Login name doubles as the fallback sender
    assert_eq!(log.sent()[0].from.as_deref(), Some("user@co.com"));
}

#[tokio::test]
async fn test_delay_between_batches() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let request = DispatchRequest::new("x", recipients(&["a@co.com", "b@co.com", "c@co.com"]))
        .batch_size(1)
        .inter_batch_delay(Duration::from_millis(40));

    let started = Instant::now();
    assert_ok!(dispatcher.dispatch(request).await);

    // Two gaps between three batches, none after the last
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(log.sent().len(), 3);
}

#[tokio::test]
async fn test_spawned_dispatch_survives_dropped_caller() {
    let (dispatcher, log) = build_dispatcher(RecordingTransport::new(), smtp_config());
    let dispatcher = Arc::new(dispatcher);

    let request = DispatchRequest::new("x", recipients(&["a@co.com", "b@co.com"]))
        .batch_size(1)
        .inter_batch_delay(Duration::from_millis(300));

    // Caller gives up during the inter-batch delay
    let waited = tokio::time::timeout(
        Duration::from_millis(100),
        dispatcher.spawn_dispatch(request),
    )
    .await;
    assert!(waited.is_err());
    assert_eq!(log.sent().len(), 1);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(log.sent().len(), 2);
    assert_eq!(log.opens(), 1);
    assert_eq!(log.closes(), 1);
    assert_eq!(dispatcher.stats().dispatches, 1);
}

#[tokio::test]
async fn test_no_delay_after_last_batch() {
    let (dispatcher, _log) = build_dispatcher(RecordingTransport::new(), smtp_config());

    let request = DispatchRequest::new("x", recipients(&["a@co.com", "b@co.com"]))
        .batch_size(2)
        .inter_batch_delay(Duration::from_secs(30));

    let result = tokio::time::timeout(Duration::from_secs(5), dispatcher.dispatch(request)).await;
    assert!(result.is_ok(), "single batch must not wait for the inter-batch delay");
}
