//! Request and response models for the send-email API

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchRequest, DispatchResult};
use crate::template::Variables;

/// Recipients as a JSON array, or one string separated by commas and/or newlines
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    List(Vec<String>),
    Text(String),
}

impl Recipients {
    pub fn into_list(self) -> Vec<String> {
        match self {
            Recipients::List(list) => list,
            Recipients::Text(text) => text
                .split([',', '\n', '\r'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Request to send a raw template to a recipient list
///
/// ```json
/// {
///   "raw_email": "From: Team <team@example.com>\nTo: [*to]\nSubject: Hi [name]\n\n...",
///   "to_emails": "a@example.com, b@example.com",
///   "variables": { "name": "there" },
///   "batch_size": 10,
///   "delay_ms": 1000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    /// Raw message template, headers and body
    #[serde(default, alias = "raw_template")]
    pub raw_email: Option<String>,
    /// Recipient addresses
    #[serde(default, alias = "recipients")]
    pub to_emails: Option<Recipients>,
    /// Values for `[KEY]` tokens
    #[serde(default)]
    pub variables: Option<Variables>,
    /// Recipients per batch, defaults to 1
    #[serde(default, deserialize_with = "lenient_int")]
    pub batch_size: Option<i64>,
    /// Pause between batches in milliseconds, defaults to 0
    #[serde(default, alias = "inter_batch_delay_ms", deserialize_with = "lenient_int")]
    pub delay_ms: Option<i64>,
}

impl SendEmailRequest {
    pub fn into_dispatch_request(self) -> DispatchRequest {
        let recipients = self
            .to_emails
            .map(Recipients::into_list)
            .unwrap_or_default();

        let batch_size = self.batch_size.unwrap_or(1).max(1);
        let delay_ms = self.delay_ms.unwrap_or(0).max(0);

        DispatchRequest::new(self.raw_email.unwrap_or_default(), recipients)
            .variables(self.variables.unwrap_or_default())
            .batch_size(usize::try_from(batch_size).unwrap_or(usize::MAX))
            .inter_batch_delay(Duration::from_millis(delay_ms as u64))
    }
}

/// Integer given as a JSON number or a numeric string. `null` and `""` mean unset,
/// fractional numbers are truncated.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientInt;

    impl<'de> Visitor<'de> for LenientInt {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(i64::try_from(v).unwrap_or(i64::MAX)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v as i64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<i64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(LenientInt)
}

/// Response for a dispatch that ran, even if some recipients failed
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub results: DispatchResult,
}
