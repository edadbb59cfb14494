//! `[D=>FORMAT]` date tokens

use std::fmt::Write;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref DATE_TOKEN: Regex = Regex::new(r"\[D=>(.*?)\]").unwrap();
}

/// Replace every `[D=>FORMAT]` token with the current UTC time formatted per FORMAT.
///
/// The clock is read once per token. A FORMAT the formatter rejects leaves the
/// token in place verbatim.
pub fn resolve_date_tokens(text: &str) -> String {
    DATE_TOKEN
        .replace_all(text, |caps: &Captures| {
            let format = &caps[1];
            match format_timestamp(Utc::now(), format) {
                Some(formatted) => formatted,
                None => {
                    tracing::debug!(format = %format, "Leaving date token with invalid format unresolved");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Format `at` with a strftime-style string, `None` if the string is not a valid format.
///
/// chrono signals bad specifiers through `fmt::Error` while writing, so the output is
/// built with `write!` instead of `to_string()` which would panic.
pub fn format_timestamp(at: DateTime<Utc>, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", at.format(format)).ok()?;
    Some(out)
}
