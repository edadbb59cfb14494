//! `To: [*to]` / `Cc: [*to]` recipient header tokens

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

lazy_static! {
    static ref TO_TOKEN: Regex = Regex::new(r"(?im)^To:[ \t]*\[\*to\]").unwrap();
    static ref CC_TOKEN: Regex = Regex::new(r"(?im)^Cc:[ \t]*\[\*to\]").unwrap();
}

/// Replace line-leading `To: [*to]` and `Cc: [*to]` with the batch's addresses.
///
/// Addresses are joined with `", "` in the order given. With an empty batch the
/// text is returned unchanged.
pub fn resolve_recipient_header<S: AsRef<str>>(text: &str, batch: &[S]) -> String {
    if batch.is_empty() {
        return text.to_string();
    }

    let joined = batch
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    let to_line = format!("To: {}", joined);
    let cc_line = format!("Cc: {}", joined);

    let text = TO_TOKEN.replace_all(text, NoExpand(to_line.as_str()));
    CC_TOKEN
        .replace_all(&text, NoExpand(cc_line.as_str()))
        .into_owned()
}
