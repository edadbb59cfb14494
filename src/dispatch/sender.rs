//! From-address extraction from a rendered message

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ANGLE_ADDRESS: Regex = Regex::new(r"<([^>]+)>").unwrap();
    static ref BARE_ADDRESS: Regex = Regex::new(r"[^\s,<>]+@[^\s,<>]+").unwrap();
}

const FROM_PREFIX: &str = "from:";

/// Find the envelope sender for a rendered message.
///
/// Only the first line starting with `From:` (any case) is considered. Its
/// `<address>` wins, then the first bare `local@domain` token. When that line has
/// neither, or there is no From line at all, `fallback` is used.
pub fn extract_from_address(message: &str, fallback: Option<&str>) -> Option<String> {
    let from_line = message.lines().find_map(|line| {
        line.get(..FROM_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(FROM_PREFIX))
            .map(|_| &line[FROM_PREFIX.len()..])
    });

    from_line
        .and_then(address_in_line)
        .or_else(|| fallback.map(str::to_string))
}

fn address_in_line(value: &str) -> Option<String> {
    let angle = ANGLE_ADDRESS
        .captures(value)
        .map(|caps| caps[1].trim().to_string())
        .filter(|address| !address.is_empty());

    angle.or_else(|| BARE_ADDRESS.find(value).map(|m| m.as_str().to_string()))
}
