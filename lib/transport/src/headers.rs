//! Header merging.

use crate::call::HeaderSet;
use std::collections::HashMap;

/// Content negotiation header, always `application/json`.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Accepted response type, always `application/json`.
pub const ACCEPT: &str = "Accept";

const JSON: &str = "application/json";

/// Merges process-wide default headers with per-call headers.
///
/// Names compare case-insensitively and per-call values win. The reserved
/// content negotiation headers are dropped from both inputs and set last.
#[must_use]
pub fn merge_headers(defaults: &HeaderSet, per_call: &HeaderSet) -> HeaderSet {
    let mut merged: HashMap<String, (String, String)> = HashMap::new();

    for (name, value) in defaults.iter().chain(per_call.iter()) {
        if is_reserved(name) {
            continue;
        }
        merged.insert(name.to_ascii_lowercase(), (name.clone(), value.clone()));
    }

    let mut headers: HeaderSet = merged.into_values().collect();
    headers.insert(CONTENT_TYPE.to_string(), JSON.to_string());
    headers.insert(ACCEPT.to_string(), JSON.to_string());
    headers
}

fn is_reserved(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_TYPE) || name.eq_ignore_ascii_case(ACCEPT)
}
