//! Input sanitization.
//!
//! # Responsibilities
//! - Strip dangerous substrings from text (angle brackets, `javascript:`
//!   prefixes, inline event-handler assignments, SQL comment tokens)
//! - Apply recursively over JSON payload trees
//!
//! # Design Decisions
//! - Runs unconditionally on every body and query; rejection via the
//!   pattern matchers is an independent second line
//! - Stripping repeats until a fixpoint so reassembled tokens
//!   (e.g. `oonerror=nerror=`) cannot survive a single pass
//! - Sanitizing already-sanitized text is a no-op (idempotent)

use serde_json::Value;

/// Case-insensitive substrings removed from every string value.
const STRIP_TOKENS: &[&str] = &[
    "javascript:",
    "--",
    "/*",
    "*/",
    "onabort=",
    "onblur=",
    "onchange=",
    "onclick=",
    "ondblclick=",
    "onerror=",
    "onfocus=",
    "oninput=",
    "onkeydown=",
    "onkeypress=",
    "onkeyup=",
    "onload=",
    "onmousedown=",
    "onmousemove=",
    "onmouseout=",
    "onmouseover=",
    "onmouseup=",
    "onreset=",
    "onselect=",
    "onsubmit=",
    "onunload=",
];

/// Strip dangerous substrings from a single string and trim it.
pub fn sanitize_text(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let mut next = current.replace(['<', '>'], "");
        for token in STRIP_TOKENS {
            next = strip_token(&next, token);
        }
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Sanitize every string leaf of a JSON tree in place. Arrays sanitize each
/// element, objects each member; numbers, booleans and nulls pass through.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let clean = sanitize_text(s);
            if clean != *s {
                *s = clean;
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_value(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                sanitize_value(item);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Remove every occurrence of `token` (ASCII case-insensitive).
/// Lowercasing ASCII preserves byte offsets, so match positions found in the
/// lowered copy index safely into the original.
fn strip_token(haystack: &str, token: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut i = 0;
    while let Some(pos) = lower[i..].find(token) {
        out.push_str(&haystack[i..i + pos]);
        i += pos + token.len();
    }
    out.push_str(&haystack[i..]);
    out
}
