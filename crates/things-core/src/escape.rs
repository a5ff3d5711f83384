//! Quoting for values interpolated into AppleScript string literals.
//!
//! Only `"` is neutralized. Backslashes and other metacharacters pass through
//! untouched, so a value that already ends in `\` can still break out of its
//! literal. Escaping is single-pass: applying it twice is not a no-op.

/// Replaces every `"` with `\"`.
pub fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Wraps an escaped value in double quotes.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", escape(value))
}
