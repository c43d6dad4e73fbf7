//! Sanitization utilities.
//!
//! Escaping for untrusted text (option blurbs, model output) before it is
//! embedded in HTML, plus whitespace normalization shared by the form
//! controller and the export formatter.

/// Escape text for HTML element content and quoted attribute values.
///
/// Covers `&`, `<`, `>`, `"` and `'`. The renderer routes every user- or
/// model-supplied string through this function.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
