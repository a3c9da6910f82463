//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render ` name="value"` with the value escaped
pub fn attr(name: &str, value: &str) -> String {
    format!(r#" {}="{}""#, name, html_escape(value))
}
