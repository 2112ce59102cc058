//! LaTeX markup primitives used by the entry formatters.

/// `{\bf text}`, or nothing for empty text.
pub fn bold(text: &str) -> String {
    wrap("\\bf", text)
}

/// `{\it text}`, or nothing for empty text.
pub fn italic(text: &str) -> String {
    wrap("\\it", text)
}

/// `{\sc text}`, or nothing for empty text.
pub fn small_caps(text: &str) -> String {
    wrap("\\sc", text)
}

fn wrap(command: &str, text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!("{{{} {}}}", command, text)
    }
}

/// The visible marker for a required field missing from an entry.
pub fn error_token(field: &str) -> String {
    format!("{{\\bf\\it !!!!!!!{}!!!!!!!}}", field.to_uppercase())
}

/// `format!`-style helper: `prefix` + `value` when `value` is non-empty.
pub fn prefixed(prefix: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{}{}", prefix, value)
    }
}

/// Joins the non-empty parts into a `\newblock {a, b, c}.` line.
pub fn block(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "\\newblock {}".to_string()
    } else {
        format!("\\newblock {{{}}}.", joined)
    }
}
