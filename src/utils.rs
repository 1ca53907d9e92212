use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder used when a field name sanitizes to nothing
const EMPTY_KEY: &str = "key";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\s+|\\n)").unwrap());

/// Convert arbitrary user input into a JSON-key-safe identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, a leading digit gets
/// a `_` prefix and empty input falls back to a placeholder key. The result
/// always matches `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn to_json_key(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        return EMPTY_KEY.to_string();
    }

    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => cleaned,
        _ => format!("_{cleaned}"),
    }
}

/// Collapse whitespace runs (and literal `\n` sequences) into single spaces
pub fn clean_up_string(input: &str) -> String {
    WHITESPACE_RE
        .replace_all(input, " ")
        .replace("\\t", "")
        .trim()
        .to_string()
}

/// Escape a class name or id so it can be used as a CSS identifier
pub fn css_escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars().peekable();
    let mut first = true;

    while let Some(c) = chars.next() {
        let leading_digit = c.is_ascii_digit()
            && (first || (out == "-" && ident.starts_with('-')));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            if first && c == '-' && chars.peek().is_none() {
                out.push_str("\\-");
            } else {
                out.push(c);
            }
        } else {
            out.push('\\');
            out.push(c);
        }
        first = false;
    }

    out
}

/// Convert a string to a sanitized filename
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let mut name = url.replace("http://", "").replace("https://", "");
    name = name.replace(['/', ':', '?', '&', '=', '#', '%'], "_");
    let name = name.trim_matches('_');

    if name.is_empty() {
        return "extracted-data".to_string();
    }

    name.chars().take(100).collect()
}
