//! Plain-vs-double-quoted YAML scalar emission heuristic (component F).
//!
//! `serde_yaml`'s own emitter does not expose a stable choice between
//! plain and quoted style, so the front-matter writer formats scalars
//! itself against the literal rule in `spec.md` §4.F.

/// Whether `s` must be emitted in double-quoted style rather than plain
/// style.
#[must_use]
pub fn needs_double_quote(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let first = s.chars().next().unwrap();
    if matches!(first, '>' | ':' | '?' | '-' | ' ') {
        return true;
    }
    if s.ends_with(' ') {
        return true;
    }
    if s.contains('\t') || s.contains('\n') || s.contains('"') {
        return true;
    }
    if s.chars().any(|c| c.is_control()) {
        return true;
    }
    if s.contains(": ") || s.contains(":\t") || s.ends_with(':') {
        return true;
    }
    if s.contains("# ") || s.starts_with('#') {
        return true;
    }
    false
}

/// Render a standard double-quoted-style escape of `s` (without the
/// surrounding quotes).
#[must_use]
fn double_quote_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Format `s` as a YAML scalar: plain style when it round-trips as plain,
/// double-quoted style otherwise.
#[must_use]
pub fn format_scalar(s: &str) -> String {
    if needs_double_quote(s) {
        format!("\"{}\"", double_quote_escape(s))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_stays_unquoted() {
        assert_eq!(format_scalar("hello-world"), "hello-world");
    }

    #[test]
    fn leading_indicator_forces_quoting() {
        assert_eq!(format_scalar("- not a list"), "\"- not a list\"");
        assert_eq!(format_scalar(":colon"), "\":colon\"");
    }

    #[test]
    fn colon_space_forces_quoting() {
        assert!(needs_double_quote("key: value"));
    }

    #[test]
    fn trailing_space_forces_quoting() {
        assert!(needs_double_quote("trailing "));
    }

    #[test]
    fn tab_and_newline_force_quoting_and_escape() {
        let s = "a\tb\nc";
        let out = format_scalar(s);
        assert_eq!(out, "\"a\\tb\\nc\"");
    }

    #[test]
    fn empty_string_is_quoted() {
        assert_eq!(format_scalar(""), "\"\"");
    }
}
