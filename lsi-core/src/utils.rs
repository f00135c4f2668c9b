//! Text normalisation shared by every host.
//!
//! Hosts report the same source through different token models (a token
//! stream printer inserts spaces, a concrete syntax tree keeps the author's
//! layout). These helpers reduce both to one canonical form.

/// Collapse token text to a canonical compact form.
///
/// Whitespace is dropped unless it separates two identifier characters, and
/// string literals are copied verbatim. `Vec < u8 >` and `Vec<u8>` both become
/// `Vec<u8>`; `dyn  Send` becomes `dyn Send`.
pub fn compact_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_ident = out.chars().last().is_some_and(is_ident_char);
            if prev_ident && is_ident_char(c) {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
        if c == '"' {
            copy_string_body(&mut chars, &mut out);
        }
    }
    out
}

fn copy_string_body(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    let mut escaped = false;
    for c in chars.by_ref() {
        out.push(c);
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return;
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Return the contents of a string literal, or `None` if `text` is not one.
///
/// Handles plain literals with the common escapes and raw literals
/// (`r"..."`, `r#"..."#`).
pub fn unquote(text: &str) -> Option<String> {
    let text = text.trim();
    if let Some(raw) = text.strip_prefix('r') {
        let hashes = raw.chars().take_while(|c| *c == '#').count();
        let fence = "#".repeat(hashes);
        let body = raw
            .strip_prefix(&fence)?
            .strip_prefix('"')?
            .strip_suffix(&fence)?
            .strip_suffix('"')?;
        return Some(body.to_string());
    }

    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Split `text` at commas that are not nested in brackets or string literals.
///
/// Empty trailing pieces (from a trailing comma) are dropped.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.trim().is_empty());
    pieces
}

/// Join documentation chunks into one text block.
///
/// Each chunk is one `///` line or one `#[doc = "..."]` value. One leading
/// space per line is removed, trailing whitespace is trimmed, and leading or
/// trailing blank lines are dropped.
pub fn doc_text<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    let lines: Vec<&str> = chunks
        .into_iter()
        .flat_map(|chunk| chunk.split('\n'))
        .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end())
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Convert a TOML value to its string representation
pub fn toml_value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(toml_value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        toml::Value::Table(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_tokens() {
        assert_eq!(compact_tokens("Vec < u8 >"), "Vec<u8>");
        assert_eq!(compact_tokens("Vec<u8>"), "Vec<u8>");
        assert_eq!(compact_tokens("dyn   Send"), "dyn Send");
        assert_eq!(compact_tokens("& 'a str"), "&'a str");
        assert_eq!(compact_tokens("foo :: bar"), "foo::bar");
        assert_eq!(compact_tokens("- 1"), "-1");
    }

    #[test]
    fn test_compact_tokens_keeps_strings() {
        assert_eq!(compact_tokens(r#"fmt ( "a  b" )"#), r#"fmt("a  b")"#);
        assert_eq!(compact_tokens(r#""x \" y""#), r#""x \" y""#);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""sex""#).as_deref(), Some("sex"));
        assert_eq!(unquote(r#""a\"b\n""#).as_deref(), Some("a\"b\n"));
        assert_eq!(unquote(r##"r#"raw "x""#"##).as_deref(), Some(r#"raw "x""#));
        assert_eq!(unquote(r#"r"plain""#).as_deref(), Some("plain"));
        assert_eq!(unquote("42"), None);
        assert_eq!(unquote("\""), None);
        assert_eq!(unquote("rename"), None);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level(r#"name = "a, b", len = 64"#),
            vec![r#"name = "a, b""#, " len = 64"]
        );
        assert_eq!(split_top_level("Map<K, V>, x"), vec!["Map<K, V>", " x"]);
        assert_eq!(split_top_level("a, b,"), vec!["a", " b"]);
        assert!(split_top_level("").is_empty());
    }

    #[test]
    fn test_doc_text() {
        assert_eq!(
            doc_text([" User account.", "", " Second line.  "]),
            "User account.\n\nSecond line."
        );
        assert_eq!(doc_text(["", " Only", ""]), "Only");
        assert_eq!(doc_text(Vec::<&str>::new()), "");
        assert_eq!(doc_text(["   "]), "");
    }

    #[test]
    fn test_toml_value_to_string() {
        assert_eq!(toml_value_to_string(&toml::Value::String("a".into())), "a");
        assert_eq!(toml_value_to_string(&toml::Value::Integer(3)), "3");
        assert_eq!(toml_value_to_string(&toml::Value::Boolean(true)), "true");
        let arr = toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::Integer(2)]);
        assert_eq!(toml_value_to_string(&arr), "1,2");
    }
}
