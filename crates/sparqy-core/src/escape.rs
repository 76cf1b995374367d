//! RDF literal escaping for values embedded in query text.
//!
//! Escaping maps every value onto printable ASCII: backslash, tab, newline and
//! carriage return get their short escapes, other control and Latin-1 characters
//! become `\u00XX`, anything wider becomes `\uXXXX` or `\UXXXXXXXX`, and both
//! quote characters are backslash-escaped. [`unescape_from_rdf`] inverts it.
//!
//! This covers quotes and control characters only. Values are still spliced
//! into query text, so the escaping is the sole barrier against injection.

use crate::error::SparqyError;

/// Escape a value for use inside a double-quoted SPARQL string literal.
pub fn escape_for_rdf(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            c if (c as u32) < 0x20 || (0x7f..0x100).contains(&(c as u32)) => {
                out.push_str(&format!("\\u00{:02x}", c as u32));
            }
            c if (c as u32) < 0x100 => out.push(c),
            c if (c as u32) <= 0xffff => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out
}

/// Reverse [`escape_for_rdf`].
///
/// Unknown or malformed escape sequences are kept verbatim rather than rejected,
/// since values read back from a store may never have been escaped.
pub fn unescape_from_rdf(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(&next) = chars.peek() else {
            out.push('\\');
            break;
        };
        let simple = match next {
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            't' => Some('\t'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0c}'),
            'v' => Some('\u{0b}'),
            _ => None,
        };
        if let Some(c) = simple {
            chars.next();
            out.push(c);
            continue;
        }
        let width = match next {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => 0,
        };
        if width == 0 {
            out.push('\\');
            continue;
        }

        let digits: String = chars.clone().skip(1).take(width).collect();
        let decoded = (digits.len() == width && digits.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| u32::from_str_radix(&digits, 16).ok())
            .flatten()
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                for _ in 0..=width {
                    chars.next();
                }
                out.push(c);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Check that `iri` can be embedded between `<` and `>` without altering query structure.
pub fn check_iri(iri: &str) -> Result<&str, SparqyError> {
    let forbidden = |c: char| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    };
    if iri.is_empty() || iri.chars().any(forbidden) {
        return Err(SparqyError::InvalidIri(iri.to_string()));
    }
    Ok(iri)
}
