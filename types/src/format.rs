//! The small template language type constructors use to name their types.
//!
//! `{N}` is the N-th type argument and `[N]` the N-th value argument.
//! `{N|sep}` joins type arguments N.. with `sep` (and `[N|sep]` value
//! arguments likewise). `{N?text}` is type argument N, or `text` when there is
//! no such argument. `{{`, `}}`, `[[` and `]]` produce literal brackets.
//!
//! Any error (unknown index, unbalanced bracket) yields
//! [`MALFORMED_TYPE_EXP`] instead of a name.

use alloc::string::{String, ToString};

pub const MALFORMED_TYPE_EXP: &str = "MalformedTypeExp";

pub fn format_type_name(format: &str, type_arguments: &[String], value_arguments: &[String]) -> String {
    try_format(format, type_arguments, value_arguments).unwrap_or_else(|| MALFORMED_TYPE_EXP.to_string())
}

fn try_format(format: &str, type_arguments: &[String], value_arguments: &[String]) -> Option<String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        let (close, arguments) = match c {
            '{' => ('}', type_arguments),
            '[' => (']', value_arguments),
            '}' | ']' => {
                // Only the doubled form is allowed outside a placeholder.
                if chars.next_if_eq(&c).is_none() {
                    return None;
                }
                out.push(c);
                continue;
            }
            _ => {
                out.push(c);
                continue;
            }
        };
        if chars.next_if_eq(&c).is_some() {
            out.push(c);
            continue;
        }
        let mut placeholder = String::new();
        loop {
            match chars.next()? {
                ch if ch == close => break,
                ch => placeholder.push(ch),
            }
        }
        expand(&placeholder, arguments, &mut out)?;
    }
    Some(out)
}

fn expand(placeholder: &str, arguments: &[String], out: &mut String) -> Option<()> {
    let digits_end = placeholder
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(placeholder.len());
    let index: usize = placeholder[..digits_end].parse().ok()?;
    let rest = &placeholder[digits_end..];

    if let Some(separator) = rest.strip_prefix('|') {
        let tail = arguments.get(index..)?;
        out.push_str(&tail.join(separator));
    } else if let Some(replacement) = rest.strip_prefix('?') {
        out.push_str(arguments.get(index).map_or(replacement, String::as_str));
    } else if rest.is_empty() {
        out.push_str(arguments.get(index)?);
    } else {
        return None;
    }
    Some(())
}
