//! Filename extraction from `Content-Disposition` headers.
//!
//! The RFC 5987 extended form (`filename*=UTF-8''...`) wins over the plain
//! `filename="..."` form when both are present.

use crate::types::Operation;

/// Picks the download name for a binary response, falling back to the
/// operation's default when the header is absent or carries no usable name.
pub fn download_filename(header: Option<&str>, operation: Operation) -> String {
    header
        .and_then(parse_filename)
        .unwrap_or_else(|| operation.default_filename().to_string())
}

/// Extracts the filename from a `Content-Disposition` value, if any.
pub fn parse_filename(header: &str) -> Option<String> {
    let params = split_params(header);

    let extended = params
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, value)| decode_extended(value));
    if extended.is_some() {
        return extended;
    }

    params
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("filename"))
        .map(|(_, value)| unquote(value))
        .filter(|name| !name.is_empty())
}

/// Splits `attachment; a=b; c="d;e"` into `(name, raw value)` pairs,
/// honouring `;` inside quoted strings. The disposition type is skipped.
fn split_params(header: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in header.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Removes surrounding quotes and backslash escapes from a parameter value.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes `charset'language'percent-encoded` (RFC 5987). Only UTF-8 is accepted.
fn decode_extended(value: &str) -> Option<String> {
    let value = unquote(value);
    let mut pieces = value.splitn(3, '\'');
    let charset = pieces.next()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;

    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }

    urlencoding::decode(encoded)
        .ok()
        .map(|decoded| decoded.into_owned())
        .filter(|name| !name.is_empty())
}
