//! Line-oriented ENVI header text: tokenizing and serialization.
//!
//! A header starts with a magic token line (`ENVI`), followed by
//! `attribute name = value` lines. Values opening with `{` may span lines
//! until the matching `}`; other lines without `=` continue the previous value.

use crate::error::{EnviError, Result};
use crate::header::value::{HeaderValue, parse_list};

/// Conventional magic token on the first line of a header.
pub const ENVI_MAGIC: &str = "ENVI";

/// Raw result of parsing header text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHeader {
    /// First-line magic token
    pub magic: String,
    /// Attributes in file order, keys normalized
    pub attributes: Vec<(String, HeaderValue)>,
}

/// Normalize an attribute name: lower-case, whitespace runs become `_`.
pub fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Inverse of [`normalize_key`] for writing.
pub fn display_key(key: &str) -> String {
    key.replace('_', " ")
}

/// Net brace depth change contributed by `text`.
fn brace_delta(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

/// Parse header text into ordered `(key, value)` pairs.
pub fn parse(raw: &str) -> Result<ParsedHeader> {
    let mut lines = raw.lines().enumerate();

    let mut magic = ENVI_MAGIC.to_string();
    let mut pending: Vec<(usize, String, String)> = Vec::new();
    let mut depth: i64 = 0;

    // Magic token is the first non-blank line unless it already holds an attribute
    let mut first_attribute = None;
    for (idx, line) in lines.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains('=') {
            log::warn!("Header has no magic token, assuming {ENVI_MAGIC}");
            first_attribute = Some((idx, line));
        } else {
            if trimmed != ENVI_MAGIC {
                log::warn!("Unexpected header magic token '{trimmed}'");
            }
            magic = trimmed.to_string();
        }
        break;
    }

    for (idx, line) in first_attribute.into_iter().chain(lines) {
        let line_no = idx + 1;

        if depth > 0 {
            // Inside a brace value every line belongs to it, '=' or not
            let Some((_, _, value)) = pending.last_mut() else {
                return Err(EnviError::malformed(line_no, "open brace without attribute"));
            };
            value.push_str(line);
            depth += brace_delta(line);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = normalize_key(key);
            if key.is_empty() {
                return Err(EnviError::malformed(line_no, "empty attribute name"));
            }
            let value = value.trim().to_string();
            depth = brace_delta(&value);
            pending.push((line_no, key, value));
        } else {
            let Some((_, _, value)) = pending.last_mut() else {
                return Err(EnviError::malformed(
                    line_no,
                    format!("continuation line before any attribute: '{trimmed}'"),
                ));
            };
            value.push_str(line);
            depth = brace_delta(value);
        }

        if depth < 0 {
            return Err(EnviError::malformed(line_no, "unbalanced '}'"));
        }
    }

    if depth != 0 {
        let line = pending.last().map_or(0, |(line, _, _)| *line);
        return Err(EnviError::malformed(line, "unterminated '{' list"));
    }

    let mut attributes = Vec::with_capacity(pending.len());
    for (line_no, key, value) in pending {
        let value = parse_value(&value).map_err(|e| EnviError::malformed(line_no, e.to_string()))?;
        attributes.push((key, value));
    }

    Ok(ParsedHeader { magic, attributes })
}

/// Second pass over a raw attribute value: list, exact integer, or string.
fn parse_value(raw: &str) -> Result<HeaderValue> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return Ok(HeaderValue::List(parse_list(trimmed)?));
    }
    Ok(trimmed
        .parse::<i64>()
        .map(HeaderValue::Int)
        .unwrap_or_else(|_| HeaderValue::Str(trimmed.to_string())))
}

/// Serialize attributes in order; keys are written with spaces.
pub fn serialize<'a, I>(magic: &str, attributes: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a HeaderValue)>,
{
    let mut out = String::new();
    out.push_str(magic);
    out.push('\n');
    for (key, value) in attributes {
        out.push_str(&display_key(key));
        out.push_str(" = ");
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ENVI
description = {
  Synthetic scene, created for tests}
samples = 4
lines   = 3
bands = 2
; a comment line
header offset = 0
data type = 4
interleave = bsq
Byte Order = 0
map info = {UTM, 1.000, 1.000, 500000.0, 4000000.0, 30.0, 30.0, 33, North, WGS-84,
 units=Meters}
wavelength units = Nanometers
wavelength = {
 450.5, 550.0
}
reflectance scale factor = 10000.0
";

    fn get<'a>(parsed: &'a ParsedHeader, key: &str) -> &'a HeaderValue {
        &parsed
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .unwrap_or_else(|| panic!("missing {key}"))
            .1
    }

    #[test]
    fn test_parse_sample_header() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.magic, "ENVI");
        assert_eq!(get(&parsed, "samples"), &HeaderValue::Int(4));
        assert_eq!(get(&parsed, "byte_order"), &HeaderValue::Int(0));
        assert_eq!(get(&parsed, "interleave"), &HeaderValue::Str("bsq".into()));
        assert_eq!(
            get(&parsed, "wavelength"),
            &HeaderValue::List(vec![HeaderValue::Float(450.5), HeaderValue::Float(550.0)])
        );
        // top-level scalars are only tried as integers
        assert_eq!(
            get(&parsed, "reflectance_scale_factor"),
            &HeaderValue::Str("10000.0".into())
        );
    }

    #[test]
    fn test_attribute_order_preserved() {
        let parsed = parse(SAMPLE).unwrap();
        let keys: Vec<&str> = parsed.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(&keys[..4], &["description", "samples", "lines", "bands"]);
        assert_eq!(keys.last(), Some(&"reflectance_scale_factor"));
    }

    #[test]
    fn test_brace_value_may_contain_equals() {
        let parsed = parse(SAMPLE).unwrap();
        let map_info = get(&parsed, "map_info").as_list().unwrap();
        assert_eq!(map_info.len(), 11);
        assert_eq!(map_info[10], HeaderValue::Str("units=Meters".into()));
    }

    #[test]
    fn test_plain_continuation_appends_verbatim() {
        let parsed = parse("ENVI\nsensor type = Hy\nMap\n").unwrap();
        assert_eq!(get(&parsed, "sensor_type"), &HeaderValue::Str("HyMap".into()));
    }

    #[test]
    fn test_continuation_before_attribute_is_fatal() {
        let err = parse("ENVI\n; comment\n  dangling\nsamples = 1\n").unwrap_err();
        assert!(matches!(err, EnviError::MalformedHeader { line: 3, .. }));
    }

    #[test]
    fn test_unterminated_list_is_fatal() {
        assert!(matches!(
            parse("ENVI\nwavelength = {1, 2,\n3\nbands = 3\n"),
            Err(EnviError::MalformedHeader { .. })
        ));
        assert!(parse("ENVI\nbands = 3}\n").is_err());
    }

    #[test]
    fn test_normalize_and_display_keys() {
        assert_eq!(normalize_key("  Data  Type "), "data_type");
        assert_eq!(display_key("data_type"), "data type");
    }

    #[test]
    fn test_serialize_round_trip() {
        let parsed = parse(SAMPLE).unwrap();
        let text = serialize(
            &parsed.magic,
            parsed.attributes.iter().map(|(k, v)| (k.as_str(), v)),
        );
        assert!(text.starts_with("ENVI\ndescription = {Synthetic scene, created for tests}\n"));
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed, parsed);
    }
}
