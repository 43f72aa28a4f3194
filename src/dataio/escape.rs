//! Quoting of string values and section names.

/// Strip surrounding quotes and resolve backslash escapes.
///
/// Values without surrounding quotes are returned unchanged. `\n`, `\t`, `\v`
/// and `\0` become control characters; any other escaped character is kept
/// as-is (so `\"` gives `"` and `\\` gives `\`).
pub fn deserialize_string(value: &str) -> String {
    let inner = match value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) if value.len() >= 2 => inner,
        _ => return value.to_string(),
    };

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('v') => result.push('\x0B'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// Quote `value` unless it consists only of ASCII alphanumerics, `%`, `_` and `@`.
///
/// The inverse of [`deserialize_string`].
pub fn serialize_string(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '%' | '_' | '@'));
    if plain {
        return value.to_string();
    }

    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\x0B' => result.push_str("\\v"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\0' => result.push_str("\\0"),
            _ => result.push(c),
        }
    }
    result.push('"');
    result
}
