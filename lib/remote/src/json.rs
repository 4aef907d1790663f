//! Field extraction for the protocol's JSON dialect.
//!
//! This is substring scanning, not a parser: keys are matched
//! literally, string values are taken up to the next quote (the server
//! never emits escapes), and numbers are bare tokens.

/// Byte offset of the value following `"field":`.
fn value_start(json: &str, field: &str) -> Option<usize> {
    let needle = format!("\"{field}\"");
    let mut from = 0;

    while let Some(found) = json[from..].find(&needle) {
        let after = from + found + needle.len();
        let rest = &json[after..];
        let trimmed = rest.trim_start();
        if let Some(value) = trimmed.strip_prefix(':') {
            let value = value.trim_start();
            return Some(json.len() - value.len());
        }
        // A string value that happens to equal the key.
        from = after;
    }

    None
}

/// Offset of the bracket closing the one `json` starts with.
fn matching_close(json: &str, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;

    for (i, byte) in json.bytes().enumerate() {
        match byte {
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b if b == open => depth += 1,
            b if b == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// The quoted string value of `field`.
pub fn string_field<'a>(json: &'a str, field: &str) -> Option<&'a str> {
    let start = value_start(json, field)?;
    let value = json[start..].strip_prefix('"')?;
    let end = value.find('"')?;
    Some(&value[..end])
}

/// The bare numeric value of `field`.
pub fn number_field<T: std::str::FromStr>(json: &str, field: &str) -> Option<T> {
    let start = value_start(json, field)?;
    let value = &json[start..];
    let end = value
        .find(|c: char| matches!(c, ',' | '}' | ']') || c.is_whitespace())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// The object value of `field`, braces included.
pub fn object_field<'a>(json: &'a str, field: &str) -> Option<&'a str> {
    let start = value_start(json, field)?;
    let value = &json[start..];
    if !value.starts_with('{') {
        return None;
    }
    let end = matching_close(value, b'{', b'}')?;
    Some(&value[..=end])
}

/// Every object element of the array value of `field`.
pub fn array_objects<'a>(json: &'a str, field: &str) -> Option<Vec<&'a str>> {
    let start = value_start(json, field)?;
    let value = &json[start..];
    if !value.starts_with('[') {
        return None;
    }
    let end = matching_close(value, b'[', b']')?;

    let mut objects = Vec::new();
    let mut rest = &value[1..end];
    while let Some(open) = rest.find('{') {
        rest = &rest[open..];
        let close = matching_close(rest, b'{', b'}')?;
        objects.push(&rest[..=close]);
        rest = &rest[close + 1..];
    }
    Some(objects)
}

/// Whether the outermost object has a key named `field`.
pub fn has_top_level_field(json: &str, field: &str) -> bool {
    let bytes = json.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b'"' => {
                let Some(len) = json[i + 1..].find('"') else {
                    return false;
                };
                let string = &json[i + 1..i + 1 + len];
                i += len + 1;
                if depth == 1
                    && string == field
                    && json[i + 1..].trim_start().starts_with(':')
                {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}
