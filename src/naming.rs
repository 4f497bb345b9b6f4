//! Conversion between Django field names (snake_case) and TypeScript
//! property names (camelCase).

/// Converts a snake_case identifier to camelCase.
///
/// Identifiers without an underscore are returned unchanged. The first
/// segment is kept verbatim; every following non-empty segment gets its
/// first character upper-cased and the rest left untouched.
///
/// ```text
/// to_camel("user_name")    == "userName"
/// to_camel("is_high_risk") == "isHighRisk"
/// to_camel("id")           == "id"
/// ```
pub fn to_camel(snake: &str) -> String {
    if !snake.contains('_') {
        return snake.to_string();
    }

    let mut segments = snake.split('_');
    let mut camel = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }
    camel
}
