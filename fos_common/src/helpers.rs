/// Parse a boolean flag. Returns `None` for unrecognised text so that the caller can report it.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a strictly positive integer setting. Returns `None` for missing, malformed, zero or negative values so that
/// the caller can fall back to its default.
pub fn parse_positive_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|s| s.trim().parse::<i64>().ok()).filter(|v| *v > 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert_eq!(parse_boolean("YES"), Some(true));
        assert_eq!(parse_boolean(" off "), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
        assert_eq!(parse_boolean(""), None);
    }

    #[test]
    fn positive_ints() {
        assert_eq!(parse_positive_int(Some("30")), Some(30));
        assert_eq!(parse_positive_int(Some(" 8 ")), Some(8));
        assert_eq!(parse_positive_int(Some("0")), None);
        assert_eq!(parse_positive_int(Some("-5")), None);
        assert_eq!(parse_positive_int(Some("five")), None);
        assert_eq!(parse_positive_int(None), None);
    }
}
