use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Leading decimal number of a cell value, the way spreadsheet users type them
    /// - Matches: "12.5kg" -> "12.5", " -3e2 units" -> " -3e2", ".5" -> ".5"
    /// - No match: "abc", "kg12", ""
    pub static ref LEADING_NUMBER_REGEX: Regex =
        Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();

    /// Characters that cannot appear inside a quoted Content-Disposition filename
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r#"[\x00-\x1f"\\/;]"#).unwrap();
}

/// Parse the leading number of `raw`; anything without one is 0
pub fn parse_leading_number(raw: &str) -> f64 {
    LEADING_NUMBER_REGEX
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Make a user-supplied name safe for a download header
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(name.trim(), "_")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_number_valid() {
        assert_eq!(parse_leading_number("12.5kg"), 12.5);
        assert_eq!(parse_leading_number("42"), 42.0);
        assert_eq!(parse_leading_number("  -3"), -3.0);
        assert_eq!(parse_leading_number(".5"), 0.5);
        assert_eq!(parse_leading_number("1e3 rows"), 1000.0);
        assert_eq!(parse_leading_number("7."), 7.0);
    }

    #[test]
    fn test_leading_number_invalid() {
        assert_eq!(parse_leading_number("abc"), 0.0);
        assert_eq!(parse_leading_number("kg12"), 0.0);
        assert_eq!(parse_leading_number(""), 0.0);
        assert_eq!(parse_leading_number("-"), 0.0);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("sales \"Q1\""), "sales _Q1_");
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_name("report-2024.v2"), "report-2024.v2");
    }
}
