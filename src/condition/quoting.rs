//! MySQL string quoting.

/// Escapes a value for use inside a single-quoted MySQL string literal.
pub fn quote_str(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\x1a' => escaped.push_str("\\Z"),
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn full_quote_str(value: &str) -> String {
    format!("'{}'", quote_str(value))
}

/// Escapes the LIKE wildcards `%` and `_`.
pub fn escape_str_for_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '%' || ch == '_' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escapes quotes, backslashes and NUL, leaving everything else untouched.
pub fn add_slashes(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\0' => escaped.push_str("\\0"),
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Membership test of `value` in a comma-separated list column.
pub fn list_query(field: &str, value: &str) -> String {
    format!("FIND_IN_SET('{}',{})", quote_str(value), field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_full_quote_str() {
        assert_eq!(full_quote_str("10"), "'10'");
        assert_eq!(full_quote_str("it's"), r"'it\'s'");
        assert_eq!(full_quote_str("a\\b\"c\n"), r#"'a\\b\"c\n'"#);
    }

    #[test]
    pub fn test_escape_str_for_like() {
        assert_eq!(escape_str_for_like("100%_sure"), r"100\%\_sure");
    }

    #[test]
    pub fn test_add_slashes() {
        assert_eq!(add_slashes(r#"don't "say""#), r#"don\'t \"say\""#);
        assert_eq!(add_slashes("(>bar <baz)"), "(>bar <baz)");
    }

    #[test]
    pub fn test_list_query() {
        assert_eq!(list_query("tt_content.fe_group", "1"), "FIND_IN_SET('1',tt_content.fe_group)");
    }
}
