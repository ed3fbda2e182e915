use crate::{error::InvalidQueryError, parser::QueryParser};

pub struct LimitAndOffsetParser;

impl LimitAndOffsetParser {
    /// Parses the LIMIT clause. Accepts `count` and the `offset, count` form.
    /// Returns `(limit, offset)`.
    pub fn parse_limit(text: &str) -> Result<(u64, Option<u64>), InvalidQueryError> {
        let parts = QueryParser::split_top_level(text, ',');
        match parts.as_slice() {
            [count] => Ok((Self::parse_number("LIMIT", count)?, None)),
            [offset, count] => Ok((
                Self::parse_number("LIMIT", count)?,
                Some(Self::parse_number("LIMIT", offset)?),
            )),
            _ => InvalidQueryError::InvalidLimit { clause: "LIMIT", value: text.trim().to_string() }.err(),
        }
    }

    pub fn parse_offset(text: &str) -> Result<u64, InvalidQueryError> {
        Self::parse_number("OFFSET", text)
    }

    fn parse_number(clause: &'static str, text: &str) -> Result<u64, InvalidQueryError> {
        let text = text.trim();
        text.parse::<u64>().map_err(|_| InvalidQueryError::InvalidLimit {
            clause,
            value: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::InvalidQueryError, parser::ast::LimitAndOffsetParser};

    #[test]
    pub fn test_limit() {
        let (limit, offset) = LimitAndOffsetParser::parse_limit("10").expect("Failed to parse limit");
        assert_eq!(limit, 10);
        assert!(offset.is_none());
    }

    #[test]
    pub fn test_limit_with_offset() {
        let (limit, offset) = LimitAndOffsetParser::parse_limit("10, 20").expect("Failed to parse limit");
        assert_eq!(limit, 20);
        assert_eq!(offset, Some(10));
    }

    #[test]
    pub fn test_offset() {
        let offset = LimitAndOffsetParser::parse_offset(" 5 ").expect("Failed to parse offset");
        assert_eq!(offset, 5);
    }

    #[test]
    pub fn test_invalid_limit() {
        match LimitAndOffsetParser::parse_limit("ten") {
            Err(InvalidQueryError::InvalidLimit { clause, value }) => {
                assert_eq!(clause, "LIMIT");
                assert_eq!(value, "ten");
            }
            _ => panic!(),
        }
    }
}
