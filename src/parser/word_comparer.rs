use crate::parser::QueryParser;

/// Case-insensitive keyword matcher.
///
/// A space inside the keyword matches any run of whitespace, so `GROUP BY`
/// also matches `group\n  by`. A match must stand on word boundaries.
#[derive(Debug, Default, Clone)]
pub struct WordComparer {
    pub word: Vec<char>,
}

impl WordComparer {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_uppercase().chars().collect(),
        }
    }

    pub fn is_identifier_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.'
    }

    /// Returns the length of the text matched at the parser's position.
    pub fn compare(&self, parser: &QueryParser) -> Option<usize> {
        if parser.previous().is_some_and(Self::is_identifier_char) {
            return None;
        }

        let mut offset = 0;
        for expected in self.word.iter() {
            if *expected == ' ' {
                let start = offset;
                while parser.peek(offset).is_whitespace() {
                    offset += 1;
                }
                if offset == start {
                    return None;
                }
                continue;
            }
            let current = parser.peek(offset);
            if current == '\0' || current.to_ascii_uppercase() != *expected {
                return None;
            }
            offset += 1;
        }

        if parser.position + offset < parser.length && Self::is_identifier_char(parser.peek(offset)) {
            return None;
        }

        Some(offset)
    }

    pub fn matches_at(&self, text: &str, position: usize) -> Option<usize> {
        let mut parser = QueryParser::new(text);
        parser.jump(position);
        self.compare(&parser)
    }
}
