use crate::parser::WordComparer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Normal,
    /// Inside a literal opened by the given quote character.
    Quoted(char),
}

/// A keyword found by [`QueryParser::scan_keywords`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Index of the matching comparer in the slice given to the scan.
    pub index: usize,
    pub start: usize,
    pub end: usize,
    /// Parenthesis depth at which the keyword was found.
    pub depth: usize,
}

/// Character cursor over a query fragment.
///
/// Tracks parenthesis depth and quoted literals while moving forward, so callers
/// can tell whether the current position is at the top level of the statement.
#[derive(Debug, Default)]
pub struct QueryParser {
    pub position: usize,
    pub length: usize,
    pub text_v: Vec<char>,
    pub state: ScanState,
    pub depth: usize,
    /// Position of the first `)` that had no matching `(`.
    pub stray_close: Option<usize>,
    /// Position where the current quoted literal was opened.
    pub quote_start: usize,
}

impl QueryParser {
    pub fn new(text: &str) -> Self {
        let text_v: Vec<char> = text.chars().collect();
        Self {
            length: text_v.len(),
            text_v,
            ..Default::default()
        }
    }

    pub fn eof(&self) -> bool {
        self.position >= self.length
    }

    pub fn current(&self) -> char {
        self.peek(0)
    }

    pub fn peek(&self, ahead: usize) -> char {
        self.text_v.get(self.position + ahead).copied().unwrap_or('\0')
    }

    pub fn previous(&self) -> Option<char> {
        if self.position == 0 {
            return None;
        }
        self.text_v.get(self.position - 1).copied()
    }

    pub fn is_top_level(&self) -> bool {
        self.depth == 0 && self.state == ScanState::Normal
    }

    pub fn is_quoted(&self) -> bool {
        self.state != ScanState::Normal
    }

    /// Consumes the current character and updates the scan state.
    pub fn next(&mut self) {
        if self.eof() {
            return;
        }
        let current = self.current();
        match self.state {
            ScanState::Normal => match current {
                '\'' | '"' => {
                    self.state = ScanState::Quoted(current);
                    self.quote_start = self.position;
                }
                '(' => self.depth += 1,
                ')' => {
                    if self.depth == 0 {
                        self.stray_close.get_or_insert(self.position);
                    } else {
                        self.depth -= 1;
                    }
                }
                _ => {}
            },
            ScanState::Quoted(quote) => {
                if current == '\\' {
                    self.position += 1;
                } else if current == quote {
                    if self.peek(1) == quote {
                        self.position += 1;
                    } else {
                        self.state = ScanState::Normal;
                    }
                }
            }
        }
        self.position += 1;
    }

    pub fn jump(&mut self, ahead: usize) {
        self.position = (self.position + ahead).min(self.length);
    }

    pub fn text_from_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.length);
        let start = start.min(end);
        self.text_v[start..end].iter().collect()
    }

    pub fn text_from_pivot(&self, pivot: usize) -> String {
        self.text_from_range(pivot, self.position)
    }

    /// Walks the whole text and records every occurrence of the given keywords found
    /// outside quoted literals. Keywords are never matched inside one another.
    pub fn scan_keywords(&mut self, comparers: &[&WordComparer]) -> Vec<TokenMatch> {
        let mut matches = vec![];
        while !self.eof() {
            if !self.is_quoted() {
                let found = comparers
                    .iter()
                    .enumerate()
                    .find_map(|(index, comparer)| comparer.compare(self).map(|len| (index, len)));
                if let Some((index, len)) = found {
                    matches.push(TokenMatch {
                        index,
                        start: self.position,
                        end: self.position + len,
                        depth: self.depth,
                    });
                    self.jump(len);
                    continue;
                }
            }
            self.next();
        }
        matches
    }

    /// Splits `text` on `delimiter` wherever it appears at the top level.
    /// Parts are trimmed and empty parts are dropped.
    pub fn split_top_level(text: &str, delimiter: char) -> Vec<String> {
        let mut parser = QueryParser::new(text);
        let mut parts = vec![];
        let mut pivot = 0;
        while !parser.eof() {
            if parser.is_top_level() && parser.current() == delimiter {
                parts.push(parser.text_from_pivot(pivot));
                parser.jump(1);
                pivot = parser.position;
                continue;
            }
            parser.next();
        }
        parts.push(parser.text_from_pivot(pivot));

        parts
            .into_iter()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Splits `text` around the first top-level occurrence of the keyword.
    /// Both sides are trimmed; the right side is `None` when the keyword is absent.
    pub fn split_once_keyword(text: &str, comparer: &WordComparer) -> (String, Option<String>) {
        let mut parser = QueryParser::new(text);
        let found = parser
            .scan_keywords(&[comparer])
            .into_iter()
            .find(|token| token.depth == 0);

        match found {
            Some(token) => (
                parser.text_from_range(0, token.start).trim().to_string(),
                Some(parser.text_from_range(token.end, parser.length).trim().to_string()),
            ),
            None => (text.trim().to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{QueryComparers, QueryParser, ScanState};

    #[test]
    pub fn test_query_parser_tracks_depth() {
        let mut parser = QueryParser::new("a(b(c)d)e");
        let mut depths = vec![];
        while !parser.eof() {
            parser.next();
            depths.push(parser.depth);
        }
        assert_eq!(depths, vec![0, 1, 1, 2, 2, 1, 1, 0, 0]);
        assert!(parser.stray_close.is_none());
    }

    #[test]
    pub fn test_query_parser_ignores_parentheses_in_literals() {
        let mut parser = QueryParser::new("f(')', \"(\")");
        while !parser.eof() {
            parser.next();
        }
        assert_eq!(parser.depth, 0);
        assert_eq!(parser.state, ScanState::Normal);
    }

    #[test]
    pub fn test_query_parser_escaped_quote() {
        let mut parser = QueryParser::new(r"'it\'s' x");
        while !parser.eof() {
            parser.next();
        }
        assert_eq!(parser.state, ScanState::Normal);

        let mut parser = QueryParser::new("'it''s' x");
        while !parser.eof() {
            parser.next();
        }
        assert_eq!(parser.state, ScanState::Normal);
    }

    #[test]
    pub fn test_query_parser_stray_close() {
        let mut parser = QueryParser::new("a) b");
        while !parser.eof() {
            parser.next();
        }
        assert_eq!(parser.stray_close, Some(1));
    }

    #[test]
    pub fn test_split_top_level() {
        let parts = QueryParser::split_top_level("a, CONCAT(b, ', ', c) AS d ,, e", ',');
        assert_eq!(parts, vec!["a", "CONCAT(b, ', ', c) AS d", "e"]);
    }

    #[test]
    pub fn test_split_once_keyword() {
        let comparers = QueryComparers::new();

        let (left, right) = QueryParser::split_once_keyword("pages AS p ON p.uid = c.pid", &comparers.on);
        assert_eq!(left, "pages AS p");
        assert_eq!(right.as_deref(), Some("p.uid = c.pid"));

        let (left, right) = QueryParser::split_once_keyword("pages", &comparers.alias);
        assert_eq!(left, "pages");
        assert!(right.is_none());
    }

    #[test]
    pub fn test_scan_keywords_reports_depth() {
        let comparers = QueryComparers::new();
        let mut parser = QueryParser::new("EXTRACT(YEAR FROM tstamp) FROM tt_content WHERE x = 'from'");
        let matches = parser.scan_keywords(&[&comparers.from]);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].depth, 1);
        assert_eq!(matches[1].depth, 0);
        assert_eq!(matches[1].start, 26);
        assert_eq!(matches[1].end, 30);
    }
}
