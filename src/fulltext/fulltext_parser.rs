use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::{condition::add_slashes, database::SchemaProvider, error::InvalidQueryError};

/// Boolean-mode operators kept in front of a term.
const TERM_OPERATORS: [char; 5] = ['+', '-', '~', '>', '<'];

const MARKER: char = '\u{1}';

/// Builds `MATCH() AGAINST()` conditions for fulltext indexes.
///
/// Created per build with the schema of the current request, so no instance is
/// shared between threads.
pub struct FulltextParser<'a> {
    schema: &'a dyn SchemaProvider,
    minimum_word_length: usize,
}

impl<'a> FulltextParser<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, minimum_word_length: usize) -> Self {
        Self { schema, minimum_word_length }
    }

    /// Builds the MATCH condition for `index` of `table`, qualifying the indexed
    /// columns with `alias`.
    pub fn parse(
        &self,
        table: &str,
        alias: &str,
        index: &str,
        search: &str,
        natural: bool,
        negated: bool,
    ) -> Result<String, InvalidQueryError> {
        let indexes = self.schema.fulltext_indexes(table);
        let Some(fields) = indexes.get(index) else {
            return InvalidQueryError::UnknownIndex {
                table: table.to_string(),
                index: index.to_string(),
            }
            .err();
        };
        let fields = Self::qualify_fields(fields, table, alias);
        let search = Self::decode_search(search);

        let (terms, mode) = if natural {
            (add_slashes(search.trim()), "")
        } else {
            (self.process_search_term(&search), " IN BOOLEAN MODE")
        };
        if terms.is_empty() {
            return InvalidQueryError::EmptySearch.err();
        }

        debug!(table, index, terms = %terms, "Fulltext condition");
        let not = if negated { "NOT " } else { "" };
        Ok(format!("{not}MATCH({fields}) AGAINST('{terms}'{mode})"))
    }

    /// Search strings come from query strings: `+` is a space and `%XX` sequences are decoded.
    /// A literal boolean `+` operator therefore has to be sent as `%2B`.
    pub fn decode_search(search: &str) -> String {
        percent_decode_str(&search.replace('+', " ")).decode_utf8_lossy().into_owned()
    }

    fn qualify_fields(fields: &str, table: &str, alias: &str) -> String {
        if table == alias {
            return fields.to_string();
        }
        let prefix = format!("{table}.");
        fields
            .split(',')
            .map(|field| {
                let field = field.trim();
                match field.strip_prefix(&prefix) {
                    Some(column) => format!("{alias}.{column}"),
                    None => field.to_string(),
                }
            })
            .collect::<Vec<String>>()
            .join(",")
    }

    /// Turns a user search string into boolean-mode syntax.
    ///
    /// Quoted phrases and bracketed groups are kept whole. Other terms keep one
    /// leading operator and one trailing `*`; terms shorter than the minimum word
    /// length are dropped unless they carry the wildcard.
    pub fn process_search_term(&self, term: &str) -> String {
        let (text, protected) = Self::protect_groups(term);

        let mut processed = vec![];
        for token in text.split(' ').filter(|token| !token.is_empty()) {
            let (operator, rest) = match token.chars().next() {
                Some(first) if TERM_OPERATORS.contains(&first) => (Some(first), &token[first.len_utf8()..]),
                _ => (None, token),
            };
            let operator = operator.map(String::from).unwrap_or_default();

            // The operator was split off above, so `-"a b"` arrives here as a marker token.
            if rest.contains(MARKER) {
                processed.push(format!("{operator}{}", add_slashes(&Self::restore_groups(rest, &protected))));
                continue;
            }

            let (word, wildcard) = match rest.strip_suffix('*') {
                Some(word) => (word, "*"),
                None => (rest, ""),
            };
            if word.is_empty() || (wildcard.is_empty() && word.chars().count() < self.minimum_word_length) {
                continue;
            }
            processed.push(format!("{operator}{}{wildcard}", add_slashes(word)));
        }

        processed.join(" ")
    }

    /// Replaces quoted phrases and bracketed groups with numbered markers.
    fn protect_groups(term: &str) -> (String, Vec<String>) {
        let chars: Vec<char> = term.chars().collect();
        let mut text = String::with_capacity(term.len());
        let mut protected = vec![];
        let mut position = 0;

        while position < chars.len() {
            let end = match chars[position] {
                '"' => chars[position + 1..]
                    .iter()
                    .position(|ch| *ch == '"')
                    .map(|offset| position + 1 + offset),
                '(' => Self::closing_bracket(&chars, position),
                _ => None,
            };
            match end {
                Some(end) => {
                    text.push(MARKER);
                    text.push_str(&protected.len().to_string());
                    text.push(MARKER);
                    protected.push(chars[position..=end].iter().collect());
                    position = end + 1;
                }
                None => {
                    text.push(chars[position]);
                    position += 1;
                }
            }
        }

        (text, protected)
    }

    fn closing_bracket(chars: &[char], start: usize) -> Option<usize> {
        let mut depth = 0;
        for (offset, ch) in chars[start..].iter().enumerate() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(start + offset);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn restore_groups(text: &str, protected: &[String]) -> String {
        let mut restored = String::with_capacity(text.len());
        let mut parts = text.split(MARKER);
        if let Some(first) = parts.next() {
            restored.push_str(first);
        }
        // Markers come in pairs: index, then the text following the closing marker.
        while let (Some(index), Some(tail)) = (parts.next(), parts.next()) {
            if let Some(group) = index.parse::<usize>().ok().and_then(|index| protected.get(index)) {
                restored.push_str(group);
            }
            restored.push_str(tail);
        }
        restored
    }
}
