use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{ast::TableRef, QueryComparers, QueryParser};

static ROW_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)MAX\s+(\d+)\s*$").expect("row limit pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub table: String,
    pub alias: String,
    pub on_clause: String,
    /// Maximum number of related rows to fetch, from the `MAX n` suffix of the ON clause.
    pub row_limit: Option<u64>,
}

impl JoinSpec {
    pub fn new(join_type: JoinType, table: &TableRef) -> Self {
        Self {
            join_type,
            table: table.table.clone(),
            alias: table.alias.clone(),
            on_clause: String::new(),
            row_limit: None,
        }
    }

    /// Parses the text following a JOIN keyword: `table [AS alias] [ON condition [MAX n]]`.
    pub fn parse(join_type: JoinType, text: &str, comparers: &QueryComparers) -> Self {
        let (table_part, on_part) = QueryParser::split_once_keyword(text, &comparers.on);
        let mut join = JoinSpec::new(join_type, &TableRef::parse(&table_part, comparers));

        if let Some(on_part) = on_part {
            let (on_clause, row_limit) = Self::extract_row_limit(&on_part);
            join.on_clause = on_clause;
            join.row_limit = row_limit;
        }

        join
    }

    fn extract_row_limit(on_part: &str) -> (String, Option<u64>) {
        if let Some(captures) = ROW_LIMIT.captures(on_part) {
            let limit = captures.get(1).and_then(|value| value.as_str().parse::<u64>().ok());
            if let (Some(whole), Some(limit)) = (captures.get(0), limit) {
                return (on_part[..whole.start()].trim().to_string(), Some(limit));
            }
        }
        (on_part.trim().to_string(), None)
    }
}
