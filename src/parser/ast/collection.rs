use crate::parser::{QueryComparers, QueryParser};

/// A table reference, `table [AS alias]`. The alias defaults to the table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub table: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
        }
    }

    pub fn parse(text: &str, comparers: &QueryComparers) -> Self {
        let (table, alias) = QueryParser::split_once_keyword(text, &comparers.alias);
        let alias = match alias {
            Some(alias) if !alias.is_empty() => alias,
            _ => table.clone(),
        };
        Self { table, alias }
    }
}
