use serde::{Deserialize, Serialize};

use crate::parser::QueryParser;

/// Where a sort must be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderEngine {
    /// Sorting happens in the database.
    Source,
    /// Sorting must happen after fetching, in the data provider.
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderField {
    pub field: String,
    pub order: String,
    pub engine: Option<OrderEngine>,
    /// Original field name when `field` was replaced by its SELECT alias.
    pub alias: Option<String>,
}

impl OrderField {
    pub fn new(field: &str, order: &str) -> Self {
        Self {
            field: field.to_string(),
            order: order.to_string(),
            engine: None,
            alias: None,
        }
    }
}

pub struct OrderByParser;

impl OrderByParser {
    /// Parses `expr [ASC|DESC], ...` into the raw fragments and the order fields.
    pub fn parse(text: &str) -> (Vec<String>, Vec<OrderField>) {
        let parts = QueryParser::split_top_level(text, ',');
        let fields = parts.iter().map(|part| Self::parse_part(part)).collect();
        (parts, fields)
    }

    fn parse_part(part: &str) -> OrderField {
        if let Some((field, direction)) = part.rsplit_once(char::is_whitespace) {
            let direction = direction.trim();
            if direction.eq_ignore_ascii_case("ASC") || direction.eq_ignore_ascii_case("DESC") {
                return OrderField::new(field.trim(), &direction.to_uppercase());
            }
        }
        OrderField::new(part, "ASC")
    }
}
