use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidQueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    /// `!=`, kept apart from `<>` so it is written back as typed.
    BangEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl ComparisonOperator {
    /// The operator to use when comparing against NULL. Only `=` becomes `IS`.
    pub fn null_safe(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "IS",
            _ => self.symbol(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::BangEqual => "!=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessOrEqual => "<=",
        }
    }
}

/// Filter condition operator, one variant per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    In,
    AndGroup,
    OrGroup,
    Like,
    Start,
    End,
    Fulltext,
    FulltextNatural,
    Comparison(ComparisonOperator),
}

impl Operator {
    pub fn is_fulltext(&self) -> bool {
        matches!(self, Operator::Fulltext | Operator::FulltextNatural)
    }
}

impl FromStr for Operator {
    type Err = InvalidQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let operator = match value.trim().to_lowercase().as_str() {
            "in" => Operator::In,
            "andgroup" => Operator::AndGroup,
            "orgroup" => Operator::OrGroup,
            "like" => Operator::Like,
            "start" => Operator::Start,
            "end" => Operator::End,
            "fulltext" => Operator::Fulltext,
            "fulltext_natural" => Operator::FulltextNatural,
            "=" => Operator::Comparison(ComparisonOperator::Equal),
            "<>" => Operator::Comparison(ComparisonOperator::NotEqual),
            "!=" => Operator::Comparison(ComparisonOperator::BangEqual),
            ">" => Operator::Comparison(ComparisonOperator::Greater),
            ">=" => Operator::Comparison(ComparisonOperator::GreaterOrEqual),
            "<" => Operator::Comparison(ComparisonOperator::Less),
            "<=" => Operator::Comparison(ComparisonOperator::LessOrEqual),
            _ => return InvalidQueryError::UnknownOperator(value.to_string()).err(),
        };
        Ok(operator)
    }
}

impl TryFrom<String> for Operator {
    type Error = InvalidQueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operator::In => "in",
            Operator::AndGroup => "andgroup",
            Operator::OrGroup => "orgroup",
            Operator::Like => "like",
            Operator::Start => "start",
            Operator::End => "end",
            Operator::Fulltext => "fulltext",
            Operator::FulltextNatural => "fulltext_natural",
            Operator::Comparison(comparison) => comparison.symbol(),
        };
        write!(f, "{name}")
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.to_string()
    }
}
