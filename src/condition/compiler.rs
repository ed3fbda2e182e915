use crate::{
    condition::{escape_str_for_like, full_quote_str, list_query, Condition, Operator, VALUE_EMPTY, VALUE_NULL},
    error::InvalidQueryError,
    fulltext::FulltextParser,
};

/// The column a condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionTarget<'a> {
    /// Field expression as written in SQL, e.g. `tt_content.header`.
    pub field: &'a str,
    /// True name of the table the field belongs to.
    pub table: &'a str,
    /// Alias of that table in the query.
    pub alias: &'a str,
}

impl<'a> ConditionTarget<'a> {
    pub fn new(field: &'a str, table: &'a str, alias: &'a str) -> Self {
        Self { field, table, alias }
    }

    /// Index name of a `alias.fulltext.INDEX` field, or the last segment of any other field.
    pub fn fulltext_index(&self) -> &'a str {
        let parts: Vec<&'a str> = self.field.split('.').collect();
        match parts.as_slice() {
            [_, "fulltext", index] => index,
            _ => parts.last().copied().unwrap_or(self.field),
        }
    }
}

/// Turns filter conditions into SQL boolean fragments.
pub struct ConditionCompiler<'a> {
    fulltext: &'a FulltextParser<'a>,
}

impl<'a> ConditionCompiler<'a> {
    pub fn new(fulltext: &'a FulltextParser<'a>) -> Self {
        Self { fulltext }
    }

    /// Compiles `condition` against `target`. A `\all` value yields an empty fragment.
    pub fn compile(&self, target: &ConditionTarget, condition: &Condition) -> Result<String, InvalidQueryError> {
        if condition.value.is_all() {
            return Ok(String::new());
        }
        let field = target.field;

        let fragment = match condition.operator {
            Operator::In => {
                let values = condition
                    .value
                    .values(true)
                    .iter()
                    .map(|value| full_quote_str(value))
                    .collect::<Vec<String>>()
                    .join(",");
                let not = if condition.negate { " NOT" } else { "" };
                return Ok(format!("{field}{not} IN ({values})"));
            }
            Operator::AndGroup | Operator::OrGroup => {
                let joiner = if condition.operator == Operator::AndGroup { " AND " } else { " OR " };
                condition
                    .value
                    .values(true)
                    .iter()
                    .map(|value| list_query(field, value))
                    .collect::<Vec<String>>()
                    .join(joiner)
            }
            Operator::Like | Operator::Start | Operator::End => condition
                .value
                .values(false)
                .iter()
                .map(|value| {
                    let value = escape_str_for_like(value);
                    let pattern = match condition.operator {
                        Operator::Start => format!("{value}%"),
                        Operator::End => format!("%{value}"),
                        _ => format!("%{value}%"),
                    };
                    format!("{field} LIKE {}", full_quote_str(&pattern))
                })
                .collect::<Vec<String>>()
                .join(" OR "),
            Operator::Fulltext | Operator::FulltextNatural => {
                return self.fulltext.parse(
                    target.table,
                    target.alias,
                    target.fulltext_index(),
                    &condition.value.as_text(),
                    condition.operator == Operator::FulltextNatural,
                    condition.negate,
                );
            }
            Operator::Comparison(comparison) => condition
                .value
                .values(false)
                .iter()
                .map(|value| match value.as_str() {
                    VALUE_EMPTY => format!("{field} {} ''", comparison.symbol()),
                    VALUE_NULL => format!("{field} {} NULL", comparison.null_safe()),
                    _ => format!("{field} {} {}", comparison.symbol(), full_quote_str(value)),
                })
                .collect::<Vec<String>>()
                .join(" OR "),
        };

        if condition.negate {
            Ok(format!("NOT ({fragment})"))
        } else {
            Ok(fragment)
        }
    }
}
