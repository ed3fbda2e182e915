use std::fmt::Display;

use crate::parser::ast::ParsedQuery;

/// Assembles SQL text from a [`ParsedQuery`].
///
/// Output only depends on the query state, so serializing the same query twice
/// yields the same string.
pub struct QuerySerializer;

impl QuerySerializer {
    /// Renders the query. ORDER BY is left out when `process_order_by` is false,
    /// the caller then sorts the fetched rows itself.
    pub fn serialize(query: &ParsedQuery, process_order_by: bool) -> String {
        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&Self::select_part(query));

        sql.push_str(&format!(" FROM {} AS {}", query.from.table, query.from.alias));

        for join in query.joins.values() {
            sql.push_str(&format!(" {} JOIN {} AS {}", join.join_type, join.table, join.alias));
            if !join.on_clause.is_empty() {
                sql.push_str(&format!(" ON {}", join.on_clause));
            }
        }

        if !query.r#where.is_empty() {
            let clauses = query
                .r#where
                .iter()
                .map(|clause| format!("({clause})"))
                .collect::<Vec<String>>()
                .join(" AND ");
            sql.push_str(&format!(" WHERE {clauses}"));
        }

        if !query.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", query.group_by.join(", ")));
        }

        if process_order_by && !query.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", query.order_by.join(", ")));
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = query.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        sql
    }

    /// The SELECT list with every fulltext placeholder replaced.
    fn select_part(query: &ParsedQuery) -> String {
        let mut fields = if query.select_list.is_empty() {
            query
                .select
                .iter()
                .map(|field| field.to_string())
                .collect::<Vec<String>>()
                .join(", ")
        } else {
            query.select_list.join(", ")
        };

        // Longest keys first so that `c.fulltext.SEARCH` cannot eat into `c.fulltext.SEARCH2`.
        let mut placeholders: Vec<(&String, &String)> = query.fulltext_placeholders.iter().collect();
        placeholders.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        for (placeholder, replacement) in placeholders {
            fields = fields.replace(placeholder.as_str(), replacement);
        }

        fields
    }
}

impl Display for ParsedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", QuerySerializer::serialize(self, true))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        database::StaticCatalog,
        parser::{ast::ParsedQuery, SqlParser},
        serializer::QuerySerializer,
    };

    fn parse(text: &str) -> ParsedQuery {
        let catalog = StaticCatalog::from_json(json!({
            "tables": {
                "tt_content": {
                    "fields": {"uid": null, "pid": null, "header": null},
                    "fulltext_indexes": {"SEARCH": ["header"]}
                }
            }
        }))
        .expect("Failed to build catalog");
        SqlParser::new(&catalog).parse(text).expect("Failed to parse query")
    }

    #[test]
    pub fn test_serialize_simple_query() {
        let query = parse("SELECT uid, header FROM tt_content");
        assert_eq!(
            QuerySerializer::serialize(&query, true),
            "SELECT tt_content.uid, tt_content.header FROM tt_content AS tt_content"
        );
    }

    #[test]
    pub fn test_serialize_all_clauses() {
        let query = parse(
            "SELECT DISTINCT c.header FROM tt_content AS c LEFT JOIN pages AS p ON p.uid = c.pid MAX 2 \
             WHERE c.header <> '' GROUP BY c.header ORDER BY c.header DESC LIMIT 5,10",
        );
        assert_eq!(
            QuerySerializer::serialize(&query, true),
            "SELECT DISTINCT c.header FROM tt_content AS c LEFT JOIN pages AS p ON p.uid = c.pid \
             WHERE (c.header <> '') GROUP BY c.header ORDER BY c.header DESC LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    pub fn test_serialize_without_ordering() {
        let query = parse("SELECT uid FROM tt_content ORDER BY header");
        assert_eq!(
            QuerySerializer::serialize(&query, false),
            "SELECT tt_content.uid FROM tt_content AS tt_content"
        );
    }

    #[test]
    pub fn test_serialize_offset_needs_limit() {
        let mut query = parse("SELECT uid FROM tt_content");
        query.offset = Some(4);
        assert_eq!(query.to_string(), "SELECT tt_content.uid FROM tt_content AS tt_content");
    }

    #[test]
    pub fn test_serialize_fulltext_placeholder_default() {
        let query = parse("SELECT uid, fulltext:SEARCH AS score FROM tt_content");
        assert_eq!(
            query.to_string(),
            "SELECT tt_content.uid, 1 AS score FROM tt_content AS tt_content"
        );
    }

    #[test]
    pub fn test_serialize_is_repeatable() {
        let query = parse("SELECT uid FROM tt_content AS c, pages AS p WHERE p.uid = c.pid");
        let first = QuerySerializer::serialize(&query, true);
        let second = QuerySerializer::serialize(&query, true);

        assert_eq!(first, second);
        assert_eq!(
            first,
            "SELECT c.uid FROM tt_content AS c INNER JOIN pages AS p WHERE (p.uid = c.pid)"
        );
    }
}
