use tracing::debug;

use crate::{
    database::SchemaProvider,
    error::InvalidQueryError,
    parser::{
        ast::{GroupByParser, JoinSpec, JoinType, LimitAndOffsetParser, OrderByParser, ParsedQuery, TableRef},
        Clause, ClauseSegment, QueryComparers, QueryParser, SelectListParser,
    },
};

/// Normalizes query text as typed by an editor: comment lines and blank lines
/// are dropped, lines are joined, backquotes and a trailing `;` are removed.
pub fn prepare_query_string(text: &str) -> String {
    let joined = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("--"))
        .collect::<Vec<&str>>()
        .join(" ")
        .replace('`', "");

    joined.trim().trim_end_matches(';').trim_end().to_string()
}

/// Parses the constrained SELECT dialect into a [`ParsedQuery`].
pub struct SqlParser<'a> {
    schema: &'a dyn SchemaProvider,
    comparers: QueryComparers,
}

impl<'a> SqlParser<'a> {
    pub fn new(schema: &'a dyn SchemaProvider) -> Self {
        Self {
            schema,
            comparers: QueryComparers::new(),
        }
    }

    pub fn parse(&self, text: &str) -> Result<ParsedQuery, InvalidQueryError> {
        let (select_text, remainder) = self.split_select(text)?;
        let segments = self.split_clauses(&remainder);

        let mut query = ParsedQuery::default();

        let from_text = segments
            .iter()
            .find(|segment| segment.clause == Clause::From)
            .map(|segment| segment.text.as_str())
            .unwrap_or("");
        self.parse_from(from_text, &mut query)?;

        for segment in segments.iter() {
            match segment.clause {
                Clause::From => {}
                Clause::InnerJoin | Clause::LeftJoin | Clause::RightJoin => {
                    let join_type = segment.clause.join_type().unwrap_or(JoinType::Inner);
                    query.add_join(JoinSpec::parse(join_type, &segment.text, &self.comparers));
                }
                Clause::Where => query.add_where_clause(&segment.text),
                Clause::GroupBy => query.group_by.extend(GroupByParser::parse(&segment.text)),
                Clause::OrderBy => {
                    let (order_by, order_fields) = OrderByParser::parse(&segment.text);
                    query.order_by.extend(order_by);
                    query.order_fields.extend(order_fields);
                }
                Clause::Limit => {
                    let (limit, offset) = LimitAndOffsetParser::parse_limit(&segment.text)?;
                    query.limit = Some(limit);
                    if offset.is_some() {
                        query.offset = offset;
                    }
                }
                Clause::Offset => query.offset = Some(LimitAndOffsetParser::parse_offset(&segment.text)?),
            }
        }

        SelectListParser::new(&self.comparers, self.schema).parse(&select_text, &mut query)?;

        debug!(
            main_table = %query.main_table_alias,
            joins = query.joins.len(),
            fields = query.select.len(),
            "Parsed query"
        );

        Ok(query)
    }

    /// Returns the SELECT list text and the text after the last top-level FROM.
    fn split_select(&self, text: &str) -> Result<(String, String), InvalidQueryError> {
        let mut parser = QueryParser::new(text);
        let tokens = parser.scan_keywords(&[&self.comparers.select, &self.comparers.from]);

        let Some(select) = tokens.iter().find(|token| token.index == 0 && token.depth == 0) else {
            return InvalidQueryError::MissingSelect.err();
        };

        let candidates: Vec<_> = tokens
            .iter()
            .filter(|token| token.index == 1 && token.start >= select.end)
            .collect();
        let from = candidates
            .iter()
            .rev()
            .find(|token| token.depth == 0)
            .or_else(|| candidates.last());
        let Some(from) = from else {
            return InvalidQueryError::MissingFrom.err();
        };

        Ok((
            parser.text_from_range(select.end, from.start),
            parser.text_from_range(from.end, parser.length),
        ))
    }

    /// Capturing split of the text after FROM on the clause keywords.
    fn split_clauses(&self, text: &str) -> Vec<ClauseSegment> {
        let clauses = self.comparers.clauses();
        let comparers: Vec<_> = clauses.iter().map(|(_, comparer)| *comparer).collect();

        let mut parser = QueryParser::new(text);
        let tokens: Vec<_> = parser
            .scan_keywords(&comparers)
            .into_iter()
            .filter(|token| token.depth == 0)
            .collect();

        let mut segments = vec![];
        let mut clause = Clause::From;
        let mut pivot = 0;
        for token in tokens {
            segments.push(ClauseSegment {
                clause,
                text: parser.text_from_range(pivot, token.start).trim().to_string(),
            });
            clause = clauses[token.index].0;
            pivot = token.end;
        }
        segments.push(ClauseSegment {
            clause,
            text: parser.text_from_range(pivot, parser.length).trim().to_string(),
        });

        segments
    }

    fn parse_from(&self, text: &str, query: &mut ParsedQuery) -> Result<(), InvalidQueryError> {
        let mut tables = QueryParser::split_top_level(text, ',')
            .into_iter()
            .map(|table| TableRef::parse(&table, &self.comparers));

        let Some(main) = tables.next() else {
            return InvalidQueryError::EmptyFrom.err();
        };
        query.set_main_table(main);

        for table in tables {
            query.add_join(JoinSpec::new(JoinType::Inner, &table));
        }

        Ok(())
    }
}

impl TryFrom<&str> for ParsedQuery {
    type Error = InvalidQueryError;

    /// Parses without schema knowledge; wildcards expand to nothing.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let schema = crate::database::StaticCatalog::new();
        SqlParser::new(&schema).parse(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        database::StaticCatalog,
        error::InvalidQueryError,
        parser::{ast::{JoinType, OrderField, ParsedQuery}, prepare_query_string, SqlParser},
    };

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_json(json!({
            "tables": {
                "tt_content": {"fields": {"uid": null, "pid": null, "header": null}},
                "pages": {"fields": {"uid": null, "pid": null, "title": null}}
            }
        }))
        .expect("Failed to build catalog")
    }

    fn parse(text: &str) -> Result<ParsedQuery, InvalidQueryError> {
        SqlParser::new(&catalog()).parse(text)
    }

    #[test]
    pub fn test_prepare_query_string() {
        let text = "# list content\nSELECT `uid`, header\n\n  FROM tt_content ;\n-- done";
        assert_eq!(prepare_query_string(text), "SELECT uid, header FROM tt_content");
    }

    #[test]
    pub fn test_parse_simple_query() {
        let query = parse("SELECT uid, header FROM tt_content").expect("Failed to parse query");

        assert!(!query.distinct);
        assert_eq!(query.from.table, "tt_content");
        assert_eq!(query.main_table_alias, "tt_content");
        assert_eq!(query.select.len(), 2);
        assert!(query.joins.is_empty());
        assert!(query.r#where.is_empty());
    }

    #[test]
    pub fn test_parse_keywords_case_insensitive() {
        let query = parse("select uid from tt_content where pid = 1 order by header desc").expect("Failed to parse query");

        assert_eq!(query.r#where, vec!["pid = 1"]);
        assert_eq!(query.order_fields, vec![OrderField::new("header", "DESC")]);
    }

    #[test]
    pub fn test_parse_last_from() {
        let query = parse("SELECT EXTRACT(YEAR FROM tstamp) AS year FROM tt_content").expect("Failed to parse query");

        assert_eq!(query.from.table, "tt_content");
        assert_eq!(query.select[0].field, "EXTRACT(YEAR FROM tstamp)");
    }

    #[test]
    pub fn test_parse_full_query() {
        let query = parse(
            "SELECT tt_content.uid, p.title FROM tt_content INNER JOIN pages AS p ON p.uid = tt_content.pid \
             LEFT JOIN tt_content AS c ON c.pid = p.uid MAX 5 \
             WHERE tt_content.header != '' GROUP BY p.uid, tt_content.uid ORDER BY p.title, tt_content.uid DESC LIMIT 10",
        )
        .expect("Failed to parse query");

        assert_eq!(query.joins.len(), 2);
        assert_eq!(query.joins["p"].join_type, JoinType::Inner);
        assert_eq!(query.joins["p"].on_clause, "p.uid = tt_content.pid");
        assert_eq!(query.joins["c"].join_type, JoinType::Left);
        assert_eq!(query.joins["c"].row_limit, Some(5));
        assert_eq!(query.true_table("c"), Some("tt_content"));
        assert_eq!(query.r#where, vec!["tt_content.header != ''"]);
        assert_eq!(query.group_by, vec!["p.uid", "tt_content.uid"]);
        assert_eq!(query.order_by, vec!["p.title", "tt_content.uid DESC"]);
        assert_eq!(query.order_fields[1], OrderField::new("tt_content.uid", "DESC"));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.select[1].true_table, "pages");
    }

    #[test]
    pub fn test_parse_comma_tables_are_inner_joins() {
        let query = parse("SELECT a.x FROM t1 AS a, t2 AS b WHERE b.id=a.id").expect("Failed to parse query");

        assert_eq!(query.main_table_alias, "a");
        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins["b"].join_type, JoinType::Inner);
        assert_eq!(query.joins["b"].table, "t2");
        assert_eq!(query.joins["b"].on_clause, "");
        assert!(query.subtable_aliases.contains("b"));
        assert_eq!(query.r#where, vec!["b.id=a.id"]);
    }

    #[test]
    pub fn test_parse_limit_forms() {
        let first = parse("SELECT uid FROM tt_content LIMIT 10,20").expect("Failed to parse query");
        let second = parse("SELECT uid FROM tt_content LIMIT 20 OFFSET 10").expect("Failed to parse query");

        assert_eq!((first.limit, first.offset), (Some(20), Some(10)));
        assert_eq!((second.limit, second.offset), (Some(20), Some(10)));
    }

    #[test]
    pub fn test_parse_where_keyword_inside_literal() {
        let query = parse("SELECT uid FROM tt_content WHERE header = 'ORDER BY me' LIMIT 1").expect("Failed to parse query");

        assert_eq!(query.r#where, vec!["header = 'ORDER BY me'"]);
        assert!(query.order_by.is_empty());
    }

    #[test]
    pub fn test_parse_errors() {
        let cases = [
            ("uid FROM tt_content", InvalidQueryError::MissingSelect),
            ("SELECT uid", InvalidQueryError::MissingFrom),
            ("SELECT uid FROM ", InvalidQueryError::EmptyFrom),
            ("SELECT uid FROM WHERE uid = 1", InvalidQueryError::EmptyFrom),
            ("SELECT FROM tt_content", InvalidQueryError::EmptySelect),
        ];
        for (text, expected) in cases {
            match parse(text) {
                Err(error) => assert_eq!(error, expected, "{text}"),
                Ok(_) => panic!("{text} should not parse"),
            }
        }
    }

    #[test]
    pub fn test_parse_unbalanced_parentheses() {
        match parse("SELECT FN(a,b FROM t") {
            Err(error) => assert_eq!(error.code(), 1272954424),
            Ok(_) => panic!(),
        }

        let query = parse("SELECT FN(a,b) FROM t").expect("Failed to parse query");
        assert_eq!(query.select.len(), 1);
        assert!(query.select[0].is_function_call);
    }

    #[test]
    pub fn test_try_from() {
        let query = ParsedQuery::try_from("SELECT * FROM pages").expect("Failed to parse query");
        assert!(query.select.is_empty());
        assert!(query.has_base_fields.contains_key("pages"));
    }
}
