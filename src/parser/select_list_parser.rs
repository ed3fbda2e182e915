use tracing::warn;

use crate::{
    database::SchemaProvider,
    error::InvalidQueryError,
    parser::{ast::{ParsedQuery, SelectField}, QueryComparers, QueryParser},
};

const FULLTEXT_PREFIXES: [&str; 2] = ["fulltext:", "fulltext_natural:"];

/// One top-level segment of the SELECT list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    pub expression: String,
    pub field_alias: Option<String>,
    pub has_function_call: bool,
    pub has_wildcard: bool,
}

impl FieldSpec {
    fn from_segment(parser: &QueryParser, pivot: usize, alias_at: Option<(usize, usize)>, has_function_call: bool, has_star: bool) -> Self {
        let (expression, field_alias) = match alias_at {
            Some((start, end)) => (
                parser.text_from_range(pivot, start).trim().to_string(),
                Some(parser.text_from_pivot(end).trim().to_string()).filter(|alias| !alias.is_empty()),
            ),
            None => (parser.text_from_pivot(pivot).trim().to_string(), None),
        };
        let has_wildcard = has_star && !has_function_call && (expression == "*" || expression.ends_with(".*"));

        Self { expression, field_alias, has_function_call, has_wildcard }
    }
}

pub struct SelectListParser<'a> {
    comparers: &'a QueryComparers,
    schema: &'a dyn SchemaProvider,
    function_count: usize,
}

impl<'a> SelectListParser<'a> {
    pub fn new(comparers: &'a QueryComparers, schema: &'a dyn SchemaProvider) -> Self {
        Self { comparers, schema, function_count: 0 }
    }

    /// Parses the SELECT list into `query`. The FROM clause must already be parsed.
    pub fn parse(&mut self, text: &str, query: &mut ParsedQuery) -> Result<(), InvalidQueryError> {
        let mut text = text.trim();
        if let Some(length) = self.comparers.distinct.matches_at(text, 0) {
            query.distinct = true;
            text = text[self.byte_offset(text, length)..].trim();
        }

        if text.is_empty() {
            return InvalidQueryError::EmptySelect.err();
        }

        for spec in self.split(text)? {
            self.resolve(spec, query);
        }

        Ok(())
    }

    fn byte_offset(&self, text: &str, chars: usize) -> usize {
        text.char_indices().nth(chars).map(|(index, _)| index).unwrap_or(text.len())
    }

    /// Scans the list, splitting on top-level commas and noting for every
    /// segment its function calls, wildcard and top-level `AS`.
    pub fn split(&self, text: &str) -> Result<Vec<FieldSpec>, InvalidQueryError> {
        let mut parser = QueryParser::new(text);
        let mut specs = vec![];
        let mut pivot = 0;
        let mut alias_at = None;
        let mut has_function_call = false;
        let mut has_star = false;

        while !parser.eof() {
            if parser.is_top_level() {
                match parser.current() {
                    ',' => {
                        specs.push(FieldSpec::from_segment(&parser, pivot, alias_at, has_function_call, has_star));
                        parser.jump(1);
                        pivot = parser.position;
                        alias_at = None;
                        has_function_call = false;
                        has_star = false;
                        continue;
                    }
                    '*' => has_star = true,
                    _ => {
                        if let Some(length) = self.comparers.alias.compare(&parser) {
                            alias_at = Some((parser.position, parser.position + length));
                            parser.jump(length);
                            continue;
                        }
                    }
                }
            }
            if !parser.is_quoted() && parser.current() == '(' {
                has_function_call = true;
            }
            parser.next();
        }

        if parser.is_quoted() {
            return InvalidQueryError::UnterminatedLiteral { position: parser.quote_start }.err();
        }
        if let Some(position) = parser.stray_close {
            return InvalidQueryError::UnbalancedParentheses { position }.err();
        }
        if parser.depth > 0 {
            return InvalidQueryError::UnbalancedParentheses { position: parser.length }.err();
        }

        specs.push(FieldSpec::from_segment(&parser, pivot, alias_at, has_function_call, has_star));
        Ok(specs.into_iter().filter(|spec| !spec.expression.is_empty()).collect())
    }

    fn resolve(&mut self, spec: FieldSpec, query: &mut ParsedQuery) {
        if spec.has_wildcard {
            self.expand_wildcard(&spec.expression, query);
            return;
        }

        let main_alias = query.main_table_alias.clone();
        let main_table = query.main_true_table().to_string();

        let mut field = if spec.has_function_call {
            self.function_count += 1;
            SelectField::column(&main_table, &main_alias, &spec.expression)
                .as_function()
                .with_alias(spec.field_alias.or_else(|| Some(format!("function_{}", self.function_count))))
        } else if let Some((alias, column)) = spec.expression.split_once('.') {
            let alias = alias.trim();
            let table = query.true_table(alias).unwrap_or(alias).to_string();
            SelectField::column(&table, alias, column.trim()).with_alias(spec.field_alias)
        } else {
            SelectField::column(&main_table, &main_alias, &spec.expression).with_alias(spec.field_alias)
        };

        if !field.is_function_call {
            self.register_fulltext(&mut field, query);
        }

        let flag_name = field.field_alias.clone().unwrap_or_else(|| field.field.clone());
        let base_fields = query.base_fields_mut(&field.table_alias);
        base_fields.uid |= flag_name == "uid";
        base_fields.pid |= flag_name == "pid";

        if let Some(field_alias) = &field.field_alias {
            query
                .field_aliases
                .entry(field.table_alias.clone())
                .or_default()
                .insert(field.field.clone(), field_alias.clone());
            query.field_alias_mappings.insert(field_alias.clone(), field.expression());
        }

        query.select.push(field);
    }

    fn register_fulltext(&self, field: &mut SelectField, query: &mut ParsedQuery) {
        let Some(index) = FULLTEXT_PREFIXES
            .iter()
            .find_map(|prefix| field.field.strip_prefix(prefix))
        else {
            return;
        };
        field.field = format!("fulltext.{}", index.trim());
        query
            .fulltext_placeholders
            .insert(format!("{}.{}", field.table_alias, field.field), "1".to_string());
    }

    fn expand_wildcard(&self, expression: &str, query: &mut ParsedQuery) {
        let alias = match expression.strip_suffix(".*") {
            Some(alias) => alias.trim().to_string(),
            None => query.main_table_alias.clone(),
        };
        let table = query.true_table(&alias).unwrap_or(&alias).to_string();

        query.base_fields_mut(&alias);
        let fields = self.schema.all_fields(&table);
        if fields.is_empty() {
            warn!(table = %table, "No known fields for wildcard expansion");
        }

        for name in fields {
            let base_fields = query.base_fields_mut(&alias);
            base_fields.uid |= name == "uid";
            base_fields.pid |= name == "pid";
            query.select.push(SelectField::column(&table, &alias, &name));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        database::{SchemaProvider, StaticCatalog},
        error::InvalidQueryError,
        parser::{ast::{BaseFields, ParsedQuery, SelectField, TableRef}, QueryComparers, SelectListParser},
    };
    use serde_json::json;

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_json(json!({
            "tables": {
                "tt_content": {"fields": {"uid": null, "pid": null, "header": null, "bodytext": null}},
                "pages": {"fields": {"uid": null, "title": null}}
            }
        }))
        .expect("Failed to build catalog")
    }

    fn query() -> ParsedQuery {
        let mut query = ParsedQuery::default();
        query.set_main_table(TableRef::new("tt_content", "tt_content"));
        query.alias_to_true_table.insert("p".into(), "pages".into());
        query
    }

    fn parse(text: &str, schema: &dyn SchemaProvider) -> Result<ParsedQuery, InvalidQueryError> {
        let comparers = QueryComparers::new();
        let mut query = query();
        SelectListParser::new(&comparers, schema).parse(text, &mut query)?;
        Ok(query)
    }

    #[test]
    pub fn test_select_plain_fields() {
        let query = parse("uid, header", &catalog()).expect("Failed to parse select list");

        assert_eq!(
            query.select,
            vec![
                SelectField::column("tt_content", "tt_content", "uid"),
                SelectField::column("tt_content", "tt_content", "header"),
            ]
        );
        assert_eq!(query.has_base_fields["tt_content"], BaseFields { uid: true, pid: false });
    }

    #[test]
    pub fn test_select_wildcard() {
        let query = parse("*", &catalog()).expect("Failed to parse select list");

        let names: Vec<&str> = query.select.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["uid", "pid", "header", "bodytext"]);
        assert_eq!(query.has_base_fields["tt_content"], BaseFields { uid: true, pid: true });
    }

    #[test]
    pub fn test_select_alias_wildcard() {
        let query = parse("p.*", &catalog()).expect("Failed to parse select list");

        assert_eq!(query.select.len(), 2);
        assert_eq!(query.select[1], SelectField::column("pages", "p", "title"));
        assert_eq!(query.has_base_fields["p"], BaseFields { uid: true, pid: false });
    }

    #[test]
    pub fn test_select_function_calls() {
        let query = parse("FROM_UNIXTIME(tstamp, '%Y') AS year, CONCAT(header, ', ', bodytext)", &catalog())
            .expect("Failed to parse select list");

        assert_eq!(query.select.len(), 2);
        assert!(query.select[0].is_function_call);
        assert_eq!(query.select[0].field, "FROM_UNIXTIME(tstamp, '%Y')");
        assert_eq!(query.select[0].field_alias.as_deref(), Some("year"));
        assert_eq!(query.select[1].field_alias.as_deref(), Some("function_2"));
        assert_eq!(query.field_alias_mappings["year"], "FROM_UNIXTIME(tstamp, '%Y')");
    }

    #[test]
    pub fn test_select_as_inside_function_is_not_an_alias() {
        let query = parse("CAST(header AS CHAR) AS label", &catalog()).expect("Failed to parse select list");

        assert_eq!(query.select[0].field, "CAST(header AS CHAR)");
        assert_eq!(query.select[0].field_alias.as_deref(), Some("label"));
    }

    #[test]
    pub fn test_select_dotted_and_aliased() {
        let query = parse("p.title AS tt_content.title, unknown.x, CType AS uid", &catalog())
            .expect("Failed to parse select list");

        assert_eq!(query.select[0].true_table, "pages");
        assert_eq!(query.select[0].table_alias, "p");
        assert_eq!(query.field_alias("p", "title"), Some("tt_content.title"));
        assert_eq!(query.field_alias_mappings["tt_content.title"], "p.title");
        assert_eq!(query.select[1].true_table, "unknown");
        assert!(query.has_base_fields["tt_content"].uid);
    }

    #[test]
    pub fn test_select_fulltext_placeholder() {
        let query = parse("uid, fulltext:SEARCH AS score", &catalog()).expect("Failed to parse select list");

        assert_eq!(query.select[1].field, "fulltext.SEARCH");
        assert_eq!(query.fulltext_placeholders["tt_content.fulltext.SEARCH"], "1");
        assert_eq!(query.field_alias_mappings["score"], "tt_content.fulltext.SEARCH");
    }

    #[test]
    pub fn test_select_distinct() {
        let query = parse("DISTINCT CType AS uid", &catalog()).expect("Failed to parse select list");

        assert!(query.distinct);
        assert_eq!(query.select[0].field, "CType");
    }

    #[test]
    pub fn test_select_count_star_is_a_function() {
        let query = parse("COUNT(*) AS total", &catalog()).expect("Failed to parse select list");

        assert_eq!(query.select.len(), 1);
        assert!(query.select[0].is_function_call);
    }

    #[test]
    pub fn test_select_unbalanced() {
        match parse("FN(a, b", &catalog()) {
            Err(InvalidQueryError::UnbalancedParentheses { .. }) => {}
            _ => panic!(),
        }
        match parse("FN(a, b))", &catalog()) {
            Err(InvalidQueryError::UnbalancedParentheses { position }) => assert_eq!(position, 8),
            _ => panic!(),
        }
    }

    #[test]
    pub fn test_select_unterminated_literal() {
        match parse("CONCAT(header, ', )", &catalog()) {
            Err(InvalidQueryError::UnterminatedLiteral { position }) => assert_eq!(position, 15),
            _ => panic!(),
        }
    }

    #[test]
    pub fn test_select_empty() {
        match parse("  DISTINCT ", &catalog()) {
            Err(InvalidQueryError::EmptySelect) => {}
            _ => panic!(),
        }
    }
}
