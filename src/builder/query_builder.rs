use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

use crate::{
    builder::{Diagnostic, Diagnostics, FieldTrueName, QueryField, QueryTable},
    database::{PolicyProvider, RequestContext, SchemaProvider, Settings},
    error::InvalidQueryError,
    logging::build_span,
    parser::{
        ast::{JoinType, OrderField, ParsedQuery},
        prepare_query_string, SqlParser,
    },
    serializer::QuerySerializer,
};

const BASE_FIELDS: [&str; 2] = ["uid", "pid"];

/// Result of [`QueryBuilder::check_query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCheck {
    pub query: String,
    /// The same query restricted to one row, safe to run for validation.
    pub validation_query: String,
    pub warning: String,
}

/// Parses an editor query and rewrites it with the platform conditions.
///
/// One builder handles one query. The calls are expected in this order:
/// [`parse_query`](Self::parse_query), [`add_typo3_mechanisms`](Self::add_typo3_mechanisms),
/// then any number of [`add_filter`](Self::add_filter) and [`add_id_list`](Self::add_id_list),
/// and finally [`build_query`](Self::build_query).
pub struct QueryBuilder<'a> {
    pub(crate) schema: &'a dyn SchemaProvider,
    pub(crate) policy: &'a dyn PolicyProvider,
    pub(crate) context: RequestContext,
    pub(crate) settings: Settings,
    pub(crate) query: ParsedQuery,
    /// table alias -> selected fields
    pub(crate) query_fields: IndexMap<String, QueryTable>,
    /// final SELECT alias -> origin
    pub(crate) field_true_names: IndexMap<String, FieldTrueName>,
    /// true table -> overlays handled
    pub(crate) do_overlays: IndexMap<String, bool>,
    pub(crate) do_versioning: IndexMap<String, bool>,
    pub(crate) process_order_by: bool,
    /// requested name -> alias, see `match_alias_or_table_name`
    pub(crate) table_matches: IndexMap<String, String>,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(
        schema: &'a dyn SchemaProvider,
        policy: &'a dyn PolicyProvider,
        context: RequestContext,
        settings: Settings,
    ) -> Self {
        Self {
            schema,
            policy,
            context,
            settings,
            query: ParsedQuery::default(),
            query_fields: IndexMap::new(),
            field_true_names: IndexMap::new(),
            do_overlays: IndexMap::new(),
            do_versioning: IndexMap::new(),
            process_order_by: true,
            table_matches: IndexMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Parses `text` and prepares the SELECT list.
    ///
    /// Returns a warning listing duplicate fields, or an empty string.
    pub fn parse_query(&mut self, text: &str) -> Result<String, InvalidQueryError> {
        let text = prepare_query_string(text);
        let query = SqlParser::new(self.schema).parse(&text)?;

        let span = build_span(&query.main_table_alias);
        let _guard = span.enter();

        self.reset(query);
        self.analyze();

        if self.query.distinct {
            if !self.check_uid_for_distinct_usage() {
                return InvalidQueryError::MissingUid.err();
            }
        } else {
            self.add_base_fields();
        }

        let duplicates = self.check_for_duplicate_fields();
        if duplicates.is_empty() {
            return Ok(String::new());
        }
        let warning = format!("Duplicate fields in query: {}", duplicates.join(" / "));
        self.diagnostics.warning("Duplicate fields", warning.clone());
        Ok(warning)
    }

    fn reset(&mut self, query: ParsedQuery) {
        self.query = query;
        self.query_fields.clear();
        self.field_true_names.clear();
        self.do_overlays.clear();
        self.do_versioning.clear();
        self.table_matches.clear();
        self.process_order_by = true;
        self.diagnostics.clear();
    }

    /// Builds the final SELECT list and the registry of field origins.
    ///
    /// Main table fields keep their alias. Fields of joined tables are always
    /// aliased as `table$field`. An alias containing a dot, like `foo.bar AS hey.you`,
    /// moves the field to another table namespace as `hey$you`.
    pub fn analyze(&mut self) {
        let main_alias = self.query.main_table_alias.clone();
        let mut select_list = Vec::with_capacity(self.query.select.len());

        for field in self.query.select.iter() {
            self.query_fields
                .entry(field.table_alias.clone())
                .or_insert_with(|| QueryTable::new(&field.true_table, &field.table_alias))
                .fields
                .push(QueryField {
                    name: field.field.clone(),
                    is_function: field.is_function_call,
                });

            let mut full_field = field.expression();
            let mut mapped: Option<(String, String)> = None;
            let is_main = field.table_alias == main_alias;

            let the_alias = match (&field.field_alias, is_main) {
                (None, true) => field.field.clone(),
                (None, false) => format!("{}${}", field.table_alias, field.field),
                (Some(alias), _) => match alias.split_once('.') {
                    Some((table, column)) => {
                        mapped = Some((table.to_string(), column.to_string()));
                        format!("{table}${column}")
                    }
                    None if is_main => {
                        mapped = Some((field.table_alias.clone(), alias.clone()));
                        alias.clone()
                    }
                    None => format!("{}${}", field.table_alias, alias),
                },
            };
            if !is_main || field.field_alias.is_some() {
                full_field = format!("{full_field} AS {the_alias}");
            }

            let true_name = FieldTrueName::new(&field.true_table, &field.table_alias, &field.field);
            let true_name = match mapped {
                Some((table, column)) => true_name.mapped_to(&table, &column),
                None => true_name,
            };
            self.field_true_names.insert(the_alias, true_name);
            select_list.push(full_field);
        }

        self.query.select_list = select_list;
    }

    /// Adds `uid` and `pid` for every table that lacks them and has them in its schema.
    pub fn add_base_fields(&mut self) {
        let flags: Vec<(String, bool, bool)> = self
            .query
            .has_base_fields
            .iter()
            .map(|(alias, flags)| (alias.clone(), flags.uid, flags.pid))
            .collect();

        for (alias, has_uid, has_pid) in flags {
            let table = self.query.true_table(&alias).unwrap_or(&alias).to_string();
            let fields = self.schema.all_fields(&table);
            for (base_field, present) in BASE_FIELDS.iter().zip([has_uid, has_pid]) {
                if !present && fields.iter().any(|field| field == base_field) {
                    self.add_extra_field(base_field, &alias, &table);
                }
            }
        }
    }

    /// Appends a column to the SELECT list and registers it everywhere a selected
    /// field is tracked.
    pub(crate) fn add_extra_field(&mut self, field: &str, table_alias: &str, table: &str) {
        let field_alias = if self.query.is_main_alias(table_alias) {
            field.to_string()
        } else {
            format!("{table_alias}${field}")
        };
        self.push_select_entry(field, table_alias, table, &field_alias);
    }

    pub(crate) fn push_select_entry(&mut self, field: &str, table_alias: &str, table: &str, field_alias: &str) {
        let expression = format!("{table_alias}.{field}");
        if field == field_alias {
            self.query.select_list.push(expression);
        } else {
            self.query.select_list.push(format!("{expression} AS {field_alias}"));
        }

        self.query_fields
            .entry(table_alias.to_string())
            .or_insert_with(|| QueryTable::new(table, table_alias))
            .fields
            .push(QueryField {
                name: field.to_string(),
                is_function: false,
            });
        self.field_true_names
            .insert(field_alias.to_string(), FieldTrueName::new(table, table_alias, field));
    }

    /// With DISTINCT the caller must select a field mapped to `uid` on the main table,
    /// either as `uid` or as `alias$uid`.
    fn check_uid_for_distinct_usage(&self) -> bool {
        let main_alias = &self.query.main_table_alias;
        let main_table = self.query.main_true_table();

        let mut keys = vec!["uid".to_string(), format!("{main_alias}$uid")];
        keys.extend(
            self.query
                .alias_to_true_table
                .iter()
                .filter(|(_, table)| table.as_str() == main_table)
                .map(|(alias, _)| format!("{alias}$uid")),
        );

        keys.iter().any(|key| {
            self.field_true_names
                .get(key)
                .is_some_and(|true_name| true_name.mapping.field == "uid")
        })
    }

    /// Lists every field selected more than once from the same table.
    fn check_for_duplicate_fields(&self) -> Vec<String> {
        let mut per_table: IndexMap<&str, IndexMap<&str, Vec<&str>>> = IndexMap::new();
        for (alias, true_name) in self.field_true_names.iter() {
            per_table
                .entry(true_name.table_alias.as_str())
                .or_default()
                .entry(true_name.field.as_str())
                .or_default()
                .push(alias.as_str());
        }

        per_table
            .iter()
            .flat_map(|(table, fields)| {
                fields
                    .iter()
                    .filter(|(_, aliases)| aliases.len() > 1)
                    .map(move |(field, aliases)| {
                        format!("In table {table}, duplicates for {field} as: {}", aliases.join(","))
                    })
            })
            .collect()
    }

    /// Assembles the final SQL.
    pub fn build_query(&mut self) -> String {
        self.preprocess_order_by_fields();
        let sql = QuerySerializer::serialize(&self.query, self.process_order_by);
        debug!(sql = %sql, process_order_by = self.process_order_by, "Built query");
        sql
    }

    /// Validation flow of the query editor: parses, builds, then builds again
    /// restricted to a single row. Nothing is executed.
    pub fn check_query(&mut self, text: &str) -> Result<QueryCheck, InvalidQueryError> {
        let warning = self.parse_query(text)?;
        let query = self.build_query();
        self.set_limit(1);
        let validation_query = self.build_query();

        Ok(QueryCheck {
            query,
            validation_query,
            warning,
        })
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.query.limit = Some(limit);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.query.offset = Some(offset);
    }

    pub(crate) fn attach_condition(&mut self, table_alias: &str, condition: &str) {
        if self.query.is_main_alias(table_alias) {
            self.query.add_where_clause(condition);
        } else if self.query.subtable_aliases.contains(table_alias) {
            self.query.add_on_clause(table_alias, condition);
        }
    }

    pub fn query(&self) -> &ParsedQuery {
        &self.query
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    pub fn main_table_name(&self) -> &str {
        &self.query.main_table_alias
    }

    pub fn subtables_names(&self) -> &IndexSet<String> {
        &self.query.subtable_aliases
    }

    pub fn true_table_name(&self, alias: &str) -> Option<&str> {
        self.query.true_table(alias)
    }

    /// Origin of a field of the final SELECT list, given its alias there (e.g. `pages$title`).
    pub fn true_field_name(&self, alias: &str) -> Option<FieldTrueName> {
        let mut true_name = self.field_true_names.get(alias)?.clone();
        if let Some(field_alias) = self.query.field_alias(&true_name.table_alias, &true_name.field) {
            let field_alias = match field_alias.split_once('.') {
                Some((_, field)) => field,
                None => field_alias,
            };
            true_name.mapping.alias = Some(field_alias.to_string());
        }
        Some(true_name)
    }

    pub fn order_by_fields(&self) -> &[OrderField] {
        &self.query.order_fields
    }

    /// Whether ORDER BY is part of the SQL. When false the caller sorts the rows.
    pub fn is_sql_used_for_ordering(&self) -> bool {
        self.process_order_by
    }

    pub fn has_ordering(&self) -> bool {
        !self.query.order_fields.is_empty()
    }

    pub fn must_handle_language_overlay(&self, table: &str) -> bool {
        self.do_overlays.get(table).copied().unwrap_or(false)
    }

    pub fn must_handle_versioning_overlay(&self, table: &str) -> bool {
        self.do_versioning.get(table).copied().unwrap_or(false)
    }

    /// Alias of the first joined table that has selected fields, if that join is an INNER JOIN.
    pub fn has_inner_join_on_first_subtable(&self) -> Option<&str> {
        self.query
            .joins
            .values()
            .find(|join| self.query_fields.contains_key(&join.alias))
            .filter(|join| join.join_type == JoinType::Inner)
            .map(|join| join.alias.as_str())
    }

    /// Row limit set with `MAX n` on the join of `alias`.
    pub fn sub_table_limit(&self, alias: &str) -> Option<u64> {
        self.query.joins.get(alias).and_then(|join| join.row_limit)
    }
}
