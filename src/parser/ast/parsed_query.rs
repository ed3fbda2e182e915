use indexmap::{IndexMap, IndexSet};

use crate::parser::ast::{JoinSpec, OrderField, SelectField, TableRef};

/// Whether `uid` and `pid` are already part of the SELECT list for a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseFields {
    pub uid: bool,
    pub pid: bool,
}

/// Structured form of a SELECT statement.
///
/// Created by [`crate::parser::SqlParser`], enriched by [`crate::builder::QueryBuilder`]
/// and turned back into SQL by [`crate::serializer::QuerySerializer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub distinct: bool,
    /// Fields as read from the SELECT list.
    pub select: Vec<SelectField>,
    /// Rendered `expression AS alias` entries, filled in by analysis.
    /// When empty, the serializer renders `select` directly.
    pub select_list: Vec<String>,
    pub from: TableRef,
    /// Joins keyed by alias, in insertion order.
    pub joins: IndexMap<String, JoinSpec>,
    /// Fragments AND-ed together, each one parenthesized on output.
    pub r#where: Vec<String>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub main_table_alias: String,
    pub alias_to_true_table: IndexMap<String, String>,
    pub subtable_aliases: IndexSet<String>,
    pub has_base_fields: IndexMap<String, BaseFields>,
    pub order_fields: Vec<OrderField>,
    /// table alias -> field -> explicit SELECT alias
    pub field_aliases: IndexMap<String, IndexMap<String, String>>,
    /// SELECT alias -> `alias.field` or raw function text
    pub field_alias_mappings: IndexMap<String, String>,
    /// `alias.fulltext.index` -> SQL that replaces it in the SELECT list
    pub fulltext_placeholders: IndexMap<String, String>,
}

impl ParsedQuery {
    pub fn set_main_table(&mut self, table: TableRef) {
        self.main_table_alias = table.alias.clone();
        self.alias_to_true_table.insert(table.alias.clone(), table.table.clone());
        self.from = table;
    }

    pub fn add_join(&mut self, join: JoinSpec) {
        self.alias_to_true_table.insert(join.alias.clone(), join.table.clone());
        self.subtable_aliases.insert(join.alias.clone());
        self.joins.insert(join.alias.clone(), join);
    }

    pub fn true_table(&self, alias: &str) -> Option<&str> {
        self.alias_to_true_table.get(alias).map(|table| table.as_str())
    }

    pub fn main_true_table(&self) -> &str {
        self.true_table(&self.main_table_alias).unwrap_or(&self.from.table)
    }

    pub fn is_main_alias(&self, alias: &str) -> bool {
        self.main_table_alias == alias
    }

    pub fn base_fields_mut(&mut self, alias: &str) -> &mut BaseFields {
        self.has_base_fields.entry(alias.to_string()).or_default()
    }

    pub fn field_alias(&self, table_alias: &str, field: &str) -> Option<&str> {
        self.field_aliases
            .get(table_alias)
            .and_then(|fields| fields.get(field))
            .map(|alias| alias.as_str())
    }

    /// Appends a WHERE fragment. Blank fragments are ignored.
    pub fn add_where_clause(&mut self, clause: &str) {
        let clause = clause.trim();
        if !clause.is_empty() {
            self.r#where.push(clause.to_string());
        }
    }

    /// Appends a parenthesized condition to the ON clause of a join.
    pub fn add_on_clause(&mut self, alias: &str, clause: &str) {
        let clause = clause.trim();
        if clause.is_empty() {
            return;
        }
        if let Some(join) = self.joins.get_mut(alias) {
            if !join.on_clause.is_empty() {
                join.on_clause.push_str(" AND ");
            }
            join.on_clause.push_str(&format!("({clause})"));
        }
    }
}
