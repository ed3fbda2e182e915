use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    builder::QueryBuilder,
    condition::{Condition, ConditionCompiler, ConditionTarget},
    fulltext::FulltextParser,
    parser::ast::{OrderEngine, OrderField},
};

/// Operator combining the filter groups that apply to the same table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// Conditions on one field. They are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterGroup {
    /// Table name or alias; empty means the main table.
    pub table: String,
    pub field: String,
    pub conditions: Vec<Condition>,
    /// Attach to the main WHERE clause even when the field belongs to a joined table.
    pub main: bool,
    /// Informational only, never applied.
    pub void: bool,
    /// Label used in diagnostics.
    #[serde(rename = "string")]
    pub label: Option<String>,
}

impl FilterGroup {
    pub fn new(table: &str, field: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn on_main(mut self) -> Self {
        self.main = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSpec {
    pub table: String,
    pub field: String,
    /// `ASC`, `DESC` or `RAND`, as given.
    pub order: String,
    pub engine: Option<OrderEngine>,
}

impl OrderSpec {
    pub fn new(table: &str, field: &str, order: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            order: order.to_string(),
            engine: None,
        }
    }

    pub fn random() -> Self {
        Self::new("", "", "RAND")
    }

    pub fn with_engine(mut self, engine: OrderEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn is_random(&self) -> bool {
        self.order.eq_ignore_ascii_case("RAND")
    }
}

/// Filter structure handed over by an external filter builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub filters: Vec<FilterGroup>,
    #[serde(alias = "logicalOperator")]
    pub logical_operator: LogicalOperator,
    #[serde(alias = "orderby")]
    pub order_by: Vec<OrderSpec>,
    /// Always appended to the main WHERE clause.
    #[serde(alias = "rawSQL")]
    pub raw_sql: String,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json_value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json_value)
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.filters.push(group);
        self
    }

    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.logical_operator = operator;
        self
    }

    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn with_raw_sql(mut self, raw_sql: &str) -> Self {
        self.raw_sql = raw_sql.to_string();
        self
    }
}

impl<'a> QueryBuilder<'a> {
    /// Applies a filter structure: conditions, raw SQL and ordering.
    ///
    /// Groups targeting an unknown table and conditions that cannot be compiled
    /// are dropped with a diagnostic; the rest of the filter still applies.
    pub fn add_filter(&mut self, filter: &FilterSpec) {
        let schema = self.schema;
        let fulltext = FulltextParser::new(schema, self.settings.fulltext_minimum_word_length);
        let compiler = ConditionCompiler::new(&fulltext);

        // target alias -> parenthesized group conditions
        let mut complete_filters: IndexMap<String, Vec<String>> = IndexMap::new();

        for (index, group) in filter.filters.iter().enumerate() {
            if group.void {
                continue;
            }

            let table_name = if group.table.is_empty() {
                self.query.main_table_alias.clone()
            } else {
                group.table.clone()
            };
            let component = match &group.label {
                Some(label) if !label.is_empty() => format!("Filter - {label}"),
                _ => format!("Filter - {index}"),
            };
            let Ok(alias) = self.match_alias_or_table_name(&table_name, &component) else {
                self.diagnostics
                    .notice("Condition ignored", "The condition did not apply to a table used in the query.");
                continue;
            };
            let table = self.query.true_table(&alias).unwrap_or(&alias).to_string();

            let full_field = self
                .query
                .field_alias_mappings
                .get(&group.field)
                .cloned()
                .unwrap_or_else(|| format!("{alias}.{}", group.field));
            let target = ConditionTarget::new(&full_field, &table, &alias);

            let mut condition = String::new();
            for item in group.conditions.iter().filter(|item| !item.value.is_all()) {
                let fragment = match compiler.compile(&target, item) {
                    Ok(fragment) => fragment,
                    Err(error) => {
                        self.diagnostics.warning("Condition ignored", error.to_string());
                        continue;
                    }
                };
                if fragment.is_empty() {
                    continue;
                }
                if !condition.is_empty() {
                    condition.push_str(" AND ");
                }
                condition.push_str(&format!("({fragment})"));

                if item.operator.is_fulltext()
                    && let Some(index) = full_field.split('.').nth(2)
                    && let Some(placeholder) = self
                        .query
                        .fulltext_placeholders
                        .get_mut(&format!("{alias}.fulltext.{index}"))
                {
                    *placeholder = condition.clone();
                }
            }
            if condition.is_empty() {
                continue;
            }

            let application_alias = if group.main {
                self.query.main_table_alias.clone()
            } else {
                alias
            };
            complete_filters
                .entry(application_alias)
                .or_default()
                .push(format!("({condition})"));
        }

        let operator = format!(" {} ", filter.logical_operator);
        for (alias, conditions) in complete_filters {
            self.attach_condition(&alias, &conditions.join(&operator));
        }

        self.query.add_where_clause(&filter.raw_sql);

        for order in filter.order_by.iter() {
            self.add_filter_ordering(order);
        }
    }

    fn add_filter_ordering(&mut self, order: &OrderSpec) {
        if order.is_random() {
            self.query.order_by.push("RAND()".to_string());
            return;
        }

        let table_name = if order.table.is_empty() {
            self.query.main_table_alias.clone()
        } else {
            order.table.clone()
        };
        let component = format!("Order clause - {table_name} - {} - {}", order.field, order.order);
        let Ok(alias) = self.match_alias_or_table_name(&table_name, &component) else {
            self.diagnostics
                .notice("Ordering ignored", "The ordering clause did not apply to a table used in the query.");
            return;
        };

        let complete_field = format!("{alias}.{}", order.field);
        self.query.order_by.push(format!("{complete_field} {}", order.order));
        self.query.order_fields.push(OrderField {
            field: complete_field,
            order: order.order.clone(),
            engine: order.engine,
            alias: None,
        });
    }

    /// Restricts the query to a list of records, given as `uid` or `table_uid` items.
    ///
    /// Items without a table apply to the main table.
    pub fn add_id_list(&mut self, id_list: &str) {
        let mut ids_per_alias: IndexMap<String, Vec<u64>> = IndexMap::new();

        for item in id_list.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (table, uid) = match item.rsplit_once('_') {
                Some((table, uid)) => (Some(table), uid),
                None => (None, item),
            };
            let Ok(uid) = uid.parse::<u64>() else {
                self.diagnostics
                    .notice("Id ignored", format!("An item from the id list is not a valid uid: {item}"));
                continue;
            };

            let alias = match table {
                None => self.query.main_table_alias.clone(),
                Some(table) => match self.match_alias_or_table_name(table, &format!("Id list - {item}")) {
                    Ok(alias) => alias,
                    Err(_) => {
                        self.diagnostics.notice(
                            "Id ignored",
                            format!("An item from the id list did not apply, because table {table} is not used in the query."),
                        );
                        continue;
                    }
                },
            };
            ids_per_alias.entry(alias).or_default().push(uid);
        }

        for (alias, uids) in ids_per_alias {
            let uids = uids.iter().map(u64::to_string).collect::<Vec<String>>().join(",");
            self.attach_condition(&alias, &format!("{alias}.uid IN ({uids})"));
        }
    }
}
