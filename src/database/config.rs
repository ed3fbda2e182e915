use std::{ffi::OsString, fs};

use serde::{Deserialize, Serialize};

use crate::{database::IgnoreMap, error::CatalogError};

/// Which enable fields are dropped from the generated conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnableFieldsMode {
    /// Enable fields are applied to every table.
    #[default]
    #[serde(alias = "0")]
    None,
    /// Enable fields are ignored altogether.
    #[serde(alias = "1")]
    All,
    /// Enable fields are ignored per class and per table, see [`Settings::ignore_map`].
    #[serde(alias = "2")]
    Partial,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableListRepr {
    Text(String),
    List(Vec<String>),
}

/// A list of table names or aliases. `*` matches every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableListRepr", into = "String")]
pub enum TableList {
    All,
    #[default]
    None,
    Tables(Vec<String>),
}

impl TableList {
    pub fn parse(text: &str) -> Self {
        let tables: Vec<String> = text
            .split(',')
            .map(|table| table.trim().to_string())
            .filter(|table| !table.is_empty())
            .collect();
        Self::from_tables(tables)
    }

    fn from_tables(tables: Vec<String>) -> Self {
        if tables.iter().any(|table| table == "*") {
            TableList::All
        } else if tables.is_empty() {
            TableList::None
        } else {
            TableList::Tables(tables)
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        match self {
            TableList::All => true,
            TableList::None => false,
            TableList::Tables(tables) => tables.iter().any(|name| name == table),
        }
    }
}

impl From<TableListRepr> for TableList {
    fn from(value: TableListRepr) -> Self {
        match value {
            TableListRepr::Text(text) => TableList::parse(&text),
            TableListRepr::List(tables) => TableList::from_tables(
                tables.into_iter().map(|table| table.trim().to_string()).filter(|t| !t.is_empty()).collect(),
            ),
        }
    }
}

impl From<TableList> for String {
    fn from(value: TableList) -> Self {
        match value {
            TableList::All => "*".to_string(),
            TableList::None => String::new(),
            TableList::Tables(tables) => tables.join(","),
        }
    }
}

/// Per-query settings record, as stored with the query definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lifetime of cached results, in seconds.
    pub cache_duration: u64,
    pub ignore_enable_fields: EnableFieldsMode,
    pub ignore_time_for_tables: TableList,
    pub ignore_disabled_for_tables: TableList,
    pub ignore_fegroup_for_tables: TableList,
    pub ignore_language_handling: bool,
    pub skip_overlays_for_tables: TableList,
    /// Tables whose workspace versions are fetched directly instead of being overlaid.
    pub get_versions_directly: TableList,
    pub fulltext_minimum_word_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_duration: 86400,
            ignore_enable_fields: EnableFieldsMode::None,
            ignore_time_for_tables: TableList::None,
            ignore_disabled_for_tables: TableList::None,
            ignore_fegroup_for_tables: TableList::None,
            ignore_language_handling: false,
            skip_overlays_for_tables: TableList::None,
            get_versions_directly: TableList::None,
            fulltext_minimum_word_length: 4,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(file_path: &OsString) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(file_path)?;
        Self::from_json(&content)
    }

    /// Durations beyond what chrono can represent are clamped to the maximum.
    pub fn cache_lifetime(&self) -> chrono::Duration {
        i64::try_from(self.cache_duration)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Enable-field classes to leave out for `table`. Only the partial mode ignores anything.
    pub fn ignore_map(&self, table: &str) -> IgnoreMap {
        if self.ignore_enable_fields != EnableFieldsMode::Partial {
            return IgnoreMap::default();
        }
        let ignore_time = self.ignore_time_for_tables.contains(table);
        IgnoreMap {
            disabled: self.ignore_disabled_for_tables.contains(table),
            starttime: ignore_time,
            endtime: ignore_time,
            fe_group: self.ignore_fegroup_for_tables.contains(table),
        }
    }
}
