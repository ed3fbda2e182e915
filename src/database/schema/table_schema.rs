use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::database::ColumnTypeInfo;

/// Control settings of a table: which columns drive visibility, translation and versioning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCtrl {
    pub delete: Option<String>,
    pub disabled: Option<String>,
    pub starttime: Option<String>,
    pub endtime: Option<String>,
    pub fe_group: Option<String>,
    pub language_field: Option<String>,
    pub trans_orig_pointer_field: Option<String>,
    /// Table holding the translations when they are not stored in the table itself.
    pub trans_foreign_table: Option<String>,
    pub versioning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    /// Columns in schema order. Columns without form configuration map to `null`.
    pub fields: IndexMap<String, Option<ColumnTypeInfo>>,
    /// Index name -> indexed columns.
    pub fulltext_indexes: IndexMap<String, Vec<String>>,
    pub ctrl: TableCtrl,
}

impl TableSchema {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn qualified_index(&self, table: &str, index: &str) -> Option<String> {
        self.fulltext_indexes.get(index).map(|columns| {
            columns
                .iter()
                .map(|column| format!("{table}.{column}"))
                .collect::<Vec<String>>()
                .join(",")
        })
    }
}
