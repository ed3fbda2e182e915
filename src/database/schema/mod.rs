use indexmap::IndexMap;

pub mod column_info;
pub use column_info::*;

pub mod table_schema;
pub use table_schema::*;

/// Structural information about tables, as known to the hosting platform.
pub trait SchemaProvider {
    /// Every column of the table, in schema order. Unknown tables yield an empty list.
    fn all_fields(&self, table: &str) -> Vec<String>;

    /// Fulltext index name -> comma-joined qualified field list (`table.a,table.b`).
    fn fulltext_indexes(&self, table: &str) -> IndexMap<String, String>;

    fn has_fulltext_index(&self, table: &str) -> bool {
        !self.fulltext_indexes(table).is_empty()
    }

    /// Form configuration of a column, `None` when the column has none.
    fn column_type_info(&self, table: &str, field: &str) -> Option<ColumnTypeInfo>;
}
