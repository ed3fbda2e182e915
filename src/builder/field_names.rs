use serde::Serialize;

/// Where the value of a SELECT entry ends up in the result structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub table: String,
    pub field: String,
    /// Explicit alias given in the query, without any table part.
    pub alias: Option<String>,
}

/// Origin of a SELECT entry, keyed by the alias it has in the final query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldTrueName {
    pub true_table: String,
    pub table_alias: String,
    pub field: String,
    pub mapping: FieldMapping,
}

impl FieldTrueName {
    pub fn new(true_table: &str, table_alias: &str, field: &str) -> Self {
        Self {
            true_table: true_table.to_string(),
            table_alias: table_alias.to_string(),
            field: field.to_string(),
            mapping: FieldMapping {
                table: table_alias.to_string(),
                field: field.to_string(),
                alias: None,
            },
        }
    }

    pub fn mapped_to(mut self, table: &str, field: &str) -> Self {
        self.mapping.table = table.to_string();
        self.mapping.field = field.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryField {
    pub name: String,
    pub is_function: bool,
}

/// Fields selected from one table of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTable {
    pub true_table: String,
    pub alias: String,
    pub fields: Vec<QueryField>,
}

impl QueryTable {
    pub fn new(true_table: &str, alias: &str) -> Self {
        Self {
            true_table: true_table.to_string(),
            alias: alias.to_string(),
            fields: vec![],
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    /// Names of the selected columns, function calls excluded.
    pub fn column_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| !field.is_function)
            .map(|field| field.name.clone())
            .collect()
    }
}
