use std::fmt::Display;

/// One entry of the SELECT list as read by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectField {
    pub true_table: String,
    pub table_alias: String,
    /// Column name, or the whole expression text for function calls.
    pub field: String,
    pub field_alias: Option<String>,
    pub is_function_call: bool,
}

impl SelectField {
    pub fn column(true_table: &str, table_alias: &str, field: &str) -> Self {
        Self {
            true_table: true_table.to_string(),
            table_alias: table_alias.to_string(),
            field: field.to_string(),
            field_alias: None,
            is_function_call: false,
        }
    }

    pub fn with_alias(mut self, field_alias: Option<String>) -> Self {
        self.field_alias = field_alias;
        self
    }

    pub fn as_function(mut self) -> Self {
        self.is_function_call = true;
        self
    }

    /// The expression without its alias.
    pub fn expression(&self) -> String {
        if self.is_function_call {
            self.field.clone()
        } else {
            format!("{}.{}", self.table_alias, self.field)
        }
    }
}

impl Display for SelectField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field_alias {
            Some(alias) => write!(f, "{} AS {}", self.expression(), alias),
            None => write!(f, "{}", self.expression()),
        }
    }
}
