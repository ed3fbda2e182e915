use crate::{builder::QueryBuilder, error::InvalidQueryError};

impl<'a> QueryBuilder<'a> {
    /// Finds the alias used in the query for `name`, which may be an alias or a table name.
    ///
    /// An exact alias wins. Otherwise the first alias pointing to a table called `name`
    /// is used, with a warning since several aliases may share that table.
    pub fn match_alias_or_table_name(&mut self, name: &str, component: &str) -> Result<String, InvalidQueryError> {
        if let Some(alias) = self.table_matches.get(name) {
            return Ok(alias.clone());
        }

        let alias = if self.query.alias_to_true_table.contains_key(name) {
            name.to_string()
        } else {
            let Some(alias) = self
                .query
                .alias_to_true_table
                .iter()
                .find(|(_, table)| table.as_str() == name)
                .map(|(alias, _)| alias.clone())
            else {
                return InvalidQueryError::UnknownTable {
                    table: name.to_string(),
                    component: component.to_string(),
                }
                .err();
            };
            self.diagnostics.warning(
                "Unreliable alias match",
                format!("Potentially unreliable match of table {name} from component {component}"),
            );
            alias
        };

        self.table_matches.insert(name.to_string(), alias.clone());
        Ok(alias)
    }
}
