use crate::{
    builder::QueryBuilder,
    database::TranslationMode,
    parser::ast::OrderEngine,
};

const UNSORTABLE: [&str; 2] = ["RAND()", "NULL"];

impl<'a> QueryBuilder<'a> {
    /// Decides whether ORDER BY can stay in SQL.
    ///
    /// With a non-default language, sorting on translated text is only correct after
    /// the overlays are applied, so SQL ordering is abandoned and the sort fields are
    /// added to the SELECT list for the caller to sort on.
    pub fn preprocess_order_by_fields(&mut self) {
        self.process_order_by = true;
        if self.query.order_fields.is_empty() || self.context.language == 0 {
            return;
        }

        let main_alias = self.query.main_table_alias.clone();
        let mut cannot_use_sql = false;
        let mut missing_fields: Vec<(String, String, String)> = vec![];

        for index in 0..self.query.order_fields.len() {
            let order_field = &self.query.order_fields[index];
            let engine = order_field.engine;
            let (mut alias, mut field) = match order_field.field.split_once('.') {
                Some((alias, field)) => (alias.trim().to_string(), field.trim().to_string()),
                None => (main_alias.clone(), order_field.field.trim().to_string()),
            };
            if UNSORTABLE.contains(&field.as_str()) || field.contains('(') {
                continue;
            }

            let field_alias = self.query.field_alias(&alias, &field).map(str::to_string);
            if let Some(field_alias) = &field_alias {
                let order_field = &mut self.query.order_fields[index];
                order_field.alias = Some(field.clone());
                order_field.field = field_alias.clone();
                field = field_alias.clone();
            }
            if let Some(true_name) = self.field_true_names.get(&field) {
                alias = true_name.table_alias.clone();
                field = true_name.field.clone();
            }
            let table = self.query.true_table(&alias).unwrap_or(&alias).to_string();

            match engine {
                Some(OrderEngine::Provider) => cannot_use_sql = true,
                Some(OrderEngine::Source) => {}
                None => {
                    if self.policy.translation_mode(&table) != TranslationMode::None
                        && self.is_a_text_field(&table, &field)
                    {
                        cannot_use_sql = true;
                    }
                }
            }

            let selected = self.query_fields.get(&alias).is_some_and(|selected| selected.has_field(&field));
            if !selected && field_alias.is_none() {
                missing_fields.push((alias, field, table));
            }
        }

        if cannot_use_sql {
            for (alias, field, table) in missing_fields {
                self.push_select_entry(&field, &alias, &table, &format!("{alias}${field}"));
            }
            self.process_order_by = false;
        }
    }

    /// Columns without type information are treated as text.
    pub fn is_a_text_field(&self, table: &str, field: &str) -> bool {
        self.schema
            .column_type_info(table, field)
            .is_none_or(|info| info.is_text())
    }
}
