use std::{ffi::OsString, fs};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    database::{
        ColumnTypeInfo, IgnoreMap, PolicyProvider, RequestContext, SchemaProvider, TableSchema, TranslationMode,
    },
    error::{CatalogError, ProviderError},
};

/// In-memory description of the platform tables.
///
/// Serves as both schema and policy provider, producing the same kind of
/// visibility, language and workspace conditions as the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    pub tables: IndexMap<String, TableSchema>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json_value: Value) -> Result<Self, CatalogError> {
        Ok(serde_json::from_value(json_value)?)
    }

    pub fn load_from_file(file_path: &OsString) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(file_path)?;
        let json_value = serde_json::from_str::<Value>(&content)?;
        Self::from_json(json_value)
    }

    pub fn with_table(mut self, name: &str, schema: TableSchema) -> Self {
        self.tables.insert(name.to_string(), schema);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    fn require_table(&self, name: &str) -> Result<&TableSchema, ProviderError> {
        self.table(name)
            .ok_or_else(|| ProviderError::new(format!("Table {name} is not described in the catalog")))
    }

    fn complete_fields(current: &[String], required: &[Option<&str>]) -> Vec<String> {
        let mut fields = current.to_vec();
        for field in required.iter().flatten() {
            if !fields.iter().any(|existing| existing == field) {
                fields.push(field.to_string());
            }
        }
        fields
    }

    fn group_condition(table: &str, field: &str, user_groups: &[i64]) -> String {
        let mut parts = vec![
            format!("{table}.{field}=''"),
            format!("{table}.{field} IS NULL"),
            format!("{table}.{field}='0'"),
        ];
        for group in user_groups {
            parts.push(format!("FIND_IN_SET('{group}',{table}.{field})"));
        }
        format!("({})", parts.join(" OR "))
    }
}

impl SchemaProvider for StaticCatalog {
    fn all_fields(&self, table: &str) -> Vec<String> {
        self.table(table)
            .map(|schema| schema.fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn fulltext_indexes(&self, table: &str) -> IndexMap<String, String> {
        let Some(schema) = self.table(table) else {
            return IndexMap::new();
        };
        schema
            .fulltext_indexes
            .keys()
            .filter_map(|index| schema.qualified_index(table, index).map(|fields| (index.clone(), fields)))
            .collect()
    }

    fn column_type_info(&self, table: &str, field: &str) -> Option<ColumnTypeInfo> {
        self.table(table)
            .and_then(|schema| schema.fields.get(field))
            .and_then(|info| info.clone())
    }
}

impl PolicyProvider for StaticCatalog {
    fn enable_fields_condition(
        &self,
        table: &str,
        show_hidden: bool,
        ignore: &IgnoreMap,
        context: &RequestContext,
    ) -> Result<String, ProviderError> {
        let ctrl = &self.require_table(table)?.ctrl;
        let now = context.access_time.timestamp();
        let mut parts = vec![];

        if let Some(delete) = &ctrl.delete {
            parts.push(format!("{table}.{delete}=0"));
        }
        if ctrl.versioning {
            if context.versioning_preview {
                parts.push(format!(
                    "({table}.t3ver_wsid=0 OR {table}.t3ver_wsid={}) AND {table}.pid<>-1",
                    context.workspace
                ));
            } else {
                parts.push(format!("{table}.t3ver_state<=0 AND {table}.pid<>-1"));
            }
        }
        if let Some(disabled) = &ctrl.disabled
            && !show_hidden
            && !ignore.disabled
        {
            parts.push(format!("{table}.{disabled}=0"));
        }
        if let Some(starttime) = &ctrl.starttime
            && !ignore.starttime
        {
            parts.push(format!("{table}.{starttime}<={now}"));
        }
        if let Some(endtime) = &ctrl.endtime
            && !ignore.endtime
        {
            parts.push(format!("({table}.{endtime}=0 OR {table}.{endtime}>{now})"));
        }
        if let Some(fe_group) = &ctrl.fe_group
            && !ignore.fe_group
        {
            parts.push(Self::group_condition(table, fe_group, &context.user_groups));
        }

        Ok(parts.join(" AND "))
    }

    fn translation_mode(&self, table: &str) -> TranslationMode {
        let Some(schema) = self.table(table) else {
            return TranslationMode::None;
        };
        let ctrl = &schema.ctrl;
        match (&ctrl.language_field, &ctrl.trans_orig_pointer_field, &ctrl.trans_foreign_table) {
            (_, _, Some(_)) => TranslationMode::ForeignTable,
            (Some(_), Some(_), None) => TranslationMode::SameTable,
            (Some(language_field), None, None) => TranslationMode::LanguageFlag {
                language_field: language_field.clone(),
            },
            _ => TranslationMode::None,
        }
    }

    fn language_condition(&self, table: &str, alias: &str, context: &RequestContext) -> Result<String, ProviderError> {
        let ctrl = &self.require_table(table)?.ctrl;
        let (Some(language_field), Some(pointer_field)) = (&ctrl.language_field, &ctrl.trans_orig_pointer_field) else {
            return Err(ProviderError::new(format!("Table {table} is not translated in place")));
        };

        if context.language == 0 {
            Ok(format!("{alias}.{language_field} IN (0,-1)"))
        } else {
            Ok(format!(
                "{alias}.{language_field} IN (0,-1) OR ({alias}.{language_field} = '{}' AND {alias}.{pointer_field} = '0')",
                context.language
            ))
        }
    }

    fn select_overlay_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError> {
        let ctrl = &self.require_table(table)?.ctrl;
        match self.translation_mode(table) {
            TranslationMode::SameTable => Ok(Self::complete_fields(
                current,
                &[Some("uid"), Some("pid"), ctrl.language_field.as_deref()],
            )),
            TranslationMode::ForeignTable => Ok(Self::complete_fields(current, &[Some("uid"), Some("pid")])),
            _ => Err(ProviderError::new(format!("Table {table} has no translation overlays"))),
        }
    }

    fn supports_versioning(&self, table: &str) -> bool {
        self.table(table).is_some_and(|schema| schema.ctrl.versioning)
    }

    fn versioning_condition(
        &self,
        table: &str,
        alias: &str,
        direct_fetch: bool,
        context: &RequestContext,
    ) -> Result<String, ProviderError> {
        if !self.supports_versioning(table) {
            return Err(ProviderError::new(format!("Table {table} is not versioned")));
        }
        let workspace = context.workspace;
        if direct_fetch {
            return Ok(format!("{alias}.t3ver_wsid IN (0,{workspace})"));
        }
        Ok(format!(
            "({alias}.t3ver_state <= 0 AND {alias}.t3ver_oid = 0) OR ({alias}.t3ver_state = 0 AND {alias}.t3ver_wsid = {workspace}) OR ({alias}.t3ver_state = 1 AND {alias}.t3ver_wsid = {workspace}) OR ({alias}.t3ver_state = 3 AND {alias}.t3ver_wsid = {workspace})"
        ))
    }

    fn select_versioning_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError> {
        if !self.supports_versioning(table) {
            return Err(ProviderError::new(format!("Table {table} is not versioned")));
        }
        Ok(Self::complete_fields(current, &[Some("uid"), Some("pid"), Some("t3ver_state")]))
    }
}
