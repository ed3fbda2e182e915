use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use crate::{
    builder::QueryBuilder,
    database::{EnableFieldsMode, TranslationMode},
};

/// Rewrites `table.` (or `` table`. ``) into `alias.` in a condition produced for the true table.
pub fn replace_table_name_by_alias(condition: &str, table: &str, alias: &str) -> String {
    match Regex::new(&format!(r"\b({})(`?\.)", regex::escape(table))) {
        Ok(pattern) => pattern.replace_all(condition, format!("{alias}${{2}}")).into_owned(),
        Err(_) => condition.to_string(),
    }
}

impl<'a> QueryBuilder<'a> {
    /// Adds the visibility, language and workspace conditions required by the platform.
    pub fn add_typo3_mechanisms(&mut self) {
        self.add_enable_fields_condition();

        let fields_per_table: IndexMap<String, Vec<String>> = self
            .query_fields
            .iter()
            .map(|(alias, table)| (alias.clone(), table.column_names()))
            .collect();
        self.add_language_condition(&fields_per_table);
        self.add_versioning_condition(&fields_per_table);
    }

    fn add_enable_fields_condition(&mut self) {
        if self.settings.ignore_enable_fields == EnableFieldsMode::All {
            return;
        }

        let mut tables = vec![(self.query.main_table_alias.clone(), self.query.main_true_table().to_string())];
        tables.extend(
            self.query
                .joins
                .values()
                .map(|join| (join.alias.clone(), join.table.clone())),
        );

        for (alias, table) in tables {
            let show_hidden = self.context.show_hidden(&table);
            let ignore = self.settings.ignore_map(&alias);
            let condition = match self
                .policy
                .enable_fields_condition(&table, show_hidden, &ignore, &self.context)
            {
                Ok(condition) => condition,
                Err(error) => {
                    self.diagnostics
                        .warning("Enable fields ignored", format!("No enable fields for table {table}: {error}"));
                    continue;
                }
            };
            let condition = if alias != table {
                replace_table_name_by_alias(&condition, &table, &alias)
            } else {
                condition
            };
            self.attach_condition(&alias, &condition);
        }
    }

    /// Language handling: tables translated with overlays get the fields the
    /// overlay needs and, for same-table translations, a language condition.
    /// Tables that only carry a language flag get a plain condition on it.
    fn add_language_condition(&mut self, fields_per_table: &IndexMap<String, Vec<String>>) {
        if self.settings.ignore_language_handling || self.query.distinct {
            return;
        }

        for (alias, current_fields) in fields_per_table {
            let table = self.query.true_table(alias).unwrap_or(alias).to_string();
            if self.settings.skip_overlays_for_tables.contains(&table) {
                self.do_overlays.insert(table, false);
                continue;
            }

            match self.policy.translation_mode(&table) {
                TranslationMode::None => {}
                TranslationMode::LanguageFlag { language_field } => {
                    let condition = format!("{alias}.{language_field} IN ({}, -1)", self.context.language);
                    self.attach_condition(alias, &condition);
                }
                mode => {
                    let overlay_fields = match self.policy.select_overlay_fields(&table, current_fields) {
                        Ok(fields) => fields,
                        Err(error) => {
                            debug!(table = %table, error = %error, "No language overlays");
                            self.do_overlays.insert(table, false);
                            continue;
                        }
                    };
                    self.add_missing_fields(&overlay_fields, current_fields, alias, &table);
                    self.do_overlays.insert(table.clone(), true);

                    if mode == TranslationMode::SameTable {
                        match self.policy.language_condition(&table, alias, &self.context) {
                            Ok(condition) => self.attach_condition(alias, &condition),
                            Err(error) => {
                                debug!(table = %table, error = %error, "No language condition");
                                self.do_overlays.insert(table, false);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Workspace handling, applied to every versioned table. Live records only,
    /// unless a workspace preview is active.
    fn add_versioning_condition(&mut self, fields_per_table: &IndexMap<String, Vec<String>>) {
        for (alias, current_fields) in fields_per_table {
            let table = self.query.true_table(alias).unwrap_or(alias).to_string();
            self.do_versioning.insert(table.clone(), false);
            if !self.policy.supports_versioning(&table) {
                continue;
            }

            let mut condition = format!("{alias}.t3ver_oid = '0'");
            if self.context.versioning_preview {
                let direct_fetch = self.settings.get_versions_directly.contains(alias);
                let versioning = self
                    .policy
                    .select_versioning_fields(&table, current_fields)
                    .and_then(|fields| {
                        self.policy
                            .versioning_condition(&table, alias, direct_fetch, &self.context)
                            .map(|condition| (fields, condition))
                    });
                match versioning {
                    Ok((fields, workspace_condition)) => {
                        self.add_missing_fields(&fields, current_fields, alias, &table);
                        self.do_versioning.insert(table.clone(), true);
                        condition = workspace_condition;
                    }
                    Err(error) => {
                        self.diagnostics.warning(
                            &format!("Falling back to LIVE records for table {table}"),
                            format!("A problem happened with versioning: {error}"),
                        );
                    }
                }
            }
            self.attach_condition(alias, &condition);
        }
    }

    fn add_missing_fields(&mut self, fields: &[String], current_fields: &[String], alias: &str, table: &str) {
        for field in fields {
            let already_selected = current_fields.contains(field)
                || self.query_fields.get(alias).is_some_and(|selected| selected.has_field(field));
            if !already_selected {
                self.add_extra_field(field, alias, table);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        builder::{_tests::fixtures, mechanisms::replace_table_name_by_alias, QueryBuilder},
        database::{
            EnableFieldsMode, IgnoreMap, PolicyProvider, RequestContext, Settings, StaticCatalog, TableList,
            TranslationMode,
        },
        error::ProviderError,
    };

    /// Delegates to the catalog but cannot build workspace conditions.
    struct BrokenWorkspaces<'a>(&'a StaticCatalog);

    impl PolicyProvider for BrokenWorkspaces<'_> {
        fn enable_fields_condition(
            &self,
            table: &str,
            show_hidden: bool,
            ignore: &IgnoreMap,
            context: &RequestContext,
        ) -> Result<String, ProviderError> {
            self.0.enable_fields_condition(table, show_hidden, ignore, context)
        }

        fn translation_mode(&self, table: &str) -> TranslationMode {
            self.0.translation_mode(table)
        }

        fn language_condition(&self, table: &str, alias: &str, context: &RequestContext) -> Result<String, ProviderError> {
            self.0.language_condition(table, alias, context)
        }

        fn select_overlay_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError> {
            self.0.select_overlay_fields(table, current)
        }

        fn supports_versioning(&self, table: &str) -> bool {
            self.0.supports_versioning(table)
        }

        fn versioning_condition(&self, _: &str, _: &str, _: bool, _: &RequestContext) -> Result<String, ProviderError> {
            Err(ProviderError::new("workspace service unavailable"))
        }

        fn select_versioning_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError> {
            self.0.select_versioning_fields(table, current)
        }
    }

    #[test]
    pub fn test_replace_table_name_by_alias() {
        assert_eq!(
            replace_table_name_by_alias("tt_content.deleted=0 AND `tt_content`.hidden=0", "tt_content", "c"),
            "c.deleted=0 AND `c`.hidden=0"
        );
        assert_eq!(
            replace_table_name_by_alias("tx_pages.hidden=0 AND pages.hidden=0", "pages", "p"),
            "tx_pages.hidden=0 AND p.hidden=0"
        );
    }

    #[test]
    pub fn test_mechanisms_simple_query() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder(&catalog);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert_eq!(
            builder.build_query(),
            format!(
                "SELECT tt_content.uid, tt_content.header, tt_content.pid, tt_content.sys_language_uid \
                 FROM tt_content AS tt_content WHERE {}",
                fixtures::full_condition("tt_content")
            )
        );
        assert!(builder.must_handle_language_overlay("tt_content"));
        assert!(!builder.must_handle_versioning_overlay("tt_content"));
    }

    #[test]
    pub fn test_mechanisms_with_table_alias() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder(&catalog);

        builder.parse_query("SELECT uid,header FROM tt_content AS c").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert_eq!(
            builder.build_query(),
            format!(
                "SELECT c.uid, c.header, c.pid, c.sys_language_uid FROM tt_content AS c WHERE {}",
                fixtures::full_condition("c")
            )
        );
    }

    #[test]
    pub fn test_mechanisms_with_join() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder(&catalog);

        builder
            .parse_query("SELECT uid,header,pages.title AS tt_content.title FROM tt_content INNER JOIN pages ON pages.uid = tt_content.pid")
            .expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert_eq!(
            builder.build_query(),
            format!(
                "SELECT tt_content.uid, tt_content.header, pages.title AS tt_content$title, tt_content.pid, \
                 pages.uid AS pages$uid, pages.pid AS pages$pid, tt_content.sys_language_uid \
                 FROM tt_content AS tt_content INNER JOIN pages AS pages ON pages.uid = tt_content.pid AND {} \
                 WHERE {}",
                fixtures::pages_condition("pages"),
                fixtures::full_condition("tt_content")
            )
        );
        assert!(builder.must_handle_language_overlay("pages"));
    }

    #[test]
    pub fn test_mechanisms_ignore_all_enable_fields() {
        let catalog = fixtures::catalog();
        let settings = Settings {
            ignore_enable_fields: EnableFieldsMode::All,
            ..fixtures::settings()
        };
        let mut builder = fixtures::builder_with(&catalog, fixtures::context(), settings);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(builder.build_query().ends_with(&format!(
            "WHERE ({}) AND ({})",
            fixtures::language_condition("tt_content"),
            fixtures::live_condition("tt_content")
        )));
    }

    #[test]
    pub fn test_mechanisms_partial_enable_fields() {
        let catalog = fixtures::catalog();
        let settings = Settings {
            ignore_enable_fields: EnableFieldsMode::Partial,
            ignore_time_for_tables: TableList::All,
            ignore_disabled_for_tables: TableList::parse(", tt_content"),
            ignore_fegroup_for_tables: TableList::parse("pages"),
            ..fixtures::settings()
        };
        let mut builder = fixtures::builder_with(&catalog, fixtures::context(), settings);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(builder.build_query().contains(&format!(
            "WHERE ({} AND {}) AND",
            fixtures::minimal_condition("tt_content"),
            fixtures::group_condition("tt_content")
        )));
    }

    #[test]
    pub fn test_mechanisms_without_language_handling() {
        let catalog = fixtures::catalog();
        let settings = Settings {
            ignore_language_handling: true,
            ..fixtures::settings()
        };
        let mut builder = fixtures::builder_with(&catalog, fixtures::context(), settings);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        let sql = builder.build_query();
        assert!(!sql.contains("sys_language_uid"));
        assert!(!builder.must_handle_language_overlay("tt_content"));
    }

    #[test]
    pub fn test_mechanisms_skip_overlays_for_table() {
        let catalog = fixtures::catalog();
        let settings = Settings {
            skip_overlays_for_tables: TableList::parse("tt_content"),
            ..fixtures::settings()
        };
        let mut builder = fixtures::builder_with(&catalog, fixtures::context(), settings);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(!builder.build_query().contains("sys_language_uid"));
        assert!(!builder.must_handle_language_overlay("tt_content"));
    }

    #[test]
    pub fn test_mechanisms_language_flag_table() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder_with(&catalog, fixtures::context().with_language(2), fixtures::settings());

        builder.parse_query("SELECT uid, title FROM sys_category").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(builder.build_query().contains("(sys_category.sys_language_uid IN (2, -1))"));
        assert!(!builder.must_handle_language_overlay("sys_category"));
    }

    #[test]
    pub fn test_mechanisms_distinct_has_no_language_condition() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder(&catalog);

        builder.parse_query("SELECT DISTINCT CType AS uid FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert_eq!(
            builder.build_query(),
            format!(
                "SELECT DISTINCT tt_content.CType AS uid FROM tt_content AS tt_content WHERE ({}) AND ({})",
                fixtures::enable_condition("tt_content"),
                fixtures::live_condition("tt_content")
            )
        );
    }

    #[test]
    pub fn test_mechanisms_non_default_language() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder_with(&catalog, fixtures::context().with_language(2), fixtures::settings());

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(builder.build_query().contains(
            "(tt_content.sys_language_uid IN (0,-1) OR (tt_content.sys_language_uid = '2' AND tt_content.l18n_parent = '0'))"
        ));
    }

    #[test]
    pub fn test_mechanisms_workspace_preview() {
        let catalog = fixtures::catalog();
        let mut builder = fixtures::builder_with(&catalog, fixtures::context().with_preview(42), fixtures::settings());

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        let sql = builder.build_query();
        assert!(sql.starts_with(
            "SELECT tt_content.uid, tt_content.header, tt_content.pid, tt_content.sys_language_uid, tt_content.t3ver_state FROM"
        ));
        assert!(sql.contains("(tt_content.t3ver_wsid=0 OR tt_content.t3ver_wsid=42) AND tt_content.pid<>-1"));
        assert!(sql.ends_with("(tt_content.t3ver_state = 3 AND tt_content.t3ver_wsid = 42))"));
        assert!(!sql.contains("t3ver_oid = '0'"));
        assert!(builder.must_handle_versioning_overlay("tt_content"));
    }

    #[test]
    pub fn test_mechanisms_workspace_direct_fetch() {
        let catalog = fixtures::catalog();
        let settings = Settings {
            get_versions_directly: TableList::parse("tt_content"),
            ..fixtures::settings()
        };
        let mut builder = fixtures::builder_with(&catalog, fixtures::context().with_preview(42), settings);

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        assert!(builder.build_query().ends_with("AND (tt_content.t3ver_wsid IN (0,42))"));
    }

    #[test]
    pub fn test_mechanisms_workspace_failure_falls_back_to_live() {
        let catalog = fixtures::catalog();
        let policy = BrokenWorkspaces(&catalog);
        let mut builder = QueryBuilder::new(&catalog, &policy, fixtures::context().with_preview(42), fixtures::settings());

        builder.parse_query("SELECT uid,header FROM tt_content").expect("Failed to parse query");
        builder.add_typo3_mechanisms();

        let sql = builder.build_query();
        assert!(sql.ends_with("AND (tt_content.t3ver_oid = '0')"));
        assert!(!sql.contains("t3ver_state FROM"));
        assert!(!builder.must_handle_versioning_overlay("tt_content"));

        let diagnostic = builder.diagnostics().last().expect("Failed to find diagnostic");
        assert_eq!(diagnostic.title, "Falling back to LIVE records for table tt_content");
        assert_eq!(diagnostic.message, "A problem happened with versioning: workspace service unavailable");
    }
}
