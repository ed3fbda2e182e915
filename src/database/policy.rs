use crate::{database::RequestContext, error::ProviderError};

/// How a table stores its translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationMode {
    /// The table is not translatable.
    None,
    /// Records carry a language flag but no link to a default-language record.
    LanguageFlag { language_field: String },
    /// Translations live in the same table and point back to their original.
    SameTable,
    /// Translations live in a separate table.
    ForeignTable,
}

impl TranslationMode {
    pub fn uses_overlays(&self) -> bool {
        matches!(self, TranslationMode::SameTable | TranslationMode::ForeignTable)
    }
}

/// Classes of enable fields that may be left out of the enable-fields condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreMap {
    pub disabled: bool,
    pub starttime: bool,
    pub endtime: bool,
    pub fe_group: bool,
}

impl IgnoreMap {
    pub fn is_empty(&self) -> bool {
        !(self.disabled || self.starttime || self.endtime || self.fe_group)
    }
}

/// Record visibility, translation and versioning rules of the hosting platform.
///
/// Failures are reported as [`ProviderError`]; the query builder treats them as
/// "mechanism unavailable" and carries on.
pub trait PolicyProvider {
    fn enable_fields_condition(
        &self,
        table: &str,
        show_hidden: bool,
        ignore: &IgnoreMap,
        context: &RequestContext,
    ) -> Result<String, ProviderError>;

    fn translation_mode(&self, table: &str) -> TranslationMode;

    fn language_condition(&self, table: &str, alias: &str, context: &RequestContext) -> Result<String, ProviderError>;

    /// Returns `current` completed with the fields needed to overlay translations.
    fn select_overlay_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError>;

    fn supports_versioning(&self, table: &str) -> bool;

    fn versioning_condition(
        &self,
        table: &str,
        alias: &str,
        direct_fetch: bool,
        context: &RequestContext,
    ) -> Result<String, ProviderError>;

    /// Returns `current` completed with the fields needed to overlay workspace versions.
    fn select_versioning_fields(&self, table: &str, current: &[String]) -> Result<Vec<String>, ProviderError>;
}
