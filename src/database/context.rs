use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request-scoped state that influences how a query is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    /// Display language, 0 being the default language.
    pub language: u32,
    /// Workspace preview is active.
    pub versioning_preview: bool,
    pub workspace: u32,
    pub show_hidden_pages: bool,
    pub show_hidden_records: bool,
    /// Reference time for start/end time checks.
    pub access_time: DateTime<Utc>,
    pub user_groups: Vec<i64>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            language: 0,
            versioning_preview: false,
            workspace: 0,
            show_hidden_pages: false,
            show_hidden_records: false,
            access_time: Utc::now(),
            user_groups: vec![0, -1],
        }
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: u32) -> Self {
        self.language = language;
        self
    }

    pub fn with_preview(mut self, workspace: u32) -> Self {
        self.versioning_preview = true;
        self.workspace = workspace;
        self
    }

    pub fn with_access_time(mut self, access_time: DateTime<Utc>) -> Self {
        self.access_time = access_time;
        self
    }

    pub fn with_user_groups(mut self, user_groups: Vec<i64>) -> Self {
        self.user_groups = user_groups;
        self
    }

    /// Hidden records of `table` are visible in this request.
    pub fn show_hidden(&self, table: &str) -> bool {
        if table == "pages" {
            self.show_hidden_pages
        } else {
            self.show_hidden_records
        }
    }
}
