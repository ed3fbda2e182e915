use serde::{Deserialize, Serialize};

/// Evaluation rules that make an `input` column hold something other than free text.
pub const NON_TEXT_EVAL_RULES: [&str; 9] = [
    "date", "datetime", "time", "timesec", "year", "num", "md5", "int", "double2",
];

/// Form configuration of a column: its type and its evaluation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    #[serde(rename = "type")]
    pub kind: String,
    /// Comma-separated evaluation rules, e.g. `"int,trim"`.
    #[serde(default)]
    pub eval: String,
}

impl ColumnTypeInfo {
    pub fn new(kind: &str, eval: &str) -> Self {
        Self {
            kind: kind.to_string(),
            eval: eval.to_string(),
        }
    }

    pub fn eval_rules(&self) -> Vec<&str> {
        self.eval
            .split(',')
            .map(|rule| rule.trim())
            .filter(|rule| !rule.is_empty())
            .collect()
    }

    /// Whether the column stores text that a translation would replace.
    pub fn is_text(&self) -> bool {
        match self.kind.as_str() {
            "text" => true,
            "input" => !self
                .eval_rules()
                .iter()
                .any(|rule| NON_TEXT_EVAL_RULES.contains(rule)),
            _ => false,
        }
    }
}
