use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Operator;

/// Value meaning "no restriction"; the condition is dropped.
pub const VALUE_ALL: &str = "\\all";
/// Value compared as the empty string.
pub const VALUE_EMPTY: &str = "\\empty";
/// Value compared as NULL.
pub const VALUE_NULL: &str = "\\null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ConditionValue {
    Single(String),
    List(Vec<String>),
}

impl ConditionValue {
    pub fn single(value: &str) -> Self {
        ConditionValue::Single(value.to_string())
    }

    pub fn list(values: &[&str]) -> Self {
        ConditionValue::List(values.iter().map(|value| value.to_string()).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ConditionValue::Single(value) if value == VALUE_ALL)
    }

    pub fn is_special(&self, special: &str) -> bool {
        matches!(self, ConditionValue::Single(value) if value == special)
    }

    /// Values of the condition. A single string is split on commas when `split` is set.
    pub fn values(&self, split: bool) -> Vec<String> {
        match self {
            ConditionValue::Single(value) if split => value
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            ConditionValue::Single(value) => vec![value.clone()],
            ConditionValue::List(values) => values.clone(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            ConditionValue::Single(value) => value.clone(),
            ConditionValue::List(values) => values.join(" "),
        }
    }

    fn scalar_to_string(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            Value::Null => VALUE_NULL.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => ConditionValue::List(items.iter().map(Self::scalar_to_string).collect()),
            other => ConditionValue::Single(Self::scalar_to_string(&other)),
        }
    }
}

impl From<ConditionValue> for Value {
    fn from(value: ConditionValue) -> Self {
        match value {
            ConditionValue::Single(text) => Value::String(text),
            ConditionValue::List(values) => Value::Array(values.into_iter().map(Value::String).collect()),
        }
    }
}

/// One filter condition: operator, value(s) and negation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub operator: Operator,
    pub value: ConditionValue,
    #[serde(default)]
    pub negate: bool,
}

impl Condition {
    pub fn new(operator: Operator, value: ConditionValue) -> Self {
        Self { operator, value, negate: false }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}
