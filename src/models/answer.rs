use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One collected answer value as the dialogue platform delivers it.
///
/// Numbers often arrive as floats (`3.0`) or strings (`"3"`); coercion into
/// classifier features happens in the severity adapter, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AnswerValue {
    /// Rendered form used in error messages and categorical features.
    pub fn render(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for AnswerValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for AnswerValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Answers collected by one completed intake flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answer {
    fields: BTreeMap<String, AnswerValue>,
}

impl Answer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<AnswerValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Build from dialogue context parameters, skipping the `*.original`
    /// echo keys the platform adds next to each resolved parameter.
    pub fn from_context_parameters(
        params: impl IntoIterator<Item = (String, AnswerValue)>,
    ) -> Self {
        let fields = params
            .into_iter()
            .filter(|(k, _)| !k.ends_with(".original"))
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
