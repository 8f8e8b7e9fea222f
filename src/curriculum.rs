use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Taxonomy levels in the order the selectors cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterLevel {
    Subject,
    Grade,
    Strand,
    SubStrand,
}

impl FilterLevel {
    pub const ALL: [FilterLevel; 4] = [
        FilterLevel::Subject,
        FilterLevel::Grade,
        FilterLevel::Strand,
        FilterLevel::SubStrand,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Subject => "Subject",
            Self::Grade => "Grade",
            Self::Strand => "Strand",
            Self::SubStrand => "Sub-Strand",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Subject => 0,
            Self::Grade => 1,
            Self::Strand => 2,
            Self::SubStrand => 3,
        }
    }

    /// Levels whose options depend on this one, nearest first.
    pub fn downstream(self) -> &'static [FilterLevel] {
        &Self::ALL[self.index() + 1..]
    }
}

/// One `{id, name}` entry served by a curriculum collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: Value,
    #[serde(default)]
    pub name: String,
}

impl FilterOption {
    pub fn new(id: impl Into<Value>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The selector value for this option, i.e. the id as text.
    pub fn value(&self) -> String {
        option_value(&self.id)
    }
}

/// Leaf curriculum node. Only `id` takes part in selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningOutcome {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl LearningOutcome {
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            description: None,
            name: None,
        }
    }

    pub fn numeric_id(&self) -> Option<&Number> {
        match &self.id {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }
}

pub(crate) fn option_value(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
