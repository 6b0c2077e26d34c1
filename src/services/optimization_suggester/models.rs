//! Suggestion models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of change a suggestion asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Index,
    Query,
    Schema,
    Config,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Index => "INDEX",
            Category::Query => "QUERY",
            Category::Schema => "SCHEMA",
            Category::Config => "CONFIG",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remediation recommendation derived from one problem
///
/// `suggested_sql` is always an illustrative template, never a verified
/// rewrite of `original_sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub original_sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_improvement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_notes: Option<String>,
}

impl OptimizationSuggestion {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        category: Category,
        original_sql: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            category,
            original_sql: original_sql.into(),
            suggested_sql: None,
            estimated_improvement: None,
            implementation_notes: None,
        }
    }

    pub fn with_suggested_sql(mut self, sql: impl Into<String>) -> Self {
        self.suggested_sql = Some(sql.into());
        self
    }

    pub fn with_estimated_improvement(mut self, improvement: impl Into<String>) -> Self {
        self.estimated_improvement = Some(improvement.into());
        self
    }

    pub fn with_implementation_notes(mut self, notes: impl Into<String>) -> Self {
        self.implementation_notes = Some(notes.into());
        self
    }
}
