//! Bug report submission payload and validation.

use serde::Serialize;
use validator::Validate;

use crate::error::CoreError;
use crate::tags::wire_enum;

/// Maximum length for the user-provided description field (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length for the report title (characters).
pub const MAX_TITLE_LENGTH: usize = 200;

wire_enum! {
    Severity, "severity" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Body of `POST /api/bug-reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 10000, message = "exceeds maximum length of 10000 characters"))]
    pub description: String,
    pub severity: Severity,
    /// Page or screen the report was filed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl BugReport {
    /// Trim the free-text fields, then run validation.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}
