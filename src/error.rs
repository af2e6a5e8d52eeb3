// 🚫 Validation errors - fatal, raised before any computation starts

use thiserror::Error;

/// Structural problems with the master list, alias table or configuration.
///
/// Every variant aborts the run. Recoverable data problems are reported as
/// [`crate::quality::QualityIssue`]s instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate team_id in master list: {0}")]
    DuplicateTeamId(String),

    #[error("duplicate display_name in master list: {0}")]
    DuplicateDisplayName(String),

    #[error("master list row {row} has an empty {field}")]
    EmptyMasterField { row: usize, field: &'static str },

    #[error("alias '{raw_name}' targets unknown team_id '{team_id}'")]
    UnknownAliasTarget { raw_name: String, team_id: String },

    #[error("alias '{0}' is listed more than once with different targets")]
    ConflictingAlias(String),

    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
