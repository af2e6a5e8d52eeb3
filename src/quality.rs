// ✅ Quality Report - non-fatal issues collected during a run
//
// Nothing in here stops the pipeline. Each issue is logged when it is
// recorded and kept so the caller can hand the list to an operator.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// ISSUE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Bad or suspicious input that was recovered locally
    DataQualityWarning,

    /// Something that should never happen; the affected record was dropped
    InvariantViolation,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DataQualityWarning => "DataQualityWarning",
            IssueKind::InvariantViolation => "InvariantViolation",
        }
    }
}

// ============================================================================
// QUALITY ISSUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub kind: IssueKind,

    /// What the issue is about (a raw name, a record position, a team_id)
    pub subject: String,

    pub message: String,
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.record(IssueKind::DataQualityWarning, subject.into(), message.into());
    }

    pub fn violation(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.record(IssueKind::InvariantViolation, subject.into(), message.into());
    }

    fn record(&mut self, kind: IssueKind, subject: String, message: String) {
        warn!(kind = kind.as_str(), %subject, "{}", message);
        self.issues.push(QualityIssue {
            kind,
            subject,
            message,
        });
    }

    /// Append another report's issues, keeping their order
    pub fn merge(&mut self, other: QualityReport) {
        self.issues.extend(other.issues);
    }

    pub fn warning_count(&self) -> usize {
        self.count(IssueKind::DataQualityWarning)
    }

    pub fn violation_count(&self) -> usize {
        self.count(IssueKind::InvariantViolation)
    }

    fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} issues ({} warnings, {} invariant violations)",
            self.issues.len(),
            self.warning_count(),
            self.violation_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_by_kind() {
        let mut report = QualityReport::new();
        assert!(report.is_clean());

        report.warn("row 3", "home_score 'x' is not an integer, using 0");
        report.warn("row 4", "date '' could not be parsed");
        report.violation("Lions FC", "raw name missing from mapping");

        assert!(!report.is_clean());
        assert_eq!(report.warning_count(), 2);
        assert_eq!(report.violation_count(), 1);
        assert_eq!(
            report.summary(),
            "3 issues (2 warnings, 1 invariant violations)"
        );
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first = QualityReport::new();
        first.warn("a", "first");

        let mut second = QualityReport::new();
        second.violation("b", "second");
        second.warn("c", "third");

        first.merge(second);

        let subjects: Vec<&str> = first.issues.iter().map(|i| i.subject.as_str()).collect();
        assert_eq!(subjects, vec!["a", "b", "c"]);
        assert_eq!(first.issues[1].kind, IssueKind::InvariantViolation);
    }
}
