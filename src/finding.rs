// SPDX-License-Identifier: PMPL-1.0-or-later
//! Finding model shared by the rule checker, the criteria mapper and the
//! scoring engine.
//!
//! A [`Finding`] is plain serializable data. It references the page it came
//! from by URL only and carries a sanitized [`ElementInfo`] instead of any
//! parser or browser handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ElementSource;

/// Kind of observation a check emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// The page fails the check
    Violation,
    /// Likely problem or best-practice gap
    Warning,
    /// The check ran and found nothing wrong
    Passed,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingKind::Violation => write!(f, "violation"),
            FindingKind::Warning => write!(f, "warning"),
            FindingKind::Passed => write!(f, "passed"),
        }
    }
}

/// Severity of a finding, most severe first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks access to content entirely
    Critical,
    /// Serious barrier for some users
    #[default]
    Major,
    /// Noticeable friction
    Moderate,
    /// Cosmetic or best-practice
    Minor,
}

impl Severity {
    /// Parse a severity label, falling back to [`Severity::Major`]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            _ => Severity::Major,
        }
    }

    /// Lowercase label used in reports and config keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// Sanitized snapshot of the element a finding is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    /// CSS-like path from the document root
    pub path: String,
    /// Truncated outer HTML
    pub snippet: String,
}

impl From<&ElementSource> for ElementInfo {
    fn from(source: &ElementSource) -> Self {
        Self {
            tag: source.tag.clone(),
            path: source.path.clone(),
            snippet: source.snippet.clone(),
        }
    }
}

/// One accessibility observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Violation, warning or passed
    pub kind: FindingKind,
    /// Stable identifier of the specific check, e.g. `missing_alt`
    #[serde(rename = "type")]
    pub finding_type: String,
    /// Severity; `major` unless the check says otherwise
    #[serde(default)]
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// URL of the page this finding was observed on
    pub source_page: String,
    /// Offending element, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_info: Option<ElementInfo>,
    /// Suggested remediation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// When this finding was created
    pub created_at: DateTime<Utc>,
}

impl Finding {
    /// Create a new finding
    pub fn new(kind: FindingKind, finding_type: &str, message: &str, source_page: &str) -> Self {
        Self {
            kind,
            finding_type: finding_type.to_string(),
            severity: Severity::default(),
            message: message.to_string(),
            source_page: source_page.to_string(),
            element_info: None,
            suggestion: None,
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a violation
    pub fn violation(finding_type: &str, message: &str, source_page: &str) -> Self {
        Self::new(FindingKind::Violation, finding_type, message, source_page)
    }

    /// Shorthand for a warning
    pub fn warning(finding_type: &str, message: &str, source_page: &str) -> Self {
        Self::new(FindingKind::Warning, finding_type, message, source_page)
    }

    /// Shorthand for a passed check
    pub fn passed(finding_type: &str, message: &str, source_page: &str) -> Self {
        Self::new(FindingKind::Passed, finding_type, message, source_page).with_severity(Severity::Minor)
    }

    /// Set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the offending element
    pub fn with_element(mut self, source: &ElementSource) -> Self {
        self.element_info = Some(ElementInfo::from(source));
        self
    }

    /// Set suggestion
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Location string for display
    pub fn location_string(&self) -> String {
        match &self.element_info {
            Some(info) if !info.path.is_empty() => format!("{} @ {}", self.source_page, info.path),
            _ => self.source_page.clone(),
        }
    }
}

/// Findings split by kind, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingSet {
    /// Violations
    pub violations: Vec<Finding>,
    /// Warnings
    pub warnings: Vec<Finding>,
    /// Passed checks
    pub passed: Vec<Finding>,
}

impl FindingSet {
    /// Create empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a finding into the bucket for its kind
    pub fn add(&mut self, finding: Finding) {
        match finding.kind {
            FindingKind::Violation => self.violations.push(finding),
            FindingKind::Warning => self.warnings.push(finding),
            FindingKind::Passed => self.passed.push(finding),
        }
    }

    /// Extend with findings from an iterator
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// Merge another set into this one, preserving order
    pub fn merge(&mut self, other: FindingSet) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
        self.passed.extend(other.passed);
    }

    /// Iterate violations, then warnings, then passed
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.violations.iter().chain(self.warnings.iter()).chain(self.passed.iter())
    }

    /// Findings of a given type
    pub fn by_type<'a>(&'a self, finding_type: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.iter().filter(move |f| f.finding_type == finding_type)
    }

    /// Findings at a given severity
    pub fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.iter().filter(|f| f.severity == severity).collect()
    }

    /// Whether any violation is critical
    pub fn has_critical(&self) -> bool {
        self.violations.iter().any(|f| f.severity == Severity::Critical)
    }

    /// Total count
    pub fn len(&self) -> usize {
        self.violations.len() + self.warnings.len() + self.passed.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_default_is_major() {
        let finding = Finding::violation("missing_alt", "no alt", "https://example.com/");
        assert_eq!(finding.severity, Severity::Major);
    }

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label("Critical"), Severity::Critical);
        assert_eq!(Severity::from_label(" minor "), Severity::Minor);
        assert_eq!(Severity::from_label("bogus"), Severity::Major);
    }

    #[test]
    fn test_finding_set_routes_by_kind() {
        let mut set = FindingSet::new();
        set.add(Finding::violation("a", "x", "u"));
        set.add(Finding::warning("b", "x", "u"));
        set.add(Finding::passed("c", "x", "u"));
        set.add(Finding::violation("a", "y", "u"));
        assert_eq!(set.violations.len(), 2);
        assert_eq!(set.warnings.len(), 1);
        assert_eq!(set.passed.len(), 1);
        assert_eq!(set.by_type("a").count(), 2);
    }

    #[test]
    fn test_serialized_type_field() {
        let finding = Finding::violation("heading_hierarchy", "skip", "https://example.com/");
        let json = serde_json::to_value(&finding).expect("serialize");
        assert_eq!(json["type"], "heading_hierarchy");
        assert_eq!(json["kind"], "violation");
        assert_eq!(json["severity"], "major");
        assert!(json.get("element_info").is_none());
    }

    #[test]
    fn test_missing_severity_deserializes_as_major() {
        let json = r#"{"kind":"warning","type":"x","message":"m","source_page":"u","created_at":"2024-01-01T00:00:00Z"}"#;
        let finding: Finding = serde_json::from_str(json).expect("deserialize");
        assert_eq!(finding.severity, Severity::Major);
    }
}
