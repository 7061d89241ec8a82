// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule Checker: a fixed, ordered battery of independent accessibility
//! checks run against a [`PageSnapshot`].
//!
//! Each check returns `Result<Vec<Finding>, CheckError>`. The runner
//! isolates every check: an error or panic becomes a `check_error` warning
//! naming the check, and the remaining checks still run.

pub mod aria;
pub mod contrast;
pub mod document;
pub mod forms;
pub mod images;
pub mod keyboard;
pub mod links;
pub mod media;
pub mod structure;

use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CheckConfig;
use crate::extractor::panic_message;
use crate::finding::{Finding, FindingSet, Severity, WcagLevel};
use crate::model::{PageSnapshot, PageStatus};

/// Finding type for a check that could not complete
pub const CHECK_ERROR: &str = "check_error";

/// Finding type for a page that could not be fetched
pub const PAGE_UNAVAILABLE: &str = "page_unavailable";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("{0}")]
    Failed(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Trait implemented by every check
pub trait Check: Send + Sync {
    /// Stable identifier, used in `check_error` findings and config
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Lowest conformance level this check covers
    fn level(&self) -> WcagLevel {
        WcagLevel::A
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError>;
}

/// Findings of one page, split by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub findings: FindingSet,
}

/// The standard battery, in execution order
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(images::ImageAltCheck),
        Box::new(keyboard::KeyboardCheck),
        Box::new(keyboard::SkipLinkCheck),
        Box::new(structure::HeadingCheck),
        Box::new(contrast::ContrastCheck),
        Box::new(forms::FormLabelCheck),
        Box::new(document::LanguageCheck),
        Box::new(document::ViewportCheck),
        Box::new(aria::AriaRoleCheck),
        Box::new(document::TitleCheck),
        Box::new(structure::LandmarkCheck),
        Box::new(links::LinkNameCheck),
        Box::new(forms::FormValidationCheck),
        Box::new(keyboard::FocusVisibleCheck),
        Box::new(contrast::TextSpacingCheck),
        Box::new(structure::TableCheck),
        Box::new(media::MediaCheck),
        Box::new(aria::FrameTitleCheck),
        Box::new(aria::DuplicateIdCheck),
        Box::new(document::TimingCheck),
    ]
}

pub struct RuleChecker {
    checks: Vec<Box<dyn Check>>,
}

impl RuleChecker {
    /// Default battery filtered by target level and the disabled list
    pub fn new(config: &CheckConfig) -> Self {
        let checks = default_checks()
            .into_iter()
            .filter(|c| c.level() <= config.target_level)
            .filter(|c| !config.disabled.iter().any(|d| d == c.name()))
            .collect();
        Self { checks }
    }

    pub fn with_checks(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check against one page
    pub fn run(&self, page: &PageSnapshot) -> CheckReport {
        let mut findings = FindingSet::new();

        if let PageStatus::Unavailable { reason } = &page.status {
            findings.add(
                Finding::warning(
                    PAGE_UNAVAILABLE,
                    &format!("Page could not be loaded: {}", reason),
                    &page.url,
                )
                .with_severity(Severity::Moderate),
            );
            return CheckReport {
                url: page.url.clone(),
                timestamp: Utc::now(),
                findings,
            };
        }

        for check in &self.checks {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| check.run(page))) {
                Ok(result) => result,
                Err(payload) => Err(CheckError::Panicked(panic_message(payload.as_ref()))),
            };
            match outcome {
                Ok(found) => {
                    debug!("{} produced {} findings on {}", check.name(), found.len(), page.url);
                    findings.extend(found);
                }
                Err(e) => {
                    warn!(url = %page.url, check = %check.name(), error = %e, "Check failed");
                    findings.add(
                        Finding::warning(
                            CHECK_ERROR,
                            &format!("Check '{}' failed: {}", check.name(), e),
                            &page.url,
                        )
                        .with_severity(Severity::Minor),
                    );
                }
            }
        }

        CheckReport {
            url: page.url.clone(),
            timestamp: Utc::now(),
            findings,
        }
    }

    pub fn run_all(&self, pages: &[PageSnapshot]) -> Vec<CheckReport> {
        pages.iter().map(|p| self.run(p)).collect()
    }
}

/// Case-insensitive substring match against a list
pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Snapshot of inline markup, for check tests
#[cfg(test)]
pub(crate) fn snapshot(html: &str) -> PageSnapshot {
    use crate::config::ExtractConfig;
    use crate::extractor::PageExtractor;
    use crate::fetch::FetchedPage;

    let page = FetchedPage::from_markup("https://example.com/", html);
    PageExtractor::new(ExtractConfig::default()).extract_html(&page)
}

/// Finding types in emission order, for check tests
#[cfg(test)]
pub(crate) fn types(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.finding_type.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingKind;

    struct Boom;

    impl Check for Boom {
        fn name(&self) -> &str {
            "boom"
        }
        fn description(&self) -> &str {
            "always panics"
        }
        fn run(&self, _page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
            panic!("exploded")
        }
    }

    struct Broken;

    impl Check for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always errors"
        }
        fn run(&self, _page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
            Err(CheckError::Failed("bad input".to_string()))
        }
    }

    struct Fine;

    impl Check for Fine {
        fn name(&self) -> &str {
            "fine"
        }
        fn description(&self) -> &str {
            "always passes"
        }
        fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
            Ok(vec![Finding::passed("fine", "ok", &page.url)])
        }
    }

    fn page() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com/".to_string(),
            ..PageSnapshot::default()
        }
    }

    #[test]
    fn test_failing_checks_are_isolated() {
        let checker = RuleChecker::with_checks(vec![Box::new(Boom), Box::new(Broken), Box::new(Fine)]);
        let report = checker.run(&page());
        assert_eq!(report.findings.warnings.len(), 2);
        assert!(report.findings.warnings.iter().all(|f| f.finding_type == CHECK_ERROR));
        assert!(report.findings.warnings[0].message.contains("boom"));
        assert!(report.findings.warnings[0].message.contains("exploded"));
        assert!(report.findings.warnings[1].message.contains("bad input"));
        assert_eq!(report.findings.passed.len(), 1);
    }

    #[test]
    fn test_unavailable_page_yields_single_warning() {
        let checker = RuleChecker::new(&CheckConfig::default());
        let report = checker.run(&PageSnapshot::unavailable("https://example.com/x", "HTTP 500"));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings.warnings[0].finding_type, PAGE_UNAVAILABLE);
        assert_eq!(report.findings.warnings[0].kind, FindingKind::Warning);
    }

    #[test]
    fn test_config_filters_battery() {
        let all = RuleChecker::new(&CheckConfig::default());
        assert_eq!(all.check_names().len(), default_checks().len());

        let config = CheckConfig {
            target_level: WcagLevel::A,
            disabled: vec!["contrast".to_string()],
        };
        let reduced = RuleChecker::new(&config);
        assert!(!reduced.check_names().contains(&"contrast"));
        assert!(!reduced.check_names().contains(&"text_spacing"));
        assert!(reduced.check_names().contains(&"images"));
    }
}
