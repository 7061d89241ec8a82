// SPDX-License-Identifier: PMPL-1.0-or-later
//! Outermost orchestration: crawl, check, categorize, score.
//!
//! [`analyze_snapshots`] is the pure core and needs no network. [`Auditor`]
//! wraps it with the crawl, the optional page-count consensus, narrative
//! enrichment and persistence. Only fatal input errors reach the caller,
//! as a structured [`AuditError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::checks::RuleChecker;
use crate::config::Config;
use crate::crawler::Crawler;
use crate::criteria::{bucket_by_level, categorize, ConformanceLevels, Principle, WcagCategories};
use crate::discovery::{PageCountEstimate, PageCounter};
use crate::error::{AuditError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::finding::{Finding, FindingSet, WcagLevel};
use crate::model::{PageSnapshot, PageStatus};
use crate::narrative::{HttpNarrativeProvider, NarrativeAnalysis, NarrativeProvider, NarrativeRequest, NoNarrative};
use crate::scoring::{Scores, ScoringEngine};
use crate::storage::{record_progress, record_result, JsonFileSink, NullSink, ResultSink};

/// Per-page summary carried in the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: Option<String>,
    pub available: bool,
    /// Extraction sub-steps that failed on this page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extraction_errors: Vec<String>,
}

impl From<&PageSnapshot> for PageInfo {
    fn from(page: &PageSnapshot) -> Self {
        Self {
            url: page.url.clone(),
            title: page.title.clone(),
            available: matches!(page.status, PageStatus::Available),
            extraction_errors: page.extraction_errors.clone(),
        }
    }
}

/// Complete output of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub job_id: Uuid,
    /// Audited URL, or the scanned directory
    pub target: String,
    pub analyzed_at: DateTime<Utc>,
    pub target_level: WcagLevel,
    pub pages: Vec<PageInfo>,
    pub violations: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub passed: Vec<Finding>,
    pub wcag_categories: WcagCategories,
    pub conformance_levels: ConformanceLevels,
    pub scores: Scores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<PageCountEstimate>,
    /// Narrative enrichment keyed by module
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub narratives: BTreeMap<String, NarrativeAnalysis>,
}

impl AnalysisResult {
    /// All findings as one set
    pub fn findings(&self) -> FindingSet {
        FindingSet {
            violations: self.violations.clone(),
            warnings: self.warnings.clone(),
            passed: self.passed.clone(),
        }
    }
}

/// Check, categorize and score already-extracted pages
pub fn analyze_snapshots(target: &str, snapshots: &[PageSnapshot], config: &Config) -> AnalysisResult {
    let checker = RuleChecker::new(&config.checks);
    let mut findings = FindingSet::new();
    for report in checker.run_all(snapshots) {
        findings.merge(report.findings);
    }

    let wcag_categories = categorize(&findings, snapshots);
    let conformance_levels = bucket_by_level(&wcag_categories);
    let target_level = config.checks.target_level;
    let scores = ScoringEngine::new(config.scoring.clone()).score(&wcag_categories, target_level);

    info!(
        "Analyzed {}: {} pages, {} violations, {} warnings, overall {:.1} ({})",
        target,
        snapshots.len(),
        findings.violations.len(),
        findings.warnings.len(),
        scores.overall.score,
        scores.overall.compliance_level
    );

    AnalysisResult {
        job_id: Uuid::new_v4(),
        target: target.to_string(),
        analyzed_at: Utc::now(),
        target_level,
        pages: snapshots.iter().map(PageInfo::from).collect(),
        violations: findings.violations,
        warnings: findings.warnings,
        passed: findings.passed,
        wcag_categories,
        conformance_levels,
        scores,
        page_count: None,
        narratives: BTreeMap::new(),
    }
}

/// Validate an audit target
pub fn parse_target(url: &str) -> std::result::Result<Url, AuditError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AuditError::MissingUrl);
    }
    let parsed = Url::parse(trimmed).map_err(|e| AuditError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AuditError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed)
}

pub struct Auditor {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    /// Used by the page-count signals, with the discovery timeouts
    discovery_fetcher: Arc<dyn Fetcher>,
    narrative: Box<dyn NarrativeProvider>,
    sink: Box<dyn ResultSink>,
    count_pages: bool,
}

impl Auditor {
    /// Auditor with the HTTP fetcher and the configured collaborators
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            &config.crawl.user_agent,
            config.crawl.request_timeout_secs,
        )?);
        let discovery_fetcher = Arc::new(HttpFetcher::new(
            &config.discovery.user_agent,
            config.discovery.request_timeout_secs,
        )?);
        let narrative = HttpNarrativeProvider::from_config(&config.narrative)?;
        let sink = JsonFileSink::from_config(&config.storage);
        Ok(Self {
            config,
            fetcher,
            discovery_fetcher,
            narrative,
            sink,
            count_pages: false,
        })
    }

    /// Auditor over a custom fetcher, without narrative or persistence
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            discovery_fetcher: Arc::clone(&fetcher),
            fetcher,
            narrative: Box::new(NoNarrative),
            sink: Box::new(NullSink),
            count_pages: false,
        }
    }

    pub fn with_narrative(mut self, narrative: Box<dyn NarrativeProvider>) -> Self {
        self.narrative = narrative;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Also run the page-count consensus alongside the crawl
    pub fn with_page_count(mut self, enabled: bool) -> Self {
        self.count_pages = enabled;
        self
    }

    /// Page-count consensus only
    pub async fn count_pages(&self, url: &str) -> std::result::Result<PageCountEstimate, AuditError> {
        let target = parse_target(url)?;
        self.page_counter()
            .estimate(target.as_str())
            .await
            .map_err(|e| AuditError::InvalidUrl {
                url: url.trim().to_string(),
                reason: e.to_string(),
            })
    }

    fn page_counter(&self) -> PageCounter {
        PageCounter::new(Arc::clone(&self.discovery_fetcher), self.config.discovery.clone())
    }

    /// Audit the site at `url`
    pub async fn audit(&self, url: &str) -> std::result::Result<AnalysisResult, AuditError> {
        let target = parse_target(url)?;
        let job_id = Uuid::new_v4();
        let sink = self.sink.as_ref();
        record_progress(sink, job_id, "crawl", 0).await;

        let crawler = Crawler::new(
            Arc::clone(&self.fetcher),
            self.config.crawl.clone(),
            self.config.extract.clone(),
        );
        let (snapshots, page_count) = if self.count_pages {
            let counter = self.page_counter();
            let (snapshots, estimate) = tokio::join!(crawler.crawl(&target), counter.estimate(target.as_str()));
            let estimate = match estimate {
                Ok(estimate) => Some(estimate),
                Err(e) => {
                    warn!(url = %target, error = %e, "Page-count consensus failed");
                    None
                }
            };
            (snapshots, estimate)
        } else {
            (crawler.crawl(&target).await, None)
        };

        match snapshots.first().map(|p| &p.status) {
            Some(PageStatus::Available) => {}
            Some(PageStatus::Unavailable { reason }) => {
                return Err(AuditError::Unreachable {
                    url: target.to_string(),
                    reason: reason.clone(),
                })
            }
            None => {
                return Err(AuditError::Unreachable {
                    url: target.to_string(),
                    reason: "no page was fetched".to_string(),
                })
            }
        }

        record_progress(sink, job_id, "check", 40).await;
        let mut result = analyze_snapshots(target.as_str(), &snapshots, &self.config);
        result.job_id = job_id;
        result.page_count = page_count;

        record_progress(sink, job_id, "narrative", 70).await;
        result.narratives = self.narrate(&snapshots, &result.wcag_categories).await;

        for module in result.scores.modules() {
            record_result(sink, job_id, &module.module, module, None).await;
        }
        record_result(sink, job_id, "overall", &result.scores.overall, None).await;
        record_progress(sink, job_id, "done", 100).await;

        Ok(result)
    }

    async fn narrate(
        &self,
        snapshots: &[PageSnapshot],
        categories: &WcagCategories,
    ) -> BTreeMap<String, NarrativeAnalysis> {
        let mut narratives = BTreeMap::new();
        if !self.narrative.enabled() {
            return narratives;
        }
        let website = serde_json::to_value(snapshots).unwrap_or(Value::Null);
        for principle in Principle::ALL {
            let request = NarrativeRequest {
                wcag_area: principle.as_str().to_string(),
                complete_website_data: website.clone(),
                complete_accessibility_data: serde_json::to_value(categories.principle(principle))
                    .unwrap_or(Value::Null),
            };
            match self.narrative.narrate(&request).await {
                Ok(Some(analysis)) => {
                    narratives.insert(principle.as_str().to_string(), analysis);
                }
                Ok(None) => {}
                Err(e) => warn!(area = %principle, error = %e, "Narrative request failed"),
            }
        }
        narratives
    }
}
