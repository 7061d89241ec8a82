// SPDX-License-Identifier: PMPL-1.0-or-later
//! Principle categorization: findings and snapshot observations grouped
//! into principle -> guideline -> criterion buckets.
//!
//! Output is built from `BTreeMap`s and input order only, so categorizing
//! the same input twice serializes to identical bytes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::mapping::criterion_for;
use super::taxonomy::{criterion, CriterionInfo, Principle, CRITERIA};
use crate::finding::{Finding, FindingKind, FindingSet, Severity, WcagLevel};
use crate::model::{MediaKind, PageSnapshot};

/// Evaluation status of one criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionStatus {
    Passed,
    Failed,
    Partial,
    Warning,
    Unknown,
}

impl CriterionStatus {
    /// Status from the kinds of findings a criterion collected
    pub fn from_findings(findings: &[Finding]) -> Self {
        let has = |kind| findings.iter().any(|f| f.kind == kind);
        match (has(FindingKind::Violation), has(FindingKind::Warning), has(FindingKind::Passed)) {
            (true, _, true) => CriterionStatus::Partial,
            (true, _, false) => CriterionStatus::Failed,
            (false, true, _) => CriterionStatus::Warning,
            (false, false, true) => CriterionStatus::Passed,
            (false, false, false) => CriterionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionStatus::Passed => "PASSED",
            CriterionStatus::Failed => "FAILED",
            CriterionStatus::Partial => "PARTIAL",
            CriterionStatus::Warning => "WARNING",
            CriterionStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A success criterion with the findings mapped to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WcagCriterion {
    pub id: String,
    pub name: String,
    pub principle: Principle,
    pub guideline: String,
    pub conformance_level: WcagLevel,
    pub status: CriterionStatus,
    /// Worst violation severity, for failed and partial criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub findings: Vec<Finding>,
}

impl WcagCriterion {
    fn empty(info: &CriterionInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name.to_string(),
            principle: info.principle,
            guideline: info.guideline.to_string(),
            conformance_level: info.level,
            status: CriterionStatus::Unknown,
            severity: None,
            findings: Vec::new(),
        }
    }

    fn settle(&mut self) {
        self.status = CriterionStatus::from_findings(&self.findings);
        self.severity = self
            .findings
            .iter()
            .filter(|f| f.kind == FindingKind::Violation)
            .map(|f| f.severity)
            .min();
    }
}

/// Aggregate fact re-scanned from snapshots, not covered by any finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub key: String,
    pub count: usize,
    pub detail: String,
}

impl Observation {
    fn new(key: &str, count: usize, detail: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            count,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidelineBucket {
    /// Criteria keyed by id
    pub criteria: BTreeMap<String, WcagCriterion>,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipleCategory {
    pub guidelines: BTreeMap<String, GuidelineBucket>,
}

impl PrincipleCategory {
    pub fn criteria(&self) -> impl Iterator<Item = &WcagCriterion> {
        self.guidelines.values().flat_map(|g| g.criteria.values())
    }
}

/// Findings and observations organized by WCAG principle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcagCategories {
    pub perceivable: PrincipleCategory,
    pub operable: PrincipleCategory,
    pub understandable: PrincipleCategory,
    pub robust: PrincipleCategory,
    /// Findings whose type maps to no criterion
    pub uncategorized: Vec<Finding>,
}

impl WcagCategories {
    pub fn principle(&self, principle: Principle) -> &PrincipleCategory {
        match principle {
            Principle::Perceivable => &self.perceivable,
            Principle::Operable => &self.operable,
            Principle::Understandable => &self.understandable,
            Principle::Robust => &self.robust,
        }
    }

    fn principle_mut(&mut self, principle: Principle) -> &mut PrincipleCategory {
        match principle {
            Principle::Perceivable => &mut self.perceivable,
            Principle::Operable => &mut self.operable,
            Principle::Understandable => &mut self.understandable,
            Principle::Robust => &mut self.robust,
        }
    }

    /// Every criterion, in principle then guideline then id order
    pub fn criteria(&self) -> impl Iterator<Item = &WcagCriterion> {
        Principle::ALL.into_iter().flat_map(move |p| self.principle(p).criteria())
    }

    pub fn get(&self, id: &str) -> Option<&WcagCriterion> {
        let info = criterion(id)?;
        self.principle(info.principle)
            .guidelines
            .get(info.guideline)?
            .criteria
            .get(id)
    }

    fn bucket_mut(&mut self, principle: Principle, guideline: &str) -> &mut GuidelineBucket {
        self.principle_mut(principle)
            .guidelines
            .entry(guideline.to_string())
            .or_default()
    }
}

/// Classify findings and snapshots into the WCAG taxonomy
pub fn categorize(findings: &FindingSet, snapshots: &[PageSnapshot]) -> WcagCategories {
    let mut categories = WcagCategories::default();

    for info in CRITERIA {
        categories
            .bucket_mut(info.principle, info.guideline)
            .criteria
            .insert(info.id.to_string(), WcagCriterion::empty(info));
    }

    for finding in findings.iter() {
        let target = criterion_for(&finding.finding_type).and_then(criterion);
        let Some(info) = target else {
            categories.uncategorized.push(finding.clone());
            continue;
        };
        if let Some(c) = categories
            .bucket_mut(info.principle, info.guideline)
            .criteria
            .get_mut(info.id)
        {
            c.findings.push(finding.clone());
        }
    }

    for principle in Principle::ALL {
        for bucket in categories.principle_mut(principle).guidelines.values_mut() {
            for c in bucket.criteria.values_mut() {
                c.settle();
            }
        }
    }

    for (principle, guideline, observation) in observe(snapshots) {
        categories.bucket_mut(principle, guideline).observations.push(observation);
    }
    categories
}

/// Snapshot-only observations, attached to their guideline
fn observe(snapshots: &[PageSnapshot]) -> Vec<(Principle, &'static str, Observation)> {
    let pages: Vec<&PageSnapshot> = snapshots.iter().filter(|s| s.is_available()).collect();
    if pages.is_empty() {
        return Vec::new();
    }
    let sum = |f: &dyn Fn(&PageSnapshot) -> usize| pages.iter().map(|p| f(p)).sum::<usize>();
    let mut out = Vec::new();

    let images = sum(&|p| p.structure.images.len());
    let decorative = sum(&|p| p.structure.images.iter().filter(|i| i.is_decorative()).count());
    out.push((
        Principle::Perceivable,
        "text_alternatives",
        Observation::new(
            "images",
            images,
            format!("{} informative, {} decorative", images - decorative, decorative),
        ),
    ));

    let videos = sum(&|p| p.structure.media.iter().filter(|m| m.kind == MediaKind::Video).count());
    let audios = sum(&|p| p.structure.media.iter().filter(|m| m.kind == MediaKind::Audio).count());
    out.push((
        Principle::Perceivable,
        "time_based_media",
        Observation::new("media", videos + audios, format!("{} video, {} audio", videos, audios)),
    ));

    let headings = sum(&|p| p.structure.headings.len());
    let mut levels = [0usize; 6];
    for h in pages.iter().flat_map(|p| p.structure.headings.iter()) {
        if let Some(slot) = levels.get_mut(usize::from(h.level.clamp(1, 6)) - 1) {
            *slot += 1;
        }
    }
    let level_detail: Vec<String> = levels
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .map(|(i, n)| format!("h{}: {}", i + 1, n))
        .collect();
    out.push((
        Principle::Perceivable,
        "adaptable",
        Observation::new("headings", headings, level_detail.join(", ")),
    ));

    let roles: BTreeSet<&str> = pages
        .iter()
        .flat_map(|p| p.structure.landmarks.iter().map(|l| l.role.as_str()))
        .collect();
    out.push((
        Principle::Perceivable,
        "adaptable",
        Observation::new(
            "landmarks",
            sum(&|p| p.structure.landmarks.len()),
            roles.into_iter().collect::<Vec<_>>().join(", "),
        ),
    ));
    let tables = sum(&|p| p.structure.tables.len());
    let layout = sum(&|p| p.structure.tables.iter().filter(|t| t.is_layout).count());
    out.push((
        Principle::Perceivable,
        "adaptable",
        Observation::new("tables", tables, format!("{} layout", layout)),
    ));
    out.push((
        Principle::Perceivable,
        "adaptable",
        Observation::new("lists", sum(&|p| p.structure.lists.len()), ""),
    ));

    let checked = sum(&|p| p.styling.contrast_stats.elements_checked);
    let issues = sum(&|p| p.styling.contrast_stats.issues_found);
    out.push((
        Principle::Perceivable,
        "distinguishable",
        Observation::new("contrast_samples", checked, format!("{} below threshold", issues)),
    ));

    out.push((
        Principle::Operable,
        "keyboard_accessible",
        Observation::new("focus_stops", sum(&|p| p.accessibility.tab_order.len()), ""),
    ));
    out.push((
        Principle::Operable,
        "navigable",
        Observation::new(
            "links",
            sum(&|p| p.structure.links.len()),
            format!("{} internal", sum(&|p| p.structure.links.iter().filter(|l| l.is_internal).count())),
        ),
    ));

    let declared = pages.iter().filter(|p| p.language.is_some()).count();
    let langs: BTreeSet<&str> = pages.iter().filter_map(|p| p.language.as_deref()).collect();
    out.push((
        Principle::Understandable,
        "readable",
        Observation::new(
            "declared_languages",
            declared,
            langs.into_iter().collect::<Vec<_>>().join(", "),
        ),
    ));

    let fields = sum(&|p| p.structure.all_fields().count());
    out.push((
        Principle::Understandable,
        "input_assistance",
        Observation::new(
            "form_fields",
            fields,
            format!("{} forms", sum(&|p| p.structure.forms.len())),
        ),
    ));

    let aria_roles: BTreeSet<&str> = pages
        .iter()
        .flat_map(|p| p.accessibility.aria.iter().filter_map(|a| a.role.as_deref()))
        .collect();
    out.push((
        Principle::Robust,
        "compatible",
        Observation::new(
            "aria_elements",
            sum(&|p| p.accessibility.aria.len()),
            aria_roles.into_iter().collect::<Vec<_>>().join(", "),
        ),
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(findings: Vec<Finding>) -> FindingSet {
        let mut set = FindingSet::new();
        set.extend(findings);
        set
    }

    #[test]
    fn test_missing_alt_lands_in_text_alternatives() {
        let findings = set(vec![Finding::violation("missing_alt", "no alt", "https://example.com/")]);
        let categories = categorize(&findings, &[]);
        let c = &categories.perceivable.guidelines["text_alternatives"].criteria["1.1.1"];
        assert_eq!(c.findings.len(), 1);
        assert_eq!(c.status, CriterionStatus::Failed);
        assert_eq!(c.severity, Some(Severity::Major));
    }

    #[test]
    fn test_status_rules() {
        let v = Finding::violation("x", "m", "u").with_severity(Severity::Critical);
        let w = Finding::warning("x", "m", "u");
        let p = Finding::passed("x", "m", "u");
        assert_eq!(CriterionStatus::from_findings(&[v.clone(), p.clone()]), CriterionStatus::Partial);
        assert_eq!(CriterionStatus::from_findings(&[v.clone(), w.clone()]), CriterionStatus::Failed);
        assert_eq!(CriterionStatus::from_findings(&[w.clone(), p.clone()]), CriterionStatus::Warning);
        assert_eq!(CriterionStatus::from_findings(&[p]), CriterionStatus::Passed);
        assert_eq!(CriterionStatus::from_findings(&[]), CriterionStatus::Unknown);
    }

    #[test]
    fn test_unmatched_criteria_are_unknown_not_omitted() {
        let categories = categorize(&FindingSet::new(), &[]);
        assert_eq!(categories.criteria().count(), 78);
        assert!(categories.criteria().all(|c| c.status == CriterionStatus::Unknown));
        assert_eq!(categories.get("2.5.3").map(|c| c.status), Some(CriterionStatus::Unknown));
    }

    #[test]
    fn test_uncategorized_findings_are_surfaced() {
        let findings = set(vec![
            Finding::warning("check_error", "Check 'x' failed", "u"),
            Finding::violation("heading_hierarchy", "skip", "u"),
        ]);
        let categories = categorize(&findings, &[]);
        assert_eq!(categories.uncategorized.len(), 1);
        assert_eq!(categories.get("1.3.1").unwrap().findings.len(), 1);
    }

    #[test]
    fn test_worst_severity_wins() {
        let findings = set(vec![
            Finding::violation("missing_alt", "a", "u").with_severity(Severity::Moderate),
            Finding::violation("generic_alt", "b", "u").with_severity(Severity::Critical),
        ]);
        let categories = categorize(&findings, &[]);
        assert_eq!(categories.get("1.1.1").unwrap().severity, Some(Severity::Critical));
    }

    #[test]
    fn test_observations_from_snapshots() {
        let page = crate::checks::snapshot(
            r#"<html lang="en"><body><h1>A</h1><h2>B</h2><img src="a.png" alt="">
            <img src="b.png" alt="Chart"><main><a href="/x">x</a></main></body></html>"#,
        );
        let categories = categorize(&FindingSet::new(), &[page]);
        let images = &categories.perceivable.guidelines["text_alternatives"].observations[0];
        assert_eq!(images.count, 2);
        assert_eq!(images.detail, "1 informative, 1 decorative");
        let headings = &categories.perceivable.guidelines["adaptable"].observations[0];
        assert_eq!(headings.detail, "h1: 1, h2: 1");
        let langs = &categories.understandable.guidelines["readable"].observations[0];
        assert_eq!(langs.detail, "en");
    }
}
