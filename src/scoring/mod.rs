// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scoring Engine.
//!
//! Per module: criterion statuses -> contributions -> raw mean -> UX
//! transform -> compliance level -> assessment. The overall score is the
//! principle-weighted mean of module scores. Everything here is a pure
//! function of its inputs and the [`ScoringConfig`].

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::criteria::{CriterionStatus, Principle, WcagCategories};
use crate::finding::{Severity, WcagLevel};

/// Compliance verdict derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "PARTIAL")]
    Partial,
    #[serde(rename = "NONE")]
    None,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::Aaa => "AAA",
            ComplianceLevel::Aa => "AA",
            ComplianceLevel::A => "A",
            ComplianceLevel::Partial => "PARTIAL",
            ComplianceLevel::None => "NONE",
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a module's criteria evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    #[serde(alias = "criterion", alias = "id")]
    pub criterion_id: String,
    pub status: CriterionStatus,
    /// Severity of a failed criterion; major when absent
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    pub warnings: usize,
    pub total: usize,
}

impl ScoreDetails {
    fn failure_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleScoreResult {
    pub module: String,
    /// UX-adjusted score in [floor, 100]
    pub score: f64,
    /// Mean contribution before the UX transform
    pub raw_score: f64,
    pub compliance_level: ComplianceLevel,
    pub assessment: String,
    pub details: ScoreDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScoreResult {
    pub score: f64,
    pub compliance_level: ComplianceLevel,
    pub assessment: String,
    pub details: ScoreDetails,
    pub total_modules: usize,
}

/// Scores of the four principle modules plus the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub perceivable: ModuleScoreResult,
    pub operable: ModuleScoreResult,
    pub understandable: ModuleScoreResult,
    pub robust: ModuleScoreResult,
    pub overall: OverallScoreResult,
}

impl Scores {
    pub fn modules(&self) -> [&ModuleScoreResult; 4] {
        [&self.perceivable, &self.operable, &self.understandable, &self.robust]
    }
}

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    fn severity_weight(&self, severity: Severity) -> f64 {
        let w = &self.config.severity_weights;
        match severity {
            Severity::Critical => w.critical,
            Severity::Major => w.major,
            Severity::Moderate => w.moderate,
            Severity::Minor => w.minor,
        }
    }

    /// Points one criterion contributes to the raw score
    pub fn contribution(&self, evaluation: &CriterionEvaluation) -> f64 {
        match evaluation.status {
            CriterionStatus::Passed => 100.0,
            CriterionStatus::Failed => {
                let weight = self.severity_weight(evaluation.severity.unwrap_or_default());
                (100.0 - weight * 100.0).max(0.0)
            }
            CriterionStatus::Partial => self.config.partial_score,
            CriterionStatus::Warning => self.config.warning_score,
            CriterionStatus::Unknown => self.config.unknown_score,
        }
    }

    /// Map a raw score onto [floor, 100]; the bonus applies only to
    /// modules with evaluated criteria
    pub fn ux_adjust(&self, raw_score: f64, failure_rate: Option<f64>) -> f64 {
        let c = &self.config;
        let mut score = c.ux_floor + raw_score.clamp(0.0, 100.0) * c.ux_scale;
        if let Some(rate) = failure_rate {
            if rate < c.large_bonus_below {
                score += c.large_bonus;
            } else if rate < c.small_bonus_below {
                score += c.small_bonus;
            }
        }
        score.clamp(c.ux_floor, 100.0)
    }

    pub fn compliance_level(&self, score: f64, failed: usize, total: usize) -> ComplianceLevel {
        if total > 0 && failed as f64 / total as f64 > self.config.max_failure_ratio {
            return ComplianceLevel::None;
        }
        let t = &self.config.level_thresholds;
        if score >= t.aaa {
            ComplianceLevel::Aaa
        } else if score >= t.aa {
            ComplianceLevel::Aa
        } else if score >= t.a {
            ComplianceLevel::A
        } else if score >= t.partial {
            ComplianceLevel::Partial
        } else {
            ComplianceLevel::None
        }
    }

    pub fn score_module(&self, module: &str, evaluations: &[CriterionEvaluation]) -> ModuleScoreResult {
        let mut details = ScoreDetails {
            total: evaluations.len(),
            ..ScoreDetails::default()
        };
        for e in evaluations {
            match e.status {
                CriterionStatus::Passed => details.passed += 1,
                CriterionStatus::Failed => details.failed += 1,
                CriterionStatus::Partial => details.partial += 1,
                CriterionStatus::Warning => details.warnings += 1,
                CriterionStatus::Unknown => {}
            }
        }

        let raw_score = if evaluations.is_empty() {
            0.0
        } else {
            evaluations.iter().map(|e| self.contribution(e)).sum::<f64>() / evaluations.len() as f64
        };
        let failure_rate = (details.total > 0).then(|| details.failure_ratio());
        let score = round2(self.ux_adjust(raw_score, failure_rate));
        let compliance_level = self.compliance_level(score, details.failed, details.total);

        ModuleScoreResult {
            module: module.to_string(),
            score,
            raw_score: round2(raw_score),
            compliance_level,
            assessment: assessment(module, compliance_level, &details),
            details,
        }
    }

    fn principle_weight(&self, module: &str) -> f64 {
        let w = &self.config.principle_weights;
        match Principle::from_identifier(module) {
            Some(Principle::Perceivable) => w.perceivable,
            Some(Principle::Operable) => w.operable,
            Some(Principle::Understandable) => w.understandable,
            Some(Principle::Robust) => w.robust,
            None => w.unrecognized,
        }
    }

    pub fn overall(&self, modules: &[ModuleScoreResult]) -> OverallScoreResult {
        let mut details = ScoreDetails::default();
        for m in modules {
            details.passed += m.details.passed;
            details.failed += m.details.failed;
            details.partial += m.details.partial;
            details.warnings += m.details.warnings;
            details.total += m.details.total;
        }

        let total_weight: f64 = modules.iter().map(|m| self.principle_weight(&m.module)).sum();
        let score = if modules.is_empty() || total_weight <= 0.0 {
            self.config.ux_floor
        } else {
            modules
                .iter()
                .map(|m| self.principle_weight(&m.module) * m.score)
                .sum::<f64>()
                / total_weight
        };
        let score = round2(score);
        let compliance_level = self.compliance_level(score, details.failed, details.total);

        OverallScoreResult {
            score,
            compliance_level,
            assessment: assessment("overall", compliance_level, &details),
            details,
            total_modules: modules.len(),
        }
    }

    /// Criteria evaluation of one principle module, up to the target level
    pub fn evaluations(
        &self,
        categories: &WcagCategories,
        principle: Principle,
        target: WcagLevel,
    ) -> Vec<CriterionEvaluation> {
        categories
            .principle(principle)
            .criteria()
            .filter(|c| c.conformance_level <= target)
            .filter(|c| self.config.include_unknown_criteria || c.status != CriterionStatus::Unknown)
            .map(|c| CriterionEvaluation {
                criterion_id: c.id.clone(),
                status: c.status,
                severity: c.severity,
            })
            .collect()
    }

    /// Score all four principle modules and the overall result
    pub fn score(&self, categories: &WcagCategories, target: WcagLevel) -> Scores {
        let module = |p: Principle| self.score_module(p.as_str(), &self.evaluations(categories, p, target));
        let perceivable = module(Principle::Perceivable);
        let operable = module(Principle::Operable);
        let understandable = module(Principle::Understandable);
        let robust = module(Principle::Robust);
        let overall = self.overall(&[
            perceivable.clone(),
            operable.clone(),
            understandable.clone(),
            robust.clone(),
        ]);
        Scores {
            perceivable,
            operable,
            understandable,
            robust,
            overall,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn assessment(module: &str, level: ComplianceLevel, details: &ScoreDetails) -> String {
    if details.total == 0 {
        return format!("No {} criteria could be evaluated", module);
    }
    let verdict = match level {
        ComplianceLevel::Aaa => "Excellent accessibility, consistent with WCAG AAA",
        ComplianceLevel::Aa => "Good accessibility, consistent with WCAG AA",
        ComplianceLevel::A => "Basic accessibility, consistent with WCAG A",
        ComplianceLevel::Partial => "Partial accessibility with significant barriers",
        ComplianceLevel::None => "Major accessibility barriers",
    };
    format!(
        "{} ({}): {} of {} criteria passed, {} failed, {} partial, {} with warnings",
        verdict, module, details.passed, details.total, details.failed, details.partial, details.warnings
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default())
    }

    fn eval(status: CriterionStatus, severity: Option<Severity>) -> CriterionEvaluation {
        CriterionEvaluation {
            criterion_id: "1.1.1".to_string(),
            status,
            severity,
        }
    }

    #[test]
    fn test_contributions() {
        let e = engine();
        assert_eq!(e.contribution(&eval(CriterionStatus::Passed, None)), 100.0);
        assert_eq!(e.contribution(&eval(CriterionStatus::Failed, Some(Severity::Critical))), 0.0);
        assert!((e.contribution(&eval(CriterionStatus::Failed, None)) - 30.0).abs() < 1e-9);
        assert!((e.contribution(&eval(CriterionStatus::Failed, Some(Severity::Minor))) - 80.0).abs() < 1e-9);
        assert_eq!(e.contribution(&eval(CriterionStatus::Partial, None)), 65.0);
        assert_eq!(e.contribution(&eval(CriterionStatus::Warning, None)), 65.0);
        assert_eq!(e.contribution(&eval(CriterionStatus::Unknown, None)), 30.0);
    }

    #[test]
    fn test_ux_transform_bounds_and_monotonicity() {
        let e = engine();
        let mut previous = f64::MIN;
        for raw in 0..=100 {
            let adjusted = e.ux_adjust(raw as f64, None);
            assert!((25.0..=100.0).contains(&adjusted));
            assert!(adjusted >= previous);
            previous = adjusted;
        }
        assert_eq!(e.ux_adjust(-50.0, None), 25.0);
        assert_eq!(e.ux_adjust(100.0, Some(0.0)), 100.0);
        assert_eq!(e.ux_adjust(60.0, Some(0.15)), 25.0 + 45.0 + 5.0);
        assert_eq!(e.ux_adjust(60.0, Some(0.05)), 25.0 + 45.0 + 10.0);
        assert_eq!(e.ux_adjust(60.0, Some(0.30)), 70.0);
    }

    #[test]
    fn test_compliance_boundaries() {
        let e = engine();
        assert_eq!(e.compliance_level(89.9, 0, 10), ComplianceLevel::Aa);
        assert_eq!(e.compliance_level(90.0, 0, 10), ComplianceLevel::Aaa);
        assert_eq!(e.compliance_level(65.0, 0, 10), ComplianceLevel::A);
        assert_eq!(e.compliance_level(40.0, 0, 10), ComplianceLevel::Partial);
        assert_eq!(e.compliance_level(39.9, 0, 10), ComplianceLevel::None);
        assert_eq!(e.compliance_level(95.0, 51, 100), ComplianceLevel::None);
        assert_eq!(e.compliance_level(95.0, 50, 100), ComplianceLevel::Aaa);
    }

    #[test]
    fn test_score_module() {
        let e = engine();
        let evals = vec![
            eval(CriterionStatus::Passed, None),
            eval(CriterionStatus::Passed, None),
            eval(CriterionStatus::Passed, None),
            eval(CriterionStatus::Failed, Some(Severity::Major)),
        ];
        let result = e.score_module("perceivable", &evals);
        // raw = (300 + 30) / 4 = 82.5; 25 + 61.875 = 86.875; no bonus at 25% failures
        assert_eq!(result.raw_score, 82.5);
        assert_eq!(result.score, 86.88);
        assert_eq!(result.compliance_level, ComplianceLevel::Aa);
        assert_eq!(result.details.failed, 1);
        assert_eq!(result.details.total, 4);
        assert!(result.assessment.contains("3 of 4"));
    }

    #[test]
    fn test_empty_module_scores_floor() {
        let result = engine().score_module("robust", &[]);
        assert_eq!(result.score, 25.0);
        assert_eq!(result.compliance_level, ComplianceLevel::None);
    }

    #[test]
    fn test_overall_weighting() {
        let e = engine();
        let module = |name: &str, score: f64, failed: usize| ModuleScoreResult {
            module: name.to_string(),
            score,
            raw_score: score,
            compliance_level: ComplianceLevel::A,
            assessment: String::new(),
            details: ScoreDetails {
                passed: 2,
                failed,
                partial: 0,
                warnings: 1,
                total: 3 + failed,
            },
        };
        let overall = e.overall(&[
            module("perceivable", 100.0, 0),
            module("operable", 50.0, 1),
            module("understandable", 80.0, 0),
            module("robust", 60.0, 0),
        ]);
        // (30 + 15 + 20 + 9) / 1.0
        assert_eq!(overall.score, 74.0);
        assert_eq!(overall.total_modules, 4);
        assert_eq!(overall.details.passed, 8);
        assert_eq!(overall.details.failed, 1);
        assert_eq!(overall.details.total, 13);

        let unknown = e.overall(&[module("seo", 40.0, 0), module("perceivable", 100.0, 0)]);
        // (0.25 * 40 + 0.30 * 100) / 0.55
        assert!((unknown.score - 72.73).abs() < 0.01);
    }

    #[test]
    fn test_evaluation_deserializes_leniently() {
        let e: CriterionEvaluation =
            serde_json::from_str(r#"{"criterion":"1.4.3","status":"FAILED","severity":"critical"}"#).unwrap();
        assert_eq!(e.criterion_id, "1.4.3");
        assert_eq!(e.severity, Some(Severity::Critical));
    }
}
