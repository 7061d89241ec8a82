// SPDX-License-Identifier: PMPL-1.0-or-later
//! Conformance-level bucketing: the same criteria regrouped into A, AA and
//! AAA. Each level lists the criteria it adds; `meets` is cumulative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::categorize::{CriterionStatus, WcagCategories};
use crate::finding::WcagLevel;

/// Status tally over a set of criteria
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    pub warnings: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: CriterionStatus) {
        match status {
            CriterionStatus::Passed => self.passed += 1,
            CriterionStatus::Failed => self.failed += 1,
            CriterionStatus::Partial => self.partial += 1,
            CriterionStatus::Warning => self.warnings += 1,
            CriterionStatus::Unknown => self.unknown += 1,
        }
    }

    /// Criteria that were evaluated
    pub fn evaluated(&self) -> usize {
        self.passed + self.failed + self.partial + self.warnings
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelBucket {
    /// Criterion id -> status, for criteria introduced at this level
    pub criteria: BTreeMap<String, CriterionStatus>,
    pub counts: StatusCounts,
    /// No failed or partial criterion at this level or below
    pub meets: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConformanceLevels {
    #[serde(rename = "A")]
    pub a: LevelBucket,
    #[serde(rename = "AA")]
    pub aa: LevelBucket,
    #[serde(rename = "AAA")]
    pub aaa: LevelBucket,
}

impl ConformanceLevels {
    pub fn level(&self, level: WcagLevel) -> &LevelBucket {
        match level {
            WcagLevel::A => &self.a,
            WcagLevel::AA => &self.aa,
            WcagLevel::AAA => &self.aaa,
        }
    }

    /// Highest level whose cumulative criteria have no failures
    pub fn achieved(&self) -> Option<WcagLevel> {
        [WcagLevel::AAA, WcagLevel::AA, WcagLevel::A]
            .into_iter()
            .find(|l| self.level(*l).meets)
    }
}

/// Bucket categorized criteria by conformance level
pub fn bucket_by_level(categories: &WcagCategories) -> ConformanceLevels {
    let mut levels = ConformanceLevels::default();
    for c in categories.criteria() {
        let bucket = match c.conformance_level {
            WcagLevel::A => &mut levels.a,
            WcagLevel::AA => &mut levels.aa,
            WcagLevel::AAA => &mut levels.aaa,
        };
        bucket.criteria.insert(c.id.clone(), c.status);
        bucket.counts.record(c.status);
    }

    let clean = |b: &LevelBucket| b.counts.failed == 0 && b.counts.partial == 0;
    levels.a.meets = clean(&levels.a);
    levels.aa.meets = levels.a.meets && clean(&levels.aa);
    levels.aaa.meets = levels.aa.meets && clean(&levels.aaa);
    levels
}
