// SPDX-License-Identifier: PMPL-1.0-or-later
//! Criteria Mapper: the WCAG 2.1 taxonomy, the finding-type lookup table,
//! principle categorization and conformance-level bucketing.

pub mod categorize;
pub mod conformance;
pub mod mapping;
pub mod taxonomy;

pub use categorize::{
    categorize, CriterionStatus, GuidelineBucket, Observation, PrincipleCategory, WcagCategories, WcagCriterion,
};
pub use conformance::{bucket_by_level, ConformanceLevels, LevelBucket, StatusCounts};
pub use mapping::criterion_for;
pub use taxonomy::{criterion, CriterionInfo, Principle, CRITERIA};
