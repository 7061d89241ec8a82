// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot - WCAG 2.1 website accessibility auditor
//!
//! Crawls a site into typed page snapshots, runs an isolated battery of
//! rule checks against each snapshot, maps the findings onto the WCAG 2.1
//! principle / guideline / criterion taxonomy and produces UX-calibrated
//! module and overall scores. A page-count consensus over sitemap,
//! robots.txt and crawl signals sizes the site alongside the crawl.
//!
//! ## Pipeline
//!
//! - **Extractor**: one fetched page to a [`model::PageSnapshot`]
//! - **Checks** (1.1.1 to 4.1.2): alt text, keyboard, skip links, headings,
//!   contrast, forms, language, viewport, ARIA, titles, landmarks, links,
//!   focus visibility, text spacing, tables, media, frames, ids, timing
//! - **Criteria**: findings and snapshot observations by principle and level
//! - **Scoring**: severity-weighted, principle-weighted, floor of 25
//! - **Discovery**: sitemap / robots / crawl arbitration

pub mod analysis;
pub mod checks;
pub mod color;
pub mod config;
pub mod crawler;
pub mod criteria;
pub mod discovery;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod finding;
pub mod model;
pub mod narrative;
pub mod report;
pub mod scanner;
pub mod scoring;
pub mod storage;

pub use analysis::{analyze_snapshots, AnalysisResult, Auditor};
pub use error::{AuditError, Result, WcagbotError};
