// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page model: the normalized, serializable snapshot of one crawled page.
//!
//! Every record is a typed struct with a fixed field set. Values the page
//! did not provide are `Option`s rather than absent keys, and every element
//! record carries an [`ElementSource`] so findings can point back at it.

pub mod accessibility;
pub mod structure;
pub mod styling;

pub use accessibility::{AccessibilityData, AriaElement, KeyboardTrap, SkipLink, TabStop};
pub use structure::{
    FormField, FormRecord, Heading, Iframe, ImageRecord, InteractiveElement, LabelSource, Landmark,
    LinkRecord, ListKind, ListRecord, MediaElement, MediaKind, PageStructure, TableRecord,
};
pub use styling::{
    ContrastSample, ContrastStats, FocusStyles, FontUsage, ResponsiveHints, StylingData, TextSpacingSample,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance of an extracted element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSource {
    /// Lowercase tag name
    pub tag: String,
    /// CSS-like path from the document root, e.g. `html > body > main > img:nth-of-type(2)`
    pub path: String,
    /// Truncated outer HTML
    pub snippet: String,
}

/// Whether the page could be fetched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Available,
    Unavailable { reason: String },
}

/// Load timing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTiming {
    pub load_time_ms: u64,
    pub redirected: bool,
}

/// Document-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// `<meta name="viewport">` content
    pub viewport: Option<String>,
    /// `<meta http-equiv="refresh">` content
    pub refresh: Option<String>,
    pub description: Option<String>,
    pub charset: Option<String>,
    /// Number of `<marquee>` / `<blink>` elements
    pub moving_elements: usize,
}

/// One crawled page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Unique key within a crawl
    pub url: String,
    pub title: Option<String>,
    /// `lang` attribute of the root element
    pub language: Option<String>,
    pub status: PageStatus,
    pub meta: PageMeta,
    pub structure: PageStructure,
    pub accessibility: AccessibilityData,
    pub styling: StylingData,
    /// Raw HTTP response headers, lowercase names
    pub headers: BTreeMap<String, String>,
    pub timing: PageTiming,
    /// Extraction sub-steps that failed and were replaced by empty results
    pub extraction_errors: Vec<String>,
}

impl PageSnapshot {
    /// Snapshot for a page that could not be fetched
    pub fn unavailable(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            status: PageStatus::Unavailable {
                reason: reason.to_string(),
            },
            ..Self::default()
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, PageStatus::Available)
    }
}
