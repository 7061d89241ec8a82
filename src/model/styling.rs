// SPDX-License-Identifier: PMPL-1.0-or-later
//! Styling records: colors, fonts, responsive hints, contrast and text
//! spacing samples, focus styles.

use super::ElementSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylingData {
    /// Distinct text colors, hex
    pub text_colors: Vec<String>,
    /// Distinct background colors, hex
    pub background_colors: Vec<String>,
    pub fonts: Vec<FontUsage>,
    pub responsive: ResponsiveHints,
    pub contrast_samples: Vec<ContrastSample>,
    pub contrast_stats: ContrastStats,
    pub text_spacing: Vec<TextSpacingSample>,
    pub focus: FocusStyles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontUsage {
    pub family: String,
    pub elements: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveHints {
    pub has_viewport_meta: bool,
    /// `user-scalable=no` or `maximum-scale` below 2
    pub zoom_disabled: bool,
    pub media_queries: usize,
    pub uses_relative_units: bool,
    pub prefers_reduced_motion: bool,
}

/// One text element whose colors could be determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastSample {
    /// Truncated visible text
    pub text: String,
    pub foreground: String,
    pub background: String,
    pub ratio: f64,
    pub required_ratio: f64,
    pub font_size_px: f64,
    pub font_weight: u16,
    pub large_text: bool,
    pub passes: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContrastStats {
    pub elements_checked: usize,
    pub issues_found: usize,
    /// Skipped: undetermined color or too little text
    pub elements_skipped: usize,
    /// Sampling stopped at the configured cap
    pub capped: bool,
}

/// Spacing of one text block relative to its font size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpacingSample {
    pub font_size_px: f64,
    /// line-height / font-size; `None` when `normal`
    pub line_height_ratio: Option<f64>,
    pub letter_spacing_ratio: Option<f64>,
    pub word_spacing_ratio: Option<f64>,
    pub source: ElementSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStyles {
    /// Stylesheet introspection ran
    pub inspected: bool,
    /// `:focus` selectors that remove the outline with no replacement
    pub outline_removed: Vec<String>,
    /// `:focus`/`:focus-visible` rules that provide a visible indicator
    pub custom_focus_rules: usize,
    /// Elements whose inline style removes the outline
    pub inline_outline_removed: Vec<ElementSource>,
}
