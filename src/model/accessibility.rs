// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility-tree records: ARIA usage, tab order, skip links, traps.

use super::ElementSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityData {
    /// Elements carrying a `role` or any `aria-*` attribute
    pub aria: Vec<AriaElement>,
    /// Sequential focus order as a browser would walk it
    pub tab_order: Vec<TabStop>,
    pub skip_links: Vec<SkipLink>,
    pub keyboard_traps: Vec<KeyboardTrap>,
    /// Elements carrying an `id`
    pub id_count: usize,
    /// `id` values used more than once
    pub duplicate_ids: Vec<String>,
    /// Elements with a `lang` attribute other than the root
    pub language_changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AriaElement {
    pub role: Option<String>,
    /// `aria-*` attributes, sorted by name
    pub attributes: BTreeMap<String, String>,
    /// Element is keyboard focusable
    pub focusable: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabStop {
    pub tabindex: i32,
    pub tag: String,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipLink {
    pub href: String,
    pub text: String,
    /// The fragment target exists in the document
    pub target_exists: bool,
    /// Position among focusable elements (0 = first)
    pub focus_position: usize,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardTrap {
    pub description: String,
    pub source: ElementSource,
}
