// SPDX-License-Identifier: PMPL-1.0-or-later
//! DOM capability interface.
//!
//! The extractor never talks to a browser engine directly. It consumes this
//! capability surface (query, attributes, computed style, script evaluation),
//! so a headless browser driver and the static [`StaticDom`] are
//! interchangeable.

pub mod css;
pub mod static_dom;

pub use static_dom::StaticDom;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Script that lists every stylesheet rule as
/// `[{selector, declarations: {prop: value}, media}]`.
pub const STYLESHEET_RULES_SCRIPT: &str = r#"(() => Array.from(document.styleSheets).flatMap(sheet => {
  let rules = [];
  try { rules = Array.from(sheet.cssRules); } catch (e) { return []; }
  return rules.flatMap(rule => {
    const media = rule.media ? rule.media.mediaText : null;
    const inner = rule.cssRules ? Array.from(rule.cssRules) : [rule];
    return inner.filter(r => r.selectorText).map(r => ({
      selector: r.selectorText,
      declarations: Object.fromEntries(Array.from(r.style).map(p => [p, r.style.getPropertyValue(p)])),
      media: media
    }));
  });
}))()"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("unknown node {0}")]
    UnknownNode(usize),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("script failed: {0}")]
    Script(String),
}

/// Opaque handle to an element, valid for the `Dom` that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Resolved style values, formatted the way `getComputedStyle` reports them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub color: String,
    pub background_color: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_family: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub word_spacing: String,
    pub outline_style: String,
    pub display: String,
    pub visibility: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            font_size: "16px".to_string(),
            font_weight: "400".to_string(),
            font_family: "serif".to_string(),
            line_height: "normal".to_string(),
            letter_spacing: "normal".to_string(),
            word_spacing: "0px".to_string(),
            outline_style: "none".to_string(),
            display: "inline".to_string(),
            visibility: "visible".to_string(),
        }
    }
}

impl ComputedStyle {
    pub fn font_size_px(&self) -> Option<f64> {
        css::px_value(&self.font_size)
    }

    pub fn font_weight_value(&self) -> u16 {
        crate::color::parse_font_weight(&self.font_weight)
    }

    /// `None` for `normal`
    pub fn line_height_px(&self) -> Option<f64> {
        css::px_value(&self.line_height)
    }

    pub fn letter_spacing_px(&self) -> Option<f64> {
        css::px_value(&self.letter_spacing)
    }

    pub fn word_spacing_px(&self) -> Option<f64> {
        css::px_value(&self.word_spacing)
    }

    pub fn is_hidden(&self) -> bool {
        self.display == "none" || self.visibility == "hidden" || self.visibility == "collapse"
    }
}

/// Capability surface of the browser/DOM collaborator
pub trait Dom {
    /// Raw markup the document was built from
    fn source(&self) -> &str;

    /// Elements matching a CSS selector, in document order
    fn query(&self, selector: &str) -> Result<Vec<NodeId>, DomError>;

    /// Lowercase tag name
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// All attributes in source order
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    /// Visible descendant text, whitespace collapsed
    fn text(&self, node: NodeId) -> String;

    /// Text of direct text-node children only, whitespace collapsed
    fn own_text(&self, node: NodeId) -> String;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError>;

    /// Run a script in page context and return its JSON result
    fn evaluate(&self, script: &str) -> Result<serde_json::Value, DomError>;

    /// Nearest ancestor (or self) with one of the given tags
    fn closest(&self, node: NodeId, tags: &[&str]) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(tag) = self.tag_name(n) {
                if tags.contains(&tag.as_str()) {
                    return Some(n);
                }
            }
            current = self.parent(n);
        }
        None
    }

    /// Whether the element is rendered (no hidden ancestor)
    fn is_rendered(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.attribute(n, "hidden").is_some() {
                return false;
            }
            if let Ok(style) = self.computed_style(n) {
                if style.is_hidden() {
                    return false;
                }
            }
            current = self.parent(n);
        }
        true
    }

    /// CSS-like path from the root, e.g. `html > body > ul > li:nth-of-type(3)`
    fn dom_path(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            let tag = self.tag_name(n).unwrap_or_default();
            let part = match self.attribute(n, "id").filter(|id| !id.is_empty()) {
                Some(id) => format!("{}#{}", tag, id),
                None => match self.parent(n) {
                    Some(parent) => {
                        let same: Vec<NodeId> = self
                            .children(parent)
                            .into_iter()
                            .filter(|c| self.tag_name(*c).as_deref() == Some(tag.as_str()))
                            .collect();
                        if same.len() > 1 {
                            let pos = same.iter().position(|c| *c == n).unwrap_or(0) + 1;
                            format!("{}:nth-of-type({})", tag, pos)
                        } else {
                            tag
                        }
                    }
                    None => tag,
                },
            };
            parts.push(part);
            current = self.parent(n);
        }
        parts.reverse();
        parts.join(" > ")
    }

    /// Sanitized outer markup: opening tag, truncated text, closing tag
    fn snippet(&self, node: NodeId, max_len: usize) -> String {
        let tag = self.tag_name(node).unwrap_or_default();
        let attrs: String = self
            .attributes(node)
            .into_iter()
            .filter(|(k, _)| !k.starts_with("on"))
            .map(|(k, v)| format!(" {}=\"{}\"", k, truncate(&v, 80).replace('"', "&quot;")))
            .collect();
        let text = self.text(node);
        let html = if text.is_empty() {
            format!("<{}{}>", tag, attrs)
        } else {
            format!("<{}{}>{}</{}>", tag, attrs, text, tag)
        };
        truncate(&html, max_len)
    }
}

/// Truncate to at most `max` characters, marking the cut with `...`
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Collapse runs of whitespace to single spaces
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_default_style_values() {
        let style = ComputedStyle::default();
        assert_eq!(style.font_size_px(), Some(16.0));
        assert_eq!(style.line_height_px(), None);
        assert_eq!(style.font_weight_value(), 400);
        assert!(!style.is_hidden());
    }
}
