// SPDX-License-Identifier: PMPL-1.0-or-later
//! Static DOM built from fetched HTML with `scraper`.
//!
//! Everything is resolved once at parse time: element data, text content
//! and computed styles from a small cascade (user-agent defaults, `<style>`
//! blocks, inline `style` attributes, inheritance). Rules inside `@media`
//! blocks are kept for introspection but do not take part in the cascade.

use super::css::{self, CssRule, Declaration};
use super::{collapse_whitespace, ComputedStyle, Dom, DomError, NodeId, STYLESHEET_RULES_SCRIPT};
use crate::color;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use std::collections::HashMap;

/// Cap on cached text per element
const MAX_TEXT_CHARS: usize = 2000;

/// Elements whose content is never rendered as text
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "template", "base", "noscript",
];

const BLOCK_TAGS: &[&str] = &[
    "html", "body", "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "main", "nav", "ol", "p", "pre", "section", "summary", "ul",
];

struct CachedNode {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
    text: String,
    own_text: String,
}

enum Content<K> {
    Text(String),
    Child(K),
}

#[derive(Clone, Copy)]
enum LineHeight {
    Normal,
    Factor(f64),
    Px(f64),
}

pub struct StaticDom {
    source: String,
    document: Html,
    nodes: Vec<CachedNode>,
    styles: Vec<ComputedStyle>,
    rules: Vec<CssRule>,
}

impl StaticDom {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let rules = collect_rules(&document);
        let cascade: Vec<(usize, Selector)> = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.media.is_none())
            .filter_map(|(i, rule)| Selector::parse(&rule.selector).ok().map(|sel| (i, sel)))
            .collect();

        let mut nodes: Vec<CachedNode> = Vec::new();
        let mut contents = Vec::new();
        let mut matched: Vec<Vec<usize>> = Vec::new();
        let mut index = HashMap::new();

        for el in document.root_element().descendants().filter_map(ElementRef::wrap) {
            let i = nodes.len();
            index.insert(el.id(), i);
            let parent = el.parent().and_then(|p| index.get(&p.id()).copied());
            if let Some(p) = parent {
                nodes[p].children.push(i);
            }

            let content: Vec<Content<_>> = el
                .children()
                .filter_map(|child| {
                    if let Some(text) = child.value().as_text() {
                        Some(Content::Text(String::from(&**text)))
                    } else if child.value().is_element() {
                        Some(Content::Child(child.id()))
                    } else {
                        None
                    }
                })
                .collect();
            let own_text = collapse_whitespace(
                &content
                    .iter()
                    .filter_map(|c| match c {
                        Content::Text(t) => Some(t.as_str()),
                        Content::Child(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            );

            matched.push(
                cascade
                    .iter()
                    .filter(|(_, sel)| sel.matches(&el))
                    .map(|(rule, _)| *rule)
                    .collect(),
            );
            contents.push(content);
            nodes.push(CachedNode {
                tag: el.value().name().to_string(),
                attrs: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent,
                children: Vec::new(),
                text: String::new(),
                own_text,
            });
        }

        // Children come after their parent in document order, so a reverse
        // pass sees every child's text before the parent needs it.
        for i in (0..nodes.len()).rev() {
            let mut text = String::new();
            for part in &contents[i] {
                match part {
                    Content::Text(t) => text.push_str(t),
                    Content::Child(id) => {
                        if let Some(&j) = index.get(id) {
                            if !NON_TEXT_TAGS.contains(&nodes[j].tag.as_str()) {
                                text.push(' ');
                                text.push_str(&nodes[j].text);
                                text.push(' ');
                            }
                        }
                    }
                }
                if text.len() > MAX_TEXT_CHARS * 4 {
                    break;
                }
            }
            let collapsed = collapse_whitespace(&text);
            nodes[i].text = collapsed.chars().take(MAX_TEXT_CHARS).collect();
        }

        let styles = compute_styles(&nodes, &rules, &matched);

        Self {
            source: html.to_string(),
            document,
            nodes,
            styles,
            rules,
        }
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All parsed stylesheet rules, including those inside `@media`
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    fn node(&self, node: NodeId) -> Option<&CachedNode> {
        self.nodes.get(node.0)
    }
}

impl Dom for StaticDom {
    fn source(&self) -> &str {
        &self.source
    }

    fn query(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| DomError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
        Ok(self
            .document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
            .filter(|(_, el)| parsed.matches(el))
            .map(|(i, _)| NodeId(i))
            .collect())
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.node(node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.node(node).map(|n| n.attrs.clone()).unwrap_or_default()
    }

    fn text(&self, node: NodeId) -> String {
        self.node(node).map(|n| n.text.clone()).unwrap_or_default()
    }

    fn own_text(&self, node: NodeId) -> String {
        self.node(node).map(|n| n.own_text.clone()).unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent.map(NodeId)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.children.iter().copied().map(NodeId).collect())
            .unwrap_or_default()
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        self.styles
            .get(node.0)
            .cloned()
            .ok_or(DomError::UnknownNode(node.0))
    }

    fn evaluate(&self, script: &str) -> Result<serde_json::Value, DomError> {
        if script.trim() != STYLESHEET_RULES_SCRIPT.trim() {
            return Err(DomError::Unsupported(
                "script evaluation requires a browser-backed DOM".to_string(),
            ));
        }
        let rules: Vec<serde_json::Value> = self
            .rules
            .iter()
            .map(|rule| {
                let declarations: serde_json::Map<String, serde_json::Value> = rule
                    .declarations
                    .iter()
                    .map(|d| (d.property.clone(), json!(d.value)))
                    .collect();
                json!({
                    "selector": rule.selector,
                    "declarations": declarations,
                    "media": rule.media,
                })
            })
            .collect();
        Ok(serde_json::Value::Array(rules))
    }
}

/// Parse every `<style>` block in document order
fn collect_rules(document: &Html) -> Vec<CssRule> {
    let Ok(selector) = Selector::parse("style") else {
        return Vec::new();
    };
    let mut rules = Vec::new();
    for style in document.select(&selector) {
        let text: String = style.text().collect();
        let media = style
            .value()
            .attr("media")
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != "all" && *m != "screen");
        let mut parsed = css::parse_stylesheet(&text, rules.len());
        if let Some(media) = media {
            for rule in &mut parsed {
                rule.media.get_or_insert_with(|| media.to_string());
            }
        }
        rules.extend(parsed);
    }
    rules
}

fn user_agent_declarations(node: &CachedNode) -> Vec<Declaration> {
    let tag = node.tag.as_str();
    let mut decls = Vec::new();
    let mut push = |property: &str, value: &str| {
        decls.push(Declaration {
            property: property.to_string(),
            value: value.to_string(),
            important: false,
        })
    };

    if HIDDEN_TAGS.contains(&tag) {
        push("display", "none");
    } else if BLOCK_TAGS.contains(&tag) {
        push("display", "block");
    } else if tag == "li" {
        push("display", "list-item");
    } else if tag == "table" {
        push("display", "table");
    }

    match tag {
        "h1" => push("font-size", "2em"),
        "h2" => push("font-size", "1.5em"),
        "h3" => push("font-size", "1.17em"),
        "h5" => push("font-size", "0.83em"),
        "h6" => push("font-size", "0.67em"),
        "small" => push("font-size", "0.83em"),
        _ => {}
    }
    if matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "b" | "strong" | "th") {
        push("font-weight", "700");
    }
    if tag == "a" && node.attrs.iter().any(|(k, _)| k == "href") {
        push("color", "#0000ee");
    }
    if node.attrs.iter().any(|(k, _)| k == "hidden") {
        push("display", "none");
    }
    decls
}

/// Expand the shorthands the cascade cares about
fn expand_shorthand(decl: &Declaration) -> Vec<(String, String)> {
    let value = decl.value.trim();
    match decl.property.as_str() {
        "background" => value
            .split_whitespace()
            .find(|token| color::parse_color(token).is_some() || *token == "transparent")
            .map(|c| vec![("background-color".to_string(), c.to_string())])
            .unwrap_or_default(),
        "outline" => {
            let lower = value.to_ascii_lowercase();
            let style = if lower == "none" || lower == "0" || lower == "0px" {
                Some("none")
            } else {
                [
                    "auto", "solid", "dotted", "dashed", "double", "groove", "ridge", "inset", "outset",
                ]
                .into_iter()
                .find(|s| lower.split_whitespace().any(|t| t == *s))
            };
            style
                .map(|s| vec![("outline-style".to_string(), s.to_string())])
                .unwrap_or_default()
        }
        "font" => expand_font(value),
        _ => vec![(decl.property.clone(), value.to_string())],
    }
}

fn expand_font(value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut tokens = value.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        let lower = token.to_ascii_lowercase();
        if matches!(lower.as_str(), "bold" | "bolder" | "lighter")
            || (lower.len() == 3 && lower.ends_with("00") && lower.parse::<u16>().is_ok())
        {
            out.push(("font-weight".to_string(), lower));
        } else if lower.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            let (size, line_height) = match lower.split_once('/') {
                Some((s, lh)) => (s.to_string(), Some(lh.to_string())),
                None => (lower.clone(), None),
            };
            out.push(("font-size".to_string(), size));
            if let Some(lh) = line_height {
                out.push(("line-height".to_string(), lh));
            }
            let family: Vec<&str> = tokens.by_ref().collect();
            if !family.is_empty() {
                out.push(("font-family".to_string(), family.join(" ")));
            }
            break;
        }
    }
    out
}

fn compute_styles(nodes: &[CachedNode], rules: &[CssRule], matched: &[Vec<usize>]) -> Vec<ComputedStyle> {
    let mut styles: Vec<ComputedStyle> = Vec::with_capacity(nodes.len());
    let mut line_heights: Vec<LineHeight> = Vec::with_capacity(nodes.len());
    let root = ComputedStyle::default();

    for (i, node) in nodes.iter().enumerate() {
        let ua = user_agent_declarations(node);
        let inline = node
            .attrs
            .iter()
            .find(|(k, _)| k == "style")
            .map(|(_, v)| css::parse_declarations(v))
            .unwrap_or_default();

        // (important, specificity, order) decides precedence; the inline
        // style outranks every selector.
        let mut ordered: Vec<((bool, (u32, u32, u32), usize), &Declaration)> = Vec::new();
        for d in &ua {
            ordered.push(((false, (0, 0, 0), 0), d));
        }
        for &r in matched.get(i).map(Vec::as_slice).unwrap_or_default() {
            let rule = &rules[r];
            for d in &rule.declarations {
                ordered.push(((d.important, rule.specificity, rule.order + 1), d));
            }
        }
        for d in &inline {
            ordered.push(((d.important, (u32::MAX, 0, 0), usize::MAX), d));
        }
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut declared: HashMap<String, String> = HashMap::new();
        for (_, d) in ordered {
            for (property, value) in expand_shorthand(d) {
                declared.insert(property, value);
            }
        }

        let parent_idx = node.parent;
        let parent = parent_idx.map(|p| &styles[p]).unwrap_or(&root);
        let parent_lh = parent_idx.map(|p| line_heights[p]).unwrap_or(LineHeight::Normal);
        let parent_font = parent.font_size_px().unwrap_or(css::ROOT_FONT_SIZE_PX);

        let is_inherit = |v: &String| {
            let v = v.trim().to_ascii_lowercase();
            v == "inherit" || v == "unset"
        };

        let font_size_px = declared
            .get("font-size")
            .and_then(|v| css::resolve_font_size(v, parent_font))
            .unwrap_or(parent_font);

        let color = match declared.get("color") {
            Some(v) if is_inherit(v) || v.eq_ignore_ascii_case("currentcolor") => parent.color.clone(),
            Some(v) => match color::parse_color(v) {
                Some(rgb) => format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b),
                None => v.clone(),
            },
            None => parent.color.clone(),
        };

        let background_color = match declared.get("background-color") {
            Some(v) if is_inherit(v) => parent.background_color.clone(),
            Some(v) if v.eq_ignore_ascii_case("transparent") => root.background_color.clone(),
            Some(v) => match color::parse_color(v) {
                Some(rgb) => format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b),
                None => v.clone(),
            },
            None => root.background_color.clone(),
        };

        let parent_weight = parent.font_weight_value();
        let font_weight = match declared.get("font-weight").map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "bolder" => (parent_weight + 300).min(900).to_string(),
            Some(v) if v == "lighter" => parent_weight.saturating_sub(300).max(100).to_string(),
            Some(v) if v == "inherit" || v == "unset" => parent.font_weight.clone(),
            Some(v) => color::parse_font_weight(&v).to_string(),
            None => parent.font_weight.clone(),
        };

        let line_height = match declared.get("line-height").map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "normal" => LineHeight::Normal,
            Some(v) if v == "inherit" || v == "unset" => parent_lh,
            Some(v) => match v.parse::<f64>() {
                Ok(factor) => LineHeight::Factor(factor),
                Err(_) => css::resolve_length(&v, font_size_px, font_size_px)
                    .map(LineHeight::Px)
                    .unwrap_or(parent_lh),
            },
            None => parent_lh,
        };

        let spacing = |property: &str, inherited: &str, normal: &str| -> String {
            match declared.get(property) {
                Some(v) if is_inherit(v) => inherited.to_string(),
                Some(v) if v.trim().eq_ignore_ascii_case("normal") => normal.to_string(),
                Some(v) => css::resolve_length(v, font_size_px, font_size_px)
                    .map(css::format_px)
                    .unwrap_or_else(|| inherited.to_string()),
                None => inherited.to_string(),
            }
        };
        let letter_spacing = spacing("letter-spacing", &parent.letter_spacing, "normal");
        let word_spacing = spacing("word-spacing", &parent.word_spacing, "0px");

        let pick = |property: &str, fallback: &str| -> String {
            match declared.get(property) {
                Some(v) if is_inherit(v) => fallback.to_string(),
                Some(v) => v.trim().to_ascii_lowercase(),
                None => fallback.to_string(),
            }
        };

        let style = ComputedStyle {
            color,
            background_color,
            font_size: css::format_px(font_size_px),
            font_weight,
            font_family: declared
                .get("font-family")
                .filter(|v| !is_inherit(*v))
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| parent.font_family.clone()),
            line_height: match line_height {
                LineHeight::Normal => "normal".to_string(),
                LineHeight::Factor(f) => css::format_px(f * font_size_px),
                LineHeight::Px(px) => css::format_px(px),
            },
            letter_spacing,
            word_spacing,
            outline_style: pick("outline-style", &root.outline_style),
            display: pick("display", &root.display),
            visibility: pick("visibility", &parent.visibility),
        };
        styles.push(style);
        line_heights.push(line_height);
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(dom: &StaticDom, selector: &str) -> NodeId {
        dom.query(selector).unwrap()[0]
    }

    #[test]
    fn test_query_and_attributes() {
        let dom = StaticDom::parse(
            r#"<html lang="en"><body><img src="a.png" alt="A"><img src="b.png"></body></html>"#,
        );
        let imgs = dom.query("img").unwrap();
        assert_eq!(imgs.len(), 2);
        assert_eq!(dom.attribute(imgs[0], "alt").as_deref(), Some("A"));
        assert_eq!(dom.attribute(imgs[1], "alt"), None);
        assert_eq!(dom.tag_name(imgs[0]).as_deref(), Some("img"));
        let html = first(&dom, "html");
        assert_eq!(dom.attribute(html, "lang").as_deref(), Some("en"));
    }

    #[test]
    fn test_invalid_selector() {
        let dom = StaticDom::parse("<p>x</p>");
        assert!(matches!(dom.query("p[["), Err(DomError::InvalidSelector(_))));
    }

    #[test]
    fn test_text_skips_scripts() {
        let dom = StaticDom::parse(
            "<body><div id=\"d\">Hello <b>world</b><script>var x = 1;</script></div></body>",
        );
        let div = first(&dom, "#d");
        assert_eq!(dom.text(div), "Hello world");
        assert_eq!(dom.own_text(div), "Hello");
    }

    #[test]
    fn test_parent_children_and_path() {
        let dom = StaticDom::parse("<body><ul><li>a</li><li id=\"x\">b</li><li>c</li></ul></body>");
        let items = dom.query("li").unwrap();
        let ul = dom.parent(items[0]).unwrap();
        assert_eq!(dom.children(ul), items);
        assert_eq!(dom.dom_path(items[2]), "html > body > ul > li:nth-of-type(3)");
        assert_eq!(dom.dom_path(items[1]), "html > body > ul > li#x");
        assert_eq!(dom.closest(items[0], &["ul", "ol"]), Some(ul));
    }

    #[test]
    fn test_cascade_specificity_and_inheritance() {
        let dom = StaticDom::parse(
            r#"<html><head><style>
                body { color: #333333; font-size: 20px; }
                p { color: #777; }
                .note { color: red; }
                #main p { line-height: 1.5; }
            </style></head>
            <body><div id="main"><p class="note">Note</p><p>Plain <span>inner</span></p></div></body></html>"#,
        );
        let ps = dom.query("p").unwrap();
        let note = dom.computed_style(ps[0]).unwrap();
        assert_eq!(note.color, "rgb(255, 0, 0)");
        assert_eq!(note.font_size, "20px");
        assert_eq!(note.line_height, "30px");

        let span = dom.computed_style(first(&dom, "span")).unwrap();
        assert_eq!(span.color, "rgb(119, 119, 119)");
        assert_eq!(span.line_height, "30px");
    }

    #[test]
    fn test_inline_style_and_important() {
        let dom = StaticDom::parse(
            r#"<style>.a { color: blue !important; background: #fff url(x.png); }</style>
            <p class="a" style="color: green; background-color: black">x</p>
            <p style="color: green">y</p>"#,
        );
        let ps = dom.query("p").unwrap();
        let a = dom.computed_style(ps[0]).unwrap();
        assert_eq!(a.color, "rgb(0, 0, 255)");
        assert_eq!(a.background_color, "rgb(0, 0, 0)");
        let b = dom.computed_style(ps[1]).unwrap();
        assert_eq!(b.color, "rgb(0, 128, 0)");
        assert_eq!(b.background_color, "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn test_user_agent_defaults() {
        let dom = StaticDom::parse("<body><h1>T</h1><h2>S</h2><p hidden>x</p><a href=\"/\">l</a></body>");
        let h1 = dom.computed_style(first(&dom, "h1")).unwrap();
        assert_eq!(h1.font_size, "32px");
        assert_eq!(h1.font_weight_value(), 700);
        let h2 = dom.computed_style(first(&dom, "h2")).unwrap();
        assert_eq!(h2.font_size, "24px");
        assert!(!dom.is_rendered(first(&dom, "p")));
        assert!(dom.is_rendered(first(&dom, "h1")));
        let a = dom.computed_style(first(&dom, "a")).unwrap();
        assert_eq!(a.color, "rgb(0, 0, 238)");
        assert!(!dom.is_rendered(first(&dom, "head")));
    }

    #[test]
    fn test_focus_rules_do_not_cascade() {
        let dom = StaticDom::parse(
            "<style>a { outline: 2px solid blue; } a:focus { outline: none; }</style><a href=\"#\">x</a>",
        );
        let a = dom.computed_style(first(&dom, "a")).unwrap();
        assert_eq!(a.outline_style, "solid");
    }

    #[test]
    fn test_evaluate_stylesheet_rules() {
        let dom = StaticDom::parse(
            "<style>a:focus { outline: none; } @media (max-width: 600px) { p { font-size: 12px; } }</style>",
        );
        let value = dom.evaluate(STYLESHEET_RULES_SCRIPT).unwrap();
        let rules = value.as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["selector"], "a:focus");
        assert_eq!(rules[0]["declarations"]["outline"], "none");
        assert_eq!(rules[1]["media"], "(max-width: 600px)");
        assert!(matches!(dom.evaluate("document.title"), Err(DomError::Unsupported(_))));
    }
}
