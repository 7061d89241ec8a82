// SPDX-License-Identifier: PMPL-1.0-or-later
//! Styling extraction: color palette, fonts, responsive hints, contrast
//! samples, text spacing and focus styles.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::ExtractContext;
use crate::color::{self, Rgb};
use crate::dom::{css, truncate, ComputedStyle, DomError, NodeId, STYLESHEET_RULES_SCRIPT};
use crate::model::{
    ContrastSample, ContrastStats, FocusStyles, FontUsage, PageMeta, ResponsiveHints, TextSpacingSample,
};

/// Elements never sampled for text styling
const SKIPPED_TAGS: &[&str] = &[
    "html", "head", "script", "style", "noscript", "template", "title", "meta", "link", "svg",
];

/// Block-level text containers checked for spacing
const SPACING_SELECTOR: &str = "p, li, td, dd, blockquote, figcaption";

/// Transparent background as reported by computed styles
const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

#[derive(Debug, Default)]
pub struct Palette {
    pub text_colors: Vec<String>,
    pub background_colors: Vec<String>,
}

/// Rendered elements that carry their own text, in document order
fn text_elements(ctx: &ExtractContext, min_len: usize) -> Result<Vec<NodeId>, DomError> {
    Ok(ctx
        .dom
        .query("body *")?
        .into_iter()
        .filter(|n| {
            let tag = ctx.dom.tag_name(*n).unwrap_or_default();
            !SKIPPED_TAGS.contains(&tag.as_str())
                && ctx.dom.own_text(*n).chars().count() >= min_len
                && ctx.dom.is_rendered(*n)
        })
        .collect())
}

/// Effective background: first opaque background on the element or an
/// ancestor, white when none is set. `None` when a background cannot be
/// resolved to a color.
fn effective_background(ctx: &ExtractContext, node: NodeId) -> Option<Rgb> {
    let mut current = Some(node);
    while let Some(n) = current {
        let style = ctx.dom.computed_style(n).ok()?;
        let bg = style.background_color.trim();
        if !(bg.is_empty() || bg == TRANSPARENT || bg.eq_ignore_ascii_case("transparent")) {
            return color::parse_color(bg);
        }
        current = ctx.dom.parent(n);
    }
    Some(Rgb::WHITE)
}

pub fn contrast(ctx: &ExtractContext) -> Result<(Vec<ContrastSample>, ContrastStats), DomError> {
    let cap = ctx.config.max_contrast_samples;
    let mut samples = Vec::new();
    let mut stats = ContrastStats::default();

    for node in text_elements(ctx, 1)? {
        let text = ctx.dom.own_text(node);
        if text.chars().count() < ctx.config.min_contrast_text_len {
            stats.elements_skipped += 1;
            continue;
        }
        if stats.elements_checked >= cap {
            stats.capped = true;
            break;
        }

        let style: ComputedStyle = ctx.dom.computed_style(node)?;
        let (Some(fg), Some(bg)) = (color::parse_color(&style.color), effective_background(ctx, node))
        else {
            stats.elements_skipped += 1;
            continue;
        };

        let size = style.font_size_px().unwrap_or(css::ROOT_FONT_SIZE_PX);
        let weight = style.font_weight_value();
        let eval = color::evaluate_contrast(fg, bg, size, weight);

        stats.elements_checked += 1;
        if !eval.passes {
            stats.issues_found += 1;
        }
        samples.push(ContrastSample {
            text: truncate(&text, 80),
            foreground: fg.to_hex(),
            background: bg.to_hex(),
            ratio: (eval.ratio * 100.0).round() / 100.0,
            required_ratio: eval.required,
            font_size_px: size,
            font_weight: weight,
            large_text: eval.large_text,
            passes: eval.passes,
            source: ctx.source(node),
        });
    }
    Ok((samples, stats))
}

pub fn palette(ctx: &ExtractContext) -> Result<Palette, DomError> {
    let mut text_colors = BTreeSet::new();
    let mut background_colors = BTreeSet::new();
    for node in text_elements(ctx, 1)? {
        let style = ctx.dom.computed_style(node)?;
        if let Some(fg) = color::parse_color(&style.color) {
            text_colors.insert(fg.to_hex());
        }
        if let Some(bg) = effective_background(ctx, node) {
            background_colors.insert(bg.to_hex());
        }
    }
    Ok(Palette {
        text_colors: text_colors.into_iter().collect(),
        background_colors: background_colors.into_iter().collect(),
    })
}

pub fn fonts(ctx: &ExtractContext) -> Result<Vec<FontUsage>, DomError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in text_elements(ctx, 1)? {
        let family = ctx.dom.computed_style(node)?.font_family;
        let primary = family
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();
        if !primary.is_empty() {
            *counts.entry(primary).or_default() += 1;
        }
    }
    let mut fonts: Vec<FontUsage> = counts
        .into_iter()
        .map(|(family, elements)| FontUsage { family, elements })
        .collect();
    fonts.sort_by(|a, b| b.elements.cmp(&a.elements).then_with(|| a.family.cmp(&b.family)));
    Ok(fonts)
}

/// One rule as returned by the stylesheet introspection script
#[derive(Debug, Deserialize)]
struct IntrospectedRule {
    selector: String,
    #[serde(default)]
    declarations: BTreeMap<String, String>,
    #[serde(default)]
    media: Option<String>,
}

fn stylesheet_rules(ctx: &ExtractContext) -> Result<Vec<IntrospectedRule>, DomError> {
    let value = ctx.dom.evaluate(STYLESHEET_RULES_SCRIPT)?;
    serde_json::from_value(value).map_err(|e| DomError::Script(e.to_string()))
}

/// Parse the viewport meta content for zoom restrictions
pub fn viewport_blocks_zoom(content: &str) -> bool {
    content.split([',', ';']).any(|part| {
        let Some((key, value)) = part.split_once('=') else {
            return false;
        };
        let value = value.trim().to_ascii_lowercase();
        match key.trim().to_ascii_lowercase().as_str() {
            "user-scalable" => value == "no" || value == "0",
            "maximum-scale" => value.parse::<f64>().map(|v| v < 2.0).unwrap_or(false),
            _ => false,
        }
    })
}

pub fn responsive(ctx: &ExtractContext, meta: &PageMeta) -> Result<ResponsiveHints, DomError> {
    let mut hints = ResponsiveHints {
        has_viewport_meta: meta.viewport.is_some(),
        zoom_disabled: meta.viewport.as_deref().map(viewport_blocks_zoom).unwrap_or(false),
        ..ResponsiveHints::default()
    };

    // Introspection is optional; a DOM that cannot run it still yields
    // the meta-based hints.
    if let Ok(rules) = stylesheet_rules(ctx) {
        let conditions: BTreeSet<&str> = rules.iter().filter_map(|r| r.media.as_deref()).collect();
        hints.media_queries = conditions.len();
        hints.prefers_reduced_motion = conditions.iter().any(|m| m.contains("prefers-reduced-motion"));
        hints.uses_relative_units = rules.iter().any(|r| {
            ["font-size", "font", "width", "max-width"]
                .iter()
                .filter_map(|p| r.declarations.get(*p))
                .any(|v| css::is_relative_unit(v.split_whitespace().next().unwrap_or_default()))
        });
    }
    Ok(hints)
}

pub fn text_spacing(ctx: &ExtractContext) -> Result<Vec<TextSpacingSample>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query(SPACING_SELECTOR)? {
        if out.len() >= ctx.config.max_text_spacing_samples {
            break;
        }
        if ctx.dom.text(node).chars().count() < ctx.config.min_contrast_text_len || !ctx.dom.is_rendered(node) {
            continue;
        }
        let style = ctx.dom.computed_style(node)?;
        let Some(size) = style.font_size_px().filter(|s| *s > 0.0) else {
            continue;
        };
        let ratio = |px: Option<f64>| px.map(|v| (v / size * 100.0).round() / 100.0);
        out.push(TextSpacingSample {
            font_size_px: size,
            line_height_ratio: ratio(style.line_height_px()),
            letter_spacing_ratio: ratio(style.letter_spacing_px()),
            word_spacing_ratio: ratio(style.word_spacing_px()),
            source: ctx.source(node),
        });
    }
    Ok(out)
}

/// Whether a declaration block removes the outline
fn removes_outline(decls: &BTreeMap<String, String>) -> bool {
    ["outline", "outline-style", "outline-width"]
        .iter()
        .filter_map(|p| decls.get(*p))
        .any(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "none" || v == "0" || v == "0px"
        })
}

/// Whether a declaration block draws some other focus indicator
fn replaces_outline(decls: &BTreeMap<String, String>) -> bool {
    decls.iter().any(|(prop, value)| {
        let v = value.trim().to_ascii_lowercase();
        let visible = !(v == "none" || v == "0" || v == "0px" || v == "transparent");
        visible
            && (prop.starts_with("box-shadow")
                || prop.starts_with("border")
                || prop.starts_with("background")
                || prop.starts_with("text-decoration")
                || (prop.starts_with("outline") && prop != "outline-offset"))
    })
}

pub fn focus_styles(ctx: &ExtractContext) -> Result<FocusStyles, DomError> {
    let mut focus = FocusStyles::default();

    let inline = ctx.dom.query("[style]")?;
    for node in inline {
        let style = ctx.dom.attribute(node, "style").unwrap_or_default();
        let decls: BTreeMap<String, String> = css::parse_declarations(&style)
            .into_iter()
            .map(|d| (d.property, d.value))
            .collect();
        if removes_outline(&decls) && super::structure::is_focusable(ctx, node) {
            focus.inline_outline_removed.push(ctx.source(node));
        }
    }

    let rules = match stylesheet_rules(ctx) {
        Ok(rules) => rules,
        Err(_) => return Ok(focus),
    };
    focus.inspected = true;
    for rule in rules.iter().filter(|r| r.selector.contains(":focus")) {
        if removes_outline(&rule.declarations) && !replaces_outline(&rule.declarations) {
            // a matching :focus-visible rule may restore the indicator
            let restored = !rule.selector.contains(":focus-visible") && {
                let visible = rule.selector.replace(":focus", ":focus-visible");
                rules
                    .iter()
                    .any(|r| r.selector == visible && replaces_outline(&r.declarations))
            };
            if !restored {
                focus.outline_removed.push(rule.selector.clone());
            }
        } else if replaces_outline(&rule.declarations) {
            focus.custom_focus_rules += 1;
        }
    }
    Ok(focus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::dom::StaticDom;

    fn with_ctx<T>(html: &str, f: impl FnOnce(&ExtractContext) -> T) -> T {
        let dom = StaticDom::parse(html);
        let config = ExtractConfig::default();
        let ctx = ExtractContext::new(&dom, &config, "https://example.com/");
        f(&ctx)
    }

    #[test]
    fn test_contrast_low_ratio_detected() {
        let (samples, stats) = with_ctx(
            r#"<body><p style="color:#000">Readable text</p>
            <p style="color:#888888">Faint grey text</p>
            <div style="background:#000"><span style="color:#fff">Inverted text</span></div>
            <p>ok</p></body>"#,
            |ctx| contrast(ctx).unwrap(),
        );
        assert_eq!(stats.elements_checked, 3);
        assert_eq!(stats.issues_found, 1);
        assert_eq!(stats.elements_skipped, 1);
        assert!(!samples[1].passes);
        assert!(samples[1].ratio < 4.5);
        assert_eq!(samples[2].background, "#000000");
        assert!(samples[2].passes);
    }

    #[test]
    fn test_contrast_large_text_threshold() {
        let (samples, _) = with_ctx(
            r#"<h1 style="color:#949494">Large heading</h1><p style="color:#949494">Small body text</p>"#,
            |ctx| contrast(ctx).unwrap(),
        );
        assert!(samples[0].large_text);
        assert!(samples[0].passes);
        assert!(!samples[1].passes);
    }

    #[test]
    fn test_contrast_sampling_is_capped() {
        let body: String = (0..80).map(|i| format!("<p>Paragraph {}</p>", i)).collect();
        let (samples, stats) = with_ctx(&body, |ctx| contrast(ctx).unwrap());
        assert_eq!(samples.len(), 50);
        assert!(stats.capped);
    }

    #[test]
    fn test_viewport_zoom() {
        assert!(viewport_blocks_zoom("width=device-width, user-scalable=no"));
        assert!(viewport_blocks_zoom("width=device-width, maximum-scale=1.0"));
        assert!(!viewport_blocks_zoom("width=device-width, initial-scale=1"));
    }

    #[test]
    fn test_responsive_hints() {
        let hints = with_ctx(
            r#"<style>body { font-size: 1rem } @media (max-width: 600px) { p { width: 100% } }
            @media (prefers-reduced-motion: reduce) { * { animation: none } }</style>"#,
            |ctx| {
                let meta = PageMeta {
                    viewport: Some("width=device-width".to_string()),
                    ..PageMeta::default()
                };
                responsive(ctx, &meta).unwrap()
            },
        );
        assert!(hints.has_viewport_meta);
        assert!(!hints.zoom_disabled);
        assert_eq!(hints.media_queries, 2);
        assert!(hints.prefers_reduced_motion);
        assert!(hints.uses_relative_units);
    }

    #[test]
    fn test_text_spacing_ratios() {
        let samples = with_ctx(
            r#"<p style="font-size:20px; line-height:1.5; letter-spacing:0.12em">Spaced text</p>"#,
            |ctx| text_spacing(ctx).unwrap(),
        );
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].line_height_ratio, Some(1.5));
        assert_eq!(samples[0].letter_spacing_ratio, Some(0.12));
        assert_eq!(samples[0].word_spacing_ratio, Some(0.0));
    }

    #[test]
    fn test_focus_styles() {
        let focus = with_ctx(
            r#"<style>
                a:focus { outline: none; }
                button:focus { outline: none; box-shadow: 0 0 0 3px blue; }
                input:focus { outline: 0; }
                input:focus-visible { outline: 2px solid; }
            </style><a href="/" style="outline: none">x</a>"#,
            |ctx| focus_styles(ctx).unwrap(),
        );
        assert!(focus.inspected);
        assert_eq!(focus.outline_removed, vec!["a:focus".to_string()]);
        assert_eq!(focus.custom_focus_rules, 2);
        assert_eq!(focus.inline_outline_removed.len(), 1);
    }
}
