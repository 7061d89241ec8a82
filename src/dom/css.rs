// SPDX-License-Identifier: PMPL-1.0-or-later
//! Minimal CSS handling for the static DOM: rule parsing, specificity and
//! length resolution.

use regex::Regex;
use std::sync::OnceLock;

/// Root font size used for `rem` and keyword sizes
pub const ROOT_FONT_SIZE_PX: f64 = 16.0;

/// One `property: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// One style rule with a single (non-grouped) selector
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    /// Enclosing `@media` condition, if any
    pub media: Option<String>,
    pub specificity: (u32, u32, u32),
    /// Source order across all stylesheets
    pub order: usize,
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"))
}

/// Parse stylesheet text into rules. Grouped selectors are split so each
/// rule carries exactly one selector. At-rules other than `@media` and
/// `@supports` are skipped.
pub fn parse_stylesheet(css: &str, order_start: usize) -> Vec<CssRule> {
    let cleaned = comment_regex().replace_all(css, "");
    let mut rules = Vec::new();
    let mut order = order_start;
    parse_block(&cleaned, None, &mut rules, &mut order);
    rules
}

fn parse_block(css: &str, media: Option<&str>, rules: &mut Vec<CssRule>, order: &mut usize) {
    let bytes = css.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let Some(open_rel) = css[pos..].find('{') else {
            break;
        };
        let open = pos + open_rel;
        let prelude = css[pos..open].trim();
        let close = matching_brace(css, open);
        let body = &css[open + 1..close.min(css.len())];

        if let Some(at_rule) = prelude.strip_prefix('@') {
            let lower = at_rule.to_ascii_lowercase();
            if lower.starts_with("media") {
                let condition = at_rule[5..].trim();
                parse_block(body, Some(condition), rules, order);
            } else if lower.starts_with("supports") {
                parse_block(body, media, rules, order);
            }
        } else if !prelude.is_empty() {
            let declarations = parse_declarations(body);
            for selector in prelude.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                rules.push(CssRule {
                    selector: selector.to_string(),
                    declarations: declarations.clone(),
                    media: media.map(str::to_string),
                    specificity: specificity(selector),
                    order: *order,
                });
                *order += 1;
            }
        }
        pos = close + 1;
    }
}

/// Index of the `}` closing the block opened at `open`, or the end of input
fn matching_brace(css: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, c) in css[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return open + i;
                }
            }
            _ => {}
        }
    }
    css.len()
}

/// Parse a declaration block or an inline `style` attribute
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim().to_string();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            let important = value.to_ascii_lowercase().ends_with("!important");
            if important {
                value.truncate(value.len() - "!important".len());
                value = value.trim().to_string();
            }
            Some(Declaration {
                property,
                value,
                important,
            })
        })
        .collect()
}

fn specificity_regexes() -> &'static [Regex; 5] {
    static RE: OnceLock<[Regex; 5]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"#[\w-]+").expect("valid regex"),
            Regex::new(r"\.[\w-]+").expect("valid regex"),
            Regex::new(r"\[[^\]]*\]").expect("valid regex"),
            Regex::new(r"::?[\w-]+").expect("valid regex"),
            Regex::new(r"(?:^|[\s>+~(])([a-zA-Z][\w-]*)").expect("valid regex"),
        ]
    })
}

/// Selector specificity as (ids, classes/attributes/pseudo-classes, types)
pub fn specificity(selector: &str) -> (u32, u32, u32) {
    let [ids, classes, attrs, pseudos, types] = specificity_regexes();
    let a = ids.find_iter(selector).count() as u32;
    let mut b = classes.find_iter(selector).count() as u32 + attrs.find_iter(selector).count() as u32;
    let mut c = types.find_iter(selector).count() as u32;
    for m in pseudos.find_iter(selector) {
        if m.as_str().starts_with("::") {
            c += 1;
        } else {
            b += 1;
        }
    }
    (a, b, c)
}

/// Parse a `px` value (`"12px"`, `"12"`); `None` for anything else
pub fn px_value(value: &str) -> Option<f64> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v);
    number.trim().parse::<f64>().ok()
}

/// Resolve a `font-size` value against the parent size
pub fn resolve_font_size(value: &str, parent_px: f64) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let keyword = match v.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(parent_px * 0.83),
        "larger" => Some(parent_px * 1.2),
        "inherit" => Some(parent_px),
        _ => None,
    };
    keyword.or_else(|| resolve_length(&v, parent_px, parent_px))
}

/// Resolve a length to px. `em_base` is the font size `em` refers to and
/// `percent_base` is what 100% means for this property.
pub fn resolve_length(value: &str, em_base: f64, percent_base: f64) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let (number, factor) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("rem") {
        (n, ROOT_FONT_SIZE_PX)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, em_base)
    } else if let Some(n) = v.strip_suffix('%') {
        (n, percent_base / 100.0)
    } else if let Some(n) = v.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else if v == "0" {
        ("0", 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f64>().ok().map(|n| n * factor)
}

/// Whether a value uses font- or viewport-relative units
pub fn is_relative_unit(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    ["rem", "em", "%", "vw", "vh", "vmin", "vmax"]
        .iter()
        .any(|unit| v.ends_with(unit))
}

/// Format px the way computed styles report it
pub fn format_px(px: f64) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{}px", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stylesheet_splits_grouped_selectors() {
        let rules = parse_stylesheet("h1, .title { color: #333; font-size: 2em !important }", 0);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector, "h1");
        assert_eq!(rules[1].selector, ".title");
        assert_eq!(rules[1].order, 1);
        assert_eq!(rules[0].declarations[1].value, "2em");
        assert!(rules[0].declarations[1].important);
    }

    #[test]
    fn test_parse_stylesheet_media_and_comments() {
        let css = r#"
            /* base */ body { color: black; }
            @media (max-width: 600px) { .nav { display: none; } }
            @font-face { font-family: X; src: url(x.woff); }
            a:focus { outline: none; }
        "#;
        let rules = parse_stylesheet(css, 0);
        let selectors: Vec<_> = rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec!["body", ".nav", "a:focus"]);
        assert_eq!(rules[1].media.as_deref(), Some("(max-width: 600px)"));
        assert!(rules[0].media.is_none());
    }

    #[test]
    fn test_specificity() {
        assert_eq!(specificity("p"), (0, 0, 1));
        assert_eq!(specificity("#main .nav a"), (1, 1, 1));
        assert_eq!(specificity("a:focus"), (0, 1, 1));
        assert_eq!(specificity("input[type=text]"), (0, 1, 1));
        assert_eq!(specificity("p::first-line"), (0, 0, 2));
    }

    #[test]
    fn test_resolve_font_size() {
        assert_eq!(resolve_font_size("24px", 16.0), Some(24.0));
        assert_eq!(resolve_font_size("1.5em", 16.0), Some(24.0));
        assert_eq!(resolve_font_size("2rem", 10.0), Some(32.0));
        assert_eq!(resolve_font_size("150%", 12.0), Some(18.0));
        assert_eq!(resolve_font_size("large", 12.0), Some(18.0));
        assert_eq!(resolve_font_size("bogus", 16.0), None);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(16.0), "16px");
        assert_eq!(format_px(18.72), "18.72px");
    }
}
