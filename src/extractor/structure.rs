// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural extraction: headings, landmarks, forms, images, links,
//! tables, lists, iframes, media and interactive elements.

use std::collections::{BTreeSet, HashMap};

use super::ExtractContext;
use crate::dom::{DomError, NodeId};
use crate::model::{
    FormField, FormRecord, Heading, Iframe, ImageRecord, InteractiveElement, LabelSource, Landmark,
    LinkRecord, ListKind, ListRecord, MediaElement, MediaKind, TableRecord,
};

/// Input types that need no programmatic label
const UNLABELLED_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// Elements that take keyboard focus without a tabindex
const NATIVELY_FOCUSABLE: &[&str] = &["button", "input", "select", "textarea", "summary", "iframe"];

const INTERACTIVE_SELECTOR: &str = "a[href], button, input, select, textarea, summary, [tabindex], \
     [onclick], [role=button], [role=link], [role=checkbox], [role=radio], [role=tab], \
     [role=menuitem], [role=switch], [role=slider], [role=option]";

pub fn headings(ctx: &ExtractContext) -> Result<Vec<Heading>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("h1, h2, h3, h4, h5, h6, [role=heading]")? {
        if !ctx.dom.is_rendered(node) || ctx.aria_hidden(node) {
            continue;
        }
        let tag = ctx.dom.tag_name(node).unwrap_or_default();
        let level = match ctx.attr(node, "aria-level").and_then(|l| l.parse::<u8>().ok()) {
            Some(level) if ctx.role(node).as_deref() == Some("heading") => level.clamp(1, 6),
            _ => tag
                .strip_prefix('h')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=6).contains(n))
                .unwrap_or(2),
        };
        let text = match ctx.attr(node, "aria-label") {
            Some(label) => label,
            None => ctx.dom.text(node),
        };
        out.push(Heading {
            level,
            text,
            id: ctx.attr(node, "id"),
            source: ctx.source(node),
        });
    }
    Ok(out)
}

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "complementary",
    "contentinfo",
    "search",
    "form",
    "region",
];

/// Sectioning elements that stop header/footer being page landmarks
const SECTIONING: &[&str] = &["article", "aside", "main", "nav", "section"];

pub fn landmarks(ctx: &ExtractContext) -> Result<Vec<Landmark>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("header, nav, main, aside, footer, section, form, search, [role]")? {
        let tag = ctx.dom.tag_name(node).unwrap_or_default();
        let label = ctx
            .attr(node, "aria-label")
            .or_else(|| ctx.attr(node, "aria-labelledby").and_then(|ids| ctx.referenced_text(&ids)));
        let scoped = || {
            ctx.dom
                .parent(node)
                .and_then(|p| ctx.dom.closest(p, SECTIONING))
                .is_some()
        };

        let role = match ctx.role(node) {
            Some(role) => Some(role).filter(|r| LANDMARK_ROLES.contains(&r.as_str())),
            None => match tag.as_str() {
                "nav" => Some("navigation".to_string()),
                "main" => Some("main".to_string()),
                "aside" => Some("complementary".to_string()),
                "search" => Some("search".to_string()),
                "header" if !scoped() => Some("banner".to_string()),
                "footer" if !scoped() => Some("contentinfo".to_string()),
                // section and form only become landmarks when named
                "section" if label.is_some() => Some("region".to_string()),
                "form" if label.is_some() => Some("form".to_string()),
                _ => None,
            },
        };

        if let Some(role) = role {
            out.push(Landmark {
                role,
                label,
                source: ctx.source(node),
            });
        }
    }
    Ok(out)
}

/// `label[for]` targets mapped to label text
fn label_map(ctx: &ExtractContext) -> Result<HashMap<String, String>, DomError> {
    let mut map = HashMap::new();
    for label in ctx.dom.query("label[for]")? {
        if let Some(target) = ctx.attr(label, "for") {
            map.entry(target).or_insert_with(|| ctx.dom.text(label));
        }
    }
    Ok(map)
}

fn form_field(
    ctx: &ExtractContext,
    node: NodeId,
    labels: &HashMap<String, String>,
    ids: &BTreeSet<String>,
) -> FormField {
    let tag = ctx.dom.tag_name(node).unwrap_or_default();
    let input_type = if tag == "input" {
        ctx.attr(node, "type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    } else {
        tag.clone()
    };
    let id = ctx.attr(node, "id");
    let placeholder = ctx.attr(node, "placeholder");

    let explicit = id.as_ref().and_then(|id| labels.get(id)).filter(|t| !t.is_empty()).cloned();
    let wrapping = ctx
        .dom
        .closest(node, &["label"])
        .map(|l| ctx.dom.text(l))
        .filter(|t| !t.is_empty());
    let labelledby = ctx
        .attr(node, "aria-labelledby")
        .and_then(|ids| ctx.referenced_text(&ids));

    let (label, label_source) = if tag == "input" && UNLABELLED_INPUT_TYPES.contains(&input_type.as_str()) {
        (ctx.attr(node, "value").or_else(|| ctx.attr(node, "alt")), LabelSource::NotRequired)
    } else if let Some(text) = explicit {
        (Some(text), LabelSource::Explicit)
    } else if let Some(text) = wrapping {
        (Some(text), LabelSource::Wrapping)
    } else if let Some(text) = labelledby {
        (Some(text), LabelSource::AriaLabelledby)
    } else if let Some(text) = ctx.attr(node, "aria-label") {
        (Some(text), LabelSource::AriaLabel)
    } else if let Some(text) = ctx.attr(node, "title") {
        (Some(text), LabelSource::Title)
    } else if placeholder.is_some() {
        (None, LabelSource::PlaceholderOnly)
    } else {
        (None, LabelSource::None)
    };

    let aria_describedby = ctx
        .attr(node, "aria-describedby")
        .or_else(|| ctx.attr(node, "aria-errormessage"));
    let description_target_exists = aria_describedby
        .as_deref()
        .map(|refs| refs.split_whitespace().all(|r| ids.contains(r)))
        .unwrap_or(false);

    FormField {
        tag,
        input_type,
        name: ctx.attr(node, "name"),
        id,
        label,
        label_source,
        required: ctx.has_attr(node, "required"),
        aria_required: ctx
            .attr(node, "aria-required")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        aria_invalid: ctx
            .attr(node, "aria-invalid")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false),
        aria_describedby,
        description_target_exists,
        autocomplete: ctx.attr(node, "autocomplete"),
        pattern: ctx.attr(node, "pattern"),
        placeholder,
        source: ctx.source(node),
    }
}

pub fn forms(ctx: &ExtractContext) -> Result<Vec<FormRecord>, DomError> {
    let labels = label_map(ctx)?;
    let ids = ctx.ids()?;
    let controls = ctx.dom.query("input, select, textarea")?;
    let submits = ctx
        .dom
        .query("button:not([type]), button[type=submit], input[type=submit], input[type=image]")?;
    let live = ctx.dom.query("[role=alert], [role=status], [aria-live]")?;

    let owner = |node: NodeId| ctx.dom.closest(node, &["form"]);

    let mut out = Vec::new();
    for form in ctx.dom.query("form")? {
        let fields = controls
            .iter()
            .filter(|c| owner(**c) == Some(form))
            .map(|c| form_field(ctx, *c, &labels, &ids))
            .collect();
        out.push(FormRecord {
            id: ctx.attr(form, "id"),
            action: ctx.attr(form, "action"),
            method: ctx.attr(form, "method").map(|m| m.to_ascii_lowercase()),
            novalidate: ctx.has_attr(form, "novalidate"),
            fields,
            has_submit: submits.iter().any(|s| owner(*s) == Some(form)),
            live_regions: live.iter().filter(|l| owner(**l) == Some(form)).count(),
            source: ctx.source(form),
        });
    }
    Ok(out)
}

pub fn standalone_fields(ctx: &ExtractContext) -> Result<Vec<FormField>, DomError> {
    let labels = label_map(ctx)?;
    let ids = ctx.ids()?;
    Ok(ctx
        .dom
        .query("input, select, textarea")?
        .into_iter()
        .filter(|n| ctx.dom.closest(*n, &["form"]).is_none())
        .map(|n| form_field(ctx, n, &labels, &ids))
        .collect())
}

pub fn images(ctx: &ExtractContext) -> Result<Vec<ImageRecord>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("img, input[type=image], area[href]")? {
        let in_link = ctx
            .dom
            .closest(node, &["a"])
            .map(|a| ctx.dom.text(a).is_empty())
            .unwrap_or(false);
        out.push(ImageRecord {
            src: ctx.attr(node, "src").or_else(|| ctx.attr(node, "href")),
            // Some("") marks a decorative image
            alt: ctx.dom.attribute(node, "alt"),
            role: ctx.role(node),
            aria_label: ctx.attr(node, "aria-label"),
            aria_labelledby: ctx.attr(node, "aria-labelledby"),
            aria_hidden: ctx.aria_hidden(node),
            title: ctx.attr(node, "title"),
            in_link,
            source: ctx.source(node),
        });
    }
    Ok(out)
}

/// Accessible name of a link-like element, in precedence order
fn accessible_name(ctx: &ExtractContext, node: NodeId) -> String {
    if let Some(name) = ctx
        .attr(node, "aria-labelledby")
        .and_then(|ids| ctx.referenced_text(&ids))
    {
        return name;
    }
    if let Some(label) = ctx.attr(node, "aria-label") {
        return label;
    }
    let text = ctx.dom.text(node);
    if !text.is_empty() {
        return text;
    }
    let alts: Vec<String> = ctx
        .dom
        .query("img[alt], svg[aria-label]")
        .unwrap_or_default()
        .into_iter()
        .filter(|img| ctx.dom.closest(*img, &["a", "button"]) == Some(node))
        .filter_map(|img| ctx.attr(img, "alt").or_else(|| ctx.attr(img, "aria-label")))
        .collect();
    if !alts.is_empty() {
        return alts.join(" ");
    }
    ctx.attr(node, "title")
        .or_else(|| ctx.attr(node, "value"))
        .unwrap_or_default()
}

pub fn links(ctx: &ExtractContext) -> Result<Vec<LinkRecord>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("a[href], [role=link]")? {
        if !ctx.dom.is_rendered(node) {
            continue;
        }
        let href = ctx.dom.attribute(node, "href");
        let is_internal = href.as_deref().map(|h| ctx.is_internal(h)).unwrap_or(false);
        out.push(LinkRecord {
            text: ctx.dom.text(node),
            accessible_name: accessible_name(ctx, node),
            target: ctx.attr(node, "target"),
            is_internal,
            href,
            source: ctx.source(node),
        });
    }
    Ok(out)
}

pub fn tables(ctx: &ExtractContext) -> Result<Vec<TableRecord>, DomError> {
    let headers = ctx.dom.query("th")?;
    let cells = ctx.dom.query("td")?;
    let rows = ctx.dom.query("tr")?;
    let owner = |node: NodeId| ctx.dom.closest(node, &["table"]);

    let mut out = Vec::new();
    for table in ctx.dom.query("table")? {
        let own_headers: Vec<NodeId> = headers.iter().copied().filter(|h| owner(*h) == Some(table)).collect();
        let caption = ctx
            .dom
            .children(table)
            .into_iter()
            .find(|c| ctx.dom.tag_name(*c).as_deref() == Some("caption"))
            .map(|c| ctx.dom.text(c))
            .filter(|t| !t.is_empty());
        let has_thead = ctx
            .dom
            .children(table)
            .into_iter()
            .any(|c| ctx.dom.tag_name(c).as_deref() == Some("thead"));
        out.push(TableRecord {
            caption,
            aria_label: ctx
                .attr(table, "aria-label")
                .or_else(|| ctx.attr(table, "aria-labelledby").and_then(|ids| ctx.referenced_text(&ids))),
            summary: ctx.attr(table, "summary"),
            has_thead,
            header_cells: own_headers.len(),
            scoped_header_cells: own_headers
                .iter()
                .filter(|h| ctx.has_attr(**h, "scope") || ctx.has_attr(**h, "id"))
                .count(),
            data_cells: cells.iter().filter(|c| owner(**c) == Some(table)).count(),
            rows: rows.iter().filter(|r| owner(**r) == Some(table)).count(),
            is_layout: matches!(ctx.role(table).as_deref(), Some("presentation") | Some("none")),
            source: ctx.source(table),
        });
    }
    Ok(out)
}

pub fn lists(ctx: &ExtractContext) -> Result<Vec<ListRecord>, DomError> {
    let mut out = Vec::new();
    for list in ctx.dom.query("ul, ol, dl")? {
        let tag = ctx.dom.tag_name(list).unwrap_or_default();
        let (kind, valid): (ListKind, &[&str]) = match tag.as_str() {
            "ol" => (ListKind::Ordered, &["li", "script", "template"]),
            "dl" => (ListKind::Description, &["dt", "dd", "div", "script", "template"]),
            _ => (ListKind::Unordered, &["li", "script", "template"]),
        };
        let children: Vec<String> = ctx
            .dom
            .children(list)
            .into_iter()
            .filter_map(|c| ctx.dom.tag_name(c))
            .collect();
        out.push(ListRecord {
            kind,
            items: children.iter().filter(|c| matches!(c.as_str(), "li" | "dt" | "dd")).count(),
            invalid_children: children.iter().filter(|c| !valid.contains(&c.as_str())).count(),
            source: ctx.source(list),
        });
    }
    Ok(out)
}

pub fn iframes(ctx: &ExtractContext) -> Result<Vec<Iframe>, DomError> {
    Ok(ctx
        .dom
        .query("iframe, frame")?
        .into_iter()
        .map(|node| Iframe {
            src: ctx.attr(node, "src"),
            title: ctx.attr(node, "title"),
            aria_label: ctx.attr(node, "aria-label"),
            aria_hidden: ctx.aria_hidden(node),
            source: ctx.source(node),
        })
        .collect())
}

pub fn media(ctx: &ExtractContext) -> Result<Vec<MediaElement>, DomError> {
    let tracks = ctx.dom.query("track")?;
    let sources = ctx.dom.query("source[src]")?;
    let page_mentions_transcript = ctx
        .dom
        .query("a, button, details, summary, [id*=transcript], [class*=transcript]")?
        .into_iter()
        .any(|n| {
            ctx.dom.text(n).to_ascii_lowercase().contains("transcript")
                || ctx
                    .attr(n, "href")
                    .map(|h| h.to_ascii_lowercase().contains("transcript"))
                    .unwrap_or(false)
                || ctx
                    .attr(n, "id")
                    .map(|id| id.to_ascii_lowercase().contains("transcript"))
                    .unwrap_or(false)
        });

    let mut out = Vec::new();
    for node in ctx.dom.query("video, audio")? {
        let kind = if ctx.dom.tag_name(node).as_deref() == Some("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Video
        };
        let own_tracks: Vec<String> = tracks
            .iter()
            .filter(|t| ctx.dom.parent(**t) == Some(node))
            .map(|t| ctx.attr(*t, "kind").unwrap_or_else(|| "subtitles".to_string()).to_ascii_lowercase())
            .collect();
        let src = ctx.attr(node, "src").or_else(|| {
            sources
                .iter()
                .find(|s| ctx.dom.parent(**s) == Some(node))
                .and_then(|s| ctx.attr(*s, "src"))
        });
        out.push(MediaElement {
            kind,
            src,
            has_captions: own_tracks.iter().any(|k| k == "captions" || k == "subtitles"),
            has_descriptions: own_tracks.iter().any(|k| k == "descriptions"),
            has_transcript: page_mentions_transcript,
            autoplay: ctx.has_attr(node, "autoplay"),
            muted: ctx.has_attr(node, "muted"),
            controls: ctx.has_attr(node, "controls"),
            source: ctx.source(node),
        });
    }
    Ok(out)
}

/// Whether an element is in the sequential focus order
pub fn is_focusable(ctx: &ExtractContext, node: NodeId) -> bool {
    let tag = ctx.dom.tag_name(node).unwrap_or_default();
    let tabindex = ctx.attr(node, "tabindex").and_then(|t| t.parse::<i32>().ok());
    if ctx.has_attr(node, "disabled") {
        return false;
    }
    if tag == "input" && ctx.attr(node, "type").map(|t| t.eq_ignore_ascii_case("hidden")).unwrap_or(false) {
        return false;
    }
    match tabindex {
        Some(t) if t < 0 => false,
        Some(_) => true,
        None => NATIVELY_FOCUSABLE.contains(&tag.as_str()) || (tag == "a" && ctx.has_attr(node, "href")),
    }
}

pub fn interactive(ctx: &ExtractContext) -> Result<Vec<InteractiveElement>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query(INTERACTIVE_SELECTOR)? {
        if !ctx.dom.is_rendered(node) {
            continue;
        }
        let name = accessible_name(ctx, node);
        out.push(InteractiveElement {
            tag: ctx.dom.tag_name(node).unwrap_or_default(),
            role: ctx.role(node),
            tabindex: ctx.attr(node, "tabindex").and_then(|t| t.parse::<i32>().ok()),
            focusable: is_focusable(ctx, node),
            has_click_handler: ctx.has_attr(node, "onclick"),
            has_key_handler: ["onkeydown", "onkeyup", "onkeypress"]
                .iter()
                .any(|h| ctx.has_attr(node, h)),
            accessible_name: (!name.is_empty()).then_some(name),
            aria_hidden: ctx.aria_hidden(node),
            disabled: ctx.has_attr(node, "disabled"),
            source: ctx.source(node),
        });
    }
    Ok(out)
}
