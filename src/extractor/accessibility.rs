// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility-tree extraction: ARIA usage, focus order, skip links,
//! keyboard traps, duplicate ids and language changes.

use std::collections::{BTreeMap, BTreeSet};

use super::structure::is_focusable;
use super::ExtractContext;
use crate::dom::{DomError, NodeId};
use crate::model::{AriaElement, KeyboardTrap, SkipLink, TabStop};

/// Link texts that mark a bypass-blocks link
const SKIP_LINK_PHRASES: &[&str] = &["skip", "jump to", "main content", "go to content"];

pub fn aria(ctx: &ExtractContext) -> Result<Vec<AriaElement>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("*")? {
        let attributes: BTreeMap<String, String> = ctx
            .dom
            .attributes(node)
            .into_iter()
            .filter(|(k, _)| k.starts_with("aria-"))
            .collect();
        let role = ctx.role(node);
        if role.is_none() && attributes.is_empty() {
            continue;
        }
        out.push(AriaElement {
            role,
            attributes,
            focusable: is_focusable(ctx, node),
            source: ctx.source(node),
        });
    }
    Ok(out)
}

fn focusable_nodes(ctx: &ExtractContext) -> Result<Vec<NodeId>, DomError> {
    Ok(ctx
        .dom
        .query("a[href], button, input, select, textarea, summary, iframe, [tabindex]")?
        .into_iter()
        .filter(|n| is_focusable(ctx, *n) && ctx.dom.is_rendered(*n))
        .collect())
}

/// Sequential focus order: positive tabindex ascending, then document order
pub fn tab_order(ctx: &ExtractContext) -> Result<Vec<TabStop>, DomError> {
    let mut stops: Vec<(i32, usize, NodeId)> = focusable_nodes(ctx)?
        .into_iter()
        .enumerate()
        .map(|(position, node)| {
            let tabindex = ctx
                .attr(node, "tabindex")
                .and_then(|t| t.parse::<i32>().ok())
                .unwrap_or(0);
            (tabindex, position, node)
        })
        .collect();
    stops.sort_by_key(|(tabindex, position, _)| {
        // tabindex 0 sorts after every positive value
        let group = if *tabindex > 0 { *tabindex } else { i32::MAX };
        (group, *position)
    });
    Ok(stops
        .into_iter()
        .map(|(tabindex, _, node)| TabStop {
            tabindex,
            tag: ctx.dom.tag_name(node).unwrap_or_default(),
            source: ctx.source(node),
        })
        .collect())
}

pub fn skip_links(ctx: &ExtractContext, tab_order: &[TabStop]) -> Result<Vec<SkipLink>, DomError> {
    let ids = ctx.ids()?;
    let anchors: BTreeSet<String> = ctx
        .dom
        .query("a[name]")?
        .into_iter()
        .filter_map(|n| ctx.attr(n, "name"))
        .collect();

    let mut out = Vec::new();
    for node in ctx.dom.query("a[href^='#']")? {
        let href = ctx.dom.attribute(node, "href").unwrap_or_default();
        let text = ctx
            .attr(node, "aria-label")
            .unwrap_or_else(|| ctx.dom.text(node));
        let lower = text.to_ascii_lowercase();
        if !SKIP_LINK_PHRASES.iter().any(|p| lower.contains(p)) {
            continue;
        }
        let fragment = href.trim_start_matches('#');
        let target_exists = !fragment.is_empty() && (ids.contains(fragment) || anchors.contains(fragment));
        let source = ctx.source(node);
        let focus_position = tab_order
            .iter()
            .position(|stop| stop.source.path == source.path)
            .unwrap_or(tab_order.len());
        out.push(SkipLink {
            href,
            text,
            target_exists,
            focus_position,
            source,
        });
    }
    Ok(out)
}

/// Static heuristics for focus traps: handlers that swallow Tab or force
/// focus back onto themselves.
pub fn keyboard_traps(ctx: &ExtractContext) -> Result<Vec<KeyboardTrap>, DomError> {
    let mut out = Vec::new();
    for node in ctx.dom.query("[onkeydown], [onblur], [onfocusout]")? {
        let keydown = ctx.dom.attribute(node, "onkeydown").unwrap_or_default();
        let blur = ctx
            .dom
            .attribute(node, "onblur")
            .or_else(|| ctx.dom.attribute(node, "onfocusout"))
            .unwrap_or_default();

        let swallows_tab = keydown.contains("preventDefault")
            && (keydown.contains("Tab") || keydown.contains("keyCode") && keydown.contains('9'));
        let refocuses = blur.contains(".focus()");

        let description = if swallows_tab {
            "keydown handler cancels Tab, focus cannot leave the element"
        } else if refocuses {
            "blur handler moves focus back, focus cannot leave the element"
        } else {
            continue;
        };
        out.push(KeyboardTrap {
            description: description.to_string(),
            source: ctx.source(node),
        });
    }
    Ok(out)
}

/// Number of elements with an `id`, and the ids used more than once
pub fn id_usage(ctx: &ExtractContext) -> Result<(usize, Vec<String>), DomError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in ctx.dom.query("[id]")? {
        if let Some(id) = ctx.attr(node, "id") {
            *counts.entry(id).or_default() += 1;
        }
    }
    let total = counts.values().sum();
    let duplicates = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    Ok((total, duplicates))
}

pub fn language_changes(ctx: &ExtractContext) -> Result<Vec<String>, DomError> {
    Ok(ctx
        .dom
        .query("body [lang]")?
        .into_iter()
        .filter_map(|n| ctx.attr(n, "lang"))
        .collect())
}
