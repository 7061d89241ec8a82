// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page Model Extractor.
//!
//! Turns one fetched document plus a [`Dom`] handle into a [`PageSnapshot`].
//! Each sub-step (headings, tables, contrast, ...) runs in isolation: an
//! error or panic inside one is logged, recorded in
//! `PageSnapshot::extraction_errors` and replaced by an empty result. Only
//! plain data leaves this module; no `NodeId` survives into the snapshot.

pub mod accessibility;
pub mod structure;
pub mod styling;

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};
use url::Url;

use crate::config::ExtractConfig;
use crate::dom::{Dom, DomError, NodeId, StaticDom};
use crate::fetch::FetchedPage;
use crate::model::{
    AccessibilityData, ElementSource, PageMeta, PageSnapshot, PageStructure, PageTiming, StylingData,
};

/// Shared, read-only state for one extraction
pub struct ExtractContext<'a> {
    pub dom: &'a dyn Dom,
    pub config: &'a ExtractConfig,
    /// Page URL after redirects, used to resolve relative links
    pub base: Option<Url>,
}

impl<'a> ExtractContext<'a> {
    pub fn new(dom: &'a dyn Dom, config: &'a ExtractConfig, url: &str) -> Self {
        Self {
            dom,
            config,
            base: Url::parse(url).ok(),
        }
    }

    /// Provenance record for a node
    pub fn source(&self, node: NodeId) -> ElementSource {
        ElementSource {
            tag: self.dom.tag_name(node).unwrap_or_default(),
            path: self.dom.dom_path(node),
            snippet: self.dom.snippet(node, self.config.snippet_length),
        }
    }

    /// Attribute value, trimmed, `None` when absent or blank
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom
            .attribute(node, name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.dom.attribute(node, name).is_some()
    }

    /// Lowercase `role` attribute (first token)
    pub fn role(&self, node: NodeId) -> Option<String> {
        self.attr(node, "role")
            .and_then(|r| r.split_whitespace().next().map(str::to_ascii_lowercase))
    }

    pub fn aria_hidden(&self, node: NodeId) -> bool {
        self.dom
            .attribute(node, "aria-hidden")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Every `id` value in the document
    pub fn ids(&self) -> Result<BTreeSet<String>, DomError> {
        Ok(self
            .dom
            .query("[id]")?
            .into_iter()
            .filter_map(|n| self.attr(n, "id"))
            .collect())
    }

    /// Text of the elements named by an id-reference list (`aria-labelledby`)
    pub fn referenced_text(&self, ids: &str) -> Option<String> {
        let parts: Vec<String> = ids
            .split_whitespace()
            .filter_map(|id| {
                let selector = format!("[id=\"{}\"]", id.replace('"', ""));
                let node = self.dom.query(&selector).ok()?.into_iter().next()?;
                let text = self.dom.text(node);
                (!text.is_empty()).then_some(text)
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Same-site check against the page URL
    pub fn is_internal(&self, href: &str) -> bool {
        let Some(base) = &self.base else {
            return !href.contains("://");
        };
        match base.join(href) {
            Ok(resolved) => {
                matches!(resolved.scheme(), "http" | "https") && resolved.host_str() == base.host_str()
            }
            Err(_) => false,
        }
    }
}

/// Builds page snapshots with a fixed configuration
pub struct PageExtractor {
    config: ExtractConfig,
}

impl PageExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Parse markup with the static DOM and extract it
    pub fn extract_html(&self, page: &FetchedPage) -> PageSnapshot {
        let dom = StaticDom::parse(&page.body);
        self.extract(page, &dom)
    }

    /// Build the snapshot for one page. Never fails: broken sub-steps
    /// produce empty sections.
    pub fn extract(&self, page: &FetchedPage, dom: &dyn Dom) -> PageSnapshot {
        let url = page.url.as_str();
        let ctx = ExtractContext::new(dom, &self.config, &page.final_url);
        let mut errors = Vec::new();

        let title = guarded("title", url, &mut errors, || extract_title(&ctx));
        let language = guarded("language", url, &mut errors, || extract_language(&ctx));
        let meta = guarded("meta", url, &mut errors, || extract_meta(&ctx));

        let structure = PageStructure {
            headings: guarded("headings", url, &mut errors, || structure::headings(&ctx)),
            landmarks: guarded("landmarks", url, &mut errors, || structure::landmarks(&ctx)),
            forms: guarded("forms", url, &mut errors, || structure::forms(&ctx)),
            standalone_fields: guarded("standalone_fields", url, &mut errors, || {
                structure::standalone_fields(&ctx)
            }),
            images: guarded("images", url, &mut errors, || structure::images(&ctx)),
            links: guarded("links", url, &mut errors, || structure::links(&ctx)),
            tables: guarded("tables", url, &mut errors, || structure::tables(&ctx)),
            lists: guarded("lists", url, &mut errors, || structure::lists(&ctx)),
            iframes: guarded("iframes", url, &mut errors, || structure::iframes(&ctx)),
            media: guarded("media", url, &mut errors, || structure::media(&ctx)),
            interactive: guarded("interactive", url, &mut errors, || structure::interactive(&ctx)),
        };

        let tab_order = guarded("tab_order", url, &mut errors, || accessibility::tab_order(&ctx));
        let (id_count, duplicate_ids) = guarded("ids", url, &mut errors, || accessibility::id_usage(&ctx));
        let accessibility = AccessibilityData {
            aria: guarded("aria", url, &mut errors, || accessibility::aria(&ctx)),
            skip_links: guarded("skip_links", url, &mut errors, || {
                accessibility::skip_links(&ctx, &tab_order)
            }),
            keyboard_traps: guarded("keyboard_traps", url, &mut errors, || {
                accessibility::keyboard_traps(&ctx)
            }),
            id_count,
            duplicate_ids,
            language_changes: guarded("language_changes", url, &mut errors, || {
                accessibility::language_changes(&ctx)
            }),
            tab_order,
        };

        let (contrast_samples, contrast_stats) =
            guarded("contrast", url, &mut errors, || styling::contrast(&ctx));
        let palette = guarded("colors", url, &mut errors, || styling::palette(&ctx));
        let styling = StylingData {
            text_colors: palette.text_colors,
            background_colors: palette.background_colors,
            fonts: guarded("fonts", url, &mut errors, || styling::fonts(&ctx)),
            responsive: guarded("responsive", url, &mut errors, || styling::responsive(&ctx, &meta)),
            contrast_samples,
            contrast_stats,
            text_spacing: guarded("text_spacing", url, &mut errors, || styling::text_spacing(&ctx)),
            focus: guarded("focus_styles", url, &mut errors, || styling::focus_styles(&ctx)),
        };

        debug!(
            "Extracted {}: {} headings, {} images, {} links, {} contrast samples",
            url,
            structure.headings.len(),
            structure.images.len(),
            structure.links.len(),
            styling.contrast_samples.len()
        );

        PageSnapshot {
            url: url.to_string(),
            title,
            language,
            status: Default::default(),
            meta,
            structure,
            accessibility,
            styling,
            headers: page.headers.clone(),
            timing: PageTiming {
                load_time_ms: page.load_time_ms,
                redirected: page.redirected,
            },
            extraction_errors: errors,
        }
    }
}

/// Run one extraction sub-step, turning errors and panics into an empty
/// result plus a recorded error
fn guarded<T, F>(step: &str, url: &str, errors: &mut Vec<String>, f: F) -> T
where
    T: Default,
    F: FnOnce() -> Result<T, DomError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!(url = %url, step = %step, error = %e, "Extraction step failed");
            errors.push(format!("{}: {}", step, e));
            T::default()
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(url = %url, step = %step, error = %message, "Extraction step panicked");
            errors.push(format!("{}: panicked: {}", step, message));
            T::default()
        }
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn extract_title(ctx: &ExtractContext) -> Result<Option<String>, DomError> {
    Ok(ctx
        .dom
        .query("title")?
        .into_iter()
        .next()
        .map(|n| ctx.dom.text(n))
        .filter(|t| !t.is_empty()))
}

fn extract_language(ctx: &ExtractContext) -> Result<Option<String>, DomError> {
    Ok(ctx
        .dom
        .query("html")?
        .into_iter()
        .next()
        .and_then(|n| ctx.attr(n, "lang").or_else(|| ctx.attr(n, "xml:lang"))))
}

fn extract_meta(ctx: &ExtractContext) -> Result<PageMeta, DomError> {
    let mut meta = PageMeta::default();
    for node in ctx.dom.query("meta")? {
        let name = ctx.attr(node, "name").map(|n| n.to_ascii_lowercase());
        let http_equiv = ctx.attr(node, "http-equiv").map(|n| n.to_ascii_lowercase());
        let content = ctx.dom.attribute(node, "content");
        match (name.as_deref(), http_equiv.as_deref()) {
            (Some("viewport"), _) => meta.viewport = content,
            (Some("description"), _) => meta.description = content,
            (_, Some("refresh")) => meta.refresh = content,
            _ => {}
        }
        if let Some(charset) = ctx.attr(node, "charset") {
            meta.charset = Some(charset);
        }
    }
    meta.moving_elements = ctx.dom.query("marquee, blink")?.len();
    Ok(meta)
}
