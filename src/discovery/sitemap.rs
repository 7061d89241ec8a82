// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sitemap signal: XML sitemaps, sitemap indexes and HTML sitemap pages
//! flattened into a deduplicated URL set.

use std::collections::{BTreeSet, VecDeque};

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::fetch::Fetcher;

/// Conventional sitemap locations probed when robots.txt names none
pub const DEFAULT_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// One parsed sitemap document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs (`<urlset><url><loc>`)
    pub urls: Vec<String>,
    /// Nested sitemaps (`<sitemapindex><sitemap><loc>`)
    pub nested: Vec<String>,
}

/// Parse an XML sitemap or sitemap index. Markup that is not XML is read as
/// an HTML sitemap page whose same-site links are the URLs.
pub fn parse_sitemap(body: &str, base: &Url) -> SitemapDocument {
    let parsed = roxmltree::Document::parse(body.trim_start_matches('\u{feff}')).map_err(|e| e.to_string());
    let parsed = parsed.and_then(|doc| {
        let root = doc.root_element().tag_name().name().to_string();
        if root == "urlset" || root == "sitemapindex" {
            Ok(doc)
        } else {
            Err(format!("root element <{}>", root))
        }
    });
    match parsed {
        Ok(doc) => {
            let mut out = SitemapDocument::default();
            for loc in doc.descendants().filter(|n| n.has_tag_name("loc")) {
                let Some(text) = loc.text().map(str::trim).filter(|t| !t.is_empty()) else {
                    continue;
                };
                let in_index = loc.parent().map(|p| p.has_tag_name("sitemap")).unwrap_or(false);
                if in_index {
                    out.nested.push(text.to_string());
                } else {
                    out.urls.push(text.to_string());
                }
            }
            out
        }
        Err(e) => {
            debug!("Sitemap is not XML ({}), reading as HTML", e);
            SitemapDocument {
                urls: html_sitemap_links(body, base),
                nested: Vec::new(),
            }
        }
    }
}

fn html_sitemap_links(body: &str, base: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(body);
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|u| u.host_str() == base.host_str() && matches!(u.scheme(), "http" | "https"))
        .map(|mut u| {
            u.set_fragment(None);
            u.to_string()
        })
        .collect()
}

/// Follow sitemaps breadth-first from `roots`, up to `max_documents`
/// fetched documents. Unreachable documents are skipped.
pub async fn collect_urls(
    fetcher: &dyn Fetcher,
    roots: &[String],
    base: &Url,
    max_documents: usize,
) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<String> = roots.iter().cloned().collect();
    let mut fetched = 0usize;

    while let Some(location) = queue.pop_front() {
        if fetched >= max_documents {
            warn!("Sitemap document limit ({}) reached, {} left unread", max_documents, queue.len() + 1);
            break;
        }
        if !seen.insert(location.clone()) {
            continue;
        }
        fetched += 1;
        let body = match fetcher.fetch_text(&location).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Sitemap {} unavailable: {}", location, e);
                continue;
            }
        };
        let doc = parse_sitemap(&body, base);
        debug!("Sitemap {}: {} urls, {} nested", location, doc.urls.len(), doc.nested.len());
        urls.extend(doc.urls);
        queue.extend(doc.nested);
    }
    urls
}

/// Sitemap signal from the conventional locations
pub async fn sitemap_count(fetcher: &dyn Fetcher, base: &Url, max_documents: usize) -> usize {
    let roots: Vec<String> = DEFAULT_SITEMAP_PATHS
        .iter()
        .filter_map(|p| base.join(p).ok())
        .map(|u| u.to_string())
        .collect();
    collect_urls(fetcher, &roots, base, max_documents).await.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/</loc></url>
              <url><loc> https://example.com/about </loc><lastmod>2024-01-01</lastmod></url>
            </urlset>"#;
        let doc = parse_sitemap(xml, &base());
        assert_eq!(doc.urls, vec!["https://example.com/", "https://example.com/about"]);
        assert!(doc.nested.is_empty());
    }

    #[test]
    fn test_parse_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://example.com/posts.xml</loc></sitemap>
              <sitemap><loc>https://example.com/pages.xml</loc></sitemap>
            </sitemapindex>"#;
        let doc = parse_sitemap(xml, &base());
        assert!(doc.urls.is_empty());
        assert_eq!(doc.nested.len(), 2);
    }

    #[test]
    fn test_html_sitemap_page() {
        let html = r#"<html><body><a href="/a">A</a><a href="/b#top">B</a>
            <a href="https://other.org/x">X</a></body></html>"#;
        let doc = parse_sitemap(html, &base());
        assert_eq!(doc.urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
