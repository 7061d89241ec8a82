// SPDX-License-Identifier: PMPL-1.0-or-later
//! Crawl signal: breadth-first, same-site link traversal that counts
//! content pages. The link filter is shared with the audit crawler.

use std::collections::{HashSet, VecDeque};

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::fetch::Fetcher;

/// Path fragments of URLs that are not content pages
const NON_CONTENT_PATTERNS: &[&str] = &[
    "/admin", "/wp-admin", "/wp-login", "/login", "/logout", "/signin", "/cart", "/checkout", "/feed",
    "/rss", "/atom", "/cdn-cgi/", "/wp-content/", "/wp-json/", "/static/", "/assets/", "/api/",
];

/// Extensions of static assets and downloads
const NON_CONTENT_EXTENSIONS: &[&str] = &[
    ".xml", ".rss", ".json", ".pdf", ".zip", ".gz", ".tar", ".doc", ".docx", ".xls", ".xlsx", ".ppt",
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".mp3", ".mp4", ".webm",
    ".woff", ".woff2", ".ttf", ".exe", ".dmg",
];

/// Whether `url` is a same-site content page worth visiting
pub fn is_content_url(url: &Url, base: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") || url.host_str() != base.host_str() {
        return false;
    }
    if url.query().is_some() {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    !NON_CONTENT_PATTERNS.iter().any(|p| path.contains(p))
        && !NON_CONTENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Canonical form used for deduplication: no fragment, no trailing slash
/// except for the root
pub fn normalize(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    let s = u.to_string();
    if u.path() != "/" {
        s.trim_end_matches('/').to_string()
    } else {
        s
    }
}

/// Resolved `<a href>` targets of a page, in document order
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| page_url.join(href).ok())
        .collect()
}

/// Count reachable content pages up to `max_depth` links from `base`,
/// stopping after `max_pages` visits. Failed fetches count as visits but
/// not as pages.
pub async fn crawl_count(fetcher: &dyn Fetcher, base: &Url, max_depth: usize, max_pages: usize) -> usize {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Url, usize)> = VecDeque::new();
    let mut fetches = 0usize;
    let mut pages = 0usize;

    visited.insert(normalize(base));
    queue.push_back((base.clone(), 0));

    while let Some((url, depth)) = queue.pop_front() {
        if fetches >= max_pages {
            debug!("Crawl signal hit the {} visit cap", max_pages);
            break;
        }
        fetches += 1;
        let page = match fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Crawl signal skipped {}: {}", url, e);
                continue;
            }
        };
        pages += 1;
        if depth >= max_depth {
            continue;
        }
        let page_url = Url::parse(&page.final_url).unwrap_or(url);
        for link in extract_links(&page.body, &page_url) {
            if is_content_url(&link, base) && visited.insert(normalize(&link)) {
                queue.push_back((link, depth + 1));
            }
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_content_filter() {
        assert!(is_content_url(&url("https://example.com/about"), &base()));
        assert!(is_content_url(&url("https://example.com/blog/post-1/"), &base()));
        assert!(!is_content_url(&url("https://other.com/about"), &base()));
        assert!(!is_content_url(&url("https://example.com/search?q=x"), &base()));
        assert!(!is_content_url(&url("https://example.com/wp-admin/edit"), &base()));
        assert!(!is_content_url(&url("https://example.com/feed"), &base()));
        assert!(!is_content_url(&url("https://example.com/logo.PNG"), &base()));
        assert!(!is_content_url(&url("mailto:hi@example.com"), &base()));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&url("https://example.com/a/#top")), "https://example.com/a");
        assert_eq!(normalize(&url("https://example.com/")), "https://example.com/");
    }

    #[test]
    fn test_extract_links() {
        let links = extract_links(
            r##"<a href="/a">A</a><a href="#skip">skip</a><a href="b">B</a><a href="">empty</a>"##,
            &url("https://example.com/dir/"),
        );
        let links: Vec<String> = links.into_iter().map(|u| u.to_string()).collect();
        assert_eq!(links, vec!["https://example.com/a", "https://example.com/dir/b"]);
    }

    #[tokio::test]
    async fn test_crawl_count_caps_failed_visits() {
        use crate::fetch::HttpFetcher;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let links: String = (0..40).map(|i| format!(r#"<a href="/p{i}">p{i}</a>"#)).collect();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(links),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("wcagbot-test", 5).unwrap();
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let count = crawl_count(&fetcher, &base, 3, 5).await;

        assert_eq!(count, 1);
        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests.len() <= 5, "crawl made {} requests", requests.len());
    }
}
