// SPDX-License-Identifier: PMPL-1.0-or-later
//! Multi-page crawl session.
//!
//! A single coordinator owns the frontier queue and the visited set. Fetch
//! workers are spawned onto a `JoinSet`, hold no crawl state, and hand the
//! fetched document back; the coordinator extracts it and schedules its
//! links. A failed fetch becomes an unavailable snapshot, never an abort.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{CrawlConfig, ExtractConfig};
use crate::discovery::crawl::{extract_links, is_content_url, normalize};
use crate::error::Result;
use crate::extractor::PageExtractor;
use crate::fetch::{FetchedPage, Fetcher};
use crate::model::PageSnapshot;

/// Outcome of one fetch worker
struct Fetched {
    order: usize,
    url: Url,
    depth: usize,
    result: Result<FetchedPage>,
}

pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    config: CrawlConfig,
    extractor: PageExtractor,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CrawlConfig, extract: ExtractConfig) -> Self {
        Self {
            fetcher,
            config,
            extractor: PageExtractor::new(extract),
        }
    }

    /// Crawl from `start`, returning snapshots in discovery order. The first
    /// snapshot is always the start page.
    pub async fn crawl(&self, start: &Url) -> Vec<PageSnapshot> {
        let max_pages = self.config.max_pages.max(1);
        let concurrency = self.config.concurrency.max(1);

        let mut frontier: VecDeque<(Url, usize)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut workers: JoinSet<Fetched> = JoinSet::new();
        let mut pages: Vec<(usize, PageSnapshot)> = Vec::new();
        let mut scheduled = 0usize;

        visited.insert(normalize(start));
        frontier.push_back((start.clone(), 0));

        loop {
            while workers.len() < concurrency && scheduled < max_pages {
                let Some((url, depth)) = frontier.pop_front() else {
                    break;
                };
                let fetcher = Arc::clone(&self.fetcher);
                let order = scheduled;
                scheduled += 1;
                workers.spawn(async move {
                    let result = fetcher.fetch(url.as_str()).await;
                    Fetched {
                        order,
                        url,
                        depth,
                        result,
                    }
                });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };
            let fetched = match joined {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(error = %e, "Fetch worker did not complete");
                    continue;
                }
            };

            let snapshot = match fetched.result {
                Ok(page) => {
                    if fetched.depth < self.config.max_depth {
                        let page_url = Url::parse(&page.final_url).unwrap_or_else(|_| fetched.url.clone());
                        for link in extract_links(&page.body, &page_url) {
                            if is_content_url(&link, start) && visited.insert(normalize(&link)) {
                                frontier.push_back((link, fetched.depth + 1));
                            }
                        }
                    }
                    self.extractor.extract_html(&page)
                }
                Err(e) => {
                    warn!(url = %fetched.url, error = %e, "Page fetch failed");
                    PageSnapshot::unavailable(fetched.url.as_str(), &e.to_string())
                }
            };
            debug!("Crawled {} (depth {})", snapshot.url, fetched.depth);
            pages.push((fetched.order, snapshot));
        }

        pages.sort_by_key(|(order, _)| *order);
        info!(
            "Crawl of {} finished: {} pages, {} left in frontier",
            start,
            pages.len(),
            frontier.len()
        );
        pages.into_iter().map(|(_, snapshot)| snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_html(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn crawler(max_pages: usize, max_depth: usize) -> Crawler {
        let fetcher = Arc::new(HttpFetcher::new("wcagbot-test", 5).unwrap());
        let config = CrawlConfig {
            max_pages,
            max_depth,
            ..CrawlConfig::default()
        };
        Crawler::new(fetcher, config, ExtractConfig::default())
    }

    #[tokio::test]
    async fn test_crawl_follows_same_site_links() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html lang="en"><title>Home</title><a href="/a">A</a><a href="/b">B</a>
               <a href="/a#top">A again</a><a href="https://elsewhere.test/">out</a></html>"#,
        )
        .await;
        mount_html(&server, "/a", r#"<html><title>A</title><a href="/c">C</a></html>"#).await;
        mount_html(&server, "/b", r#"<html><title>B</title></html>"#).await;
        mount_html(&server, "/c", r#"<html><title>C</title></html>"#).await;

        let start = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = crawler(10, 1).crawl(&start).await;

        let titles: Vec<_> = pages.iter().filter_map(|p| p.title.as_deref()).collect();
        assert_eq!(titles, vec!["Home", "A", "B"]);
        assert_eq!(pages[0].language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_crawl_respects_page_cap() {
        let server = MockServer::start().await;
        mount_html(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#).await;
        mount_html(&server, "/a", "<p>a</p>").await;
        mount_html(&server, "/b", "<p>b</p>").await;
        mount_html(&server, "/c", "<p>c</p>").await;

        let start = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = crawler(2, 3).crawl(&start).await;
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_unavailable_page() {
        let server = MockServer::start().await;
        mount_html(&server, "/", r#"<a href="/gone">gone</a>"#).await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let start = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = crawler(10, 2).crawl(&start).await;
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_available());
        assert!(!pages[1].is_available());
    }
}
