// SPDX-License-Identifier: PMPL-1.0-or-later
//! Multi-page discovery and page-count consensus.
//!
//! Three unreliable signals (sitemap, robots.txt, crawl) run concurrently,
//! each bounded by a timeout; [`arbitrate`] then picks one trusted count.

pub mod crawl;
pub mod robots;
pub mod sitemap;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::{ConsensusThresholds, DiscoveryConfig};
use crate::error::Result;
use crate::fetch::Fetcher;
use robots::RobotsTxt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Result of one page-count request. A signal that produced nothing is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCountEstimate {
    pub sitemap_count: usize,
    pub robots_count: usize,
    pub crawl_count: usize,
    pub chosen_count: usize,
    pub confidence: Confidence,
    /// Which rule produced the count
    pub method: String,
    pub recommendations: Vec<String>,
}

/// Keyword-based guess for a site no signal could measure
pub fn domain_estimate(domain: &str, t: &ConsensusThresholds) -> usize {
    let d = domain.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| d.contains(w));
    if has(&["shop", "store", "commerce", "cart", "market"]) {
        t.commerce_estimate
    } else if has(&["blog", "news", "magazine", "journal"]) {
        t.publication_estimate
    } else if d.ends_with(".edu") || d.contains(".edu.") || d.contains(".ac.") {
        t.education_estimate
    } else {
        t.default_estimate
    }
}

/// Pick one page count from the three signals
pub fn arbitrate(
    sitemap: usize,
    robots: usize,
    crawl: usize,
    domain: &str,
    t: &ConsensusThresholds,
) -> PageCountEstimate {
    let (chosen, mut confidence, method) = match (sitemap > 0, robots > 0, crawl > 0) {
        (false, false, false) => (domain_estimate(domain, t), Confidence::Low, "domain_heuristic"),
        (true, false, false) => (sitemap, Confidence::High, "sitemap"),
        (false, false, true) => (crawl, Confidence::Medium, "crawl"),
        (false, true, false) => (robots, Confidence::Low, "robots"),
        (true, _, true) => {
            let ratio = sitemap.max(crawl) as f64 / sitemap.min(crawl) as f64;
            if ratio <= t.agreement_ratio {
                (sitemap, Confidence::High, "sitemap_crawl_agree")
            } else if crawl > sitemap {
                ((sitemap + crawl) / 2, Confidence::Medium, "sitemap_crawl_mean")
            } else {
                (sitemap, Confidence::High, "sitemap_larger")
            }
        }
        (true, true, false) => {
            if sitemap > t.sitemap_robots_factor * robots {
                (sitemap.min(robots), Confidence::Medium, "sitemap_suspect")
            } else {
                (sitemap, Confidence::High, "sitemap")
            }
        }
        (false, true, true) => (crawl, Confidence::Medium, "crawl"),
    };

    let mut recommendations = Vec::new();
    if chosen > t.very_large_site {
        confidence = confidence.min(Confidence::Medium);
        recommendations.push(format!(
            "Very large site ({} pages): use sampling rather than a full audit",
            chosen
        ));
    } else if chosen > t.large_site {
        recommendations.push(format!(
            "Large site ({} pages): audit a representative sample of templates",
            chosen
        ));
    } else if chosen < t.small_site {
        recommendations.push(format!("Small site ({} pages): run a full-site analysis", chosen));
    }

    PageCountEstimate {
        sitemap_count: sitemap,
        robots_count: robots,
        crawl_count: crawl,
        chosen_count: chosen,
        confidence,
        method: method.to_string(),
        recommendations,
    }
}

/// Runs the three signals for a site
pub struct PageCounter {
    fetcher: Arc<dyn Fetcher>,
    config: DiscoveryConfig,
}

impl PageCounter {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DiscoveryConfig) -> Self {
        Self { fetcher, config }
    }

    async fn bounded<F>(&self, signal: &str, fut: F) -> usize
    where
        F: Future<Output = usize>,
    {
        match tokio::time::timeout(Duration::from_secs(self.config.signal_timeout_secs), fut).await {
            Ok(count) => count,
            Err(_) => {
                warn!(signal = %signal, "Page-count signal timed out");
                0
            }
        }
    }

    async fn robots_signal(&self, base: &Url) -> usize {
        let Ok(robots_url) = base.join("/robots.txt") else {
            return 0;
        };
        let text = match self.fetcher.fetch_text(robots_url.as_str()).await {
            Ok(text) => text,
            Err(e) => {
                info!("No robots.txt for {}: {}", base, e);
                return 0;
            }
        };
        let robots = RobotsTxt::parse(&text);
        if !robots.sitemaps.is_empty() {
            let urls =
                sitemap::collect_urls(self.fetcher.as_ref(), &robots.sitemaps, base, self.config.max_sitemaps)
                    .await;
            if !urls.is_empty() {
                return urls.len();
            }
        }
        robots.estimate(&self.config.thresholds)
    }

    /// Estimate the page count of the site at `base_url`
    pub async fn estimate(&self, base_url: &str) -> Result<PageCountEstimate> {
        let base = Url::parse(base_url)?;
        let fetcher = self.fetcher.as_ref();

        let (sitemap, robots, crawl) = tokio::join!(
            self.bounded("sitemap", sitemap::sitemap_count(fetcher, &base, self.config.max_sitemaps)),
            self.bounded("robots", self.robots_signal(&base)),
            self.bounded(
                "crawl",
                crawl::crawl_count(fetcher, &base, self.config.max_depth, self.config.max_crawl_pages)
            ),
        );

        let domain = base.host_str().unwrap_or_default();
        let estimate = arbitrate(sitemap, robots, crawl, domain, &self.config.thresholds);
        info!(
            "Page count for {}: {} ({} confidence, sitemap={}, robots={}, crawl={})",
            domain, estimate.chosen_count, estimate.confidence, sitemap, robots, crawl
        );
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> ConsensusThresholds {
        ConsensusThresholds::default()
    }

    #[test]
    fn test_sitemap_and_crawl_agree() {
        let e = arbitrate(100, 0, 120, "example.com", &t());
        assert_eq!(e.chosen_count, 100);
        assert_eq!(e.confidence, Confidence::High);
    }

    #[test]
    fn test_crawl_much_larger_uses_mean() {
        let e = arbitrate(100, 0, 500, "example.com", &t());
        assert_eq!(e.chosen_count, 300);
        assert_eq!(e.confidence, Confidence::Medium);
    }

    #[test]
    fn test_sitemap_much_larger_is_trusted() {
        let e = arbitrate(900, 50, 100, "example.com", &t());
        assert_eq!(e.chosen_count, 900);
        assert_eq!(e.confidence, Confidence::High);
    }

    #[test]
    fn test_robots_only() {
        let robots = RobotsTxt {
            sitemaps: Vec::new(),
            disallow_rules: 25,
        };
        let e = arbitrate(0, robots.estimate(&t()), 0, "example.com", &t());
        assert_eq!(e.chosen_count, 500);
        assert_eq!(e.confidence, Confidence::Low);
    }

    #[test]
    fn test_single_signals() {
        assert_eq!(arbitrate(40, 0, 0, "x.com", &t()).confidence, Confidence::High);
        assert_eq!(arbitrate(0, 0, 40, "x.com", &t()).confidence, Confidence::Medium);
    }

    #[test]
    fn test_sitemap_vs_robots() {
        let e = arbitrate(300, 100, 0, "x.com", &t());
        assert_eq!(e.chosen_count, 100);
        assert_eq!(e.confidence, Confidence::Medium);

        let e = arbitrate(150, 100, 0, "x.com", &t());
        assert_eq!(e.chosen_count, 150);
        assert_eq!(e.confidence, Confidence::High);
    }

    #[test]
    fn test_crawl_and_robots() {
        let e = arbitrate(0, 500, 37, "x.com", &t());
        assert_eq!(e.chosen_count, 37);
        assert_eq!(e.confidence, Confidence::Medium);
    }

    #[test]
    fn test_domain_fallback() {
        assert_eq!(arbitrate(0, 0, 0, "myshop.example", &t()).chosen_count, 200);
        assert_eq!(arbitrate(0, 0, 0, "dailynews.example", &t()).chosen_count, 150);
        assert_eq!(arbitrate(0, 0, 0, "cs.stanford.edu", &t()).chosen_count, 150);
        let e = arbitrate(0, 0, 0, "example.com", &t());
        assert_eq!(e.chosen_count, 45);
        assert_eq!(e.confidence, Confidence::Low);
    }

    #[test]
    fn test_post_validation() {
        let e = arbitrate(20_000, 0, 0, "x.com", &t());
        assert_eq!(e.confidence, Confidence::Medium);
        assert!(e.recommendations[0].contains("sampling"));

        let e = arbitrate(2_000, 0, 0, "x.com", &t());
        assert_eq!(e.confidence, Confidence::High);
        assert!(e.recommendations[0].contains("representative"));

        let e = arbitrate(3, 0, 0, "x.com", &t());
        assert!(e.recommendations[0].contains("full-site"));

        assert!(arbitrate(50, 0, 0, "x.com", &t()).recommendations.is_empty());
    }
}
