// SPDX-License-Identifier: PMPL-1.0-or-later
//! robots.txt signal

use crate::config::ConsensusThresholds;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RobotsTxt {
    /// `Sitemap:` references, in file order
    pub sitemaps: Vec<String>,
    /// Non-empty `Disallow:` rules across all user agents
    pub disallow_rules: usize,
}

impl RobotsTxt {
    pub fn parse(text: &str) -> Self {
        let mut robots = RobotsTxt::default();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "sitemap" if !value.is_empty() => robots.sitemaps.push(value.to_string()),
                "disallow" if !value.is_empty() => robots.disallow_rules += 1,
                _ => {}
            }
        }
        robots
    }

    /// Page-count guess from the number of disallow rules
    pub fn estimate(&self, t: &ConsensusThresholds) -> usize {
        if self.disallow_rules > t.robots_large_rules {
            t.robots_large_estimate
        } else if self.disallow_rules > t.robots_medium_rules {
            t.robots_medium_estimate
        } else {
            t.robots_default_estimate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_robots() {
        let robots = RobotsTxt::parse(
            "User-agent: *\nDisallow: /admin\nDisallow: /tmp # scratch\nDisallow:\nAllow: /\n\
             Sitemap: https://example.com/sitemap.xml\nsitemap: https://example.com/news.xml\n",
        );
        assert_eq!(robots.disallow_rules, 2);
        assert_eq!(
            robots.sitemaps,
            vec!["https://example.com/sitemap.xml", "https://example.com/news.xml"]
        );
    }

    #[test]
    fn test_estimate_buckets() {
        let t = ConsensusThresholds::default();
        let with_rules = |n| RobotsTxt {
            sitemaps: Vec::new(),
            disallow_rules: n,
        };
        assert_eq!(with_rules(25).estimate(&t), 500);
        assert_eq!(with_rules(20).estimate(&t), 100);
        assert_eq!(with_rules(11).estimate(&t), 100);
        assert_eq!(with_rules(10).estimate(&t), 50);
        assert_eq!(with_rules(0).estimate(&t), 50);
    }
}
