// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for wcagbot
//!
//! Every component receives its section explicitly; nothing reads global
//! state. Thresholds that were tuned by hand (consensus ratios, robots
//! buckets, UX transform constants) are exposed here so they can be adjusted
//! without touching the algorithms.

use crate::error::{Result, WcagbotError};
use crate::finding::WcagLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub extract: ExtractConfig,
    pub checks: CheckConfig,
    pub discovery: DiscoveryConfig,
    pub scoring: ScoringConfig,
    pub narrative: NarrativeConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard cap on pages extracted per audit
    pub max_pages: usize,
    /// Maximum link depth from the start page
    pub max_depth: usize,
    /// Concurrent page fetches
    pub concurrency: usize,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Maximum elements sampled for color contrast per page
    pub max_contrast_samples: usize,
    /// Maximum text blocks sampled for text spacing per page
    pub max_text_spacing_samples: usize,
    /// Minimum visible text length for a contrast sample
    pub min_contrast_text_len: usize,
    /// Truncation length of element snippets
    pub snippet_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Highest conformance level evaluated and scored
    pub target_level: WcagLevel,
    /// Check names to skip
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub request_timeout_secs: u64,
    /// Upper bound for each signal before arbitration proceeds without it
    pub signal_timeout_secs: u64,
    /// Crawl signal depth
    pub max_depth: usize,
    /// Crawl signal page cap
    pub max_crawl_pages: usize,
    /// Nested sitemap documents followed per estimate
    pub max_sitemaps: usize,
    pub user_agent: String,
    pub thresholds: ConsensusThresholds,
}

/// Hand-tuned constants of the page-count arbitration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusThresholds {
    /// Sitemap and crawl agree when max/min stays at or below this
    pub agreement_ratio: f64,
    /// A sitemap larger than this multiple of the robots estimate is suspect
    pub sitemap_robots_factor: usize,
    pub very_large_site: usize,
    pub large_site: usize,
    pub small_site: usize,
    pub robots_large_rules: usize,
    pub robots_large_estimate: usize,
    pub robots_medium_rules: usize,
    pub robots_medium_estimate: usize,
    pub robots_default_estimate: usize,
    pub commerce_estimate: usize,
    pub publication_estimate: usize,
    pub education_estimate: usize,
    pub default_estimate: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub severity_weights: SeverityWeights,
    pub partial_score: f64,
    pub warning_score: f64,
    pub unknown_score: f64,
    pub ux_floor: f64,
    pub ux_scale: f64,
    /// Bonus when the failure rate is below `small_bonus_below`
    pub small_bonus: f64,
    pub small_bonus_below: f64,
    /// Bonus when the failure rate is below `large_bonus_below`
    pub large_bonus: f64,
    pub large_bonus_below: f64,
    pub principle_weights: PrincipleWeights,
    pub level_thresholds: LevelThresholds,
    /// Failure ratio above which compliance is forced to NONE
    pub max_failure_ratio: f64,
    /// Score criteria nobody could evaluate (as `unknown_score`)
    pub include_unknown_criteria: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: f64,
    pub major: f64,
    pub moderate: f64,
    pub minor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipleWeights {
    pub perceivable: f64,
    pub operable: f64,
    pub understandable: f64,
    pub robust: f64,
    /// Weight for modules whose identifier names no principle
    pub unrecognized: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub aaa: f64,
    pub aa: f64,
    pub a: f64,
    pub partial: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// HTTP endpoint of the narrative collaborator; disabled when unset
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for per-job result files; disabled when unset
    pub results_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            concurrency: 4,
            request_timeout_secs: 30,
            user_agent: format!("wcagbot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_contrast_samples: 50,
            max_text_spacing_samples: 30,
            min_contrast_text_len: 3,
            snippet_length: 200,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            target_level: WcagLevel::AA,
            disabled: Vec::new(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            signal_timeout_secs: 120,
            max_depth: 3,
            max_crawl_pages: 500,
            max_sitemaps: 50,
            user_agent: format!("wcagbot/{}", env!("CARGO_PKG_VERSION")),
            thresholds: ConsensusThresholds::default(),
        }
    }
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            agreement_ratio: 3.0,
            sitemap_robots_factor: 2,
            very_large_site: 10_000,
            large_site: 1_000,
            small_site: 5,
            robots_large_rules: 20,
            robots_large_estimate: 500,
            robots_medium_rules: 10,
            robots_medium_estimate: 100,
            robots_default_estimate: 50,
            commerce_estimate: 200,
            publication_estimate: 150,
            education_estimate: 150,
            default_estimate: 45,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            severity_weights: SeverityWeights::default(),
            partial_score: 65.0,
            warning_score: 65.0,
            unknown_score: 30.0,
            ux_floor: 25.0,
            ux_scale: 0.75,
            small_bonus: 5.0,
            small_bonus_below: 0.20,
            large_bonus: 10.0,
            large_bonus_below: 0.10,
            principle_weights: PrincipleWeights::default(),
            level_thresholds: LevelThresholds::default(),
            max_failure_ratio: 0.5,
            include_unknown_criteria: false,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 1.0,
            major: 0.7,
            moderate: 0.4,
            minor: 0.2,
        }
    }
}

impl Default for PrincipleWeights {
    fn default() -> Self {
        Self {
            perceivable: 0.30,
            operable: 0.30,
            understandable: 0.25,
            robust: 0.15,
            unrecognized: 0.25,
        }
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            aaa: 90.0,
            aa: 80.0,
            a: 65.0,
            partial: 40.0,
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 60,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wcagbot")
        .join("config.yml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str(&content)
            .map_err(|e| WcagbotError::Config(format!("TOML parse error: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| WcagbotError::Config(format!("YAML parse error: {}", e)))
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::to_string_pretty(&config)
            .map_err(|e| WcagbotError::Config(format!("TOML serialize error: {}", e)))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/wcagbot.yml")).expect("defaults");
        assert_eq!(config.crawl.max_pages, 10);
        assert_eq!(config.scoring.ux_floor, 25.0);
        assert_eq!(config.discovery.thresholds.agreement_ratio, 3.0);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "crawl:\n  max_pages: 3\nchecks:\n  target_level: AAA\n").expect("write");
        let config = load_config(&path).expect("load");
        assert_eq!(config.crawl.max_pages, 3);
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.checks.target_level, WcagLevel::AAA);
        assert_eq!(config.scoring.principle_weights.perceivable, 0.30);
    }

    #[test]
    fn test_toml_round_trip_through_default_writer() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path).expect("write");
        let config = load_config(&path).expect("load");
        assert_eq!(config.discovery.max_crawl_pages, 500);
        assert_eq!(config.scoring.severity_weights.major, 0.7);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "crawl: [not, a, map").expect("write");
        assert!(matches!(load_config(&path), Err(WcagbotError::Config(_))));
    }
}
