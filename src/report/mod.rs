// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for analysis results.
//!
//! Supports multiple output formats:
//! - Text: scores, conformance and findings grouped by severity
//! - JSON: the full `AnalysisResult`
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use serde::Serialize;

use crate::analysis::AnalysisResult;
use crate::criteria::criterion_for;
use crate::finding::{Finding, FindingKind, Severity, WcagLevel};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report from an analysis result
pub fn generate_report(result: &AnalysisResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(result),
        OutputFormat::Json => generate_json_report(result),
        OutputFormat::Sarif => generate_sarif_report(result),
    }
}

fn write_finding(output: &mut String, finding: &Finding) {
    output.push_str(&format!("[{}] {}\n", finding.finding_type, finding.message));
    output.push_str(&format!("  Location: {}\n", finding.location_string()));
    if let Some(id) = criterion_for(&finding.finding_type) {
        output.push_str(&format!("  WCAG: {}\n", id));
    }
    if let Some(ref suggestion) = finding.suggestion {
        output.push_str(&format!("  Fix: {}\n", suggestion));
    }
    output.push('\n');
}

/// Generate human-readable text report
fn generate_text_report(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("=== wcagbot WCAG 2.1 Analysis Report ===\n\n");
    output.push_str(&format!("Target: {}\n", result.target));
    output.push_str(&format!(
        "Pages: {} ({} unavailable)\n",
        result.pages.len(),
        result.pages.iter().filter(|p| !p.available).count()
    ));
    output.push_str(&format!("Target level: {}\n", result.target_level));

    if let Some(ref count) = result.page_count {
        output.push_str(&format!(
            "Estimated site size: {} pages ({} confidence; sitemap {}, robots {}, crawl {})\n",
            count.chosen_count, count.confidence, count.sitemap_count, count.robots_count, count.crawl_count
        ));
        for rec in &count.recommendations {
            output.push_str(&format!("  Note: {}\n", rec));
        }
    }

    output.push_str("\n--- Scores ---\n");
    for module in result.scores.modules() {
        output.push_str(&format!(
            "{:<15} {:>6.2}  {:<8} {}\n",
            module.module, module.score, module.compliance_level, module.assessment
        ));
    }
    let overall = &result.scores.overall;
    output.push_str(&format!(
        "{:<15} {:>6.2}  {:<8} {}\n",
        "overall", overall.score, overall.compliance_level, overall.assessment
    ));

    output.push_str("\n--- Conformance ---\n");
    for level in [WcagLevel::A, WcagLevel::AA, WcagLevel::AAA] {
        let bucket = result.conformance_levels.level(level);
        output.push_str(&format!(
            "{:<4} {}  (passed {}, failed {}, partial {}, warnings {}, unknown {})\n",
            level,
            if bucket.meets { "met    " } else { "not met" },
            bucket.counts.passed,
            bucket.counts.failed,
            bucket.counts.partial,
            bucket.counts.warnings,
            bucket.counts.unknown
        ));
    }
    output.push('\n');

    if result.violations.is_empty() && result.warnings.is_empty() {
        output.push_str("No accessibility issues found. All checks passed.\n");
        return output;
    }

    output.push_str(&format!(
        "Found {} violation(s) and {} warning(s); {} check(s) passed\n\n",
        result.violations.len(),
        result.warnings.len(),
        result.passed.len()
    ));

    for severity in [Severity::Critical, Severity::Major, Severity::Moderate, Severity::Minor] {
        let issues: Vec<&Finding> = result
            .violations
            .iter()
            .chain(result.warnings.iter())
            .filter(|f| f.severity == severity)
            .collect();
        if issues.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity, issues.len()));
        for finding in issues {
            write_finding(&mut output, finding);
        }
    }

    for (module, narrative) in &result.narratives {
        if let Some(ref assessment) = narrative.summary.overall_assessment {
            output.push_str(&format!("--- {} narrative ---\n{}\n", module, assessment));
        }
        for action in &narrative.priority_actions.immediate {
            output.push_str(&format!("  Now: {}\n", action));
        }
        output.push('\n');
    }

    if result.violations.iter().any(|f| f.severity == Severity::Critical) {
        output.push_str("RESULT: FAIL (critical violations found)\n");
    } else if !result.violations.is_empty() {
        output.push_str("RESULT: FAIL\n");
    } else {
        output.push_str("RESULT: PASS WITH WARNINGS\n");
    }

    output
}

/// Generate JSON report
fn generate_json_report(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize analysis: {}\"}}", e))
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<SarifProperties>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations", skip_serializing_if = "Vec::is_empty")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
}

#[derive(Debug, Serialize)]
struct SarifProperties {
    #[serde(rename = "wcagCriterion")]
    wcag_criterion: String,
}

/// Generate SARIF report; passed findings are omitted
fn generate_sarif_report(result: &AnalysisResult) -> String {
    let results: Vec<SarifResult> = result
        .violations
        .iter()
        .chain(result.warnings.iter())
        .map(|f| {
            let level = match (f.kind, f.severity) {
                (FindingKind::Violation, Severity::Critical | Severity::Major) => "error",
                (FindingKind::Violation, _) => "warning",
                _ => "note",
            };

            let logical_locations = f
                .element_info
                .iter()
                .filter(|info| !info.path.is_empty())
                .map(|info| SarifLogicalLocation {
                    fully_qualified_name: info.path.clone(),
                })
                .collect();

            SarifResult {
                rule_id: f.finding_type.clone(),
                level: level.to_string(),
                message: SarifMessage { text: f.message.clone() },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: f.source_page.clone(),
                        },
                    },
                    logical_locations,
                }],
                properties: criterion_for(&f.finding_type).map(|id| SarifProperties {
                    wcag_criterion: id.to_string(),
                }),
            }
        })
        .collect();

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "wcagbot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: "https://www.w3.org/TR/WCAG21/".to_string(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_snapshots;
    use crate::config::Config;
    use crate::extractor::PageExtractor;
    use crate::fetch::FetchedPage;

    fn result(html: &str) -> AnalysisResult {
        let page = PageExtractor::new(Default::default())
            .extract_html(&FetchedPage::from_markup("https://example.com/", html));
        analyze_snapshots("https://example.com/", &[page], &Config::default())
    }

    const BROKEN: &str = r#"<html><body><img src="a.png"><h1>A</h1><h3>B</h3></body></html>"#;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("SARIF".parse::<OutputFormat>(), Ok(OutputFormat::Sarif));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_report_with_findings() {
        let report = generate_report(&result(BROKEN), OutputFormat::Text);
        assert!(report.contains("[missing_alt]"));
        assert!(report.contains("WCAG: 1.1.1"));
        assert!(report.contains("overall"));
        assert!(report.contains("RESULT: FAIL"));
    }

    #[test]
    fn test_json_report() {
        let report = generate_report(&result(BROKEN), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert!(parsed["violations"].is_array());
        assert!(parsed["conformance_levels"]["AA"].is_object());
        assert!(parsed["scores"]["overall"]["score"].is_number());
    }

    #[test]
    fn test_sarif_report() {
        let report = generate_report(&result(BROKEN), OutputFormat::Sarif);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["version"], "2.1.0");
        let results = parsed["runs"][0]["results"].as_array().expect("results");
        let alt = results.iter().find(|r| r["ruleId"] == "missing_alt").expect("missing_alt");
        assert_eq!(alt["properties"]["wcagCriterion"], "1.1.1");
        assert_eq!(alt["locations"][0]["physicalLocation"]["artifactLocation"]["uri"], "https://example.com/");
    }
}
