// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for wcagbot

use std::path::Path;
use std::sync::Arc;

use wcagbot::analysis::{analyze_snapshots, AnalysisResult, Auditor};
use wcagbot::config::{Config, DiscoveryConfig, ExtractConfig};
use wcagbot::criteria::{categorize, CriterionStatus};
use wcagbot::discovery::{Confidence, PageCounter};
use wcagbot::fetch::HttpFetcher;
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::scanner;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analyze_fixture(name: &str) -> AnalysisResult {
    let file = Path::new("tests/fixtures").join(name);
    let page = scanner::scan_file(&file, &ExtractConfig::default()).expect("scan should succeed");
    analyze_snapshots(name, &[page], &Config::default())
}

fn count(result: &AnalysisResult, finding_type: &str) -> usize {
    result
        .violations
        .iter()
        .filter(|f| f.finding_type == finding_type)
        .count()
}

#[test]
fn test_inaccessible_fixture_violations() {
    let result = analyze_fixture("inaccessible.html");

    assert_eq!(count(&result, "missing_alt"), 3);
    assert_eq!(count(&result, "heading_hierarchy"), 1);
    assert!(count(&result, "color_contrast") >= 1);
    assert!(
        result.violations.len() >= 3,
        "expected at least 3 violations, got {:?}",
        result.violations.iter().map(|f| &f.finding_type).collect::<Vec<_>>()
    );

    let contrast = result
        .violations
        .iter()
        .find(|f| f.finding_type == "color_contrast")
        .expect("contrast violation");
    assert!(contrast.message.contains("3.9"), "{}", contrast.message);
}

#[test]
fn test_accessible_fixture_scores_higher() {
    let good = analyze_fixture("accessible.html");
    let bad = analyze_fixture("inaccessible.html");

    assert_eq!(count(&good, "missing_alt"), 0);
    assert_eq!(count(&good, "heading_hierarchy"), 0);
    assert_eq!(count(&good, "color_contrast"), 0);

    assert!(
        bad.scores.perceivable.score < good.scores.perceivable.score,
        "perceivable: bad {} vs good {}",
        bad.scores.perceivable.score,
        good.scores.perceivable.score
    );
    assert!(bad.scores.overall.score < good.scores.overall.score);

    for module in bad.scores.modules() {
        assert!(module.score >= 25.0 && module.score <= 100.0);
    }
}

#[test]
fn test_missing_alt_lands_in_text_alternatives() {
    let result = analyze_fixture("inaccessible.html");
    let bucket = result
        .wcag_categories
        .perceivable
        .guidelines
        .get("text_alternatives")
        .expect("text_alternatives bucket");
    let non_text = bucket.criteria.get("1.1.1").expect("1.1.1");
    assert_eq!(non_text.status, CriterionStatus::Failed);
    assert_eq!(non_text.findings.iter().filter(|f| f.finding_type == "missing_alt").count(), 3);
}

#[test]
fn test_categorization_is_idempotent() {
    let file = Path::new("tests/fixtures/inaccessible.html");
    let page = scanner::scan_file(file, &ExtractConfig::default()).unwrap();
    let result = analyze_snapshots("inaccessible.html", &[page.clone()], &Config::default());
    let findings = result.findings();

    let first = serde_json::to_string(&categorize(&findings, &[page.clone()])).unwrap();
    let second = serde_json::to_string(&categorize(&findings, &[page])).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scan_directory_fixture() {
    let pages = scanner::scan_directory(Path::new("tests/fixtures/site"), &ExtractConfig::default())
        .expect("scan should succeed");
    let keys: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(keys, vec!["docs/guide.html", "index.html"]);

    let result = analyze_snapshots("tests/fixtures/site", &pages, &Config::default());
    let missing_alt: Vec<_> = result
        .violations
        .iter()
        .filter(|f| f.finding_type == "missing_alt")
        .map(|f| f.source_page.as_str())
        .collect();
    assert_eq!(missing_alt, vec!["docs/guide.html"]);
    assert!(result.violations.iter().any(|f| f.finding_type == "missing_lang"));
}

#[test]
fn test_reports_render() {
    let result = analyze_fixture("inaccessible.html");
    let text = generate_report(&result, OutputFormat::Text);
    assert!(text.contains("missing_alt"));

    let sarif: serde_json::Value =
        serde_json::from_str(&generate_report(&result, OutputFormat::Sarif)).expect("valid SARIF");
    assert_eq!(sarif["runs"][0]["tool"]["driver"]["name"], "wcagbot");

    let json: serde_json::Value =
        serde_json::from_str(&generate_report(&result, OutputFormat::Json)).expect("valid JSON");
    assert_eq!(json["violations"].as_array().map(Vec::len), Some(result.violations.len()));
}

async fn mount(server: &MockServer, route: &str, content_type: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_page_count_consensus_against_mock_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>{base}/</loc></url>
          <url><loc>{base}/a</loc></url>
          <url><loc>{base}/b</loc></url>
          <url><loc>{base}/c</loc></url>
        </urlset>"#
    );
    mount(&server, "/sitemap.xml", "application/xml", sitemap).await;
    mount(
        &server,
        "/robots.txt",
        "text/plain",
        format!("User-agent: *\nDisallow: /admin\nSitemap: {base}/sitemap.xml\n"),
    )
    .await;
    mount(
        &server,
        "/",
        "text/html",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a><a href="/admin/x">admin</a>"#.to_string(),
    )
    .await;
    for page in ["/a", "/b", "/c"] {
        mount(&server, page, "text/html", "<p>page</p>".to_string()).await;
    }

    let fetcher = Arc::new(HttpFetcher::new("wcagbot-test", 5).unwrap());
    let estimate = PageCounter::new(fetcher, DiscoveryConfig::default())
        .estimate(&format!("{}/", base))
        .await
        .expect("estimate");

    assert_eq!(estimate.sitemap_count, 4);
    assert_eq!(estimate.robots_count, 4);
    assert_eq!(estimate.crawl_count, 4);
    assert_eq!(estimate.chosen_count, 4);
    assert_eq!(estimate.confidence, Confidence::High);
    assert!(estimate.recommendations.iter().any(|r| r.contains("full-site")));
}

#[tokio::test]
async fn test_audit_end_to_end() {
    let server = MockServer::start().await;
    let body = std::fs::read_to_string("tests/fixtures/inaccessible.html").unwrap();
    mount(&server, "/", "text/html; charset=utf-8", body).await;

    let auditor = Auditor::new(Config::default()).unwrap();
    let result = auditor.audit(&format!("{}/", server.uri())).await.expect("audit");

    assert_eq!(result.pages.len(), 1);
    assert!(result.violations.len() >= 3);
    assert!(result.scores.overall.score >= 25.0);
    assert!(!result.conformance_levels.a.meets);
}
