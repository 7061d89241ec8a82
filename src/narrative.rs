// SPDX-License-Identifier: PMPL-1.0-or-later
//! Boundary to the AI narrative collaborator.
//!
//! The collaborator receives one JSON payload per WCAG area and answers with
//! a summary, a criteria evaluation and prioritized actions. Its output is
//! best-effort enrichment: a failed request or an unparseable answer yields
//! `None`, and module scoring never depends on it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::NarrativeConfig;
use crate::error::{Result, WcagbotError};
use crate::scoring::{CriterionEvaluation, ModuleScoreResult, ScoringEngine};

/// Payload sent to the collaborator for one WCAG area
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRequest {
    /// Module name, e.g. `perceivable`
    pub wcag_area: String,
    pub complete_website_data: Value,
    pub complete_accessibility_data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeSummary {
    pub score: Option<f64>,
    pub compliance_level: Option<String>,
    pub overall_assessment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityActions {
    #[serde(deserialize_with = "lenient_actions")]
    pub immediate: Vec<String>,
    #[serde(deserialize_with = "lenient_actions")]
    pub short_term: Vec<String>,
    #[serde(deserialize_with = "lenient_actions")]
    pub long_term: Vec<String>,
}

/// Parsed collaborator answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAnalysis {
    pub summary: NarrativeSummary,
    pub criteria_evaluation: Vec<CriterionEvaluation>,
    pub priority_actions: PriorityActions,
}

impl NarrativeAnalysis {
    /// Score the area from the collaborator's criteria evaluation alone
    pub fn score_with(&self, engine: &ScoringEngine, module: &str) -> ModuleScoreResult {
        engine.score_module(module, &self.criteria_evaluation)
    }
}

/// Actions may come back as strings or as objects with a text field
fn lenient_actions<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Object(map) => ["action", "description", "title", "text"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str).map(str::to_string)),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect())
}

/// Parse a collaborator response. Accepts a bare object, an object under
/// `analysis_result`, and JSON wrapped in prose or code fences. Returns
/// `None` when no usable JSON is found.
pub fn parse_response(text: &str) -> Option<NarrativeAnalysis> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let root: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let result = root.get("analysis_result").unwrap_or(&root);
    if !result.is_object() {
        return None;
    }

    let summary = result
        .get("summary")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let priority_actions = result
        .get("priority_actions")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let criteria_evaluation = result
        .get("criteria_evaluation")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(evaluation_entry).collect())
        .unwrap_or_default();

    Some(NarrativeAnalysis {
        summary,
        criteria_evaluation,
        priority_actions,
    })
}

/// One criteria_evaluation entry; status is matched case-insensitively and
/// entries that still do not fit are dropped
fn evaluation_entry(entry: &Value) -> Option<CriterionEvaluation> {
    let mut entry = entry.clone();
    let obj = entry.as_object_mut()?;
    if let Some(Value::String(status)) = obj.get_mut("status") {
        *status = status.trim().to_ascii_uppercase();
    }
    if let Some(Value::String(severity)) = obj.get_mut("severity") {
        *severity = severity.trim().to_ascii_lowercase();
    }
    match serde_json::from_value(entry) {
        Ok(evaluation) => Some(evaluation),
        Err(e) => {
            debug!("Dropping criteria_evaluation entry: {}", e);
            None
        }
    }
}

/// Source of qualitative narrative findings
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Whether requests should be built at all
    fn enabled(&self) -> bool {
        true
    }

    async fn narrate(&self, request: &NarrativeRequest) -> Result<Option<NarrativeAnalysis>>;
}

/// Provider used when no collaborator is configured
pub struct NoNarrative;

#[async_trait]
impl NarrativeProvider for NoNarrative {
    fn enabled(&self) -> bool {
        false
    }

    async fn narrate(&self, _request: &NarrativeRequest) -> Result<Option<NarrativeAnalysis>> {
        Ok(None)
    }
}

/// JSON-over-HTTP collaborator
pub struct HttpNarrativeProvider {
    client: Client,
    endpoint: String,
}

impl HttpNarrativeProvider {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Provider for the configured endpoint, or [`NoNarrative`]
    pub fn from_config(config: &NarrativeConfig) -> Result<Box<dyn NarrativeProvider>> {
        match config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(endpoint) => Ok(Box::new(Self::new(endpoint, config.timeout_secs)?)),
            None => Ok(Box::new(NoNarrative)),
        }
    }
}

#[async_trait]
impl NarrativeProvider for HttpNarrativeProvider {
    async fn narrate(&self, request: &NarrativeRequest) -> Result<Option<NarrativeAnalysis>> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        if !response.status().is_success() {
            return Err(WcagbotError::Narrative(format!(
                "collaborator returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let parsed = parse_response(&body);
        if parsed.is_none() {
            warn!(area = %request.wcag_area, "Narrative response was not usable JSON");
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::criteria::CriterionStatus;
    use crate::scoring::ComplianceLevel;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ANSWER: &str = r#"{"analysis_result": {
        "summary": {"score": 72, "compliance_level": "A", "overall_assessment": "Decent"},
        "criteria_evaluation": [
            {"criterion_id": "1.1.1", "status": "failed", "severity": "Critical"},
            {"criterion": "1.4.3", "status": "PASSED"},
            {"id": "1.3.1", "status": "not-a-status"}
        ],
        "priority_actions": {
            "immediate": ["Add alt text"],
            "short_term": [{"action": "Fix contrast", "effort": "low"}],
            "long_term": "Train authors"
        }
    }}"#;

    fn request() -> NarrativeRequest {
        NarrativeRequest {
            wcag_area: "perceivable".to_string(),
            complete_website_data: Value::Null,
            complete_accessibility_data: Value::Null,
        }
    }

    #[test]
    fn test_parse_full_answer() {
        let analysis = parse_response(ANSWER).expect("parsed");
        assert_eq!(analysis.summary.score, Some(72.0));
        assert_eq!(analysis.criteria_evaluation.len(), 2);
        assert_eq!(analysis.criteria_evaluation[0].status, CriterionStatus::Failed);
        assert_eq!(analysis.criteria_evaluation[1].criterion_id, "1.4.3");
        assert_eq!(analysis.priority_actions.short_term, vec!["Fix contrast"]);
        assert_eq!(analysis.priority_actions.long_term, vec!["Train authors"]);
    }

    #[test]
    fn test_parse_fenced_answer() {
        let text = format!("Here is the analysis:\n```json\n{}\n```", ANSWER);
        assert!(parse_response(&text).is_some());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_response("I cannot help with that").is_none());
        assert!(parse_response("{ not json }").is_none());
        assert!(parse_response("} backwards {").is_none());
    }

    #[test]
    fn test_scoring_from_criteria_evaluation_only() {
        let analysis = parse_response(ANSWER).expect("parsed");
        let engine = ScoringEngine::new(ScoringConfig::default());
        let module = analysis.score_with(&engine, "perceivable");
        assert_eq!(module.details.total, 2);
        assert_eq!(module.details.failed, 1);
        // (0 + 100) / 2 = 50 raw, 25 + 37.5 = 62.5, no bonus at 50% failures
        assert!((module.score - 62.5).abs() < 0.01);
        assert_eq!(module.compliance_level, ComplianceLevel::Partial);
    }

    #[tokio::test]
    async fn test_http_provider_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/narrate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ANSWER))
            .mount(&server)
            .await;

        let provider = HttpNarrativeProvider::new(&format!("{}/narrate", server.uri()), 5).unwrap();
        let analysis = provider.narrate(&request()).await.unwrap();
        assert!(analysis.is_some());
    }

    #[tokio::test]
    async fn test_http_provider_malformed_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let provider = HttpNarrativeProvider::new(&server.uri(), 5).unwrap();
        assert!(provider.narrate(&request()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_http_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = HttpNarrativeProvider::new(&server.uri(), 5).unwrap();
        assert!(provider.narrate(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_no_narrative() {
        assert!(NoNarrative.narrate(&request()).await.unwrap().is_none());
    }
}
