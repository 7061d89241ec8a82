// SPDX-License-Identifier: PMPL-1.0-or-later
//! Boundary to the persistence collaborator.
//!
//! The core never depends on storage succeeding: [`record_result`] and
//! [`record_progress`] log and swallow sink errors.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Result, WcagbotError};

/// Tokens spent by the narrative collaborator on one module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    /// Current stage, e.g. `crawl`, `check`, `score`
    pub stage: String,
    /// 0-100
    pub percent: u8,
    pub updated_at: DateTime<Utc>,
}

impl JobProgress {
    pub fn new(job_id: Uuid, stage: &str, percent: u8) -> Self {
        Self {
            job_id,
            stage: stage.to_string(),
            percent: percent.min(100),
            updated_at: Utc::now(),
        }
    }
}

/// One persisted module result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub job_id: Uuid,
    pub module: String,
    pub result: Value,
    pub token_usage: Option<TokenUsage>,
    pub stored_at: DateTime<Utc>,
}

/// Write side of the persistence collaborator
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save_result(
        &self,
        job_id: Uuid,
        module: &str,
        result: &Value,
        token_usage: Option<TokenUsage>,
    ) -> Result<()>;

    async fn update_progress(&self, progress: &JobProgress) -> Result<()>;
}

/// Sink that discards everything
pub struct NullSink;

#[async_trait]
impl ResultSink for NullSink {
    async fn save_result(&self, _: Uuid, _: &str, _: &Value, _: Option<TokenUsage>) -> Result<()> {
        Ok(())
    }

    async fn update_progress(&self, _: &JobProgress) -> Result<()> {
        Ok(())
    }
}

/// One directory per job: `<root>/<job_id>/<module>.json` plus `progress.json`
pub struct JsonFileSink {
    root: PathBuf,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Sink for the configured results directory, or [`NullSink`]
    pub fn from_config(config: &StorageConfig) -> Box<dyn ResultSink> {
        match &config.results_dir {
            Some(dir) => Box::new(Self::new(dir.clone())),
            None => Box::new(NullSink),
        }
    }

    pub fn job_dir(&self, job_id: Uuid) -> PathBuf {
        self.root.join(job_id.to_string())
    }

    async fn write_json<T: Serialize + Sync>(&self, job_id: Uuid, file: &str, value: &T) -> Result<()> {
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;
        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::write(dir.join(file), content).await?;
        Ok(())
    }
}

/// Module names become file names; anything but `[A-Za-z0-9_-]` is rejected
fn module_file(module: &str) -> Result<String> {
    if module.is_empty() || !module.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(WcagbotError::Storage(format!("invalid module name '{}'", module)));
    }
    Ok(format!("{}.json", module))
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn save_result(
        &self,
        job_id: Uuid,
        module: &str,
        result: &Value,
        token_usage: Option<TokenUsage>,
    ) -> Result<()> {
        let file = module_file(module)?;
        let stored = StoredResult {
            job_id,
            module: module.to_string(),
            result: result.clone(),
            token_usage,
            stored_at: Utc::now(),
        };
        self.write_json(job_id, &file, &stored).await?;
        debug!("Stored {} for job {}", module, job_id);
        Ok(())
    }

    async fn update_progress(&self, progress: &JobProgress) -> Result<()> {
        self.write_json(progress.job_id, "progress.json", progress).await
    }
}

/// Persist one module result, logging failures
pub async fn record_result<T: Serialize>(
    sink: &dyn ResultSink,
    job_id: Uuid,
    module: &str,
    result: &T,
    token_usage: Option<TokenUsage>,
) {
    let value = match serde_json::to_value(result) {
        Ok(value) => value,
        Err(e) => {
            warn!(job = %job_id, module = %module, error = %e, "Result not serializable, not stored");
            return;
        }
    };
    if let Err(e) = sink.save_result(job_id, module, &value, token_usage).await {
        warn!(job = %job_id, module = %module, error = %e, "Failed to store result");
    }
}

/// Publish job progress, logging failures
pub async fn record_progress(sink: &dyn ResultSink, job_id: Uuid, stage: &str, percent: u8) {
    if let Err(e) = sink.update_progress(&JobProgress::new(job_id, stage, percent)).await {
        warn!(job = %job_id, stage = %stage, error = %e, "Failed to update progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_sink_writes_result_and_progress() {
        let dir = TempDir::new().expect("tempdir");
        let sink = JsonFileSink::new(dir.path());
        let job = Uuid::new_v4();

        let usage = TokenUsage {
            input_tokens: 1200,
            output_tokens: 300,
        };
        sink.save_result(job, "perceivable", &json!({"score": 81.5}), Some(usage))
            .await
            .unwrap();
        sink.update_progress(&JobProgress::new(job, "score", 250)).await.unwrap();

        let stored: StoredResult = serde_json::from_str(
            &std::fs::read_to_string(sink.job_dir(job).join("perceivable.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(stored.result["score"], 81.5);
        assert_eq!(stored.token_usage, Some(usage));

        let progress: JobProgress = serde_json::from_str(
            &std::fs::read_to_string(sink.job_dir(job).join("progress.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.stage, "score");
    }

    #[tokio::test]
    async fn test_rejects_path_like_module_names() {
        let dir = TempDir::new().expect("tempdir");
        let sink = JsonFileSink::new(dir.path());
        let err = sink
            .save_result(Uuid::new_v4(), "../escape", &json!({}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WcagbotError::Storage(_)));
    }

    #[tokio::test]
    async fn test_record_result_swallows_failures() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // root is a regular file, so every write fails
        let sink = JsonFileSink::new(&blocker);
        record_result(&sink, Uuid::new_v4(), "overall", &json!({"score": 1}), None).await;
        record_progress(&sink, Uuid::new_v4(), "crawl", 10).await;
    }

    #[test]
    fn test_from_config_without_dir_is_null() {
        let sink = JsonFileSink::from_config(&StorageConfig::default());
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            assert!(sink.update_progress(&JobProgress::new(Uuid::new_v4(), "crawl", 0)).await.is_ok());
        });
    }
}
