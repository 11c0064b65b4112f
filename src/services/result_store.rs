//! 结果存储 - 业务能力层
//!
//! 只追加，不修改。任务运行中也可以随时读取。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ReportOutcome;

/// 没有违规类型的结果归入此键
pub const UNKNOWN_VIOLATION: &str = "Unknown";

/// 结果统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStats {
    pub total: usize,
    pub successful: usize,
    /// 百分比，保留两位小数
    pub success_rate: f64,
    pub counts_by_violation_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    outcomes: Arc<RwLock<Vec<ReportOutcome>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: Vec<ReportOutcome>) -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(outcomes)),
        }
    }

    pub async fn append(&self, outcome: ReportOutcome) {
        self.outcomes.write().await.push(outcome);
    }

    /// 当前所有结果的快照（按追加顺序）
    pub async fn all(&self) -> Vec<ReportOutcome> {
        self.outcomes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.outcomes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outcomes.read().await.is_empty()
    }

    pub async fn stats(&self) -> ResultStats {
        compute_stats(&self.outcomes.read().await)
    }

    /// 把全部结果写成 JSON 数组
    pub async fn save_json(&self, path: &Path) -> AppResult<()> {
        let outcomes = self.all().await;
        let content = serde_json::to_string_pretty(&outcomes)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file(parent.display().to_string(), e))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;

        debug!("已保存 {} 条结果到 {}", outcomes.len(), path.display());
        Ok(())
    }

    /// 从 JSON 数组加载结果
    pub async fn load_json(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;
        let outcomes: Vec<ReportOutcome> = serde_json::from_str(&content)?;
        Ok(Self::from_outcomes(outcomes))
    }
}

pub fn compute_stats(outcomes: &[ReportOutcome]) -> ResultStats {
    let total = outcomes.len();
    let successful = outcomes.iter().filter(|o| o.is_reported()).count();
    let success_rate = if total == 0 {
        0.0
    } else {
        (successful as f64 / total as f64 * 10_000.0).round() / 100.0
    };

    let mut counts_by_violation_type = BTreeMap::new();
    for outcome in outcomes {
        let key = outcome
            .violation_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_VIOLATION.to_string());
        *counts_by_violation_type.entry(key).or_insert(0) += 1;
    }

    ResultStats {
        total,
        successful,
        success_rate,
        counts_by_violation_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailureReason, Target, ViolationCandidate};

    fn candidate(kind: &str, score: f64) -> ViolationCandidate {
        ViolationCandidate {
            violation_type: kind.to_string(),
            confidence_score: score,
            evidence: "evidence".to_string(),
            report_category: "Spam".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let store = ResultStore::new();
        assert_eq!(store.stats().await.success_rate, 0.0);

        store
            .append(ReportOutcome::reported(&Target::new("a"), &candidate("spam", 90.0), "Spam"))
            .await;
        store
            .append(ReportOutcome::failed(
                &Target::new("b"),
                FailureReason::Scrape {
                    message: "gone".into(),
                },
                None,
            ))
            .await;
        store
            .append(ReportOutcome::failed(
                &Target::new("c"),
                FailureReason::Cancelled,
                Some(&candidate("spam", 85.0)),
            ))
            .await;

        let stats = store.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.success_rate, 33.33);
        assert_eq!(stats.counts_by_violation_type.get("spam"), Some(&2));
        assert_eq!(stats.counts_by_violation_type.get(UNKNOWN_VIOLATION), Some(&1));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report_results.json");

        let store = ResultStore::new();
        store
            .append(ReportOutcome::reported(&Target::new("a"), &candidate("fake", 95.0), "Fake Account"))
            .await;
        store
            .append(ReportOutcome::failed(
                &Target::new("b"),
                FailureReason::NoActionableViolation {
                    candidates: 1,
                    best_score: Some(50.0),
                },
                None,
            ))
            .await;
        store.save_json(&path).await.unwrap();

        let loaded = ResultStore::load_json(&path).await.unwrap();
        assert_eq!(loaded.all().await, store.all().await);
        assert_eq!(loaded.stats().await, store.stats().await);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ResultStore::load_json(&dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(AppError::File { .. })));
    }
}
