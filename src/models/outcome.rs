//! 单个目标的处理结果
//!
//! 写入结果存储后不再修改；序列化格式即对外持久化格式。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ReportState, Target, ViolationCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Reported,
    Failed,
}

/// 失败原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// 主页抓取失败（导航失败 / 页面不可用）
    Scrape { message: String },
    /// 没有达到阈值的违规候选，未尝试举报
    NoActionableViolation {
        candidates: usize,
        best_score: Option<f64>,
    },
    /// 举报流程在推进到 `target` 时失败
    Transition { target: ReportState, message: String },
    /// 任务在处理该目标时被取消
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub target_id: String,
    pub status: OutcomeStatus,
    pub timestamp: DateTime<Utc>,
    /// 实际在页面上选择的类别标签
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl ReportOutcome {
    pub fn reported(
        target: &Target,
        candidate: &ViolationCandidate,
        applied_category: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target.to_string(),
            status: OutcomeStatus::Reported,
            timestamp: Utc::now(),
            applied_category: Some(applied_category.into()),
            violation_type: Some(candidate.violation_type.clone()),
            confidence_score: Some(candidate.confidence_score),
            failure: None,
        }
    }

    pub fn failed(
        target: &Target,
        failure: FailureReason,
        candidate: Option<&ViolationCandidate>,
    ) -> Self {
        Self {
            target_id: target.to_string(),
            status: OutcomeStatus::Failed,
            timestamp: Utc::now(),
            applied_category: None,
            violation_type: candidate.map(|c| c.violation_type.clone()),
            confidence_score: candidate.map(|c| c.confidence_score),
            failure: Some(failure),
        }
    }

    pub fn is_reported(&self) -> bool {
        self.status == OutcomeStatus::Reported
    }
}
