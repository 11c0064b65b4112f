//! 任务记录
//!
//! 只由编排器通过任务注册表修改，状态到达终止值后不再变化。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ReportOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    /// 任务级业务失败（如登录被拒）
    Failed,
    /// 任务级基础设施错误（如目标列表 / 浏览器不可用）
    Error,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// `floor(processed / planned * 100)`，planned 为 0 时视为已完成
pub fn progress_percent(processed: usize, planned: usize) -> u8 {
    if planned == 0 {
        return 100;
    }
    let processed = processed.min(planned);
    (processed * 100 / planned) as u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub results: Vec<ReportOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// 结果文件路径；没有写文件时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_file: Option<String>,
}

impl JobRecord {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Running,
            progress: 0,
            results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            results_file: None,
        }
    }

    /// 追加一个目标结果并同步更新进度（进度只增不减）
    pub fn push_outcome(&mut self, outcome: ReportOutcome, planned: usize) {
        self.results.push(outcome);
        self.set_progress(progress_percent(self.results.len(), planned));
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// 进入终止状态
    pub fn finish(&mut self, status: JobStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }
}

/// 状态查询返回的视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub progress: u8,
    pub results: Vec<ReportOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&JobRecord> for JobStatusView {
    fn from(record: &JobRecord) -> Self {
        Self {
            status: record.status,
            progress: record.progress,
            results: record.results.clone(),
            error: record.error.clone(),
        }
    }
}
