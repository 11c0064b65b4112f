//! 任务注册表
//!
//! 保存所有任务的 `JobRecord` 和取消令牌。内部的表不对外暴露，
//! 所有修改都在写锁内完成，读者不会看到进度和结果不一致的中间状态。
//! 任务进入终止状态后，记录不再被修改。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{JobId, JobRecord, JobStatus, JobStatusView};

struct JobEntry {
    record: JobRecord,
    cancel: CancellationToken,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新的运行中任务，返回任务 ID 和它的取消令牌
    pub async fn create(&self) -> (JobId, CancellationToken) {
        let job_id = JobId::generate();
        let cancel = CancellationToken::new();
        self.jobs.write().await.insert(
            job_id.clone(),
            JobEntry {
                record: JobRecord::new(job_id.clone()),
                cancel: cancel.clone(),
            },
        );
        debug!("登记任务 {}", job_id);
        (job_id, cancel)
    }

    /// 完整记录的副本
    pub async fn get(&self, job_id: &JobId) -> Option<JobRecord> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|entry| entry.record.clone())
    }

    pub async fn status(&self, job_id: &JobId) -> Option<JobStatusView> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|entry| JobStatusView::from(&entry.record))
    }

    /// 在写锁内修改运行中的任务；任务不存在或已终止时不做任何事并返回 false
    pub async fn update<F>(&self, job_id: &JobId, f: F) -> bool
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(entry) if !entry.record.status.is_terminal() => {
                f(&mut entry.record);
                true
            }
            _ => false,
        }
    }

    /// 把任务置为终止状态
    pub async fn finish(&self, job_id: &JobId, status: JobStatus, error: Option<String>) -> bool {
        self.update(job_id, |record| record.finish(status, error))
            .await
    }

    /// 请求取消运行中的任务；返回是否发出了取消请求
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        let jobs = self.jobs.read().await;
        match jobs.get(job_id) {
            Some(entry) if !entry.record.status.is_terminal() => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }
}
