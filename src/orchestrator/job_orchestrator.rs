//! 任务编排器 - 编排层
//!
//! ## 职责
//!
//! 一个任务 = 一次会话：
//!
//! 1. 加载目标列表（一次）
//! 2. 获取独占的浏览器驱动并登录（一次，失败即任务失败）
//! 3. 按顺序处理目标，最多 `max_reports_per_session` 个：
//!    抓取 → 分类 / 决策 → 举报 → 记录结果 → 更新进度 → 固定间隔
//! 4. 无论成功失败都释放驱动，最后把结果写入 JSON 文件
//!
//! 单个目标的失败只会变成一条结果记录，不会中断任务。
//! 取消请求在每个目标开始前、目标处理中以及间隔等待中都会被响应。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Driver, DriverFactory};
use crate::models::{
    select_actionable, FailureReason, JobId, JobRecord, JobStatus, JobStatusView,
    ReportOutcome, Target, TargetLoader,
};
use crate::services::{
    AuthService, ClassificationBackend, ContentScraper, ResultStore, ViolationClassifier,
};
use crate::utils::logging::truncate_text;
use crate::workflow::{ReportCtx, ReportFlow};

use super::job_registry::JobRegistry;

/// 任务编排器
///
/// 可以廉价克隆；所有克隆共享同一个任务注册表和结果存储。
pub struct JobOrchestrator<F: DriverFactory, B: ClassificationBackend> {
    inner: Arc<Inner<F, B>>,
}

impl<F: DriverFactory, B: ClassificationBackend> Clone for JobOrchestrator<F, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<F: DriverFactory, B: ClassificationBackend> {
    loader: Arc<dyn TargetLoader>,
    factory: F,
    scraper: ContentScraper,
    classifier: ViolationClassifier<B>,
    auth: AuthService,
    flow: ReportFlow,
    registry: JobRegistry,
    store: ResultStore,
    max_reports: usize,
    delay: Duration,
    threshold: f64,
    results_dir: Option<PathBuf>,
}

/// 单个目标处理的结束方式
enum TargetEnd {
    Done(ReportOutcome),
    Cancelled(ReportOutcome),
}

impl<F, B> JobOrchestrator<F, B>
where
    F: DriverFactory + 'static,
    B: ClassificationBackend + 'static,
{
    pub fn new(
        config: &Config,
        loader: Arc<dyn TargetLoader>,
        factory: F,
        backend: Arc<B>,
    ) -> Self {
        let results_dir = Some(config.results_dir.trim())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Self {
            inner: Arc::new(Inner {
                loader,
                factory,
                scraper: ContentScraper::new(config),
                classifier: ViolationClassifier::new(backend, config.classifier_timeout()),
                auth: AuthService::new(config),
                flow: ReportFlow::new(config),
                registry: JobRegistry::new(),
                store: ResultStore::new(),
                max_reports: config.max_reports_per_session,
                delay: config.delay_between_reports(),
                threshold: config.confidence_threshold,
                results_dir,
            }),
        }
    }

    /// 提交一个任务，返回任务 ID 和后台任务句柄
    pub async fn start(&self) -> (JobId, JoinHandle<()>) {
        let (job_id, cancel) = self.inner.registry.create().await;
        info!("📋 已提交任务 {}", job_id);

        let inner = Arc::clone(&self.inner);
        let id = job_id.clone();
        let handle = tokio::spawn(async move { inner.run_job(id, cancel).await });
        (job_id, handle)
    }

    /// 提交任务并等待其结束，返回最终记录
    pub async fn run_to_completion(&self) -> Option<JobRecord> {
        let (job_id, handle) = self.start().await;
        if let Err(e) = handle.await {
            error!("[任务 {}] 后台任务异常退出: {}", job_id, e);
        }
        self.inner.registry.get(&job_id).await
    }

    pub async fn status(&self, job_id: &JobId) -> Option<JobStatusView> {
        self.inner.registry.status(job_id).await
    }

    /// 请求取消任务；已处理目标的结果会保留
    pub async fn cancel(&self, job_id: &JobId) -> bool {
        self.inner.registry.cancel(job_id).await
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.inner.registry
    }

    /// 本进程内所有任务的结果
    pub fn results(&self) -> &ResultStore {
        &self.inner.store
    }
}

impl<F, B> Inner<F, B>
where
    F: DriverFactory + 'static,
    B: ClassificationBackend + 'static,
{
    async fn run_job(&self, job_id: JobId, cancel: CancellationToken) {
        let (status, error) = match self.execute(&job_id, &cancel).await {
            Ok(status) => (status, None),
            Err(e) => {
                error!("[任务 {}] ❌ 任务终止: {}", job_id, e);
                (fatal_status(&e), Some(e.to_string()))
            }
        };

        let results_file = match self.persist(&job_id).await {
            Ok(path) => path.map(|p| p.display().to_string()),
            Err(e) => {
                warn!("[任务 {}] 保存结果失败: {}", job_id, e);
                None
            }
        };

        self.registry
            .update(&job_id, |record| record.results_file = results_file)
            .await;
        self.registry.finish(&job_id, status, error).await;
        info!("[任务 {}] 🏁 任务结束，状态: {:?}", job_id, status);
    }

    async fn execute(&self, job_id: &JobId, cancel: &CancellationToken) -> AppResult<JobStatus> {
        let targets = self.loader.load().await?;
        let planned = targets.len().min(self.max_reports);

        if planned == 0 {
            info!("[任务 {}] ⚠️ 没有待处理的目标", job_id);
            self.registry
                .update(job_id, |record| record.set_progress(100))
                .await;
            return Ok(JobStatus::Completed);
        }
        if cancel.is_cancelled() {
            return Ok(JobStatus::Cancelled);
        }

        info!(
            "[任务 {}] 共 {} 个目标，本次会话处理 {} 个",
            job_id,
            targets.len(),
            planned
        );

        let driver = self.factory.acquire().await?;
        let result = self
            .process_with_driver(&driver, job_id, &targets[..planned], cancel)
            .await;
        driver.release().await;
        result
    }

    async fn process_with_driver(
        &self,
        driver: &F::Driver,
        job_id: &JobId,
        targets: &[Target],
        cancel: &CancellationToken,
    ) -> AppResult<JobStatus> {
        if cancel.is_cancelled() {
            return Ok(JobStatus::Cancelled);
        }
        self.auth.login(driver).await?;

        let planned = targets.len();
        for (index, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("[任务 {}] ⏹ 任务已取消", job_id);
                return Ok(JobStatus::Cancelled);
            }

            let ctx = ReportCtx::new(job_id.clone(), index + 1, planned, target.clone());
            let end = tokio::select! {
                outcome = self.process_target(driver, &ctx) => TargetEnd::Done(outcome),
                _ = cancel.cancelled() => TargetEnd::Cancelled(
                    ReportOutcome::failed(target, FailureReason::Cancelled, None),
                ),
            };

            match end {
                TargetEnd::Done(outcome) => self.record(job_id, outcome, planned).await,
                TargetEnd::Cancelled(outcome) => {
                    info!("{} ⏹ 处理中被取消", ctx);
                    self.record(job_id, outcome, planned).await;
                    return Ok(JobStatus::Cancelled);
                }
            }

            // 最后一个目标之后不再等待
            if index + 1 < planned && !self.delay.is_zero() {
                info!("{} ⏳ 等待 {} 秒后处理下一个目标", ctx, self.delay.as_secs());
                tokio::select! {
                    _ = sleep(self.delay) => {}
                    _ = cancel.cancelled() => {
                        info!("[任务 {}] ⏹ 任务已取消", job_id);
                        return Ok(JobStatus::Cancelled);
                    }
                }
            }
        }

        Ok(JobStatus::Completed)
    }

    /// 处理单个目标；所有失败都被吸收为结果记录
    async fn process_target(&self, driver: &F::Driver, ctx: &ReportCtx) -> ReportOutcome {
        let target = &ctx.target;
        info!("{} 🔍 开始处理 {}", ctx, target);

        let snapshot = self.scraper.scrape(target, driver).await;
        if let Some(message) = &snapshot.error {
            warn!("{} ❌ 抓取失败: {}", ctx, message);
            return ReportOutcome::failed(
                target,
                FailureReason::Scrape {
                    message: message.clone(),
                },
                None,
            );
        }

        let candidates = self.classifier.classify(&snapshot).await;
        let Some(selected) = select_actionable(&candidates, self.threshold) else {
            let best_score = candidates
                .iter()
                .map(|c| c.confidence_score)
                .fold(None, |best: Option<f64>, score| {
                    Some(best.map_or(score, |b| b.max(score)))
                });
            info!(
                "{} 未发现达到阈值 {} 的违规 (候选 {} 个)",
                ctx,
                self.threshold,
                candidates.len()
            );
            return ReportOutcome::failed(
                target,
                FailureReason::NoActionableViolation {
                    candidates: candidates.len(),
                    best_score,
                },
                None,
            );
        };

        info!(
            "{} 🚨 发现违规: {} (置信度 {}) - {}",
            ctx,
            selected.violation_type,
            selected.confidence_score,
            truncate_text(&selected.evidence, 80)
        );
        let run = self
            .flow
            .run(driver, target, &selected.report_category, ctx)
            .await;
        run.to_outcome(target, selected)
    }

    /// 写入结果存储并在同一次注册表更新中推进进度
    async fn record(&self, job_id: &JobId, outcome: ReportOutcome, planned: usize) {
        self.store.append(outcome.clone()).await;
        self.registry
            .update(job_id, |record| record.push_outcome(outcome, planned))
            .await;
    }

    /// 把本任务的结果写到 `results_dir/report_results_<时间戳>_<任务ID>.json`
    ///
    /// 没有结果或未配置目录时不写文件，返回 `None`。
    async fn persist(&self, job_id: &JobId) -> AppResult<Option<PathBuf>> {
        let Some(dir) = &self.results_dir else {
            return Ok(None);
        };
        let Some(record) = self.registry.get(job_id).await else {
            return Ok(None);
        };
        if record.results.is_empty() {
            return Ok(None);
        }

        let path = dir.join(results_file_name(job_id, chrono::Utc::now()));
        ResultStore::from_outcomes(record.results)
            .save_json(&path)
            .await?;
        info!("[任务 {}] 💾 结果已保存至 {}", job_id, path.display());
        Ok(Some(path))
    }
}

/// 同一秒结束的并发任务靠任务 ID 区分
fn results_file_name(job_id: &JobId, at: chrono::DateTime<chrono::Utc>) -> String {
    format!("report_results_{}_{}.json", at.format("%Y%m%d_%H%M%S"), job_id)
}

/// 登录被拒属于业务失败，其它致命错误属于基础设施错误
fn fatal_status(error: &AppError) -> JobStatus {
    match error {
        AppError::Authentication(_) => JobStatus::Failed,
        _ => JobStatus::Error,
    }
}
