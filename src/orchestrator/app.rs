//! 应用外壳
//!
//! 从配置组装真实的浏览器驱动工厂、LLM 服务和目标文件加载器，
//! 提交一个任务并在控制台跟踪进度。Ctrl+C 会请求取消当前任务。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::BrowserSettings;
use crate::config::Config;
use crate::infrastructure::ChromeDriverFactory;
use crate::models::{FileTargetLoader, JobRecord};
use crate::orchestrator::JobOrchestrator;
use crate::services::{compute_stats, LlmService};
use crate::utils::logging::{log_progress, log_startup, print_final_stats};

/// 进度日志间隔
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

pub type ChromeOrchestrator = JobOrchestrator<ChromeDriverFactory, LlmService>;

/// 应用主结构
pub struct App {
    orchestrator: ChromeOrchestrator,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置无效")?;
        log_startup(&config);

        let loader = Arc::new(FileTargetLoader::new(&config.targets_file));
        let factory = ChromeDriverFactory::new(BrowserSettings::from_config(&config));
        let backend = Arc::new(LlmService::new(&config));
        let orchestrator = JobOrchestrator::new(&config, loader, factory, backend);

        Ok(Self { orchestrator })
    }

    /// 运行一个任务直到结束
    pub async fn run(&self) -> Result<JobRecord> {
        let (job_id, mut handle) = self.orchestrator.start().await;
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        let mut cancel_requested = false;

        loop {
            tokio::select! {
                joined = &mut handle => {
                    joined.context("任务执行异常")?;
                    break;
                }
                signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                    if let Err(e) = signal {
                        warn!("监听 Ctrl+C 失败: {}", e);
                    } else {
                        info!("⏹ 收到 Ctrl+C，正在取消任务...");
                        self.orchestrator.cancel(&job_id).await;
                    }
                    cancel_requested = true;
                }
                _ = ticker.tick() => {
                    if let Some(view) = self.orchestrator.status(&job_id).await {
                        log_progress(&job_id, &view);
                    }
                }
            }
        }

        let record = self
            .orchestrator
            .registry()
            .get(&job_id)
            .await
            .with_context(|| format!("找不到任务记录: {}", job_id))?;

        print_final_stats(
            record.status,
            &compute_stats(&record.results),
            record.results_file.as_deref(),
        );
        if let Some(error) = &record.error {
            warn!("任务错误: {}", error);
        }
        Ok(record)
    }
}
