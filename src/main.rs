use anyhow::{Context, Result};
use tracing::{error, info};

use profile_report_flow::models::JobStatus;
use profile_report_flow::{logger, App, Config};

/// 可选的 TOML 配置文件路径
const CONFIG_PATH_ENV: &str = "REPORTER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config_path = std::env::var(CONFIG_PATH_ENV).ok();
    let config = Config::load(config_path.as_deref().map(std::path::Path::new))
        .context("加载配置失败")?;

    // 初始化日志
    let _guard = logger::init(&config)?;

    // 初始化并运行应用
    let app = App::initialize(config)?;
    let record = app.run().await?;

    match record.status {
        JobStatus::Completed => info!("✓ 任务完成"),
        JobStatus::Cancelled => info!("⏹ 任务已取消"),
        status => {
            error!("❌ 任务未成功完成: {:?}", status);
            anyhow::bail!("任务状态: {:?}", status);
        }
    }

    Ok(())
}
