use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::{BrowserSession, BrowserSettings};
use crate::error::DriverInitError;

/// 启动新的浏览器进程并打开一个空白页面
pub async fn launch_browser(settings: &BrowserSettings) -> Result<BrowserSession, DriverInitError> {
    info!(
        "🚀 启动浏览器 ({})...",
        if settings.headless { "无头模式" } else { "有界面模式" }
    );

    let mut builder = BrowserConfig::builder()
        .args(vec![
            "--disable-gpu",           // 部分平台无头模式必须禁用 GPU
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .window_size(1920, 1080)
        .request_timeout(settings.page_timeout);

    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &settings.chrome_executable {
        debug!("使用浏览器可执行文件: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        DriverInitError::Configuration(e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        DriverInitError::Launch(e.to_string())
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        DriverInitError::PageCreation(e.to_string())
    })?;

    info!("✅ 浏览器已就绪");

    Ok(BrowserSession {
        browser,
        page,
        handler_task,
        owned: true,
    })
}
