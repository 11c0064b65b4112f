use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;
use crate::error::DriverInitError;

/// 连接到已在调试端口运行的浏览器，并为本任务新建一个页面
///
/// 复用用户已登录的浏览器配置时使用；不会关闭浏览器本身。
pub async fn connect_to_browser(port: u16) -> Result<BrowserSession, DriverInitError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        DriverInitError::Connect {
            port,
            reason: e.to_string(),
        }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    // 每个任务独占自己的页面，不复用浏览器里已有的标签页
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        DriverInitError::PageCreation(e.to_string())
    })?;

    Ok(BrowserSession {
        browser,
        page,
        handler_task,
        owned: false,
    })
}
