//! 浏览器启动与连接
//!
//! 两种获取浏览器的方式：
//! - `launch`：启动一个新的浏览器进程，任务结束时关闭
//! - `connection`：连接到已经在调试端口上运行的浏览器，任务结束时只关闭本任务的页面

pub mod connection;
pub mod launch;

use std::time::Duration;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;

pub use connection::connect_to_browser;
pub use launch::launch_browser;

use crate::config::Config;

/// 浏览器相关配置
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub debug_port: Option<u16>,
    pub page_timeout: Duration,
}

impl BrowserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.clone(),
            debug_port: config.browser_debug_port,
            page_timeout: config.page_timeout(),
        }
    }
}

/// 已就绪的浏览器会话
pub struct BrowserSession {
    pub browser: Browser,
    pub page: Page,
    /// 后台事件处理任务
    pub handler_task: JoinHandle<()>,
    /// 浏览器进程是否由本程序启动
    pub owned: bool,
}
