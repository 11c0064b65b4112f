//! 基于 chromiumoxide 的驱动实现
//!
//! 持有唯一的 Page，只暴露 `Driver` 能力。

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::browser::{self, BrowserSession, BrowserSettings};
use crate::error::{DriverError, DriverInitError, DriverResult};
use crate::infrastructure::driver::{Driver, DriverFactory, Selector};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

pub struct ChromeDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    owned: bool,
    page_timeout: Duration,
}

impl ChromeDriver {
    pub fn new(session: BrowserSession, page_timeout: Duration) -> Self {
        Self {
            page: session.page,
            browser: Mutex::new(Some(session.browser)),
            handler_task: Mutex::new(Some(session.handler_task)),
            owned: session.owned,
            page_timeout,
        }
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    type Element = Element;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);
        match timeout(self.page_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(DriverError::Timeout {
                what: format!("导航 {}", url),
                timeout: self.page_timeout,
            }),
        }
    }

    async fn locate(&self, selector: &Selector) -> DriverResult<Element> {
        let found = match selector {
            Selector::Css(css) => self.page.find_element(css.as_str()).await,
            Selector::XPath(xpath) => self.page.find_xpath(xpath.as_str()).await,
        };
        found.map_err(|_| DriverError::NotFound {
            selector: selector.to_string(),
        })
    }

    async fn locate_all(&self, selector: &Selector) -> DriverResult<Vec<Element>> {
        let found = match selector {
            Selector::Css(css) => self.page.find_elements(css.as_str()).await,
            Selector::XPath(xpath) => self.page.find_xpaths(xpath.as_str()).await,
        };
        found.map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::action("click", e))
    }

    async fn type_text(&self, element: &Element, text: &str) -> DriverResult<()> {
        element
            .click()
            .await
            .map_err(|e| DriverError::action("focus", e))?;
        element
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| DriverError::action("type", e))
    }

    async fn extract_text(&self, element: &Element) -> DriverResult<String> {
        element
            .inner_text()
            .await
            .map(|text| text.unwrap_or_default())
            .map_err(|e| DriverError::action("inner_text", e))
    }

    async fn attribute(&self, element: &Element, name: &str) -> DriverResult<Option<String>> {
        element
            .attribute(name)
            .await
            .map_err(|e| DriverError::action("attribute", e))
    }

    async fn find_within(&self, element: &Element, css: &str) -> DriverResult<Vec<Element>> {
        element
            .find_elements(css)
            .await
            .map_err(|e| DriverError::action("find_within", e))
    }

    async fn page_source(&self) -> DriverResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.page
            .url()
            .await
            .map(|url| url.unwrap_or_default())
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn release(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if self.owned {
                if let Err(e) = browser.close().await {
                    warn!("关闭浏览器失败: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    warn!("等待浏览器进程退出失败: {}", e);
                }
            } else if let Err(e) = self.page.clone().close().await {
                warn!("关闭页面失败: {}", e);
            }
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        info!("🧹 浏览器资源已释放");
    }
}

/// 为每个任务启动（或连接）一个独立的浏览器会话
pub struct ChromeDriverFactory {
    settings: BrowserSettings,
}

impl ChromeDriverFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    type Driver = ChromeDriver;

    async fn acquire(&self) -> Result<ChromeDriver, DriverInitError> {
        let session = match self.settings.debug_port {
            Some(port) => browser::connect_to_browser(port).await?,
            None => browser::launch_browser(&self.settings).await?,
        };
        Ok(ChromeDriver::new(session, self.settings.page_timeout))
    }
}
