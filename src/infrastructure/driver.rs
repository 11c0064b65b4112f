//! 浏览器驱动能力 - 基础设施层
//!
//! 只暴露"定位 / 点击 / 取文本 / 导航"这些原子能力，
//! 不认识主页、举报或分类。每个任务独占一个驱动实例。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::error::{DriverError, DriverInitError, DriverResult};

/// 等待元素出现时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 元素选择器
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Selector::XPath(selector.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css={}", s),
            Selector::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// 浏览器驱动
#[async_trait]
pub trait Driver: Send + Sync {
    /// 页面元素句柄
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 立即查找一个元素，不等待
    async fn locate(&self, selector: &Selector) -> DriverResult<Self::Element>;

    /// 查找所有匹配元素；没有匹配时返回空列表
    async fn locate_all(&self, selector: &Selector) -> DriverResult<Vec<Self::Element>>;

    async fn click(&self, element: &Self::Element) -> DriverResult<()>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> DriverResult<()>;

    async fn extract_text(&self, element: &Self::Element) -> DriverResult<String>;

    async fn attribute(&self, element: &Self::Element, name: &str)
        -> DriverResult<Option<String>>;

    /// 在元素内部按 CSS 选择器查找子元素
    async fn find_within(
        &self,
        element: &Self::Element,
        css: &str,
    ) -> DriverResult<Vec<Self::Element>>;

    async fn page_source(&self) -> DriverResult<String>;

    async fn current_url(&self) -> DriverResult<String>;

    async fn scroll_to_bottom(&self) -> DriverResult<()>;

    /// 释放底层浏览器资源；之后不应再使用该驱动
    async fn release(&self);

    /// 等待元素出现，超时返回 `DriverError::Timeout`
    async fn wait_until_present(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> DriverResult<Self::Element> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.locate(selector).await {
                Ok(element) => return Ok(element),
                Err(e) if e.is_locate_failure() => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::Timeout {
                    what: selector.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

/// 为每个任务创建独占的驱动实例
#[async_trait]
pub trait DriverFactory: Send + Sync {
    type Driver: Driver + 'static;

    async fn acquire(&self) -> Result<Self::Driver, DriverInitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_display() {
        assert_eq!(Selector::css("#email").to_string(), "css=#email");
        assert_eq!(Selector::xpath("//h1").to_string(), "xpath=//h1");
        assert_eq!(Selector::xpath("//h1").as_str(), "//h1");
    }
}
