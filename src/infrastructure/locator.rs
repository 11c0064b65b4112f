//! 定位策略与"第一个成功的候选"组合器
//!
//! 页面上的同一个按钮可能有多种找法（aria-label、文本、class……），
//! 每一步都声明一个有序的候选列表，按顺序尝试，第一个
//! "定位 + 操作"都成功的候选即为结果。全部失败时返回每个候选的失败原因。

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::error::DriverError;
use crate::infrastructure::driver::{Driver, Selector};

/// 定位到元素后执行的操作
#[derive(Clone, PartialEq)]
pub enum LocatorAction {
    Click,
    /// 输入文本（内容可能是密码，Debug 输出不包含原文）
    Type(String),
    /// 只要求元素存在
    Present,
}

impl fmt::Debug for LocatorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorAction::Click => f.write_str("Click"),
            LocatorAction::Type(text) => write!(f, "Type(<{} chars>)", text.chars().count()),
            LocatorAction::Present => f.write_str("Present"),
        }
    }
}

/// 一种定位方式
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorStrategy {
    pub name: String,
    pub selector: Selector,
    pub action: LocatorAction,
}

impl LocatorStrategy {
    pub fn click(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
            action: LocatorAction::Click,
        }
    }

    pub fn present(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
            action: LocatorAction::Present,
        }
    }

    pub fn type_into(name: impl Into<String>, selector: Selector, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector,
            action: LocatorAction::Type(text.into()),
        }
    }
}

/// 成功的候选
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorHit {
    pub index: usize,
    pub name: String,
}

/// 单个候选的失败记录
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorAttempt {
    pub name: String,
    pub error: DriverError,
}

/// 所有候选均失败
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocatorFailure {
    pub attempts: Vec<LocatorAttempt>,
}

impl fmt::Display for LocatorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return f.write_str("没有可用的定位策略");
        }
        write!(f, "{} 个定位策略全部失败", self.attempts.len())?;
        for attempt in &self.attempts {
            write!(f, "; [{}] {}", attempt.name, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for LocatorFailure {}

/// 按顺序尝试候选，返回第一个成功的候选
///
/// 每个候选最多等待 `timeout` 让元素出现。
pub async fn first_success<D>(
    driver: &D,
    candidates: &[LocatorStrategy],
    timeout: Duration,
) -> Result<LocatorHit, LocatorFailure>
where
    D: Driver + ?Sized,
{
    let mut failure = LocatorFailure::default();

    for (index, candidate) in candidates.iter().enumerate() {
        match try_candidate(driver, candidate, timeout).await {
            Ok(()) => {
                debug!("定位策略 [{}] 成功: {}", candidate.name, candidate.selector);
                return Ok(LocatorHit {
                    index,
                    name: candidate.name.clone(),
                });
            }
            Err(error) => {
                debug!("定位策略 [{}] 失败: {}", candidate.name, error);
                failure.attempts.push(LocatorAttempt {
                    name: candidate.name.clone(),
                    error,
                });
            }
        }
    }

    Err(failure)
}

async fn try_candidate<D>(
    driver: &D,
    candidate: &LocatorStrategy,
    timeout: Duration,
) -> Result<(), DriverError>
where
    D: Driver + ?Sized,
{
    let element = driver
        .wait_until_present(&candidate.selector, timeout)
        .await?;

    match &candidate.action {
        LocatorAction::Click => driver.click(&element).await,
        LocatorAction::Type(text) => driver.type_text(&element, text).await,
        LocatorAction::Present => Ok(()),
    }
}
