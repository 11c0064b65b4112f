//! 错误类型
//!
//! 按照处理范围划分：
//! - 任务级致命错误：`LoadError` / `DriverInitError` / `AuthenticationError`
//! - 单个目标错误：`ScrapeError`（以及状态机内部的 `ReportTransitionError`）
//! - 单个内容单元错误：`ClassificationError`
//!
//! 只有任务级错误会体现在 `JobRecord.status` 上，其余错误都被吸收为结果记录。

use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::LocatorFailure;
use crate::models::ReportState;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("目标列表错误: {0}")]
    Load(#[from] LoadError),

    #[error("浏览器初始化错误: {0}")]
    DriverInit(#[from] DriverInitError),

    #[error("登录错误: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 目标列表加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    /// 目标文件不存在
    #[error("目标文件不存在: {path}")]
    NotFound { path: String },

    /// 读取失败
    #[error("读取目标文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 内容格式错误
    #[error("目标文件格式错误 ({path}): {reason}")]
    Malformed { path: String, reason: String },
}

/// 浏览器驱动单步操作错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DriverError {
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },

    #[error("未找到元素: {selector}")]
    NotFound { selector: String },

    #[error("等待超时 ({timeout:?}): {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("元素操作失败 ({action}): {reason}")]
    Action { action: &'static str, reason: String },

    #[error("执行脚本失败: {0}")]
    Script(String),
}

/// 浏览器启动 / 连接错误（任务级致命）
#[derive(Debug, Error)]
pub enum DriverInitError {
    #[error("浏览器配置失败: {0}")]
    Configuration(String),

    #[error("启动浏览器失败: {0}")]
    Launch(String),

    #[error("无法连接到浏览器 (端口: {port}): {reason}")]
    Connect { port: u16, reason: String },

    #[error("创建页面失败: {0}")]
    PageCreation(String),
}

/// 登录错误（任务级致命）
#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("未配置登录凭据")]
    MissingCredentials,

    #[error("登录步骤 `{step}` 失败: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("登录后未检测到已登录标志: {0}")]
    NotConfirmed(DriverError),
}

/// 抓取错误（单个目标，非致命）
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScrapeError {
    #[error("页面导航失败: {0}")]
    Navigation(DriverError),

    #[error("页面不可用: {url}")]
    Unavailable { url: String },
}

/// 分类错误（单个内容单元，非致命）
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("分类服务调用失败 (模型: {model}): {reason}")]
    Backend { model: String, reason: String },

    #[error("分类服务超时 ({0:?})")]
    Timeout(Duration),

    #[error("分类服务返回内容为空")]
    EmptyResponse,

    #[error("分类结果不符合约定格式: {0}")]
    Schema(String),
}

/// 举报流程中单个状态转换失败的原因
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionFailure {
    #[error("导航失败: {0}")]
    Navigation(DriverError),

    #[error("页面不可用 (命中标记: {marker})")]
    PageUnavailable { marker: String },

    #[error("{0}")]
    LocatorsExhausted(LocatorFailure),
}

/// 举报流程转换错误（单个目标，非致命）
///
/// 作为数据保存在流程结果中，不向上抛出。
#[derive(Debug, Clone, Error, PartialEq)]
#[error("从 `{from}` 推进到 `{target}` 失败: {cause}")]
pub struct ReportTransitionError {
    pub from: ReportState,
    pub target: ReportState,
    pub cause: TransitionFailure,
}

/// 配置错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("置信度阈值 {0} 不在 [0, 100] 范围内")]
    ThresholdOutOfRange(f64),

    #[error("举报类别列表为空")]
    EmptyCategories,

    #[error("默认举报类别 `{0}` 不在举报类别列表中")]
    UnknownDefaultCategory(String),

    #[error("未知的举报类别: {0}")]
    UnknownCategory(String),

    #[error("缺少配置项: {0}")]
    Missing(&'static str),

    #[error("读取配置文件失败 ({path}): {reason}")]
    File { path: String, reason: String },
}

impl AppError {
    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

impl DriverError {
    /// 元素操作失败
    pub fn action(action: &'static str, reason: impl ToString) -> Self {
        DriverError::Action {
            action,
            reason: reason.to_string(),
        }
    }

    /// 是否为"未找到 / 超时"这类定位失败
    pub fn is_locate_failure(&self) -> bool {
        matches!(self, DriverError::NotFound { .. } | DriverError::Timeout { .. })
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 驱动操作结果类型
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::NotFound {
            selector: "//h1".to_string(),
        };
        assert_eq!(err.to_string(), "未找到元素: //h1");
        assert!(err.is_locate_failure());
        assert!(!DriverError::Script("boom".into()).is_locate_failure());
    }

    #[test]
    fn test_app_error_from_load_error() {
        let err: AppError = LoadError::NotFound {
            path: "data/targets.json".into(),
        }
        .into();
        assert!(err.to_string().contains("data/targets.json"));
    }
}
