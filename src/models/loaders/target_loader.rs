//! 目标列表加载
//!
//! 支持两种文件格式：
//! - `.json`：URL 字符串数组
//! - 其他扩展名：纯文本，每行一个 URL，忽略空行和 `#` 开头的注释
//!
//! 不做去重和校验，空列表不是错误。

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::error::LoadError;
use crate::models::Target;

#[async_trait]
pub trait TargetLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<Target>, LoadError>;
}

/// 从文件加载目标
pub struct FileTargetLoader {
    path: PathBuf,
}

impl FileTargetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TargetLoader for FileTargetLoader {
    async fn load(&self) -> Result<Vec<Target>, LoadError> {
        let path_str = self.path.display().to_string();

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(LoadError::NotFound { path: path_str });
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::ReadFailed {
                path: path_str.clone(),
                source,
            })?;

        let is_json = self.path.extension().and_then(|s| s.to_str()) == Some("json");
        let targets = if is_json {
            parse_json_targets(&content).map_err(|reason| LoadError::Malformed {
                path: path_str.clone(),
                reason,
            })?
        } else {
            parse_text_targets(&content)
        };

        info!("✓ 已加载 {} 个目标: {}", targets.len(), path_str);
        Ok(targets)
    }
}

/// 内存中的目标列表
#[derive(Debug, Clone, Default)]
pub struct StaticTargetLoader {
    targets: Vec<Target>,
}

impl StaticTargetLoader {
    pub fn new<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TargetLoader for StaticTargetLoader {
    async fn load(&self) -> Result<Vec<Target>, LoadError> {
        Ok(self.targets.clone())
    }
}

fn parse_json_targets(content: &str) -> Result<Vec<Target>, String> {
    serde_json::from_str::<Vec<Target>>(content).map_err(|e| e.to_string())
}

fn parse_text_targets(content: &str) -> Vec<Target> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Target::from)
        .collect()
}
