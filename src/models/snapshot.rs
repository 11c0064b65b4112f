//! 主页内容快照
//!
//! 每个目标每次尝试只生成一次，生成后不再修改。
//! 导航失败时快照只带 `error` 字段。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Target;

/// 姓名提取失败时的占位值
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub name: String,
    pub bio: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    pub timestamp: String,
    pub reaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub target: Target,
    pub profile_info: ProfileInfo,
    pub posts: Vec<Post>,
    pub image_refs: Vec<String>,
    /// None 表示未知
    pub friends_count: Option<String>,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProfileSnapshot {
    /// 只带错误标记的快照
    pub fn failed(target: &Target, error: impl Into<String>) -> Self {
        Self {
            target: target.clone(),
            profile_info: ProfileInfo {
                name: UNKNOWN_NAME.to_string(),
                bio: String::new(),
                url: target.to_string(),
            },
            posts: Vec::new(),
            image_refs: Vec::new(),
            friends_count: None,
            captured_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
