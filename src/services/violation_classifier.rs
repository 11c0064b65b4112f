//! 违规分类 - 业务能力层
//!
//! 把快照拆成内容单元（主页信息、每条帖子、每个图片地址），
//! 每个单元单独请求一次分类服务并解析结果。
//! 单元之间互不影响：某个单元超时、调用失败或返回格式不对，只是该单元没有候选。
//!
//! 图片只按地址字符串分析，不下载图片内容。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ClassificationError;
use crate::models::{Post, ProfileInfo, ProfileSnapshot, ViolationCandidate};

/// 分类服务能力：输入系统提示和用户提示，返回原始文本
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ClassificationError>;

    fn model_name(&self) -> &str;
}

pub const SYSTEM_PROMPT: &str =
    "You are a social media policy violation expert. Always return valid JSON and nothing else.";

const RESPONSE_FORMAT: &str = r#"Return analysis in this exact JSON format:
{
    "violations": [
        {
            "violation_type": "violation_name",
            "confidence_score": 85,
            "evidence": "specific evidence from the content",
            "report_category": "one of: Impersonation, Fake Profile, Harassment, Hate Speech, Nudity or Sexual Content, Violence, Self-Injury, Spam, Fraud or Scam, Underage"
        }
    ]
}
confidence_score must be a number between 0 and 100.
If no violations are found, return an empty violations array."#;

/// 一个待分类的内容单元
#[derive(Debug, Clone, Copy)]
pub enum ContentUnit<'a> {
    Profile(&'a ProfileInfo),
    Post(&'a Post),
    Image(&'a str),
}

impl ContentUnit<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentUnit::Profile(_) => "profile",
            ContentUnit::Post(_) => "post",
            ContentUnit::Image(_) => "image",
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            ContentUnit::Profile(info) => format!(
                "Analyze this social media profile for policy violations:\n\n\
                 Profile Name: {}\nBio: {}\nProfile URL: {}\n\n\
                 Check for these violation types:\n\
                 - Impersonation (using someone else's identity)\n\
                 - Fake account (bot or completely fake profile)\n\
                 - Hate speech in bio\n\
                 - Underage user (based on profile content)\n\
                 - Illegal activity promotion\n\n{}",
                info.name, info.bio, info.url, RESPONSE_FORMAT
            ),
            ContentUnit::Post(post) => format!(
                "Analyze this social media post for policy violations:\n\n\
                 Post Text: {}\nTimestamp: {}\nReactions: {}\n\n\
                 Check for:\n\
                 - Harassment or bullying\n- Hate speech\n- Sexual content\n\
                 - Violence or graphic content\n- Self-harm promotion\n\
                 - Spam or scams\n- Illegal activity\n\n{}",
                post.text, post.timestamp, post.reaction_count, RESPONSE_FORMAT
            ),
            ContentUnit::Image(url) => format!(
                "Analyze this image URL for potential policy violations:\n\n\
                 Image URL: {}\n\n\
                 Based on the URL pattern and context, check for:\n\
                 - Nudity or sexual content\n- Violent or graphic content\n- Hate symbols\n\n\
                 Note: this is URL-based analysis only.\n\n{}",
                url, RESPONSE_FORMAT
            ),
        }
    }
}

/// 按"主页信息 → 帖子 → 图片"的顺序拆分内容单元
pub fn content_units(snapshot: &ProfileSnapshot) -> Vec<ContentUnit<'_>> {
    let mut units = vec![ContentUnit::Profile(&snapshot.profile_info)];
    units.extend(snapshot.posts.iter().map(ContentUnit::Post));
    units.extend(snapshot.image_refs.iter().map(|url| ContentUnit::Image(url)));
    units
}

pub struct ViolationClassifier<B: ClassificationBackend> {
    backend: Arc<B>,
    request_timeout: Duration,
}

impl<B: ClassificationBackend> ViolationClassifier<B> {
    pub fn new(backend: Arc<B>, request_timeout: Duration) -> Self {
        Self {
            backend,
            request_timeout,
        }
    }

    /// 对快照的所有内容单元依次分类，按单元顺序拼接候选
    ///
    /// 带错误标记的快照不会发起任何请求。
    pub async fn classify(&self, snapshot: &ProfileSnapshot) -> Vec<ViolationCandidate> {
        if snapshot.is_error() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for (index, unit) in content_units(snapshot).into_iter().enumerate() {
            match self.classify_unit(&unit).await {
                Ok(found) => {
                    debug!("内容单元 #{} ({}) 返回 {} 个候选", index, unit.kind(), found.len());
                    candidates.extend(found);
                }
                Err(e) => {
                    warn!("内容单元 #{} ({}) 分类失败，已丢弃: {}", index, unit.kind(), e);
                }
            }
        }
        candidates
    }

    pub async fn classify_unit(
        &self,
        unit: &ContentUnit<'_>,
    ) -> Result<Vec<ViolationCandidate>, ClassificationError> {
        let prompt = unit.prompt();
        let raw = timeout(
            self.request_timeout,
            self.backend.complete(SYSTEM_PROMPT, &prompt),
        )
        .await
        .map_err(|_| ClassificationError::Timeout(self.request_timeout))??;

        parse_response(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct RawViolation {
    violation_type: String,
    confidence_score: f64,
    #[serde(default)]
    evidence: String,
    report_category: String,
}

/// 解析分类服务的原始返回
///
/// 接受 `{"violations": [...]}` 或裸数组，允许外层有 Markdown 代码块或说明文字。
/// 任一条目缺字段或置信度越界时，整个返回都作废。
pub fn parse_response(raw: &str) -> Result<Vec<ViolationCandidate>, ClassificationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClassificationError::EmptyResponse);
    }

    let value = extract_json(raw)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("violations") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(ClassificationError::Schema(
                    "`violations` 不是数组".to_string(),
                ))
            }
            None => {
                return Err(ClassificationError::Schema(
                    "缺少 `violations` 字段".to_string(),
                ))
            }
        },
        other => {
            return Err(ClassificationError::Schema(format!(
                "顶层不是对象或数组: {}",
                other
            )))
        }
    };

    items
        .into_iter()
        .map(|item| {
            let raw: RawViolation = serde_json::from_value(item)
                .map_err(|e| ClassificationError::Schema(e.to_string()))?;
            if !(0.0..=100.0).contains(&raw.confidence_score) {
                return Err(ClassificationError::Schema(format!(
                    "置信度 {} 不在 [0, 100] 范围内",
                    raw.confidence_score
                )));
            }
            Ok(ViolationCandidate {
                violation_type: raw.violation_type,
                confidence_score: raw.confidence_score,
                evidence: raw.evidence,
                report_category: raw.report_category,
            })
        })
        .collect()
}

/// 取出文本中的第一个 JSON 对象或数组
fn extract_json(raw: &str) -> Result<Value, ClassificationError> {
    let mut body = raw;
    if let Ok(re) = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```") {
        if let Some(inner) = re.captures(raw).and_then(|c| c.get(1)) {
            body = inner.as_str();
        }
    }

    let start = body
        .find(|c| c == '{' || c == '[')
        .ok_or_else(|| ClassificationError::Schema("返回内容中没有 JSON".to_string()))?;

    // 只解析第一个完整的值，忽略其后的说明文字
    serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| ClassificationError::Schema("返回内容中没有 JSON".to_string()))?
        .map_err(|e| ClassificationError::Schema(e.to_string()))
}
