//! 程序配置
//!
//! 配置来源（后者覆盖前者）：默认值 → TOML 配置文件（可选）→ 环境变量。
//! 运行期间配置只读。

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::ReportCategory;

/// 目标平台登录凭据
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

// 密码不进日志
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 目标平台 ---
    pub credentials: Credentials,
    /// 登录页地址
    pub login_url: String,

    // --- 会话限制 ---
    /// 每个任务最多处理的目标数
    pub max_reports_per_session: usize,
    /// 两个目标之间的固定间隔（秒）
    pub delay_between_reports_secs: u64,
    /// 违规候选的置信度阈值 [0, 100]
    pub confidence_threshold: f64,
    /// 启用的举报类别
    pub report_categories: Vec<String>,
    /// 类别无法映射时使用的默认类别
    pub default_report_category: String,

    // --- 文件 ---
    pub targets_file: String,
    pub results_dir: String,
    pub log_level: String,
    pub log_file: Option<String>,

    // --- 浏览器 ---
    pub headless: bool,
    /// 设置后连接到已在该调试端口运行的浏览器，而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub page_timeout_secs: u64,
    /// 单个定位策略的等待上限
    pub step_timeout_secs: u64,
    /// 每次点击后等待页面稳定的时间
    pub action_settle_ms: u64,

    // --- 抓取 ---
    pub max_posts: usize,
    pub max_images: usize,
    pub image_host_filter: String,
    /// 页面源码中出现即视为主页不可用
    pub unavailable_markers: Vec<String>,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub classifier_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            login_url: "https://www.facebook.com/login".to_string(),
            max_reports_per_session: 5,
            delay_between_reports_secs: 15,
            confidence_threshold: 80.0,
            report_categories: ReportCategory::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            default_report_category: ReportCategory::FakeProfile.as_str().to_string(),
            targets_file: "data/targets.json".to_string(),
            results_dir: "data/reports".to_string(),
            log_level: "info".to_string(),
            log_file: Some("logs/app.log".to_string()),
            headless: false,
            browser_debug_port: None,
            chrome_executable: None,
            page_timeout_secs: 30,
            step_timeout_secs: 15,
            action_settle_ms: 2000,
            max_posts: 5,
            max_images: 10,
            image_host_filter: "facebook.com".to_string(),
            unavailable_markers: vec!["this page isn't available".to_string()],
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4".to_string(),
            classifier_timeout_secs: 60,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件（缺省字段使用默认值），再叠加环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) if path.exists() => Self::from_toml_file(path)?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::File { reason, .. } => ConfigError::File {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::File {
            path: String::new(),
            reason: e.to_string(),
        })
    }

    /// 环境变量覆盖；无法解析的值保留原值
    pub fn with_env_overrides(self) -> Self {
        let d = self;
        Self {
            credentials: Credentials {
                username: env_string("REPORTER_USERNAME").unwrap_or(d.credentials.username),
                password: env_string("REPORTER_PASSWORD").unwrap_or(d.credentials.password),
            },
            login_url: env_string("LOGIN_URL").unwrap_or(d.login_url),
            max_reports_per_session: env_parse("MAX_REPORTS_PER_SESSION")
                .unwrap_or(d.max_reports_per_session),
            delay_between_reports_secs: env_parse("DELAY_BETWEEN_REPORTS")
                .unwrap_or(d.delay_between_reports_secs),
            confidence_threshold: env_parse("CONFIDENCE_THRESHOLD")
                .unwrap_or(d.confidence_threshold),
            report_categories: env_string("REPORT_CATEGORIES")
                .map(|v| split_list(&v))
                .unwrap_or(d.report_categories),
            default_report_category: env_string("DEFAULT_REPORT_CATEGORY")
                .unwrap_or(d.default_report_category),
            targets_file: env_string("TARGETS_FILE").unwrap_or(d.targets_file),
            results_dir: env_string("RESULTS_DIR").unwrap_or(d.results_dir),
            log_level: env_string("LOG_LEVEL").unwrap_or(d.log_level),
            log_file: env_string("LOG_FILE").or(d.log_file),
            headless: env_parse("HEADLESS_MODE").unwrap_or(d.headless),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(d.browser_debug_port),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(d.chrome_executable),
            page_timeout_secs: env_parse("PAGE_TIMEOUT_SECS").unwrap_or(d.page_timeout_secs),
            step_timeout_secs: env_parse("STEP_TIMEOUT_SECS").unwrap_or(d.step_timeout_secs),
            action_settle_ms: env_parse("ACTION_SETTLE_MS").unwrap_or(d.action_settle_ms),
            max_posts: env_parse("MAX_POSTS").unwrap_or(d.max_posts),
            max_images: env_parse("MAX_IMAGES").unwrap_or(d.max_images),
            image_host_filter: env_string("IMAGE_HOST_FILTER").unwrap_or(d.image_host_filter),
            unavailable_markers: env_string("UNAVAILABLE_MARKERS")
                .map(|v| split_list(&v))
                .unwrap_or(d.unavailable_markers),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(d.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(d.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(d.llm_model_name),
            classifier_timeout_secs: env_parse("CLASSIFIER_TIMEOUT_SECS")
                .unwrap_or(d.classifier_timeout_secs),
        }
    }

    /// 检查配置是否可用于启动任务
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.confidence_threshold));
        }
        if self.report_categories.is_empty() {
            return Err(ConfigError::EmptyCategories);
        }
        for name in &self.report_categories {
            if ReportCategory::parse(name).is_none() {
                return Err(ConfigError::UnknownCategory(name.clone()));
            }
        }
        self.default_category()?;
        if !self.credentials.is_complete() {
            return Err(ConfigError::Missing("credentials"));
        }
        if self.targets_file.trim().is_empty() {
            return Err(ConfigError::Missing("targets_file"));
        }
        Ok(())
    }

    /// 已启用的举报类别
    pub fn enabled_categories(&self) -> Vec<ReportCategory> {
        self.report_categories
            .iter()
            .filter_map(|name| ReportCategory::parse(name))
            .collect()
    }

    /// 默认举报类别，必须属于已启用类别
    pub fn default_category(&self) -> Result<ReportCategory, ConfigError> {
        ReportCategory::parse(&self.default_report_category)
            .filter(|c| self.enabled_categories().contains(c))
            .ok_or_else(|| ConfigError::UnknownDefaultCategory(self.default_report_category.clone()))
    }

    pub fn delay_between_reports(&self) -> Duration {
        Duration::from_secs(self.delay_between_reports_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.trim().parse().ok())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
