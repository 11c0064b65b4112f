//! 业务能力层
//!
//! 描述"我能做什么"，每个服务只处理单个目标或单个内容单元。

pub mod auth_service;
pub mod content_scraper;
pub mod llm_service;
pub mod result_store;
pub mod violation_classifier;

pub use auth_service::AuthService;
pub use content_scraper::ContentScraper;
pub use llm_service::LlmService;
pub use result_store::{compute_stats, ResultStats, ResultStore};
pub use violation_classifier::{
    content_units, parse_response, ClassificationBackend, ContentUnit, ViolationClassifier,
};
