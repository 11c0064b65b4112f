//! # Profile Report Flow
//!
//! 按目标列表依次抓取主页内容，交给 AI 分类器判断是否违规，
//! 达到置信度阈值时通过多步界面流程提交举报。
//! 每个会话有处理上限和固定间隔，任务进度和结果可随时查询。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器页面），只暴露能力
//! - `Driver` / `DriverFactory` - 驱动能力抽象，`ChromeDriver` 为 chromiumoxide 实现
//! - `first_success` - 有序定位策略的通用组合器
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个目标
//! - `ContentScraper` - 主页抓取
//! - `ViolationClassifier` / `LlmService` - 违规分类
//! - `AuthService` - 登录
//! - `ResultStore` - 结果存储与统计
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个目标"的举报状态机
//! - `ReportCtx` - 上下文封装（job_id + 目标序号）
//! - `ReportFlow` - Idle → Navigated → … → Submitted → Success / Failed
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/job_orchestrator` - 单个任务（会话）的完整流程
//! - `orchestrator/job_registry` - 任务状态、进度与取消
//! - `orchestrator/app` - 组装真实依赖
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{Driver, DriverFactory, Selector};
pub use models::{JobId, JobRecord, JobStatus, ReportOutcome, Target};
pub use orchestrator::{App, JobOrchestrator, JobRegistry};
pub use services::{ClassificationBackend, ResultStore};
pub use workflow::{ReportCtx, ReportFlow};
