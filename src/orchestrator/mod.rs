//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! app (组装真实依赖，跟踪进度)
//!     ↓
//! job_orchestrator (一个任务 = 一次会话，处理 Vec<Target>)
//!     ↓
//! workflow::ReportFlow (单个目标的举报状态机)
//!     ↓
//! services (能力层：抓取 / 分类 / 登录 / 结果存储)
//!     ↓
//! infrastructure (基础设施：Driver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：每个任务独占一个驱动，只有编排层获取和释放驱动
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **状态集中**：任务状态只通过 `JobRegistry` 修改

pub mod app;
pub mod job_orchestrator;
pub mod job_registry;

pub use app::{App, ChromeOrchestrator};
pub use job_orchestrator::JobOrchestrator;
pub use job_registry::JobRegistry;
