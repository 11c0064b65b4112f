//! 流程层
//!
//! 编排"一个目标从导航到提交举报"的状态机，不持有浏览器。

pub mod locators;
pub mod report_ctx;
pub mod report_flow;

pub use report_ctx::ReportCtx;
pub use report_flow::{CategoryChoice, ReportFlow, ReportRun};
