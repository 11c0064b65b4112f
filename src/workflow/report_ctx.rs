//! 目标处理上下文
//!
//! 封装"我正在处理哪个任务的第几个目标"这一信息，只用于日志

use std::fmt::Display;

use crate::models::{JobId, Target};

#[derive(Debug, Clone)]
pub struct ReportCtx {
    pub job_id: JobId,
    /// 目标序号（从1开始）
    pub target_index: usize,
    /// 本次会话计划处理的目标数
    pub planned: usize,
    pub target: Target,
}

impl ReportCtx {
    pub fn new(job_id: JobId, target_index: usize, planned: usize, target: Target) -> Self {
        Self {
            job_id,
            target_index,
            planned,
            target,
        }
    }
}

impl Display for ReportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short_id: String = self.job_id.as_str().chars().take(8).collect();
        write!(
            f,
            "[任务 {} 目标 {}/{}]",
            short_id, self.target_index, self.planned
        )
    }
}
