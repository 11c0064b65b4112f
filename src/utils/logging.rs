//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use tracing::info;

use crate::config::Config;
use crate::models::{JobId, JobStatus, JobStatusView};
use crate::services::ResultStats;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 主页违规检测与举报");
    info!("📊 每次会话最多处理: {} 个目标", config.max_reports_per_session);
    info!("⏱  目标间隔: {} 秒", config.delay_between_reports_secs);
    info!("🎯 置信度阈值: {}", config.confidence_threshold);
    info!("🤖 分类模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录任务进度
///
/// # 参数
/// - `job_id`: 任务ID
/// - `view`: 当前状态
pub fn log_progress(job_id: &JobId, view: &JobStatusView) {
    let reported = view.results.iter().filter(|o| o.is_reported()).count();
    info!(
        "[任务 {}] 📈 进度 {}% | 已处理 {} | 已举报 {}",
        job_id,
        view.progress,
        view.results.len(),
        reported
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `status`: 任务最终状态
/// - `stats`: 结果统计
/// - `results_file`: 实际写入的结果文件，没有写文件时为 `None`
pub fn print_final_stats(status: JobStatus, stats: &ResultStats, results_file: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 任务完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("任务状态: {:?}", status);
    info!("✅ 成功举报: {}/{}", stats.successful, stats.total);
    info!("📈 成功率: {:.2}%", stats.success_rate);
    for (violation_type, count) in &stats.counts_by_violation_type {
        info!("   - {}: {}", violation_type, count);
    }
    info!("{}", "=".repeat(60));
    match results_file {
        Some(path) => info!("\n结果已保存至: {}", path),
        None => info!("\n本次没有写入结果文件"),
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("这是一段很长的证据文本", 4), "这是一段...");
    }
}
