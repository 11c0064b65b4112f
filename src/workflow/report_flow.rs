//! 举报流程状态机 - 流程层
//!
//! 状态顺序：
//! `Idle → Navigated → MenuOpened → ReportOptionOpened → CategorySelected
//!  → DetailsProvided → Submitted → Success`
//!
//! 每个转换由一组有序的定位策略完成，全部失败则进入 `Failed`，
//! 本次举报尝试结束（不重试）。流程不向外抛出错误，
//! 所有出口都落在 `Success` 或 `Failed` 之一，并记录失败发生在哪一步。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ReportTransitionError, TransitionFailure};
use crate::infrastructure::{first_success, Driver, LocatorStrategy};
use crate::models::{
    FailureReason, ReportCategory, ReportOutcome, ReportState, Target, ViolationCandidate,
};
use crate::workflow::locators;
use crate::workflow::report_ctx::ReportCtx;

/// 确认弹窗（"完成"按钮）的等待上限，缺失不影响结果
const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(3);

/// 抽象类别解析结果
///
/// 流程结束后 `label` 是页面上实际点中的选项。
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChoice {
    pub category: ReportCategory,
    pub label: String,
    /// 原始类别无法映射或其选项不在页面上，使用了默认类别
    pub used_default: bool,
}

/// 一次举报尝试的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    pub final_state: ReportState,
    /// 依次到达的状态（含 Idle 和终止状态）
    pub visited: Vec<ReportState>,
    pub choice: CategoryChoice,
    pub failure: Option<ReportTransitionError>,
}

impl ReportRun {
    pub fn is_success(&self) -> bool {
        self.final_state == ReportState::Success
    }

    /// 转换为结果记录
    pub fn to_outcome(&self, target: &Target, candidate: &ViolationCandidate) -> ReportOutcome {
        match &self.failure {
            None => ReportOutcome::reported(target, candidate, self.choice.label.clone()),
            Some(err) => ReportOutcome::failed(
                target,
                FailureReason::Transition {
                    target: err.target,
                    message: err.to_string(),
                },
                Some(candidate),
            ),
        }
    }
}

/// 举报流程
///
/// 不持有任何资源，驱动由调用方传入。
pub struct ReportFlow {
    enabled: Vec<ReportCategory>,
    default_category: ReportCategory,
    step_timeout: Duration,
    settle: Duration,
    unavailable_markers: Vec<String>,
}

impl ReportFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.enabled_categories(),
            default_category: config
                .default_category()
                .unwrap_or(ReportCategory::FakeProfile),
            step_timeout: config.step_timeout(),
            settle: config.action_settle(),
            unavailable_markers: config
                .unavailable_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// 把分类器给出的抽象类别映射为页面选项；未知或未启用的类别使用默认类别
    pub fn resolve_category(&self, raw: &str) -> CategoryChoice {
        let mapped = ReportCategory::parse(raw)
            .filter(|c| self.enabled.contains(c))
            .and_then(|c| locators::category_label(c).map(|label| (c, label)));

        match mapped {
            Some((category, label)) => CategoryChoice {
                category,
                label: label.to_string(),
                used_default: false,
            },
            None => {
                let category = self.default_category;
                let label = locators::category_label(category).unwrap_or(category.as_str());
                CategoryChoice {
                    category,
                    label: label.to_string(),
                    used_default: true,
                }
            }
        }
    }

    /// 对一个目标执行完整的举报流程
    pub async fn run<D: Driver>(
        &self,
        driver: &D,
        target: &Target,
        report_category: &str,
        ctx: &ReportCtx,
    ) -> ReportRun {
        let mut choice = self.resolve_category(report_category);
        if choice.used_default {
            info!(
                "{} 类别 `{}` 无法映射，使用默认类别 `{}`",
                ctx, report_category, choice.category
            );
        }

        let mut state = ReportState::Idle;
        let mut visited = vec![state];

        while let Some(next) = state.next() {
            match self.transition(driver, target, next, &mut choice).await {
                Ok(()) => {
                    debug!("{} {} → {}", ctx, state, next);
                    state = next;
                    visited.push(state);
                }
                Err(cause) => {
                    let failure = ReportTransitionError {
                        from: state,
                        target: next,
                        cause,
                    };
                    warn!("{} ❌ 举报流程失败: {}", ctx, failure);
                    visited.push(ReportState::Failed);
                    return ReportRun {
                        final_state: ReportState::Failed,
                        visited,
                        choice,
                        failure: Some(failure),
                    };
                }
            }
        }

        info!("{} ✓ 举报已提交 (类别: {})", ctx, choice.label);
        ReportRun {
            final_state: state,
            visited,
            choice,
            failure: None,
        }
    }

    /// 执行进入 `next` 状态所需的页面操作
    async fn transition<D: Driver>(
        &self,
        driver: &D,
        target: &Target,
        next: ReportState,
        choice: &mut CategoryChoice,
    ) -> Result<(), TransitionFailure> {
        match next {
            ReportState::Navigated => self.navigate(driver, target).await,
            ReportState::MenuOpened => self.step(driver, &locators::menu_candidates()).await,
            ReportState::ReportOptionOpened => {
                self.step(driver, &locators::report_option_candidates()).await
            }
            ReportState::CategorySelected => self.select_category(driver, choice).await,
            ReportState::DetailsProvided => {
                self.step(driver, &locators::details_candidates()).await
            }
            ReportState::Submitted => self.step(driver, &locators::submit_candidates()).await,
            ReportState::Success => {
                // 确认弹窗可有可无
                if first_success(
                    driver,
                    &locators::confirmation_candidates(),
                    CONFIRMATION_TIMEOUT.min(self.step_timeout),
                )
                .await
                .is_err()
                {
                    debug!("未出现确认弹窗");
                }
                Ok(())
            }
            ReportState::Idle | ReportState::Failed => Ok(()),
        }
    }

    async fn navigate<D: Driver>(&self, driver: &D, target: &Target) -> Result<(), TransitionFailure> {
        driver
            .navigate(target.as_str())
            .await
            .map_err(TransitionFailure::Navigation)?;
        self.settle().await;

        let source = driver
            .page_source()
            .await
            .map_err(TransitionFailure::Navigation)?
            .to_lowercase();
        if let Some(marker) = self.unavailable_markers.iter().find(|m| source.contains(m.as_str())) {
            return Err(TransitionFailure::PageUnavailable {
                marker: marker.clone(),
            });
        }
        Ok(())
    }

    /// 点选类别；对应选项不存在时改点默认类别，`choice` 随之更新
    async fn select_category<D: Driver>(
        &self,
        driver: &D,
        choice: &mut CategoryChoice,
    ) -> Result<(), TransitionFailure> {
        let mut failure =
            match self.step(driver, &locators::category_candidates(&choice.label)).await {
                Ok(()) => return Ok(()),
                Err(TransitionFailure::LocatorsExhausted(failure)) => failure,
                Err(other) => return Err(other),
            };

        let default_label = locators::category_label(self.default_category)
            .unwrap_or(self.default_category.as_str());
        if choice.category == self.default_category || choice.label == default_label {
            return Err(TransitionFailure::LocatorsExhausted(failure));
        }

        warn!(
            "类别选项 `{}` 不在页面上，改用默认类别 `{}`",
            choice.label, default_label
        );
        match self.step(driver, &locators::category_candidates(default_label)).await {
            Ok(()) => {
                *choice = CategoryChoice {
                    category: self.default_category,
                    label: default_label.to_string(),
                    used_default: true,
                };
                Ok(())
            }
            Err(TransitionFailure::LocatorsExhausted(more)) => {
                failure.attempts.extend(more.attempts);
                Err(TransitionFailure::LocatorsExhausted(failure))
            }
            Err(other) => Err(other),
        }
    }

    async fn step<D: Driver>(
        &self,
        driver: &D,
        candidates: &[LocatorStrategy],
    ) -> Result<(), TransitionFailure> {
        let hit = first_success(driver, candidates, self.step_timeout)
            .await
            .map_err(TransitionFailure::LocatorsExhausted)?;
        debug!("使用定位策略 [{}]", hit.name);
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
    }
}
