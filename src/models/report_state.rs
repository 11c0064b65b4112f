use std::fmt;

use serde::{Deserialize, Serialize};

/// 举报流程状态
///
/// 顺序严格固定，每个中间状态只能由前一个状态到达；
/// `Failed` 可由任意中间状态到达。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    Idle,
    Navigated,
    MenuOpened,
    ReportOptionOpened,
    CategorySelected,
    DetailsProvided,
    Submitted,
    Success,
    Failed,
}

impl ReportState {
    /// 正常推进的下一个状态；终止状态返回 None
    pub fn next(self) -> Option<ReportState> {
        match self {
            ReportState::Idle => Some(ReportState::Navigated),
            ReportState::Navigated => Some(ReportState::MenuOpened),
            ReportState::MenuOpened => Some(ReportState::ReportOptionOpened),
            ReportState::ReportOptionOpened => Some(ReportState::CategorySelected),
            ReportState::CategorySelected => Some(ReportState::DetailsProvided),
            ReportState::DetailsProvided => Some(ReportState::Submitted),
            ReportState::Submitted => Some(ReportState::Success),
            ReportState::Success | ReportState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReportState::Success | ReportState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportState::Idle => "idle",
            ReportState::Navigated => "navigated",
            ReportState::MenuOpened => "menu_opened",
            ReportState::ReportOptionOpened => "report_option_opened",
            ReportState::CategorySelected => "category_selected",
            ReportState::DetailsProvided => "details_provided",
            ReportState::Submitted => "submitted",
            ReportState::Success => "success",
            ReportState::Failed => "failed",
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_sequence_is_linear() {
        let mut state = ReportState::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            visited.push(next);
            state = next;
        }
        assert_eq!(visited.len(), 8);
        assert_eq!(state, ReportState::Success);
        assert_eq!(ReportState::Failed.next(), None);
    }
}
