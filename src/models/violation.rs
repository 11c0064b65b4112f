//! 违规候选与举报类别

use std::fmt;

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 分类器给出的违规候选
///
/// `report_category` 保留分类器原样返回的抽象类别名，
/// 在举报时才解析为 [`ReportCategory`]（无法解析时使用默认类别）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationCandidate {
    pub violation_type: String,
    pub confidence_score: f64,
    pub evidence: String,
    pub report_category: String,
}

impl ViolationCandidate {
    pub fn is_actionable(&self, threshold: f64) -> bool {
        self.confidence_score >= threshold
    }
}

/// 从候选中选出用于举报的一项
///
/// 只考虑 `confidence_score >= threshold` 的候选，取置信度最高者；
/// 置信度相同时取最早出现的。
pub fn select_actionable(
    candidates: &[ViolationCandidate],
    threshold: f64,
) -> Option<&ViolationCandidate> {
    let mut best: Option<&ViolationCandidate> = None;
    for candidate in candidates.iter().filter(|c| c.is_actionable(threshold)) {
        match best {
            Some(current) if candidate.confidence_score <= current.confidence_score => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// 固定的举报类别集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCategory {
    Impersonation,
    FakeProfile,
    Harassment,
    HateSpeech,
    NudityOrSexualContent,
    Violence,
    SelfInjury,
    Spam,
    FraudOrScam,
    Underage,
}

/// 小写名称 / 常见别名 → 类别
static CATEGORY_NAMES: phf::Map<&'static str, ReportCategory> = phf_map! {
    "impersonation" => ReportCategory::Impersonation,
    "pretending to be someone" => ReportCategory::Impersonation,
    "fake profile" => ReportCategory::FakeProfile,
    "fake account" => ReportCategory::FakeProfile,
    "harassment" => ReportCategory::Harassment,
    "bullying" => ReportCategory::Harassment,
    "harassment or bullying" => ReportCategory::Harassment,
    "hate speech" => ReportCategory::HateSpeech,
    "nudity or sexual content" => ReportCategory::NudityOrSexualContent,
    "nudity" => ReportCategory::NudityOrSexualContent,
    "sexual content" => ReportCategory::NudityOrSexualContent,
    "violence" => ReportCategory::Violence,
    "graphic violence" => ReportCategory::Violence,
    "self-injury" => ReportCategory::SelfInjury,
    "self injury" => ReportCategory::SelfInjury,
    "self-harm" => ReportCategory::SelfInjury,
    "spam" => ReportCategory::Spam,
    "fraud or scam" => ReportCategory::FraudOrScam,
    "fraud" => ReportCategory::FraudOrScam,
    "scam" => ReportCategory::FraudOrScam,
    "underage" => ReportCategory::Underage,
    "underage user" => ReportCategory::Underage,
};

impl ReportCategory {
    pub const ALL: [ReportCategory; 10] = [
        ReportCategory::Impersonation,
        ReportCategory::FakeProfile,
        ReportCategory::Harassment,
        ReportCategory::HateSpeech,
        ReportCategory::NudityOrSexualContent,
        ReportCategory::Violence,
        ReportCategory::SelfInjury,
        ReportCategory::Spam,
        ReportCategory::FraudOrScam,
        ReportCategory::Underage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Impersonation => "Impersonation",
            ReportCategory::FakeProfile => "Fake Profile",
            ReportCategory::Harassment => "Harassment",
            ReportCategory::HateSpeech => "Hate Speech",
            ReportCategory::NudityOrSexualContent => "Nudity or Sexual Content",
            ReportCategory::Violence => "Violence",
            ReportCategory::SelfInjury => "Self-Injury",
            ReportCategory::Spam => "Spam",
            ReportCategory::FraudOrScam => "Fraud or Scam",
            ReportCategory::Underage => "Underage",
        }
    }

    /// 不区分大小写解析；未知名称返回 None
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase();
        CATEGORY_NAMES.get(key.as_str()).copied()
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(kind: &str, score: f64) -> ViolationCandidate {
        ViolationCandidate {
            violation_type: kind.to_string(),
            confidence_score: score,
            evidence: String::new(),
            report_category: "Spam".to_string(),
        }
    }

    #[test]
    fn test_threshold_filters_candidates() {
        let high = vec![candidate("spam", 95.0)];
        assert!(select_actionable(&high, 80.0).is_some());

        let low = vec![candidate("spam", 50.0)];
        assert!(select_actionable(&low, 80.0).is_none());

        // 等于阈值也算可举报
        let exact = vec![candidate("spam", 80.0)];
        assert!(select_actionable(&exact, 80.0).is_some());
    }

    #[test]
    fn test_highest_confidence_wins_and_ties_keep_earliest() {
        let candidates = vec![
            candidate("a", 85.0),
            candidate("b", 92.0),
            candidate("c", 92.0),
            candidate("d", 40.0),
        ];
        let selected = select_actionable(&candidates, 80.0).unwrap();
        assert_eq!(selected.violation_type, "b");
    }

    #[test]
    fn test_parse_category_names_and_aliases() {
        assert_eq!(ReportCategory::parse("Fake Profile"), Some(ReportCategory::FakeProfile));
        assert_eq!(ReportCategory::parse("  fake account "), Some(ReportCategory::FakeProfile));
        assert_eq!(ReportCategory::parse("SCAM"), Some(ReportCategory::FraudOrScam));
        assert_eq!(ReportCategory::parse("Copyright"), None);
    }

    #[test]
    fn test_every_category_round_trips_through_its_name() {
        for category in ReportCategory::ALL {
            assert_eq!(ReportCategory::parse(category.as_str()), Some(category));
        }
    }
}
