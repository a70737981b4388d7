//! 分类：把一次读取结果映射为 PointResult。

use domain::{GOOD_QUALITY, Outcome, PointResult, ReadOutcome};

/// 纯函数，结果只取决于输入。
pub fn classify(identifier: &str, outcome: ReadOutcome) -> PointResult {
    match outcome {
        ReadOutcome::Success {
            value,
            quality_label,
        } => {
            let outcome = if quality_label == GOOD_QUALITY {
                Outcome::Good
            } else {
                Outcome::Bad
            };
            PointResult {
                identifier: identifier.to_string(),
                exists: true,
                value: Some(value),
                quality: quality_label,
                outcome,
            }
        }
        ReadOutcome::NotFound { reason } => PointResult {
            identifier: identifier.to_string(),
            exists: false,
            value: None,
            quality: reason,
            outcome: Outcome::NotFound,
        },
        ReadOutcome::OtherFailure { reason } => PointResult {
            identifier: identifier.to_string(),
            exists: false,
            value: None,
            quality: reason,
            outcome: Outcome::Bad,
        },
    }
}
