//! 点位检查结果模型。

use crate::data::PointValueData;
use serde::Serialize;

/// 质量标签：仅此值视为“好品质”。
pub const GOOD_QUALITY: &str = "Good";

/// 单点分类结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Good,
    Bad,
    NotFound,
}

/// 单点读取结果（一次尝试）。
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// 节点解析成功并读到值与质量码。
    Success {
        value: PointValueData,
        quality_label: String,
    },
    /// 服务端报告节点不存在。
    NotFound { reason: String },
    /// 其他失败（超时、格式错误、类型不匹配、服务端错误等）。
    OtherFailure { reason: String },
}

/// 单点检查记录。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointResult {
    pub identifier: String,
    pub exists: bool,
    pub value: Option<PointValueData>,
    /// 读取成功时为质量码名称，失败时为失败原因。
    pub quality: String,
    pub outcome: Outcome,
}

/// 批次报告：按分类结果划分的三组记录，组内保持处理顺序。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub good: Vec<PointResult>,
    pub bad: Vec<PointResult>,
    pub not_found: Vec<PointResult>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 outcome 追加到对应分组。
    pub fn push(&mut self, result: PointResult) {
        match result.outcome {
            Outcome::Good => self.good.push(result),
            Outcome::Bad => self.bad.push(result),
            Outcome::NotFound => self.not_found.push(result),
        }
    }

    pub fn bucket(&self, outcome: Outcome) -> &[PointResult] {
        match outcome {
            Outcome::Good => &self.good,
            Outcome::Bad => &self.bad,
            Outcome::NotFound => &self.not_found,
        }
    }

    /// 三组记录总数。
    pub fn len(&self) -> usize {
        self.good.len() + self.bad.len() + self.not_found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<PointResult> for BatchReport {
    fn extend<T: IntoIterator<Item = PointResult>>(&mut self, iter: T) {
        for result in iter {
            self.push(result);
        }
    }
}

impl FromIterator<PointResult> for BatchReport {
    fn from_iter<T: IntoIterator<Item = PointResult>>(iter: T) -> Self {
        let mut report = BatchReport::new();
        report.extend(iter);
        report
    }
}
