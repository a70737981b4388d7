//! 批量检查：按输入顺序逐点读取并分类。

use crate::classify::classify;
use crate::reader::{DEADLINE_REASON, PointReader};
use crate::session::ServerSession;
use domain::{BatchReport, Outcome, PointResult, ReadOutcome};
use std::time::Instant;
use tracing::{error, info, warn};

/// 批次结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStop {
    Completed,
    /// 会话中途丢失，剩余点位未读取
    SessionLost { reason: String },
    /// 整体运行时限到期，剩余点位未读取
    DeadlineExceeded,
}

/// 批次检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub report: BatchReport,
    pub stop: BatchStop,
}

/// 依次检查全部点位。每个输入点恰好产生一条结果，单点失败不会中断批次。
///
/// `deadline` 为整次运行的截止时刻：到期后剩余点位不再读取，进行中的读取也在该时刻被截断。
pub async fn check_batch(
    session: &mut dyn ServerSession,
    reader: &PointReader,
    points: &[String],
    deadline: Option<Instant>,
) -> BatchOutcome {
    let started = Instant::now();
    let mut report = BatchReport::new();
    let mut stop = BatchStop::Completed;

    for identifier in points {
        let result = if stop == BatchStop::Completed {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "run deadline exceeded, remaining points skipped"
                );
                stop = BatchStop::DeadlineExceeded;
                skipped(identifier, &stop)
            } else {
                let attempt = reader.read_until(session, identifier, deadline).await;
                if attempt.session_lost {
                    let reason = match &attempt.outcome {
                        ReadOutcome::NotFound { reason }
                        | ReadOutcome::OtherFailure { reason } => reason.clone(),
                        ReadOutcome::Success { .. } => String::new(),
                    };
                    error!(identifier = %identifier, reason = %reason, "session lost during batch");
                    pointcheck_telemetry::record_session_lost();
                    stop = BatchStop::SessionLost { reason };
                } else if attempt.deadline_exceeded {
                    warn!(
                        identifier = %identifier,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "run deadline exceeded during read, remaining points skipped"
                    );
                    stop = BatchStop::DeadlineExceeded;
                }
                classify(identifier, attempt.outcome)
            }
        } else {
            skipped(identifier, &stop)
        };

        log_result(&result);
        record_result(&result);
        report.push(result);
    }

    info!(
        good = report.good.len(),
        bad = report.bad.len(),
        not_found = report.not_found.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch checked"
    );
    BatchOutcome { report, stop }
}

fn skipped(identifier: &str, stop: &BatchStop) -> PointResult {
    let reason = match stop {
        BatchStop::SessionLost { reason } => format!("connection lost: {}", reason),
        BatchStop::DeadlineExceeded => DEADLINE_REASON.to_string(),
        BatchStop::Completed => String::new(),
    };
    classify(identifier, ReadOutcome::OtherFailure { reason })
}

fn log_result(result: &PointResult) {
    match (result.outcome, result.exists) {
        (Outcome::Good, _) => info!(
            identifier = %result.identifier,
            value = %display_value(result),
            quality = %result.quality,
            "point good"
        ),
        (Outcome::Bad, true) => warn!(
            identifier = %result.identifier,
            value = %display_value(result),
            quality = %result.quality,
            "point bad quality"
        ),
        (Outcome::NotFound, _) => warn!(
            identifier = %result.identifier,
            reason = %result.quality,
            "point not found"
        ),
        (Outcome::Bad, false) => error!(
            identifier = %result.identifier,
            reason = %result.quality,
            "point read failed"
        ),
    }
}

fn display_value(result: &PointResult) -> String {
    result
        .value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn record_result(result: &PointResult) {
    pointcheck_telemetry::record_point_checked();
    match result.outcome {
        Outcome::Good => pointcheck_telemetry::record_good(),
        Outcome::Bad => pointcheck_telemetry::record_bad(),
        Outcome::NotFound => pointcheck_telemetry::record_not_found(),
    }
}
