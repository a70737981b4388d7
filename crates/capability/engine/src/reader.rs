//! 单点读取：一次尝试、受读取超时约束，并区分“不存在”与其他失败。

use crate::error::ReadError;
use crate::session::ServerSession;
use domain::ReadOutcome;
use pointcheck_config::{NotFoundMatch, RunConfig};
use std::time::{Duration, Instant};
use tracing::debug;

/// BadNodeIdUnknown
pub const NOT_FOUND_STATUS: u32 = 0x8034_0000;

/// 因运行时限到期而未完成的点位原因
pub const DEADLINE_REASON: &str = "run deadline exceeded";

/// 判定读取错误是否表示“节点不存在”。
pub trait NotFoundClassifier: Send + Sync {
    fn is_not_found(&self, error: &ReadError) -> bool;
}

/// 按状态码判定（忽略低 16 位信息位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCodeClassifier {
    code: u32,
}

impl StatusCodeClassifier {
    pub fn new(code: u32) -> Self {
        Self { code }
    }
}

impl Default for StatusCodeClassifier {
    fn default() -> Self {
        Self::new(NOT_FOUND_STATUS)
    }
}

impl NotFoundClassifier for StatusCodeClassifier {
    fn is_not_found(&self, error: &ReadError) -> bool {
        error
            .status_code()
            .is_some_and(|code| code & 0xFFFF_0000 == self.code & 0xFFFF_0000)
    }
}

/// 按错误文本是否包含标记判定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatchClassifier {
    token: String,
}

impl TextMatchClassifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl NotFoundClassifier for TextMatchClassifier {
    fn is_not_found(&self, error: &ReadError) -> bool {
        !self.token.is_empty() && error.to_string().contains(&self.token)
    }
}

impl<F> NotFoundClassifier for F
where
    F: Fn(&ReadError) -> bool + Send + Sync,
{
    fn is_not_found(&self, error: &ReadError) -> bool {
        self(error)
    }
}

/// 按配置选择判定方式。
pub fn classifier_from_config(config: &RunConfig) -> Box<dyn NotFoundClassifier> {
    match config.not_found_match {
        NotFoundMatch::Status => Box::new(StatusCodeClassifier::default()),
        NotFoundMatch::Text => Box::new(TextMatchClassifier::new(config.not_found_token.clone())),
    }
}

/// 一次读取的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAttempt {
    pub outcome: ReadOutcome,
    /// 会话已不可用，后续点位无需再尝试
    pub session_lost: bool,
    /// 读取被运行时限截断
    pub deadline_exceeded: bool,
    pub elapsed: Duration,
}

/// 单点读取器
pub struct PointReader {
    classifier: Box<dyn NotFoundClassifier>,
    read_timeout: Duration,
}

impl PointReader {
    pub fn new(classifier: Box<dyn NotFoundClassifier>, read_timeout: Duration) -> Self {
        Self {
            classifier,
            read_timeout,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(classifier_from_config(config), config.read_timeout())
    }

    /// 读取一个点位。不重试；任何错误都折叠为 ReadOutcome。
    pub async fn read(&self, session: &mut dyn ServerSession, identifier: &str) -> ReadAttempt {
        self.read_until(session, identifier, None).await
    }

    /// 同 `read`，等待时间同时受 `deadline` 约束；在时限处被截断的读取记为运行超时。
    pub async fn read_until(
        &self,
        session: &mut dyn ServerSession,
        identifier: &str,
        deadline: Option<Instant>,
    ) -> ReadAttempt {
        let started = Instant::now();
        let remaining = deadline.map(|deadline| deadline.saturating_duration_since(started));
        let capped = remaining.is_some_and(|remaining| remaining < self.read_timeout);
        let limit = match remaining {
            Some(remaining) if capped => remaining,
            _ => self.read_timeout,
        };

        let result = match tokio::time::timeout(limit, session.read(identifier)).await {
            Ok(result) => result,
            Err(_) if capped => {
                let elapsed = started.elapsed();
                pointcheck_telemetry::record_read_failure();
                debug!(identifier, "read cut off by run deadline");
                return ReadAttempt {
                    outcome: ReadOutcome::OtherFailure {
                        reason: DEADLINE_REASON.to_string(),
                    },
                    session_lost: false,
                    deadline_exceeded: true,
                    elapsed,
                };
            }
            Err(_) => Err(ReadError::Timeout(self.read_timeout.as_millis() as u64)),
        };
        let elapsed = started.elapsed();
        pointcheck_telemetry::record_read_latency_ms(elapsed.as_millis() as u64);

        match result {
            Ok(read) => {
                debug!(identifier, quality = %read.quality_label, "point read");
                ReadAttempt {
                    outcome: ReadOutcome::Success {
                        value: read.value,
                        quality_label: read.quality_label,
                    },
                    session_lost: false,
                    deadline_exceeded: false,
                    elapsed,
                }
            }
            Err(error) => {
                pointcheck_telemetry::record_read_failure();
                if matches!(error, ReadError::Timeout(_)) {
                    pointcheck_telemetry::record_read_timeout();
                }
                let reason = error.to_string();
                let outcome = if self.classifier.is_not_found(&error) {
                    ReadOutcome::NotFound { reason }
                } else {
                    ReadOutcome::OtherFailure { reason }
                };
                ReadAttempt {
                    outcome,
                    session_lost: error.is_session_lost(),
                    deadline_exceeded: false,
                    elapsed,
                }
            }
        }
    }
}
