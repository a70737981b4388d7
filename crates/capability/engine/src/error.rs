//! 检查流程错误类型

use crate::orchestrator::RunState;
use std::fmt;

/// 连接建立失败
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid server address {0}: {1}")]
    InvalidAddress(String, String),
    #[error("connecting to {0} timed out after {1}ms")]
    Timeout(String, u64),
    #[error("failed to connect to {0}: {1}")]
    Protocol(String, String),
}

/// 单点读取失败（总会被折叠为 PointResult，不向上传播）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    /// 服务端返回坏状态码
    #[error("{name}: {message}")]
    Status {
        code: u32,
        name: String,
        message: String,
    },
    #[error("BadTimeout: read timed out after {0}ms")]
    Timeout(u64),
    #[error("BadNodeIdInvalid: {0} is not a valid node id")]
    InvalidIdentifier(String),
    /// 会话/通道已不可用，后续点位无法继续读取
    #[error("session lost: {0}")]
    SessionLost(String),
    #[error("{0}")]
    Other(String),
}

impl ReadError {
    /// 结构化状态码（如有）。
    pub fn status_code(&self) -> Option<u32> {
        match self {
            ReadError::Status { code, .. } => Some(*code),
            ReadError::Timeout(_) => Some(0x800A_0000),
            ReadError::InvalidIdentifier(_) => Some(0x8033_0000),
            _ => None,
        }
    }

    pub fn is_session_lost(&self) -> bool {
        matches!(self, ReadError::SessionLost(_))
    }
}

/// 点位清单读取失败
#[derive(Debug, thiserror::Error)]
pub enum PointSourceError {
    #[error("point list not found: {0}")]
    NotFound(String),
    #[error("failed to read point list: {0}")]
    Read(String),
    #[error("point list is empty")]
    Empty,
}

/// 报告写出失败
#[derive(Debug, thiserror::Error)]
pub enum ReportWriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xlsx error: {0}")]
    Xlsx(String),
    #[error("json error: {0}")]
    Json(String),
}

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Points,
    Connect,
    Report,
}

impl Stage {
    /// 进程退出码。
    pub fn exit_code(self) -> i32 {
        match self {
            Stage::Config => 2,
            Stage::Points => 3,
            Stage::Connect => 4,
            Stage::Report => 5,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Points => "points",
            Stage::Connect => "connect",
            Stage::Report => "report",
        };
        write!(f, "{}", name)
    }
}

/// 致命阶段失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage failed: {message}")]
pub struct RunFailure {
    pub stage: Stage,
    pub message: String,
    /// 失败前依次经过的状态，以 `Failed(stage)` 结尾
    pub states: Vec<RunState>,
}

impl RunFailure {
    /// 以已经过的状态构造，并追加 `Failed(stage)`。
    pub fn after(states: &[RunState], stage: Stage, message: impl Into<String>) -> Self {
        let mut states = states.to_vec();
        states.push(RunState::Failed(stage));
        Self {
            stage,
            message: message.into(),
            states,
        }
    }
}
