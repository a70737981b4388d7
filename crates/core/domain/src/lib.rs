pub mod check;
pub mod data;

pub use check::{BatchReport, GOOD_QUALITY, Outcome, PointResult, ReadOutcome};
pub use data::PointValueData;

use serde::Serialize;

/// 服务器运行上下文：单次运行内共享的只读信息。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerContext {
    pub server_name: String,
    pub server_url: String,
    pub run_id: String,
}

impl ServerContext {
    /// 构造显式服务器标识的运行上下文。
    pub fn new(
        server_name: impl Into<String>,
        server_url: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            server_url: server_url.into(),
            run_id: run_id.into(),
        }
    }
}
