//! 服务端会话抽象

use crate::error::{ConnectionError, ReadError};
use async_trait::async_trait;
use domain::PointValueData;
use pointcheck_config::RunConfig;

/// 一次成功读取的值与质量标签
#[derive(Debug, Clone, PartialEq)]
pub struct ReadValue {
    pub value: PointValueData,
    pub quality_label: String,
}

impl ReadValue {
    pub fn new(value: PointValueData, quality_label: impl Into<String>) -> Self {
        Self {
            value,
            quality_label: quality_label.into(),
        }
    }
}

/// 已建立的服务端会话（单次运行独占）。
#[async_trait]
pub trait ServerSession: Send {
    /// 读取点位当前值，只尝试一次。
    async fn read(&mut self, identifier: &str) -> Result<ReadValue, ReadError>;

    /// 断开会话。
    async fn disconnect(&mut self) -> Result<(), ConnectionError>;
}

/// 会话工厂。
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &RunConfig) -> Result<Box<dyn ServerSession>, ConnectionError>;
}
