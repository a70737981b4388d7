//! 预设连接器与会话，供离线测试使用（需启用 `test-support` 特性）。
//!
//! 会话按点名返回预设结果；未预设的点名返回 BadNodeIdUnknown。

use crate::error::{ConnectionError, ReadError};
use crate::session::{Connector, ReadValue, ServerSession};
use async_trait::async_trait;
use domain::PointValueData;
use pointcheck_config::RunConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MockStats {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    reads: Mutex<Vec<String>>,
}

/// 预设的单点响应
#[derive(Debug, Clone)]
enum Scripted {
    Reply(Result<ReadValue, ReadError>),
    Delayed(Duration, Result<ReadValue, ReadError>),
}

/// 预设会话
#[derive(Clone, Default)]
pub struct MockSession {
    replies: HashMap<String, Scripted>,
    lose_after: Option<usize>,
    failing_disconnect: bool,
    stats: Arc<MockStats>,
    read_count: usize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 点位读取成功。
    pub fn with_value(
        mut self,
        identifier: &str,
        value: PointValueData,
        quality_label: &str,
    ) -> Self {
        self.replies.insert(
            identifier.to_string(),
            Scripted::Reply(Ok(ReadValue::new(value, quality_label))),
        );
        self
    }

    /// 点位读取失败。
    pub fn with_error(mut self, identifier: &str, error: ReadError) -> Self {
        self.replies
            .insert(identifier.to_string(), Scripted::Reply(Err(error)));
        self
    }

    /// 点位在延迟后才返回。
    pub fn with_delay(mut self, identifier: &str, delay_ms: u64, value: PointValueData) -> Self {
        self.replies.insert(
            identifier.to_string(),
            Scripted::Delayed(
                Duration::from_millis(delay_ms),
                Ok(ReadValue::new(value, "Good")),
            ),
        );
        self
    }

    /// 成功完成 `reads` 次读取后会话丢失。
    pub fn losing_session_after(mut self, reads: usize) -> Self {
        self.lose_after = Some(reads);
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.failing_disconnect = true;
        self
    }

    /// 已发起的读取次数。
    pub fn reads(&self) -> usize {
        self.stats.reads.lock().map(|reads| reads.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ServerSession for MockSession {
    async fn read(&mut self, identifier: &str) -> Result<ReadValue, ReadError> {
        if let Ok(mut reads) = self.stats.reads.lock() {
            reads.push(identifier.to_string());
        }
        if let Some(limit) = self.lose_after
            && self.read_count >= limit
        {
            return Err(ReadError::SessionLost(
                "BadConnectionClosed: mock connection closed".to_string(),
            ));
        }
        self.read_count += 1;

        match self.replies.get(identifier).cloned() {
            Some(Scripted::Reply(result)) => result,
            Some(Scripted::Delayed(delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Err(ReadError::Status {
                code: 0x8034_0000,
                name: "BadNodeIdUnknown".to_string(),
                message: format!("node {} does not exist", identifier),
            }),
        }
    }

    async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.failing_disconnect {
            return Err(ConnectionError::Protocol(
                "mock".to_string(),
                "disconnect refused".to_string(),
            ));
        }
        Ok(())
    }
}

/// 预设连接器：每次连接复制一份模板会话，统计共享。
pub struct MockConnector {
    template: MockSession,
    delay: Option<Duration>,
    failure: Option<String>,
    stats: Arc<MockStats>,
}

impl MockConnector {
    pub fn new(mut template: MockSession) -> Self {
        let stats = Arc::new(MockStats::default());
        template.stats = stats.clone();
        Self {
            template,
            delay: None,
            failure: None,
            stats,
        }
    }

    /// 连接在延迟后才完成。
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(delay_ms));
        self
    }

    /// 连接总是失败。
    pub fn refusing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn connects(&self) -> usize {
        self.stats.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.stats.disconnects.load(Ordering::SeqCst)
    }

    /// 按调用顺序记录的点名。
    pub fn reads(&self) -> Vec<String> {
        self.stats
            .reads
            .lock()
            .map(|reads| reads.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &RunConfig) -> Result<Box<dyn ServerSession>, ConnectionError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(ConnectionError::Protocol(
                config.server_url.clone(),
                reason.clone(),
            ));
        }
        Ok(Box::new(self.template.clone()))
    }
}
