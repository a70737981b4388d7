//! 连接管理：打开会话并保证在任何退出路径上释放。

use crate::error::ConnectionError;
use crate::session::{Connector, ServerSession};
use pointcheck_config::RunConfig;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// 服务端连接管理器
#[derive(Clone)]
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// 建立连接，整体受 `connect_timeout` 约束。
    pub async fn open(&self, config: &RunConfig) -> Result<ConnectionGuard, ConnectionError> {
        self.open_before(config, None).await
    }

    /// 建立连接，等待时间取 `connect_timeout` 与距 `deadline` 剩余时间中的较小者。
    pub async fn open_before(
        &self,
        config: &RunConfig,
        deadline: Option<Instant>,
    ) -> Result<ConnectionGuard, ConnectionError> {
        info!(
            server_url = %config.server_url,
            state = ?ConnectionState::Connecting,
            "connecting to server"
        );
        let mut limit = config.connect_timeout();
        if let Some(deadline) = deadline {
            limit = limit.min(deadline.saturating_duration_since(Instant::now()));
        }
        let session = match tokio::time::timeout(limit, self.connector.connect(config)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConnectionError::Timeout(
                    config.server_url.clone(),
                    limit.as_millis() as u64,
                ));
            }
        };
        info!(
            server_url = %config.server_url,
            state = ?ConnectionState::Connected,
            "connected to server"
        );
        Ok(ConnectionGuard {
            session: Some(session),
            server_url: config.server_url.clone(),
        })
    }
}

/// 已打开的连接。显式 `close` 为正常路径；仍处于连接状态时被丢弃会在运行时上补发断开。
pub struct ConnectionGuard {
    session: Option<Box<dyn ServerSession>>,
    server_url: String,
}

impl ConnectionGuard {
    pub fn state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// 当前会话；关闭后返回 None。
    pub fn session(&mut self) -> Option<&mut (dyn ServerSession + 'static)> {
        self.session.as_deref_mut()
    }

    /// 断开连接。可重复调用，失败只记录日志。
    pub async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match session.disconnect().await {
            Ok(()) => info!(
                server_url = %self.server_url,
                state = ?ConnectionState::Disconnected,
                "disconnected from server"
            ),
            Err(e) => warn!(
                server_url = %self.server_url,
                error = %e,
                "disconnect failed, connection dropped"
            ),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let server_url = std::mem::take(&mut self.server_url);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(server_url = %server_url, "connection dropped while open, disconnecting");
                handle.spawn(async move {
                    if let Err(e) = session.disconnect().await {
                        warn!(server_url = %server_url, error = %e, "deferred disconnect failed");
                    }
                });
            }
            Err(_) => warn!(server_url = %server_url, "no runtime to disconnect dropped connection"),
        }
    }
}
