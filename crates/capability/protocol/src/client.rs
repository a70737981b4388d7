//! OPC UA 客户端实现
//!
//! 通过 `async-opcua` 建立安全通道（SecurityPolicy None）与匿名会话，读取节点 Value 属性。
//! 会话事件循环在后台任务中运行，负责收发消息与安全令牌续期。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = ClientConfig::new("opc.tcp://192.168.1.100:4840");
//! let mut client = UaClient::connect(config).await?;
//! let value = client.read_value(&parse_node_id("ns=2;s=Tank.Level")?).await?;
//! client.close().await?;
//! ```

use crate::error::ProtocolError;
use opcua::client::{ClientBuilder, IdentityToken, Session};
use opcua::crypto::SecurityPolicy;
use opcua::types::{
    DataValue, MessageSecurityMode, NodeId, ReadValueId, StatusCode, TimestampsToReturn,
    UserTokenPolicy,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::{Host, Url};

/// opc.tcp 默认端口
pub const DEFAULT_PORT: u16 = 4840;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 服务端地址，如 `opc.tcp://host:4840`
    pub endpoint_url: String,
    /// 会话名称
    pub session_name: String,
    pub application_uri: String,
    pub product_uri: String,
    pub application_name: String,
    /// 获取端点、建立通道与激活会话的总超时
    pub connect_timeout: Duration,
    /// 单次读取的超时
    pub request_timeout: Duration,
    /// 请求的会话超时
    pub session_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            session_name: "pointcheck".to_string(),
            application_uri: "urn:pointcheck:client".to_string(),
            product_uri: "urn:pointcheck".to_string(),
            application_name: "pointcheck".to_string(),
            connect_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_millis(3000),
            session_timeout: Duration::from_secs(60),
        }
    }
}

/// 解析 `opc.tcp://host[:port][/path]`，返回主机与端口。
pub fn parse_endpoint(endpoint_url: &str) -> Result<(String, u16), ProtocolError> {
    let invalid = |reason: String| {
        ProtocolError::InvalidEndpoint(format!("{}: {}", endpoint_url.trim(), reason))
    };
    let url = Url::parse(endpoint_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "opc.tcp" {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(invalid("missing host".to_string())),
    };
    Ok((host, url.port().unwrap_or(DEFAULT_PORT)))
}

/// 解析 `ns=<n>;i|s|g|b=<id>` 形式的 NodeId。
pub fn parse_node_id(identifier: &str) -> Result<NodeId, ProtocolError> {
    NodeId::from_str(identifier.trim())
        .map_err(|_| ProtocolError::InvalidNodeId(identifier.to_string()))
}

/// 已激活会话的 OPC UA 客户端
pub struct UaClient {
    endpoint_url: String,
    session: Arc<Session>,
    event_loop: JoinHandle<StatusCode>,
    request_timeout: Duration,
    closed: bool,
}

impl UaClient {
    /// 连接服务端并激活匿名会话，整个过程受 `connect_timeout` 约束。
    pub async fn connect(config: ClientConfig) -> Result<Self, ProtocolError> {
        parse_endpoint(&config.endpoint_url)?;
        let limit = config.connect_timeout;
        let endpoint_url = config.endpoint_url.clone();
        match tokio::time::timeout(limit, Self::establish(config)).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Timeout(format!(
                "connecting to {} took longer than {}ms",
                endpoint_url,
                limit.as_millis()
            ))),
        }
    }

    async fn establish(config: ClientConfig) -> Result<Self, ProtocolError> {
        info!(endpoint = %config.endpoint_url, "connecting to opc ua server");

        let mut client = ClientBuilder::new()
            .application_name(config.application_name.as_str())
            .application_uri(config.application_uri.as_str())
            .product_uri(config.product_uri.as_str())
            .session_name(config.session_name.as_str())
            .session_timeout(duration_ms_u32(config.session_timeout))
            .trust_server_certs(true)
            .create_sample_keypair(false)
            // 断线后不自动重连，由调用方把剩余点位记为连接丢失
            .session_retry_limit(0)
            .client()
            .map_err(|errors| ProtocolError::Connection(errors.join("; ")))?;

        let endpoint = (
            config.endpoint_url.as_str(),
            SecurityPolicy::None.to_str(),
            MessageSecurityMode::None,
            UserTokenPolicy::anonymous(),
        );
        let (session, event_loop) = client
            .connect_to_matching_endpoint(endpoint, IdentityToken::Anonymous)
            .await
            .map_err(|status| {
                ProtocolError::Connection(format!(
                    "failed to open session on {}: {}",
                    config.endpoint_url, status
                ))
            })?;

        let event_loop = event_loop.spawn();
        if !session.wait_for_connection().await {
            event_loop.abort();
            return Err(ProtocolError::Connection(format!(
                "session on {} was not activated",
                config.endpoint_url
            )));
        }
        info!(endpoint = %config.endpoint_url, "opc ua session activated");

        Ok(Self {
            endpoint_url: config.endpoint_url,
            session,
            event_loop,
            request_timeout: config.request_timeout,
            closed: false,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// 会话事件循环仍在运行且未关闭。
    pub fn is_usable(&self) -> bool {
        !self.closed && !self.event_loop.is_finished()
    }

    /// 读取单个节点的 Value 属性。节点级坏状态码保留在返回的 DataValue 中。
    pub async fn read_value(&self, node: &NodeId) -> Result<DataValue, ProtocolError> {
        let mut values = self.read_values(std::slice::from_ref(node)).await?;
        values.pop().ok_or(ProtocolError::Service(StatusCode::BadUnexpectedError))
    }

    /// 一次请求读取多个节点，结果顺序与请求一致。
    pub async fn read_values(&self, nodes: &[NodeId]) -> Result<Vec<DataValue>, ProtocolError> {
        if !self.is_usable() {
            return Err(ProtocolError::ChannelClosed);
        }
        let request: Vec<ReadValueId> = nodes.iter().cloned().map(ReadValueId::from).collect();
        let read = self.session.read(&request, TimestampsToReturn::Neither, 0.0);
        let values = match tokio::time::timeout(self.request_timeout, read).await {
            Ok(result) => result.map_err(ProtocolError::Service)?,
            Err(_) => {
                return Err(ProtocolError::Timeout(format!(
                    "read took longer than {}ms",
                    self.request_timeout.as_millis()
                )));
            }
        };
        if values.len() != nodes.len() {
            return Err(ProtocolError::Service(StatusCode::BadUnexpectedError));
        }
        debug!(count = values.len(), "read completed");
        Ok(values)
    }

    /// 关闭会话与安全通道。可重复调用。
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = if self.event_loop.is_finished() {
            Ok(())
        } else {
            self.session.disconnect().await.map_err(ProtocolError::Service)
        };
        self.event_loop.abort();
        match &result {
            Ok(()) => info!(endpoint = %self.endpoint_url, "opc ua session closed"),
            Err(e) => warn!(endpoint = %self.endpoint_url, error = %e, "closing session failed"),
        }
        result
    }
}

impl Drop for UaClient {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

fn duration_ms_u32(value: Duration) -> u32 {
    u32::try_from(value.as_millis()).unwrap_or(u32::MAX)
}
