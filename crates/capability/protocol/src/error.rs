//! 协议错误类型定义

use opcua::types::StatusCode;

/// 表示会话或安全通道已不可用的状态码
const CONNECTION_LOST: [StatusCode; 11] = [
    StatusCode::BadConnectionClosed,
    StatusCode::BadNotConnected,
    StatusCode::BadSecureChannelClosed,
    StatusCode::BadSecureChannelIdInvalid,
    StatusCode::BadSessionClosed,
    StatusCode::BadSessionIdInvalid,
    StatusCode::BadSessionNotActivated,
    StatusCode::BadServerNotConnected,
    StatusCode::BadCommunicationError,
    StatusCode::BadServerHalted,
    StatusCode::BadShutdown,
];

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误（建立连接、获取端点、激活会话）
    #[error("connection error: {0}")]
    Connection(String),

    /// 端点地址无效
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(String),

    /// NodeId 字符串无效
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    /// 服务调用返回的坏状态码
    #[error("service error: {0}")]
    Service(StatusCode),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 会话已关闭或事件循环已退出
    #[error("channel closed")]
    ChannelClosed,
}

impl ProtocolError {
    /// 协议层给出的状态码（如有）。
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProtocolError::Service(status) => Some(*status),
            ProtocolError::InvalidNodeId(_) => Some(StatusCode::BadNodeIdInvalid),
            ProtocolError::Timeout(_) => Some(StatusCode::BadTimeout),
            _ => None,
        }
    }

    /// 错误是否意味着安全通道/会话已不可用。
    pub fn is_connection_lost(&self) -> bool {
        match self {
            ProtocolError::Connection(_) | ProtocolError::ChannelClosed => true,
            ProtocolError::Service(status) => is_connection_status(*status),
            _ => false,
        }
    }
}

fn is_connection_status(status: StatusCode) -> bool {
    let code = status.bits() & 0xFFFF_0000;
    CONNECTION_LOST.iter().any(|lost| lost.bits() == code)
}
