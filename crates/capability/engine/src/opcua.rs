//! OPC UA 会话适配：把协议客户端接入 `Connector` / `ServerSession`。

use crate::error::{ConnectionError, ReadError};
use crate::session::{Connector, ReadValue, ServerSession};
use async_trait::async_trait;
use pointcheck_config::RunConfig;
use pointcheck_protocol::{
    ClientConfig, ProtocolError, StatusCode, UaClient, parse_node_id, status_label,
    to_point_value,
};
use tracing::debug;

/// 基于 opc.tcp 客户端的连接器
#[derive(Debug, Clone, Default)]
pub struct OpcUaConnector;

impl OpcUaConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for OpcUaConnector {
    async fn connect(&self, config: &RunConfig) -> Result<Box<dyn ServerSession>, ConnectionError> {
        let mut client_config = ClientConfig::new(config.server_url.clone());
        client_config.session_name = config.session_name.clone();
        client_config.connect_timeout = config.connect_timeout();
        client_config.request_timeout = config.read_timeout();

        let client = UaClient::connect(client_config)
            .await
            .map_err(|e| connection_error(e, config))?;
        Ok(Box::new(OpcUaSession {
            client,
            read_timeout_ms: config.read_timeout_ms,
        }))
    }
}

fn connection_error(error: ProtocolError, config: &RunConfig) -> ConnectionError {
    match error {
        ProtocolError::InvalidEndpoint(reason) => {
            ConnectionError::InvalidAddress(config.server_url.clone(), reason)
        }
        ProtocolError::Timeout(_) => {
            ConnectionError::Timeout(config.server_url.clone(), config.connect_timeout_ms)
        }
        other => ConnectionError::Protocol(config.server_url.clone(), other.to_string()),
    }
}

/// 已激活的 OPC UA 会话
pub struct OpcUaSession {
    client: UaClient,
    read_timeout_ms: u64,
}

#[async_trait]
impl ServerSession for OpcUaSession {
    async fn read(&mut self, identifier: &str) -> Result<ReadValue, ReadError> {
        let node = parse_node_id(identifier)
            .map_err(|_| ReadError::InvalidIdentifier(identifier.to_string()))?;

        let data = self
            .client
            .read_value(&node)
            .await
            .map_err(|e| read_error(e, self.read_timeout_ms))?;

        let status = data.status.unwrap_or(StatusCode::Good);
        if status.is_bad() {
            return Err(status_error(
                status,
                format!("reading {} returned {}", identifier, status),
            ));
        }
        debug!(node = %node, status = %status, "value read");
        Ok(ReadValue::new(to_point_value(data.value), status_label(status)))
    }

    async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        self.client.close().await.map_err(|e| {
            ConnectionError::Protocol(self.client.endpoint_url().to_string(), e.to_string())
        })
    }
}

fn status_error(status: StatusCode, message: String) -> ReadError {
    ReadError::Status {
        code: status.bits(),
        name: status_label(status),
        message,
    }
}

fn read_error(error: ProtocolError, read_timeout_ms: u64) -> ReadError {
    if error.is_connection_lost() {
        return ReadError::SessionLost(error.to_string());
    }
    if let ProtocolError::Timeout(_) = error {
        return ReadError::Timeout(read_timeout_ms);
    }
    match error.status() {
        Some(status) => status_error(status, error.to_string()),
        None => ReadError::Other(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{NotFoundClassifier, StatusCodeClassifier};

    #[test]
    fn test_read_error_mapping() {
        let lost = read_error(ProtocolError::ChannelClosed, 100);
        assert!(lost.is_session_lost());

        let closed = read_error(ProtocolError::Service(StatusCode::BadConnectionClosed), 100);
        assert!(closed.is_session_lost());

        let timeout = read_error(ProtocolError::Timeout("late".to_string()), 100);
        assert_eq!(timeout, ReadError::Timeout(100));

        let other = read_error(ProtocolError::InvalidEndpoint("x".to_string()), 100);
        assert!(matches!(other, ReadError::Other(_)));
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        let error = read_error(ProtocolError::Service(StatusCode::BadNodeIdUnknown), 100);
        assert_eq!(error.status_code(), Some(0x8034_0000));
        assert!(error.to_string().starts_with("BadNodeIdUnknown"));
        assert!(StatusCodeClassifier::default().is_not_found(&error));
    }

    #[test]
    fn test_connect_errors() {
        let config = RunConfig::new("opc.tcp://plc.local:4840");
        assert!(matches!(
            connection_error(ProtocolError::Timeout("slow".to_string()), &config),
            ConnectionError::Timeout(_, 5000)
        ));
        assert!(matches!(
            connection_error(ProtocolError::InvalidEndpoint("bad".to_string()), &config),
            ConnectionError::InvalidAddress(_, _)
        ));
        assert!(matches!(
            connection_error(ProtocolError::Connection("refused".to_string()), &config),
            ConnectionError::Protocol(_, _)
        ));
    }
}
