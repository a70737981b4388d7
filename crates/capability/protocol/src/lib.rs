//! # 协议通信能力模块
//!
//! 基于 `async-opcua` 客户端提供 OPC UA（opc.tcp）点位读取能力，范围限定为点位检查所需：
//! - **安全通道**：SecurityPolicy None，不签名不加密
//! - **会话**：匿名身份激活，断线不自动重连
//! - **服务**：Read（Value 属性）、CloseSession
//!
//! ## NodeId 字符串格式
//!
//! ```text
//! ns=2;s=Tank.Level      字符串标识
//! ns=1;i=1001            数值标识
//! i=2258                 省略 ns 时为 0
//! ns=3;g=<uuid>          GUID 标识
//! ns=1;b=<base64>        字节串标识
//! ```

mod client;
mod error;
mod value;

pub use client::{ClientConfig, DEFAULT_PORT, UaClient, parse_endpoint, parse_node_id};
pub use error::ProtocolError;
pub use opcua::types::{DataValue, NodeId, StatusCode, Variant};
pub use value::{status_label, to_point_value};
