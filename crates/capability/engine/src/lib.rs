//! 点位检查引擎
//!
//! - `session`：服务端会话与连接器抽象
//! - `connection`：连接建立（受超时约束）与保证释放
//! - `reader`：单点读取与“不存在”判定
//! - `classify`：读取结果 → Good / Bad / NotFound
//! - `batch`：按顺序检查整张点表
//! - `orchestrator`：单次运行的阶段编排
//! - `opcua`：基于 opc.tcp 客户端的会话实现
//! - `mock`：预设会话（测试用，需 `test-support` 特性）

pub mod batch;
pub mod classify;
pub mod connection;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod opcua;
pub mod orchestrator;
pub mod reader;
pub mod session;

pub use batch::{BatchOutcome, BatchStop, check_batch};
pub use classify::classify;
pub use connection::{ConnectionGuard, ConnectionManager, ConnectionState};
pub use error::{ConnectionError, PointSourceError, ReadError, ReportWriteError, RunFailure, Stage};
pub use opcua::{OpcUaConnector, OpcUaSession};
pub use orchestrator::{
    Orchestrator, PointSource, ReportSink, RunState, RunSummary, StaticPointSource,
};
pub use reader::{
    NOT_FOUND_STATUS, NotFoundClassifier, PointReader, ReadAttempt, StatusCodeClassifier,
    TextMatchClassifier, classifier_from_config,
};
pub use session::{Connector, ReadValue, ServerSession};
