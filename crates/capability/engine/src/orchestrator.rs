//! 运行编排：配置 → 点表 → 连接 → 批量检查 → 断开 → 报告。
//!
//! 前三个阶段失败即终止运行；报告写出失败只记录，不影响已完成的检查结果。

use crate::batch::{BatchOutcome, BatchStop, check_batch};
use crate::classify::classify;
use crate::connection::ConnectionManager;
use crate::error::{PointSourceError, ReportWriteError, RunFailure, Stage};
use crate::reader::PointReader;
use crate::session::Connector;
use domain::{BatchReport, ReadOutcome, ServerContext};
use pointcheck_config::ConfigSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span};

/// 点位清单来源
pub trait PointSource: Send + Sync {
    /// 按原始顺序返回点名，允许重复。
    fn load(&self) -> Result<Vec<String>, PointSourceError>;
}

/// 检查结果输出
pub trait ReportSink: Send + Sync {
    fn write(&self, context: &ServerContext, report: &BatchReport)
    -> Result<(), ReportWriteError>;
}

/// 固定点位清单
#[derive(Debug, Clone, Default)]
pub struct StaticPointSource(pub Vec<String>);

impl PointSource for StaticPointSource {
    fn load(&self) -> Result<Vec<String>, PointSourceError> {
        Ok(self.0.clone())
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ConfigLoaded,
    PointsLoaded,
    Connected,
    BatchChecked,
    Reported,
    Done,
    Failed(Stage),
}

/// 一次完成的运行
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub context: ServerContext,
    pub report: BatchReport,
    pub stop: BatchStop,
    /// 报告写出失败原因（检查结果仍然有效）
    pub report_error: Option<String>,
    /// 依次经过的状态
    pub states: Vec<RunState>,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.report_error.is_some() {
            Stage::Report.exit_code()
        } else {
            0
        }
    }
}

/// 单次运行编排器
pub struct Orchestrator {
    config_source: Arc<dyn ConfigSource>,
    point_source: Arc<dyn PointSource>,
    connector: Arc<dyn Connector>,
    report_sink: Arc<dyn ReportSink>,
    run_id: String,
}

impl Orchestrator {
    pub fn new(
        config_source: Arc<dyn ConfigSource>,
        point_source: Arc<dyn PointSource>,
        connector: Arc<dyn Connector>,
        report_sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            config_source,
            point_source,
            connector,
            report_sink,
            run_id: pointcheck_telemetry::new_run_id(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 执行一次完整运行；该运行的全部日志都带 run_id。
    pub async fn run(&self) -> Result<RunSummary, RunFailure> {
        let span = info_span!("run", run_id = %self.run_id);
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<RunSummary, RunFailure> {
        let started = Instant::now();
        let mut states = vec![RunState::Init];

        let config = self
            .config_source
            .load()
            .map_err(|e| fail(&states, Stage::Config, e.to_string()))?;
        enter(&mut states, RunState::ConfigLoaded);
        info!(
            server_name = %config.server_name,
            server_url = %config.server_url,
            "config loaded"
        );
        let context = ServerContext::new(
            config.server_name.clone(),
            config.server_url.clone(),
            self.run_id.clone(),
        );
        // 运行时限从本次运行开始计时，连接阶段也计入
        let deadline = config.run_deadline().map(|limit| started + limit);

        let points = match self.point_source.load() {
            Ok(points) if points.is_empty() => {
                return Err(fail(
                    &states,
                    Stage::Points,
                    PointSourceError::Empty.to_string(),
                ));
            }
            Ok(points) => points,
            Err(e) => return Err(fail(&states, Stage::Points, e.to_string())),
        };
        enter(&mut states, RunState::PointsLoaded);
        info!(count = points.len(), "points loaded");

        let manager = ConnectionManager::new(self.connector.clone());
        let mut guard = manager
            .open_before(&config, deadline)
            .await
            .map_err(|e| fail(&states, Stage::Connect, e.to_string()))?;
        enter(&mut states, RunState::Connected);

        let reader = PointReader::from_config(&config);
        let outcome = match guard.session() {
            Some(session) => check_batch(session, &reader, &points, deadline).await,
            None => unavailable(&points),
        };
        enter(&mut states, RunState::BatchChecked);
        guard.close().await;

        let report_error = match self.report_sink.write(&context, &outcome.report) {
            Ok(()) => {
                enter(&mut states, RunState::Reported);
                None
            }
            Err(e) => {
                error!(stage = %Stage::Report, error = %e, "failed to write report");
                Some(e.to_string())
            }
        };
        enter(&mut states, RunState::Done);

        Ok(RunSummary {
            context,
            report: outcome.report,
            stop: outcome.stop,
            report_error,
            states,
        })
    }
}

fn enter(states: &mut Vec<RunState>, state: RunState) {
    info!(state = ?state, "run state changed");
    states.push(state);
}

fn fail(states: &[RunState], stage: Stage, message: String) -> RunFailure {
    error!(state = ?RunState::Failed(stage), stage = %stage, error = %message, "run failed");
    RunFailure::after(states, stage, message)
}

fn unavailable(points: &[String]) -> BatchOutcome {
    let reason = "session unavailable".to_string();
    let mut report = BatchReport::new();
    for identifier in points {
        report.push(classify(
            identifier,
            ReadOutcome::OtherFailure {
                reason: format!("connection lost: {}", reason),
            },
        ));
    }
    BatchOutcome {
        report,
        stop: BatchStop::SessionLost { reason },
    }
}
