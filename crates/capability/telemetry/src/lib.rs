//! 日志初始化、运行 ID 与检查计数。

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// 检查计数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub points_checked: u64,
    pub good: u64,
    pub bad: u64,
    pub not_found: u64,
    pub read_failures: u64,
    pub read_timeouts: u64,
    pub sessions_lost: u64,
    pub read_latency_ms_total: u64,
    pub read_latency_ms_count: u64,
}

impl MetricsSnapshot {
    /// 平均单点读取耗时（毫秒）。
    pub fn average_read_latency_ms(&self) -> Option<u64> {
        if self.read_latency_ms_count == 0 {
            return None;
        }
        Some(self.read_latency_ms_total / self.read_latency_ms_count)
    }
}

/// 检查计数（进程级）。
pub struct CheckMetrics {
    points_checked: AtomicU64,
    good: AtomicU64,
    bad: AtomicU64,
    not_found: AtomicU64,
    read_failures: AtomicU64,
    read_timeouts: AtomicU64,
    sessions_lost: AtomicU64,
    read_latency_ms_total: AtomicU64,
    read_latency_ms_count: AtomicU64,
}

impl CheckMetrics {
    pub fn new() -> Self {
        Self {
            points_checked: AtomicU64::new(0),
            good: AtomicU64::new(0),
            bad: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            sessions_lost: AtomicU64::new(0),
            read_latency_ms_total: AtomicU64::new(0),
            read_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            points_checked: self.points_checked.load(Ordering::Relaxed),
            good: self.good.load(Ordering::Relaxed),
            bad: self.bad.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
            sessions_lost: self.sessions_lost.load(Ordering::Relaxed),
            read_latency_ms_total: self.read_latency_ms_total.load(Ordering::Relaxed),
            read_latency_ms_count: self.read_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for CheckMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<CheckMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static CheckMetrics {
    METRICS.get_or_init(CheckMetrics::new)
}

/// 初始化 tracing（默认 info），可选追加写入日志文件。
///
/// 重复调用时保留第一次安装的订阅器。
pub fn init_tracing(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// 生成新的 run_id。
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录一次单点检查完成。
pub fn record_point_checked() {
    metrics().points_checked.fetch_add(1, Ordering::Relaxed);
}

/// 记录 Good 分类。
pub fn record_good() {
    metrics().good.fetch_add(1, Ordering::Relaxed);
}

/// 记录 Bad 分类。
pub fn record_bad() {
    metrics().bad.fetch_add(1, Ordering::Relaxed);
}

/// 记录 NotFound 分类。
pub fn record_not_found() {
    metrics().not_found.fetch_add(1, Ordering::Relaxed);
}

/// 记录读取失败次数（含不存在）。
pub fn record_read_failure() {
    metrics().read_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录读取超时次数。
pub fn record_read_timeout() {
    metrics().read_timeouts.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次中途会话丢失。
pub fn record_session_lost() {
    metrics().sessions_lost.fetch_add(1, Ordering::Relaxed);
}

/// 记录单点读取耗时（毫秒）。
pub fn record_read_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .read_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .read_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
