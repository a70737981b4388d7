//! 命令行入口：读取配置与点表，逐点检查 OPC UA 服务器上的点位并输出结果报告。

use clap::{Parser, ValueEnum};
use pointcheck_config::{DEFAULT_SECTION, IniConfigSource};
use pointcheck_engine::{BatchStop, OpcUaConnector, Orchestrator, ReportSink};
use pointcheck_telemetry::init_tracing;
use pointcheck_workbook::{JsonReportSink, XlsxPointSource, XlsxReportSink};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Xlsx,
    Json,
}

impl ReportFormat {
    fn default_file_name(self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "result.xlsx",
            ReportFormat::Json => "result.json",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pointcheck")]
#[command(about = "Check that OPC UA points exist and report their quality")]
struct Cli {
    /// 配置文件（相对路径按程序所在目录解析）
    #[arg(long, default_value = "config.ini")]
    config: PathBuf,
    /// 配置段名称
    #[arg(long, default_value = DEFAULT_SECTION)]
    section: String,
    /// 点表文件
    #[arg(long, default_value = "points.xlsx")]
    points: PathBuf,
    /// 报告文件（默认 result.xlsx / result.json）
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ReportFormat::Xlsx)]
    format: ReportFormat,
    /// 日志文件
    #[arg(long, default_value = "opcua_checker.log")]
    log_file: PathBuf,
    /// 退出前等待回车
    #[arg(long, default_value_t = false)]
    pause: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 加载本地 .env（如存在），其中的 POINTCHECK_* 变量覆盖配置文件
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let base_dir = program_dir();

    let log_file = resolve(&base_dir, &cli.log_file);
    if let Err(err) = init_tracing(Some(&log_file)) {
        let _ = init_tracing(None);
        warn!(path = %log_file.display(), error = %err, "log file unavailable, logging to console only");
    }

    let code = run(&cli, &base_dir).await;
    if cli.pause {
        wait_for_enter();
    }
    ExitCode::from(code)
}

async fn run(cli: &Cli, base_dir: &Path) -> u8 {
    let config_path = resolve(base_dir, &cli.config);
    let points_path = resolve(base_dir, &cli.points);
    let output_path = resolve(
        base_dir,
        cli.output
            .as_deref()
            .unwrap_or_else(|| Path::new(cli.format.default_file_name())),
    );
    let sink: Arc<dyn ReportSink> = match cli.format {
        ReportFormat::Xlsx => Arc::new(XlsxReportSink::new(&output_path)),
        ReportFormat::Json => Arc::new(JsonReportSink::new(&output_path)),
    };

    let orchestrator = Orchestrator::new(
        Arc::new(IniConfigSource::new(&config_path, cli.section.as_str())),
        Arc::new(XlsxPointSource::new(&points_path)),
        Arc::new(OpcUaConnector::new()),
        sink,
    );
    info!(
        run_id = %orchestrator.run_id(),
        config = %config_path.display(),
        points = %points_path.display(),
        output = %output_path.display(),
        "pointcheck started"
    );

    let code = match orchestrator.run().await {
        Ok(summary) => {
            info!(
                server_name = %summary.context.server_name,
                server_url = %summary.context.server_url,
                total = summary.report.len(),
                good = summary.report.good.len(),
                bad = summary.report.bad.len(),
                not_found = summary.report.not_found.len(),
                "check finished"
            );
            match &summary.stop {
                BatchStop::Completed => {}
                BatchStop::SessionLost { reason } => {
                    warn!(reason = %reason, "session lost, remaining points recorded as failures")
                }
                BatchStop::DeadlineExceeded => {
                    warn!("run deadline exceeded, remaining points recorded as failures")
                }
            }
            match &summary.report_error {
                None => info!(path = %output_path.display(), "report saved"),
                Some(reason) => error!(path = %output_path.display(), reason = %reason, "report not saved"),
            }
            summary.exit_code()
        }
        Err(failure) => {
            error!(
                stage = %failure.stage,
                error = %failure.message,
                states = ?failure.states,
                "pointcheck aborted"
            );
            failure.stage.exit_code()
        }
    };

    let metrics = pointcheck_telemetry::metrics().snapshot();
    info!(
        points_checked = metrics.points_checked,
        read_failures = metrics.read_failures,
        read_timeouts = metrics.read_timeouts,
        sessions_lost = metrics.sessions_lost,
        avg_read_latency_ms = metrics.average_read_latency_ms().unwrap_or(0),
        "metrics"
    );
    u8::try_from(code).unwrap_or(1)
}

/// 程序所在目录；取不到时退回当前目录。
fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn wait_for_enter() {
    println!("按回车键退出...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
