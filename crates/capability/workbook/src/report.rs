//! 检查结果输出。
//!
//! xlsx 工作簿固定包含 3 个 sheet，列名与顺序逐字匹配：
//! - Good品质（4列）
//! - Bad品质（4列）
//! - 不存在的点（3列）
//!
//! “存在”列在 Good/Bad 表中恒为 `存在`，在“不存在的点”表中恒为 `不存在`。

use domain::{BatchReport, PointResult, ServerContext};
use pointcheck_engine::{ReportSink, ReportWriteError};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const GOOD_SHEET_NAME: &str = "Good品质";
pub const BAD_SHEET_NAME: &str = "Bad品质";
pub const NOT_FOUND_SHEET_NAME: &str = "不存在的点";

pub const HEADERS_QUALITY: [&str; 4] = ["点名", "存在", "数据值", "品质"];
pub const HEADERS_NOT_FOUND: [&str; 3] = ["点名", "存在", "原因"];

pub const EXISTS_MARKER: &str = "存在";
pub const MISSING_MARKER: &str = "不存在";

const NAME_COLUMN_WIDTH: f64 = 25.0;

/// xlsx 报告（覆盖已有文件）
#[derive(Debug, Clone)]
pub struct XlsxReportSink {
    path: PathBuf,
}

impl XlsxReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for XlsxReportSink {
    fn write(&self, context: &ServerContext, report: &BatchReport) -> Result<(), ReportWriteError> {
        ensure_parent(&self.path)?;
        write_workbook(&self.path, report).map_err(|e| ReportWriteError::Xlsx(e.to_string()))?;
        info!(
            path = %self.path.display(),
            server_name = %context.server_name,
            rows = report.len(),
            "xlsx report written"
        );
        Ok(())
    }
}

fn write_workbook(path: &Path, report: &BatchReport) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let good_sheet = workbook.add_worksheet();
    good_sheet.set_name(GOOD_SHEET_NAME)?;
    write_quality_sheet(good_sheet, &report.good, &header_format)?;

    let bad_sheet = workbook.add_worksheet();
    bad_sheet.set_name(BAD_SHEET_NAME)?;
    write_quality_sheet(bad_sheet, &report.bad, &header_format)?;

    let missing_sheet = workbook.add_worksheet();
    missing_sheet.set_name(NOT_FOUND_SHEET_NAME)?;
    write_headers(missing_sheet, &HEADERS_NOT_FOUND, &header_format)?;
    for (index, result) in report.not_found.iter().enumerate() {
        let row = (index + 1) as u32;
        missing_sheet.write_string(row, 0, &result.identifier)?;
        missing_sheet.write_string(row, 1, MISSING_MARKER)?;
        missing_sheet.write_string(row, 2, &result.quality)?;
    }
    missing_sheet.set_column_width(0, NAME_COLUMN_WIDTH)?;

    workbook.save(path)?;
    Ok(())
}

fn write_quality_sheet(
    sheet: &mut Worksheet,
    results: &[PointResult],
    header_format: &Format,
) -> Result<(), XlsxError> {
    write_headers(sheet, &HEADERS_QUALITY, header_format)?;
    for (index, result) in results.iter().enumerate() {
        let row = (index + 1) as u32;
        let value = result
            .value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        sheet.write_string(row, 0, &result.identifier)?;
        // Good/Bad 表固定写“存在”；读取失败的原因见品质列
        sheet.write_string(row, 1, EXISTS_MARKER)?;
        sheet.write_string(row, 2, &value)?;
        sheet.write_string(row, 3, &result.quality)?;
    }
    sheet.set_column_width(0, NAME_COLUMN_WIDTH)?;
    Ok(())
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}

/// JSON 报告（覆盖已有文件）
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    server: &'a ServerContext,
    summary: JsonSummary,
    #[serde(flatten)]
    report: &'a BatchReport,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    good: usize,
    bad: usize,
    not_found: usize,
}

impl ReportSink for JsonReportSink {
    fn write(&self, context: &ServerContext, report: &BatchReport) -> Result<(), ReportWriteError> {
        let document = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            server: context,
            summary: JsonSummary {
                total: report.len(),
                good: report.good.len(),
                bad: report.bad.len(),
                not_found: report.not_found.len(),
            },
            report,
        };
        let body = serde_json::to_vec_pretty(&document)
            .map_err(|e| ReportWriteError::Json(e.to_string()))?;
        ensure_parent(&self.path)?;
        fs::write(&self.path, body)?;
        info!(path = %self.path.display(), rows = report.len(), "json report written");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<(), ReportWriteError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
