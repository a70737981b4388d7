//! 点表与报告文件
//!
//! - `points`：从 xlsx 点表读取点名（`XlsxPointSource`）
//! - `report`：把批次报告写成 xlsx 或 JSON（`XlsxReportSink` / `JsonReportSink`）

pub mod points;
pub mod report;

pub use points::{XlsxPointSource, load_points};
pub use report::{
    BAD_SHEET_NAME, EXISTS_MARKER, GOOD_SHEET_NAME, HEADERS_NOT_FOUND, HEADERS_QUALITY,
    JsonReportSink, MISSING_MARKER, NOT_FOUND_SHEET_NAME, XlsxReportSink,
};
