use calamine::{Data, Reader, open_workbook_auto};
use domain::{BatchReport, Outcome, PointResult, PointValueData, ServerContext};
use pointcheck_engine::{PointSource, PointSourceError, ReportSink};
use pointcheck_workbook::{
    BAD_SHEET_NAME, GOOD_SHEET_NAME, JsonReportSink, NOT_FOUND_SHEET_NAME, XlsxPointSource,
    XlsxReportSink,
};
use rust_xlsxwriter::Workbook;
use std::path::Path;

fn write_point_list(path: &Path, rows: &[Option<&str>]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "点名").unwrap();
    for (index, row) in rows.iter().enumerate() {
        if let Some(name) = row {
            sheet.write_string(index as u32 + 1, 0, *name).unwrap();
        }
        sheet.write_string(index as u32 + 1, 1, "备注").unwrap();
    }
    workbook.save(path).unwrap();
}

fn context() -> ServerContext {
    ServerContext::new("Line 1", "opc.tcp://plc.local:4840", "run-1")
}

fn sample_report() -> BatchReport {
    let mut report = BatchReport::new();
    report.push(PointResult {
        identifier: "ns=2;s=P1".to_string(),
        exists: true,
        value: Some(PointValueData::F64(21.5)),
        quality: "Good".to_string(),
        outcome: Outcome::Good,
    });
    report.push(PointResult {
        identifier: "ns=2;s=P2".to_string(),
        exists: true,
        value: Some(PointValueData::I64(0)),
        quality: "UncertainLastUsableValue".to_string(),
        outcome: Outcome::Bad,
    });
    report.push(PointResult {
        identifier: "ns=2;s=P4".to_string(),
        exists: false,
        value: None,
        quality: "BadTimeout: read timed out after 3000ms".to_string(),
        outcome: Outcome::Bad,
    });
    report.push(PointResult {
        identifier: "ns=2;s=P3".to_string(),
        exists: false,
        value: None,
        quality: "BadNodeIdUnknown: node does not exist".to_string(),
        outcome: Outcome::NotFound,
    });
    report
}

fn sheet_rows(path: &Path, sheet: &str) -> Vec<Vec<String>> {
    let mut workbook = open_workbook_auto(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_point_list_keeps_order_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.xlsx");
    write_point_list(
        &path,
        &[
            Some("ns=2;s=P1"),
            None,
            Some("ns=2;s=P2"),
            Some("  "),
            Some("ns=2;s=P1"),
        ],
    );

    let points = XlsxPointSource::new(&path).load().unwrap();
    assert_eq!(points, vec!["ns=2;s=P1", "ns=2;s=P2", "ns=2;s=P1"]);
}

#[test]
fn test_numeric_point_names_are_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "点名").unwrap();
    sheet.write_number(1, 0, 1001).unwrap();
    sheet.write_string(2, 0, "i=2258").unwrap();
    workbook.save(&path).unwrap();

    let points = XlsxPointSource::new(&path).load().unwrap();
    assert_eq!(points, vec!["1001", "i=2258"]);
}

#[test]
fn test_header_only_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.xlsx");
    write_point_list(&path, &[]);

    let err = XlsxPointSource::new(&path).load().unwrap_err();
    assert!(matches!(err, PointSourceError::Empty));
}

#[test]
fn test_missing_and_corrupt_point_lists_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let missing = XlsxPointSource::new(dir.path().join("nope.xlsx"))
        .load()
        .unwrap_err();
    assert!(matches!(missing, PointSourceError::NotFound(_)));

    let corrupt_path = dir.path().join("corrupt.xlsx");
    std::fs::write(&corrupt_path, b"not a zip archive").unwrap();
    let corrupt = XlsxPointSource::new(&corrupt_path).load().unwrap_err();
    assert!(matches!(corrupt, PointSourceError::Read(_)));
}

#[test]
fn test_xlsx_report_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("result.xlsx");
    XlsxReportSink::new(&path)
        .write(&context(), &sample_report())
        .unwrap();

    let workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(
        workbook.sheet_names().to_vec(),
        vec![GOOD_SHEET_NAME, BAD_SHEET_NAME, NOT_FOUND_SHEET_NAME]
    );

    let good = sheet_rows(&path, GOOD_SHEET_NAME);
    assert_eq!(good[0], vec!["点名", "存在", "数据值", "品质"]);
    assert_eq!(good[1], vec!["ns=2;s=P1", "存在", "21.5", "Good"]);
    assert_eq!(good.len(), 2);

    let bad = sheet_rows(&path, BAD_SHEET_NAME);
    assert_eq!(bad.len(), 3);
    assert_eq!(bad[1], vec!["ns=2;s=P2", "存在", "0", "UncertainLastUsableValue"]);
    assert_eq!(bad[2][0], "ns=2;s=P4");
    // 读取失败的点同样标记为“存在”，失败原因只出现在品质列
    assert_eq!(bad[2][1], "存在");
    assert_eq!(bad[2][3], "BadTimeout: read timed out after 3000ms");
    assert_eq!(bad[2][2], "");

    let missing = sheet_rows(&path, NOT_FOUND_SHEET_NAME);
    assert_eq!(missing[0], vec!["点名", "存在", "原因"]);
    assert_eq!(
        missing[1],
        vec!["ns=2;s=P3", "不存在", "BadNodeIdUnknown: node does not exist"]
    );
}

#[test]
fn test_xlsx_report_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.xlsx");
    std::fs::write(&path, b"stale").unwrap();

    XlsxReportSink::new(&path)
        .write(&context(), &BatchReport::new())
        .unwrap();
    let good = sheet_rows(&path, GOOD_SHEET_NAME);
    assert_eq!(good.len(), 1);
}

#[test]
fn test_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    JsonReportSink::new(&path)
        .write(&context(), &sample_report())
        .unwrap();

    let body: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(body["server"]["server_name"], "Line 1");
    assert_eq!(body["server"]["run_id"], "run-1");
    assert_eq!(body["summary"]["total"], 4);
    assert_eq!(body["summary"]["bad"], 2);
    assert_eq!(body["good"][0]["identifier"], "ns=2;s=P1");
    assert_eq!(body["good"][0]["value"], 21.5);
    assert_eq!(body["bad"][1]["value"], serde_json::Value::Null);
    assert_eq!(body["not_found"][0]["outcome"], "not_found");
    assert!(body["generated_at"].is_string());
}
