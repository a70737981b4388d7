use domain::{BatchReport, Outcome, PointResult, PointValueData, ServerContext};

fn result(identifier: &str, outcome: Outcome) -> PointResult {
    PointResult {
        identifier: identifier.to_string(),
        exists: outcome != Outcome::NotFound,
        value: None,
        quality: "Good".to_string(),
        outcome,
    }
}

#[test]
fn report_partitions_by_outcome_and_keeps_order() {
    let report: BatchReport = vec![
        result("P1", Outcome::Bad),
        result("P2", Outcome::Good),
        result("P3", Outcome::NotFound),
        result("P4", Outcome::Bad),
        result("P1", Outcome::Bad),
    ]
    .into_iter()
    .collect();

    assert_eq!(report.len(), 5);
    let bad: Vec<&str> = report
        .bucket(Outcome::Bad)
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(bad, vec!["P1", "P4", "P1"]);
    assert_eq!(report.good.len(), 1);
    assert_eq!(report.not_found[0].identifier, "P3");
}

#[test]
fn empty_report() {
    let report = BatchReport::new();
    assert!(report.is_empty());
    assert_eq!(report.len(), 0);
}

#[test]
fn report_serializes_buckets() {
    let mut report = BatchReport::new();
    report.push(PointResult {
        identifier: "ns=2;s=Level".to_string(),
        exists: true,
        value: Some(PointValueData::F64(1.5)),
        quality: "Good".to_string(),
        outcome: Outcome::Good,
    });
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["good"][0]["identifier"], "ns=2;s=Level");
    assert_eq!(json["good"][0]["value"], 1.5);
    assert_eq!(json["good"][0]["outcome"], "good");
    assert!(json["not_found"].as_array().expect("array").is_empty());
}

#[test]
fn server_context_builds() {
    let ctx = ServerContext::new("Plant", "opc.tcp://127.0.0.1:4840", "run-1");
    assert_eq!(ctx.server_name, "Plant");
    assert_eq!(ctx.server_url, "opc.tcp://127.0.0.1:4840");
    assert_eq!(ctx.run_id, "run-1");
}
