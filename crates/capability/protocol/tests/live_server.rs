use std::env;
use std::time::Duration;

use pointcheck_protocol::{ClientConfig, StatusCode, UaClient, parse_node_id, status_label};

fn it_enabled() -> bool {
    env::var("POINTCHECK_IT_ENABLE").ok().as_deref() == Some("1")
}

#[tokio::test]
async fn live_server_read_when_enabled() {
    if !it_enabled() {
        println!("SKIP live_server_read_when_enabled: POINTCHECK_IT_ENABLE!=1");
        return;
    }

    let url = match env::var("POINTCHECK_IT_URL") {
        Ok(v) => v,
        Err(_) => {
            println!("SKIP live_server_read_when_enabled: POINTCHECK_IT_URL not set");
            return;
        }
    };
    // 默认读取 Server_ServerStatus_CurrentTime
    let node = parse_node_id(
        &env::var("POINTCHECK_IT_NODE").unwrap_or_else(|_| "i=2258".to_string()),
    )
    .expect("POINTCHECK_IT_NODE must be a node id");

    let mut config = ClientConfig::new(url);
    config.connect_timeout = Duration::from_secs(10);
    let mut client = UaClient::connect(config).await.expect("connect");

    let value = client.read_value(&node).await.expect("read");
    let status = value.status.unwrap_or(StatusCode::Good);
    println!("{} => {:?} ({})", node, value.value, status_label(status));
    assert!(!status.is_bad());

    let missing = client
        .read_value(&parse_node_id("ns=0;s=pointcheck.definitely.missing").unwrap())
        .await
        .expect("read missing");
    assert_eq!(
        missing.status.map(status_label).as_deref(),
        Some("BadNodeIdUnknown")
    );

    client.close().await.expect("close");
    client.close().await.expect("close twice");
    assert!(!client.is_usable());
}
