use pointcheck_config::{
    ConfigError, ConfigSource, DEFAULT_SECTION, IniConfigSource, NotFoundMatch, RunConfig,
};
use std::io::Write;
use std::time::Duration;

#[test]
fn load_required_and_defaults() {
    let content = "[OPCUA]\nserver_url = opc.tcp://192.168.1.10:4840\n";
    let config = RunConfig::from_ini_str(content, DEFAULT_SECTION).expect("config");
    assert_eq!(config.server_url, "opc.tcp://192.168.1.10:4840");
    assert_eq!(config.server_name, "Unknown Server");
    assert_eq!(config.read_timeout(), Duration::from_millis(3000));
    assert_eq!(config.connect_timeout(), Duration::from_millis(5000));
    assert_eq!(config.run_deadline(), None);
    assert_eq!(config.not_found_match, NotFoundMatch::Status);
    assert_eq!(config.not_found_token, "BadNodeIdUnknown");
}

#[test]
fn load_optional_keys() {
    let content = "\
[OPCUA]
server_url = opc.tcp://plant:4840/ua
server_name = Boiler House
read_timeout_ms = 1500
run_deadline_seconds = 600
not_found_match = text
";
    let config = RunConfig::from_ini_str(content, "OPCUA").expect("config");
    assert_eq!(config.server_name, "Boiler House");
    assert_eq!(config.read_timeout_ms, 1500);
    assert_eq!(config.run_deadline(), Some(Duration::from_secs(600)));
    assert_eq!(config.not_found_match, NotFoundMatch::Text);
}

#[test]
fn missing_server_url_is_rejected() {
    let content = "[OPCUA]\nserver_name = Boiler House\n";
    let err = RunConfig::from_ini_str(content, "OPCUA").expect_err("missing");
    assert!(matches!(err, ConfigError::Missing(key) if key == "server_url"));
}

#[test]
fn missing_section_is_rejected() {
    let content = "[OTHER]\nserver_url = opc.tcp://plant:4840\n";
    let err = RunConfig::from_ini_str(content, "OPCUA").expect_err("missing section");
    assert!(matches!(err, ConfigError::MissingSection(section) if section == "OPCUA"));
}

#[test]
fn invalid_number_is_rejected() {
    let content = "[OPCUA]\nserver_url = opc.tcp://plant:4840\nread_timeout_ms = soon\n";
    let err = RunConfig::from_ini_str(content, "OPCUA").expect_err("invalid");
    assert_eq!(err.to_string(), "invalid value for read_timeout_ms: soon");
}

#[test]
fn ini_source_reads_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[OPCUA]").expect("write");
    writeln!(file, "server_url = opc.tcp://127.0.0.1:4840").expect("write");
    writeln!(file, "server_name = Test").expect("write");

    let source = IniConfigSource::new(file.path(), "OPCUA");
    let config = source.load().expect("config");
    assert_eq!(config.server_name, "Test");
}

#[test]
fn ini_source_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = IniConfigSource::new(dir.path().join("config.ini"), "OPCUA");
    let err = source.load().expect_err("not found");
    assert!(matches!(err, ConfigError::NotFound(_)));
}
