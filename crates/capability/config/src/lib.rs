//! 运行配置加载：INI 配置段 + 环境变量覆盖。
//!
//! 每个键都可以用 `POINTCHECK_<KEY>` 环境变量覆盖，例如 `POINTCHECK_SERVER_URL`。

use ini::Ini;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 默认配置段名。
pub const DEFAULT_SECTION: &str = "OPCUA";
/// 未配置 server_name 时的显示名。
pub const DEFAULT_SERVER_NAME: &str = "Unknown Server";
/// 旧版文本匹配使用的错误类别标记。
pub const DEFAULT_NOT_FOUND_TOKEN: &str = "BadNodeIdUnknown";

const ENV_PREFIX: &str = "POINTCHECK_";

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),
    #[error("failed to read config file {0}: {1}")]
    Read(String, String),
    #[error("missing config section: [{0}]")]
    MissingSection(String),
    #[error("missing required key: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// “节点不存在”的判定方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundMatch {
    /// 按协议层状态码判定（BadNodeIdUnknown）。
    #[default]
    Status,
    /// 按错误文本中是否包含标记判定（旧版行为）。
    Text,
}

impl FromStr for NotFoundMatch {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "status" | "status_code" => Ok(Self::Status),
            "text" | "substring" => Ok(Self::Text),
            other => Err(other.to_string()),
        }
    }
}

/// 单次运行配置（运行期间只读）。
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub server_url: String,
    pub server_name: String,
    pub session_name: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub run_deadline_seconds: Option<u64>,
    pub not_found_match: NotFoundMatch,
    pub not_found_token: String,
}

impl RunConfig {
    /// 仅指定服务器地址，其余取默认值。
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            session_name: "pointcheck".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 3000,
            run_deadline_seconds: None,
            not_found_match: NotFoundMatch::Status,
            not_found_token: DEFAULT_NOT_FOUND_TOKEN.to_string(),
        }
    }

    /// 从 INI 文件读取指定配置段。
    pub fn from_ini_file(path: &Path, section: &str) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let ini = Ini::load_from_file(path)
            .map_err(|err| ConfigError::Read(path.display().to_string(), err.to_string()))?;
        Self::from_ini(&ini, section)
    }

    /// 从 INI 文本读取指定配置段。
    pub fn from_ini_str(content: &str, section: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content)
            .map_err(|err| ConfigError::Read("<inline>".to_string(), err.to_string()))?;
        Self::from_ini(&ini, section)
    }

    fn from_ini(ini: &Ini, section: &str) -> Result<Self, ConfigError> {
        let props = ini.section(Some(section));
        let lookup = |key: &str| -> Option<String> {
            if let Some(value) = read_env_override(key) {
                return Some(value);
            }
            props?
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        // 配置段缺失且环境变量也未提供地址时，提示缺段比提示缺键更准确。
        if props.is_none() && read_env_override("server_url").is_none() {
            return Err(ConfigError::MissingSection(section.to_string()));
        }
        Self::from_lookup(lookup)
    }

    /// 仅从环境变量读取（无配置文件时使用）。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(read_env_override)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url =
            lookup("server_url").ok_or_else(|| ConfigError::Missing("server_url".to_string()))?;
        let defaults = Self::new(server_url);

        let server_name = lookup("server_name").unwrap_or(defaults.server_name);
        let session_name = lookup("session_name").unwrap_or(defaults.session_name);
        let connect_timeout_ms =
            read_u64_with_default(&lookup, "connect_timeout_ms", defaults.connect_timeout_ms)?;
        let read_timeout_ms =
            read_u64_with_default(&lookup, "read_timeout_ms", defaults.read_timeout_ms)?;
        let run_deadline_seconds =
            read_optional_u64(&lookup, "run_deadline_seconds")?.filter(|value| *value > 0);
        let not_found_match = match lookup("not_found_match") {
            Some(value) => value
                .parse::<NotFoundMatch>()
                .map_err(|value| ConfigError::Invalid("not_found_match".to_string(), value))?,
            None => defaults.not_found_match,
        };
        let not_found_token = lookup("not_found_token").unwrap_or(defaults.not_found_token);

        if connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_ms".to_string(),
                "0".to_string(),
            ));
        }
        if read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_ms".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            server_url: defaults.server_url,
            server_name,
            session_name,
            connect_timeout_ms,
            read_timeout_ms,
            run_deadline_seconds,
            not_found_match,
            not_found_token,
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_seconds.map(Duration::from_secs)
    }
}

/// 配置来源抽象（编排器的外部协作者）。
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<RunConfig, ConfigError>;
}

/// 基于 INI 文件的配置来源。
#[derive(Debug, Clone)]
pub struct IniConfigSource {
    path: PathBuf,
    section: String,
}

impl IniConfigSource {
    pub fn new(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for IniConfigSource {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        RunConfig::from_ini_file(&self.path, &self.section)
    }
}

/// 固定配置来源（用于接线与测试）。
#[derive(Debug, Clone)]
pub struct StaticConfigSource(pub RunConfig);

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

fn env_key(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase())
}

fn read_env_override(key: &str) -> Option<String> {
    match env::var(env_key(key)) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn read_u64_with_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let value = match lookup(key) {
        Some(value) => value,
        None => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_match_parses() {
        assert_eq!("status".parse::<NotFoundMatch>(), Ok(NotFoundMatch::Status));
        assert_eq!(" Text ".parse::<NotFoundMatch>(), Ok(NotFoundMatch::Text));
        assert!("regex".parse::<NotFoundMatch>().is_err());
    }

    #[test]
    fn env_key_is_prefixed_and_uppercase() {
        assert_eq!(env_key("server_url"), "POINTCHECK_SERVER_URL");
    }
}
