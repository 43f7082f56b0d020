use crate::desk::*;

use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// The settings file of the desk. Every entry is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(rename = "serverUrl")]
    pub server_url: Option<String>,
    #[serde(rename = "connectTimeoutSeconds")]
    _connect_timeout_seconds: Option<JSValue>,
    #[serde(rename = "timeoutSeconds")]
    _timeout_seconds: Option<JSValue>,
    #[serde(rename = "matchedGoal")]
    _matched_goal: Option<JSValue>,
}

impl DeskConfig {
    pub fn connect_timeout(&self) -> DeskResult<Duration> {
        let x = read_js_int_or(
            &self._connect_timeout_seconds,
            "connectTimeoutSeconds",
            DEFAULT_CONNECT_TIMEOUT_SECONDS,
        )?;
        Ok(Duration::from_secs(x))
    }

    pub fn timeout(&self) -> DeskResult<Duration> {
        let x = read_js_int_or(&self._timeout_seconds, "timeoutSeconds", DEFAULT_TIMEOUT_SECONDS)?;
        Ok(Duration::from_secs(x))
    }

    pub fn matched_goal(&self) -> DeskResult<u64> {
        read_js_int_or(&self._matched_goal, "matchedGoal", DEFAULT_MATCHED_GOAL)
    }
}

/// The settings in use, once the configuration file and the command line are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DeskSettings {
    pub server_url: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub matched_goal: u64,
}

impl DeskSettings {
    /// `server_override` (from the command line) takes precedence over the file.
    pub fn resolve(config: &DeskConfig, server_override: Option<&str>) -> DeskResult<DeskSettings> {
        let server_url = server_override
            .map(|s| s.to_string())
            .or_else(|| config.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = server_url.trim().trim_end_matches('/').to_string();
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            whatever!(
                "The server address must start with http:// or https://, got {:?}",
                server_url
            )
        }
        let timeout = config.timeout()?;
        let connect_timeout = config.connect_timeout()?;
        if timeout.is_zero() || connect_timeout.is_zero() {
            whatever!("Timeouts must be at least one second")
        }
        Ok(DeskSettings {
            server_url,
            connect_timeout,
            timeout,
            matched_goal: config.matched_goal()?,
        })
    }
}

pub fn read_config(path: &str) -> DeskResult<DeskConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: DeskConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    debug!("read config: {:?}", config);
    Ok(config)
}

fn read_js_int(x: &Option<JSValue>, field: &str) -> DeskResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<u64>()
            .ok()
            .context(ParsingJsonNumberSnafu { field }),
        _ => None.context(ParsingJsonNumberSnafu { field }),
    }
}

fn read_js_int_or(x: &Option<JSValue>, field: &str, default: u64) -> DeskResult<u64> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        _ => read_js_int(x, field),
    }
}
