use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use eventroute_domain::eventing::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "EVENTROUTE_";

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// 路由服务配置，来自 `EVENTROUTE_*` 环境变量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub worker_pool_size: usize,
    pub http_timeout_ms: u64,
    /// 设备投递的 MQTT 主题前缀：`{prefix}/{deviceId}/{channel}`
    pub mqtt_topic_prefix: String,
    pub log_format: LogFormat,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: EngineConfig::default().worker_pool_size,
            http_timeout_ms: 10_000,
            mqtt_topic_prefix: "iot".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl RoutingConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log();
        Ok(config)
    }

    /// 从任意键值来源读取，未设置的项取默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            worker_pool_size: match var("WORKER_POOL_SIZE") {
                Some(v) => parse_number(&v, "WORKER_POOL_SIZE")?,
                None => defaults.worker_pool_size,
            },
            http_timeout_ms: match var("HTTP_TIMEOUT_MS") {
                Some(v) => parse_number(&v, "HTTP_TIMEOUT_MS")?,
                None => defaults.http_timeout_ms,
            },
            mqtt_topic_prefix: var("MQTT_TOPIC_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or(defaults.mqtt_topic_prefix),
            log_format: match var("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => defaults.log_format,
            },
        };

        if config.worker_pool_size == 0 {
            return Err(AppError::Config(format!(
                "{ENV_PREFIX}WORKER_POOL_SIZE must be greater than zero"
            )));
        }
        Ok(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            worker_pool_size: self.worker_pool_size,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    fn log(&self) {
        info!(
            worker_pool_size = self.worker_pool_size,
            http_timeout_ms = self.http_timeout_ms,
            mqtt_topic_prefix = %self.mqtt_topic_prefix,
            log_format = %self.log_format,
            "routing config loaded"
        );
    }
}

fn parse_number<T: FromStr>(raw: &str, name: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::Config(format!("{ENV_PREFIX}{name}: '{raw}' is not a valid number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = RoutingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RoutingConfig::default());
        assert_eq!(config.engine_config().worker_pool_size, 16);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = RoutingConfig::from_lookup(lookup(&[
            ("EVENTROUTE_WORKER_POOL_SIZE", "4"),
            ("EVENTROUTE_HTTP_TIMEOUT_MS", "2500"),
            ("EVENTROUTE_MQTT_TOPIC_PREFIX", "/data/"),
            ("EVENTROUTE_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.http_timeout(), Duration::from_millis(2500));
        assert_eq!(config.mqtt_topic_prefix, "data");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        for pairs in [
            [("EVENTROUTE_WORKER_POOL_SIZE", "many")],
            [("EVENTROUTE_WORKER_POOL_SIZE", "0")],
            [("EVENTROUTE_LOG_FORMAT", "xml")],
        ] {
            let err = RoutingConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{err}");
        }
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: RoutingConfig = serde_json::from_str(r#"{"log_format":"json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.worker_pool_size, 16);
    }
}
