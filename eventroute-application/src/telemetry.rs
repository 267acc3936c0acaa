use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;
use crate::error::{AppError, AppResult};

/// `RUST_LOG` 未设置或无法解析时使用的过滤指令
pub const DEFAULT_DIRECTIVES: &str = "eventroute_domain=info,eventroute_application=info";

/// 初始化全局 tracing 订阅者；`RUST_LOG` 优先，未设置时路由相关 crate 默认 info
pub fn init(format: LogFormat) -> AppResult<()> {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let result = match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };
    result.map_err(|e| AppError::Telemetry(e.to_string()))
}

fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
