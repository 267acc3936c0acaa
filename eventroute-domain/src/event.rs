//! 设备事件（Event）
//!
//! 事件一经产生即不可变；转换步骤产出新的事件而不是原地修改。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Event {
    /// 事件通道，例如 `data`、`command`
    #[builder(into)]
    channel: String,
    /// 原始负载（通常为 JSON 文本），仅在过滤或转换需要时解析
    #[builder(into)]
    payload: String,
    /// 事件产生时间
    #[builder(default = Utc::now())]
    timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::builder().channel(channel).payload(payload).build()
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 以新的负载产出新事件，channel 与 timestamp 沿用当前事件
    pub fn with_payload(&self, payload: impl Into<String>) -> Self {
        Self {
            channel: self.channel.clone(),
            payload: payload.into(),
            timestamp: self.timestamp,
        }
    }
}
