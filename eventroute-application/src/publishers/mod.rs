//! 出站发布器
//!
//! 每种出站 scheme 一个实现：`device`（MQTT 主题）、`sms`（短信网关）、`rest`（HTTP 推送）。
//! 具体传输通过各自的网关协议注入，便于替换与测试。
//!
pub mod device;
pub mod http;
pub mod sms;

pub use device::{DeviceDirectory, DevicePublisher, DeviceRecord, InMemoryDeviceDirectory, MessageGateway};
pub use http::HttpPushPublisher;
pub use sms::{SmsGateway, SmsPublisher};
