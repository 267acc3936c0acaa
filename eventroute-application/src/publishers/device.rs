use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use dashmap::DashMap;
use eventroute_domain::event::Event;
use eventroute_domain::eventing::Publisher;
use eventroute_domain::value_object::{Address, DEVICE_SCHEME};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub tenant: String,
    pub device_id: String,
    pub active: bool,
}

/// 设备目录：按租户与设备 ID 查找设备
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn find(&self, tenant: &str, device_id: &str) -> anyhow::Result<Option<DeviceRecord>>;
}

/// 消息网关（MQTT 等）：向主题发送负载
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, payload: &str, topic: &str) -> anyhow::Result<()>;
}

/// 内存设备目录
#[derive(Default)]
pub struct InMemoryDeviceDirectory {
    devices: DashMap<(String, String), DeviceRecord>,
}

impl InMemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, device: DeviceRecord) {
        self.devices
            .insert((device.tenant.clone(), device.device_id.clone()), device);
    }

    pub fn set_active(&self, tenant: &str, device_id: &str, active: bool) -> bool {
        match self
            .devices
            .get_mut(&(tenant.to_string(), device_id.to_string()))
        {
            Some(mut d) => {
                d.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DeviceDirectory for InMemoryDeviceDirectory {
    async fn find(&self, tenant: &str, device_id: &str) -> anyhow::Result<Option<DeviceRecord>> {
        Ok(self
            .devices
            .get(&(tenant.to_string(), device_id.to_string()))
            .map(|d| d.value().clone()))
    }
}

/// 设备发布器：出站地址 `device://{tenant}/{deviceId}`，channel 取自出站元数据，
/// 负载发送到主题 `{prefix}/{deviceId}/{channel}`。
pub struct DevicePublisher {
    directory: Arc<dyn DeviceDirectory>,
    gateway: Arc<dyn MessageGateway>,
    topic_prefix: String,
}

impl DevicePublisher {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        gateway: Arc<dyn MessageGateway>,
        topic_prefix: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            gateway,
            topic_prefix: topic_prefix.into(),
        }
    }

    fn topic(&self, device_id: &str, channel: &str) -> String {
        format!("{}/{device_id}/{channel}", self.topic_prefix)
    }
}

#[async_trait]
impl Publisher for DevicePublisher {
    fn scheme(&self) -> &str {
        DEVICE_SCHEME
    }

    async fn send(&self, event: &Event, destination: &Address) -> anyhow::Result<()> {
        let (Some(tenant), Some(device_id)) = (destination.tenant(), destination.device_id())
        else {
            bail!("not a device address: {destination}");
        };
        let channel = destination
            .channel()
            .ok_or_else(|| anyhow!("outgoing channel missing for {destination}"))?;

        let device = self
            .directory
            .find(tenant, device_id)
            .await?
            .ok_or_else(|| anyhow!("Device is unknown : {}", destination.path()))?;

        if !device.active {
            debug!(tenant, device_id, "device disabled, event not sent");
            return Ok(());
        }

        self.gateway
            .send(event.payload(), &self.topic(&device.device_id, channel))
            .await
    }
}
