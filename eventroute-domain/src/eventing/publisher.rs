//! 事件发布器（Publisher）与发布器注册表（PublisherRegistry）
//!
//! 每种出站传输（设备/MQTT、短信、HTTP 推送等）实现一个发布器，
//! 注册表在启动时按 scheme 建立映射，投递时按出站地址的 scheme 解析。
//! 发布器的重试/退避策略由其自身负责，引擎对每条匹配路由最多调用一次 `send`。
//!
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{RoutingError, RoutingResult as Result};
use crate::event::Event;
use crate::value_object::Address;

/// 事件发布器：将事件投递到某一出站地址
#[async_trait]
pub trait Publisher: Send + Sync {
    /// 该发布器负责的地址 scheme
    fn scheme(&self) -> &str;
    /// 发送事件；失败由发布器自行记录，引擎不做重试
    async fn send(&self, event: &Event, destination: &Address) -> anyhow::Result<()>;
}

#[derive(Clone, Default)]
pub struct PublisherRegistry {
    by_scheme: HashMap<String, Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    /// 按发布器声明的 scheme 建立映射；重复的 scheme 保留先注册者
    pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Self {
        let mut registry = Self::default();
        for p in publishers {
            if let Err(err) = registry.register(p) {
                warn!(error = %err, "duplicate publisher ignored");
            }
        }
        registry
    }

    pub fn register(&mut self, publisher: Arc<dyn Publisher>) -> Result<()> {
        let scheme = publisher.scheme().to_ascii_lowercase();
        if self.by_scheme.contains_key(&scheme) {
            return Err(RoutingError::AlreadyRegistered { scheme });
        }
        self.by_scheme.insert(scheme, publisher);
        Ok(())
    }

    pub fn resolve(&self, scheme: &str) -> Result<Arc<dyn Publisher>> {
        self.by_scheme
            .get(&scheme.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| RoutingError::UnknownScheme {
                scheme: scheme.to_string(),
            })
    }

    /// 已注册的 scheme（有序）
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.by_scheme.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}
