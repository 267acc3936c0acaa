//! 事件路由（Route）
//!
//! 将入站地址、过滤表达式与可选的转换管道绑定到一个出站地址。
//! 引擎在单次执行期间只读使用路由，不做任何修改与跨调用缓存。
//!
use bon::Builder;
use eventroute_macros::entity_id;
use serde::{Deserialize, Deserializer, Serialize};

use crate::transformation::Transformation;
use crate::value_object::Address;

#[entity_id]
pub struct RouteId(String);

impl RouteId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(finish_fn(vis = "", name = build_raw))]
pub struct Route {
    #[builder(default = RouteId::generate())]
    id: RouteId,
    #[builder(into)]
    name: String,
    incoming: Address,
    outgoing: Address,
    #[builder(into)]
    #[serde(default, deserialize_with = "blank_filter_as_none")]
    filter_expression: Option<String>,
    transformation: Option<Transformation>,
    #[builder(default = true)]
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

/// 去除首尾空白；空白表达式视为未设置
fn normalize_filter(expression: Option<String>) -> Option<String> {
    expression
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

fn blank_filter_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(normalize_filter)
}

impl<S: route_builder::IsComplete> RouteBuilder<S> {
    pub fn build(self) -> Route {
        let mut route = self.build_raw();
        route.filter_expression = normalize_filter(route.filter_expression.take());
        route
    }
}

impl Route {
    pub fn id(&self) -> &RouteId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn incoming(&self) -> &Address {
        &self.incoming
    }

    pub fn outgoing(&self) -> &Address {
        &self.outgoing
    }

    pub fn filter_expression(&self) -> Option<&str> {
        self.filter_expression.as_deref()
    }

    pub fn transformation(&self) -> Option<&Transformation> {
        self.transformation.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 入站地址约束的 channel 是否与事件 channel 一致。
    ///
    /// 带 channel 语义的 scheme（device）必须声明 channel；
    /// 其它 scheme 仅在声明了 channel 时才参与比较。
    pub fn accepts_channel(&self, channel: &str) -> bool {
        match self.incoming.channel() {
            Some(expected) => expected == channel,
            None => !self.incoming.has_channel_semantics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(channel: Option<&str>) -> Address {
        let a = Address::device("konker", "0000000000000004").unwrap();
        match channel {
            Some(c) => a.with_channel(c),
            None => a,
        }
    }

    #[test]
    fn blank_filter_is_absent() {
        let route = Route::builder()
            .name("blank")
            .incoming(device(Some("data")))
            .outgoing(Address::sms("+5511999990000").unwrap())
            .filter_expression("   ")
            .build();
        assert_eq!(route.filter_expression(), None);
        assert!(route.is_active());
    }

    #[test]
    fn blank_filter_does_not_survive_serialization() {
        let json = r#"{
            "id": "r-2",
            "name": "blank",
            "incoming": {"scheme": "device", "path": "konker/d1", "metadata": {"channel": "data"}},
            "outgoing": {"scheme": "sms", "path": "+5511999990000"},
            "filter_expression": "   "
        }"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.filter_expression(), None);

        let built = Route::builder()
            .name("padded")
            .incoming(device(Some("data")))
            .outgoing(device(Some("out")))
            .filter_expression("  value > 1 ")
            .build();
        assert_eq!(built.filter_expression(), Some("value > 1"));
        let value = serde_json::to_value(&built).unwrap();
        assert_eq!(value["filter_expression"], "value > 1");
    }

    #[test]
    fn device_routes_require_channel() {
        let out = Address::sms("+5511999990000").unwrap();
        let with = Route::builder()
            .name("a")
            .incoming(device(Some("data")))
            .outgoing(out.clone())
            .build();
        let without = Route::builder()
            .name("b")
            .incoming(device(None))
            .outgoing(out.clone())
            .build();
        let other_scheme = Route::builder()
            .name("c")
            .incoming(Address::parse("rest://hook").unwrap())
            .outgoing(out)
            .build();

        assert!(with.accepts_channel("data"));
        assert!(!with.accepts_channel("command"));
        assert!(!without.accepts_channel("data"));
        assert!(other_scheme.accepts_channel("anything"));
    }

    #[test]
    fn route_round_trips_through_json() {
        let route = Route::builder()
            .id(RouteId::new("r-1"))
            .name("json")
            .incoming(device(Some("data")))
            .outgoing(device(Some("out")))
            .filter_expression("metric == 'temperature'")
            .active(false)
            .build();
        let json = serde_json::to_string(&route).unwrap();
        assert!(json.contains("\"id\":\"r-1\""));
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);
    }
}
