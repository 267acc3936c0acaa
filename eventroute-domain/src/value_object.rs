//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象。路由两端的端点统一建模为 [`Address`]：
//! `scheme` 决定匹配规则与出站时使用的发布器，`metadata` 承载附加约束（如 `channel`）。
//!

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use eventroute_macros::value_object;
use serde::Deserialize;

use crate::error::{RoutingError, RoutingResult};

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 设备端点：`device://{tenant}/{device_id}`
pub const DEVICE_SCHEME: &str = "device";
/// 短信端点：`sms://{phone_number}`
pub const SMS_SCHEME: &str = "sms";
/// HTTP 推送端点：`rest://{name}`，目标地址在 metadata 的 `url` 中
pub const REST_SCHEME: &str = "rest";
/// 约定的 channel 元数据键
pub const CHANNEL_KEY: &str = "channel";

/// 路由端点地址
///
/// # 示例
///
/// ```
/// use eventroute_domain::value_object::Address;
///
/// let addr = Address::parse("device://konker/0000000000000004")
///     .unwrap()
///     .with_metadata("channel", "data");
/// assert_eq!(addr.scheme(), "device");
/// assert_eq!(addr.device_id(), Some("0000000000000004"));
/// assert_eq!(addr.channel(), Some("data"));
/// assert_eq!(addr.to_string(), "device://konker/0000000000000004");
/// ```
#[value_object]
#[serde(try_from = "RawAddress")]
pub struct Address {
    scheme: String,
    path: String,
    metadata: BTreeMap<String, String>,
}

/// 反序列化的中间形态，经 [`Address::new`] 校验后才成为地址
#[derive(Deserialize)]
struct RawAddress {
    scheme: String,
    path: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl TryFrom<RawAddress> for Address {
    type Error = RoutingError;

    fn try_from(raw: RawAddress) -> Result<Self, Self::Error> {
        let mut address = Self::new(raw.scheme, raw.path)?;
        address.metadata = raw.metadata;
        Ok(address)
    }
}

impl Address {
    /// 由 scheme 与 path 创建并校验
    pub fn new(scheme: impl Into<String>, path: impl Into<String>) -> RoutingResult<Self> {
        let address = Self {
            scheme: scheme.into().to_ascii_lowercase(),
            path: path.into().trim_matches('/').to_string(),
            metadata: BTreeMap::new(),
        };
        address.validate()?;
        Ok(address)
    }

    /// 解析 `scheme://path` 或 `scheme:path` 形式的地址
    pub fn parse(uri: &str) -> RoutingResult<Self> {
        let (scheme, rest) = uri.split_once(':').ok_or_else(|| RoutingError::InvalidAddress {
            reason: format!("missing scheme in '{uri}'"),
        })?;
        let path = rest.strip_prefix("//").unwrap_or(rest);
        Self::new(scheme, path)
    }

    pub fn device(tenant: &str, device_id: &str) -> RoutingResult<Self> {
        Self::new(DEVICE_SCHEME, format!("{tenant}/{device_id}"))
    }

    pub fn sms(phone_number: &str) -> RoutingResult<Self> {
        Self::new(SMS_SCHEME, phone_number)
    }

    /// 追加一条元数据，返回新的地址
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_channel(self, channel: impl Into<String>) -> Self {
        self.with_metadata(CHANNEL_KEY, channel)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn channel(&self) -> Option<&str> {
        self.metadata_value(CHANNEL_KEY)
    }

    /// 该地址的 scheme 是否定义了 channel 语义
    pub fn has_channel_semantics(&self) -> bool {
        self.scheme == DEVICE_SCHEME
    }

    /// 设备地址的租户段
    pub fn tenant(&self) -> Option<&str> {
        self.device_segments().map(|(tenant, _)| tenant)
    }

    /// 设备地址的设备 ID 段
    pub fn device_id(&self) -> Option<&str> {
        self.device_segments().map(|(_, device)| device)
    }

    fn device_segments(&self) -> Option<(&str, &str)> {
        if self.scheme != DEVICE_SCHEME {
            return None;
        }
        self.path.rsplit_once('/')
    }

    /// 忽略 metadata，仅比较 scheme 与 path
    pub fn same_endpoint(&self, other: &Address) -> bool {
        self.scheme == other.scheme && self.path == other.path
    }
}

impl ValueObject for Address {
    type Error = RoutingError;

    fn validate(&self) -> Result<(), Self::Error> {
        let mut chars = self.scheme.chars();
        let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(RoutingError::InvalidAddress {
                reason: format!("invalid scheme '{}'", self.scheme),
            });
        }
        if self.path.is_empty() || self.path.chars().any(char::is_whitespace) {
            return Err(RoutingError::InvalidAddress {
                reason: format!("invalid path '{}' for scheme '{}'", self.path, self.scheme),
            });
        }
        if self.scheme == DEVICE_SCHEME && self.device_segments().is_none() {
            return Err(RoutingError::InvalidAddress {
                reason: format!("device address must be tenant/device_id, got '{}'", self.path),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

impl FromStr for Address {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_uri_forms() {
        let a = Address::parse("sms://+5511999990000").unwrap();
        let b = Address::parse("SMS:+5511999990000").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path(), "+5511999990000");
        assert_eq!(a.tenant(), None);
    }

    #[test]
    fn device_segments_are_exposed() {
        let a = Address::device("konker", "95c14b36ba2b43f1").unwrap();
        assert_eq!(a.tenant(), Some("konker"));
        assert_eq!(a.device_id(), Some("95c14b36ba2b43f1"));
        assert!(a.has_channel_semantics());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Address::parse("no-scheme-here").is_err());
        assert!(Address::parse("1abc://x").is_err());
        assert!(Address::parse("device://").is_err());
        assert!(Address::parse("device://only-one-segment").is_err());
        assert!(Address::parse("rest://with space").is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Address = serde_json::from_str(
            r#"{"scheme":"DEVICE","path":"konker/d1","metadata":{"channel":"data"}}"#,
        )
        .unwrap();
        assert_eq!(ok.scheme(), "device");
        assert_eq!(ok.channel(), Some("data"));

        for json in [
            r#"{"scheme":"device","path":"only-one-segment"}"#,
            r#"{"scheme":"1abc","path":"x"}"#,
            r#"{"scheme":"rest","path":""}"#,
        ] {
            let err = serde_json::from_str::<Address>(json).unwrap_err();
            assert!(err.to_string().contains("invalid"), "{json}: {err}");
        }
    }

    #[test]
    fn same_endpoint_ignores_metadata() {
        let a = Address::device("t", "d").unwrap().with_channel("in");
        let b = Address::device("t", "d").unwrap().with_channel("out");
        assert_ne!(a, b);
        assert!(a.same_endpoint(&b));
    }
}
