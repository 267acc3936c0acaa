//! `@{...}` 占位符插值
//!
//! 占位符的取值来源：
//! - `channel`、`timestamp`（RFC 3339）、`payload`（原始负载）为保留名；
//! - 其它名称按点分路径在 JSON 负载中查找，`payload.` 前缀可省略。
//!
use std::cell::OnceCell;

use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::event::Event;

const OPEN: &str = "@{";
const CLOSE: char = '}';

/// 插值失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
    #[error("unterminated placeholder at {offset}")]
    Unterminated { offset: usize },
    #[error("empty placeholder at {offset}")]
    EmptyPlaceholder { offset: usize },
    #[error("no value for placeholder '{key}'")]
    Unresolved { key: String },
}

/// 按顺序替换模板中的占位符
pub fn interpolate<F>(template: &str, mut resolve: F) -> Result<String, InterpolationError>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let offset = template.len() - rest.len() + start;
        out.push_str(&rest[..start]);

        let after = &rest[start + OPEN.len()..];
        let end = after
            .find(CLOSE)
            .ok_or(InterpolationError::Unterminated { offset })?;
        let key = after[..end].trim();
        if key.is_empty() {
            return Err(InterpolationError::EmptyPlaceholder { offset });
        }

        let value = resolve(key).ok_or_else(|| InterpolationError::Unresolved {
            key: key.to_string(),
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// 以事件字段作为占位符取值来源；负载只在首次需要时解析一次
pub struct EventFields<'a> {
    event: &'a Event,
    document: OnceCell<Option<Value>>,
}

impl<'a> EventFields<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            event,
            document: OnceCell::new(),
        }
    }

    pub fn resolve(&self, key: &str) -> Option<String> {
        match key {
            "channel" => return Some(self.event.channel().to_string()),
            "timestamp" => return Some(self.event.timestamp().to_rfc3339()),
            "payload" => return Some(self.event.payload().to_string()),
            _ => {}
        }

        let path = key.strip_prefix("payload.").unwrap_or(key);
        let document = self
            .document
            .get_or_init(|| serde_json::from_str(self.event.payload()).ok())
            .as_ref()?;

        let found = path
            .split('.')
            .try_fold(document, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })?;

        match found {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn interpolate(&self, template: &str) -> Result<String, InterpolationError> {
        interpolate(template, |key| self.resolve(key))
    }

    /// URL 模板插值：每个取值按 form-urlencoded 编码，只能落在所在的路径段或查询值内
    pub fn interpolate_url(&self, template: &str) -> Result<String, InterpolationError> {
        interpolate(template, |key| {
            self.resolve(key)
                .map(|value| form_urlencoded::byte_serialize(value.as_bytes()).collect())
        })
    }
}
