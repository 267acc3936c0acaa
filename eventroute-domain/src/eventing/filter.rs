//! 过滤表达式适配（FilterEvaluator）
//!
//! 将外部的表达式求值器与 JSON 解码器组合为单一的 `matches(event, expression)`：
//! - 表达式缺省或为空：恒为真；
//! - 否则解码负载一次，并以解码结果作为求值上下文；
//! - 负载无法解码、表达式无法求值或结果不是布尔值，均为 `Evaluation` 错误。
//!
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RoutingError, RoutingResult as Result};
use crate::event::Event;

/// 表达式求值上下文
pub type Document = serde_json::Map<String, Value>;

/// 表达式求值器
#[async_trait]
pub trait ExpressionEvaluator: Send + Sync {
    /// 对文档求值，返回任意 JSON 值
    async fn evaluate(&self, expression: &str, document: &Document) -> Result<Value>;

    /// 求值并要求结果为布尔值
    async fn evaluate_boolean(&self, expression: &str, document: &Document) -> Result<bool> {
        match self.evaluate(expression, document).await? {
            Value::Bool(b) => Ok(b),
            other => Err(RoutingError::evaluation(
                expression,
                format!("expected boolean result, got {other}"),
            )),
        }
    }
}

/// JSON 解码器：文本负载 -> 键值文档
pub trait JsonDecoder: Send + Sync {
    fn decode(&self, text: &str) -> Result<Document>;
}

/// 基于 serde_json 的解码器，要求顶层为 JSON 对象
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonDecoder;

impl JsonDecoder for SerdeJsonDecoder {
    fn decode(&self, text: &str) -> Result<Document> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            other => Err(RoutingError::InvalidValue {
                reason: format!("expected JSON object payload, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Clone)]
pub struct FilterEvaluator {
    evaluator: Arc<dyn ExpressionEvaluator>,
    decoder: Arc<dyn JsonDecoder>,
}

impl FilterEvaluator {
    /// 使用 serde_json 解码负载
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self::with_decoder(evaluator, Arc::new(SerdeJsonDecoder))
    }

    pub fn with_decoder(
        evaluator: Arc<dyn ExpressionEvaluator>,
        decoder: Arc<dyn JsonDecoder>,
    ) -> Self {
        Self { evaluator, decoder }
    }

    pub async fn matches(&self, event: &Event, expression: Option<&str>) -> Result<bool> {
        let Some(expression) = expression.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(true);
        };

        let document = self.decoder.decode(event.payload()).map_err(|e| {
            RoutingError::evaluation(expression, format!("undecodable payload: {e}"))
        })?;

        self.evaluator
            .evaluate_boolean(expression, &document)
            .await
            .map_err(|e| match e {
                RoutingError::Evaluation { .. } => e,
                other => RoutingError::evaluation(expression, other.to_string()),
            })
    }
}
