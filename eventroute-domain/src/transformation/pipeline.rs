use std::sync::Arc;

use tracing::debug;

use super::Transformation;
use crate::error::{RoutingError, RoutingResult};
use crate::event::Event;
use crate::http::HttpGateway;

/// 转换管道：严格按顺序执行步骤，首个失败即终止（fail-fast），
/// 不会输出部分转换结果。执行前先做校验，不合法的转换一律拒绝执行。
#[derive(Clone)]
pub struct TransformationPipeline {
    http: Arc<dyn HttpGateway>,
}

impl TransformationPipeline {
    pub fn new(http: Arc<dyn HttpGateway>) -> Self {
        Self { http }
    }

    /// 执行转换；失败时返回 `None` 并记录原因
    pub async fn apply(&self, event: &Event, transformation: &Transformation) -> Option<Event> {
        match self.try_apply(event, transformation).await {
            Ok(out) => Some(out),
            Err(err) => {
                debug!(error = %err, "transformation dropped event");
                None
            }
        }
    }

    pub async fn try_apply(
        &self,
        event: &Event,
        transformation: &Transformation,
    ) -> RoutingResult<Event> {
        let violations = transformation.validate();
        if !violations.is_empty() {
            let codes: Vec<&str> = violations.iter().map(|v| v.code()).collect();
            return Err(RoutingError::transformation("validation", codes.join(", ")));
        }

        let mut current = event.clone();
        for (index, step) in transformation.steps().iter().enumerate() {
            current = step
                .execute(&current, self.http.as_ref())
                .await
                .map_err(|err| {
                    let reason = match err {
                        RoutingError::Transformation { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    RoutingError::transformation(format!("#{index} {}", step.kind()), reason)
                })?;
        }

        Ok(current)
    }
}
