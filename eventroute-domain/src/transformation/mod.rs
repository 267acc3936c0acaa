//! 事件转换（Transformation）
//!
//! 转换由有序的步骤组成，每个步骤消费上一步的输出事件：
//! - `TransformationStep`：按类型标签区分的步骤变体，各自负责校验与执行；
//! - `TransformationPipeline`：顺序驱动步骤，任一步失败即整体无输出。
//!
//! 新增步骤类型只需增加变体及其校验/执行逻辑，管道驱动无需改动。
//!
pub mod interpolation;
pub mod pipeline;
pub mod rest;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RoutingResult;
use crate::event::Event;
use crate::http::HttpGateway;

pub use pipeline::TransformationPipeline;
pub use rest::RestStep;

/// 校验失败项，`code()` 为对外的消息键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Violation {
    StepsEmpty,
    RestAttributesEmpty,
    RestUrlMissing,
    RestUrlInvalid,
    RestUsernameMissing,
    RestPasswordMissing,
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StepsEmpty => "model.transformation.steps.not_empty",
            Self::RestAttributesEmpty => "model.transformation.rest.attributes.not_empty",
            Self::RestUrlMissing => "model.transformation.rest.attributes.url.missing",
            Self::RestUrlInvalid => "model.transformation.rest.attributes.url.invalid",
            Self::RestUsernameMissing => "model.transformation.rest.attributes.username.missing",
            Self::RestPasswordMissing => "model.transformation.rest.attributes.password.missing",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Rest,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str("REST"),
        }
    }
}

/// 转换步骤，序列化为 `{"kind": "REST", "attributes": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationStep {
    Rest(RestStep),
}

impl TransformationStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Rest(_) => StepKind::Rest,
        }
    }

    pub fn validate(&self) -> BTreeSet<Violation> {
        match self {
            Self::Rest(step) => step.validate(),
        }
    }

    pub async fn execute(&self, event: &Event, http: &dyn HttpGateway) -> RoutingResult<Event> {
        match self {
            Self::Rest(step) => step.execute(event, http).await,
        }
    }
}

impl From<RestStep> for TransformationStep {
    fn from(step: RestStep) -> Self {
        Self::Rest(step)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    steps: Vec<TransformationStep>,
}

impl Transformation {
    pub fn new(steps: Vec<TransformationStep>) -> Self {
        Self { steps }
    }

    pub fn single(step: impl Into<TransformationStep>) -> Self {
        Self::new(vec![step.into()])
    }

    pub fn steps(&self) -> &[TransformationStep] {
        &self.steps
    }

    /// 校验整个转换；返回空集合表示合法
    pub fn validate(&self) -> BTreeSet<Violation> {
        if self.steps.is_empty() {
            return BTreeSet::from([Violation::StepsEmpty]);
        }
        self.steps.iter().flat_map(TransformationStep::validate).collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transformation_is_invalid() {
        let t = Transformation::new(vec![]);
        assert_eq!(t.validate(), BTreeSet::from([Violation::StepsEmpty]));
    }

    #[test]
    fn violations_of_all_steps_are_collected() {
        let t = Transformation::new(vec![
            RestStep::from_parts("http://ok.com", "u", "p").into(),
            RestStep::default().into(),
        ]);
        assert_eq!(
            t.validate(),
            BTreeSet::from([Violation::RestAttributesEmpty])
        );
        assert!(!t.is_valid());
    }

    #[test]
    fn step_serializes_with_kind_tag() {
        let t = Transformation::single(RestStep::from_parts("http://host.com", "u", "p"));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["steps"][0]["kind"], "REST");
        assert_eq!(json["steps"][0]["attributes"]["url"], "http://host.com");
        let back: Transformation = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn codes_match_message_keys() {
        assert_eq!(
            Violation::RestUrlMissing.to_string(),
            "model.transformation.rest.attributes.url.missing"
        );
        assert_eq!(StepKind::Rest.to_string(), "REST");
    }
}
