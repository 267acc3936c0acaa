//! REST 转换步骤
//!
//! 将当前事件负载 POST 至 `url`（占位符按事件字段插值并做 URL 编码），使用 basic 认证；
//! 响应状态为 200 时以响应体作为新事件负载，否则步骤失败。
//!
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use url::Url;

use super::Violation;
use super::interpolation::{EventFields, interpolate};
use crate::error::{RoutingError, RoutingResult};
use crate::event::Event;
use crate::http::{HttpGateway, HttpMethod, HttpRequest};

pub const URL_ATTRIBUTE: &str = "url";
pub const USERNAME_ATTRIBUTE: &str = "username";
pub const PASSWORD_ATTRIBUTE: &str = "password";

/// 期望的响应状态码
pub const EXPECTED_STATUS: u16 = 200;

const STEP_LABEL: &str = "REST";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStep {
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl RestStep {
    pub fn new(attributes: BTreeMap<String, String>) -> Self {
        Self { attributes }
    }

    pub fn from_parts(url: &str, username: &str, password: &str) -> Self {
        Self::new(BTreeMap::from([
            (URL_ATTRIBUTE.to_string(), url.to_string()),
            (USERNAME_ATTRIBUTE.to_string(), username.to_string()),
            (PASSWORD_ATTRIBUTE.to_string(), password.to_string()),
        ]))
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn validate(&self) -> BTreeSet<Violation> {
        let mut violations = BTreeSet::new();

        if self.attributes.is_empty() {
            violations.insert(Violation::RestAttributesEmpty);
            return violations;
        }

        match self.attribute(URL_ATTRIBUTE).filter(|u| !u.trim().is_empty()) {
            None => {
                violations.insert(Violation::RestUrlMissing);
            }
            Some(url) if !is_interpolable_http_url(url) => {
                violations.insert(Violation::RestUrlInvalid);
            }
            Some(_) => {}
        }
        if self.attribute(USERNAME_ATTRIBUTE).is_none() {
            violations.insert(Violation::RestUsernameMissing);
        }
        if self.attribute(PASSWORD_ATTRIBUTE).is_none() {
            violations.insert(Violation::RestPasswordMissing);
        }

        violations
    }

    pub async fn execute(&self, event: &Event, http: &dyn HttpGateway) -> RoutingResult<Event> {
        let template = self
            .attribute(URL_ATTRIBUTE)
            .ok_or_else(|| RoutingError::transformation(STEP_LABEL, "url attribute missing"))?;

        // 插值在发起请求前完成，EventFields 不跨越 await
        let target = {
            let fields = EventFields::new(event);
            fields
                .interpolate_url(template)
                .map_err(|e| RoutingError::transformation(STEP_LABEL, e.to_string()))?
        };
        let url = Url::parse(&target).map_err(|e| {
            RoutingError::transformation(STEP_LABEL, format!("invalid url '{target}': {e}"))
        })?;

        let request = HttpRequest::new(HttpMethod::Post, url)
            .with_json_body(event.payload())
            .with_basic_auth(
                self.attribute(USERNAME_ATTRIBUTE).unwrap_or_default(),
                self.attribute(PASSWORD_ATTRIBUTE).unwrap_or_default(),
            );

        let response = http
            .request(request)
            .await
            .map_err(|e| RoutingError::transformation(STEP_LABEL, e.to_string()))?;

        if response.status != EXPECTED_STATUS {
            return Err(RoutingError::transformation(
                STEP_LABEL,
                format!(
                    "unexpected status {} from {target}, expected {EXPECTED_STATUS}",
                    response.status
                ),
            ));
        }

        Ok(event.with_payload(response.body))
    }
}

// 占位符以固定值代入后必须是带 host 的 http(s) 绝对地址
fn is_interpolable_http_url(template: &str) -> bool {
    let Ok(sample) = interpolate(template, |_| Some("placeholder".to_string())) else {
        return false;
    };
    match Url::parse(&sample) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}
