//! HTTP 网关协议（HttpGateway）
//!
//! REST 转换步骤与 HTTP 推送发布器都通过该协议发起请求，
//! 领域层不绑定具体 HTTP 客户端实现。
//!
use crate::error::RoutingResult as Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            _ => None,
        }
    }
}

/// Basic 认证凭据；Debug 输出不包含密码
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub credentials: Option<BasicCredentials>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            credentials: None,
        }
    }

    /// 以 JSON 内容类型携带请求体
    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(body.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(BasicCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP 网关：发起一次请求并返回状态码与响应体。
/// 仅传输层失败返回错误，非 2xx 状态码由调用方自行判断。
#[async_trait]
pub trait HttpGateway: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;
}
