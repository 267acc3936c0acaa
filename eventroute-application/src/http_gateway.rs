use std::time::Duration;

use async_trait::async_trait;
use eventroute_domain::error::{RoutingError, RoutingResult};
use eventroute_domain::http::{HttpGateway, HttpMethod, HttpRequest, HttpResponse};
use reqwest::Method;
use tracing::debug;

use crate::error::AppResult;

/// 基于 reqwest 的 HTTP 网关
#[derive(Clone)]
pub struct ReqwestHttpGateway {
    client: reqwest::Client,
}

impl ReqwestHttpGateway {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn method(m: HttpMethod) -> Method {
    match m {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}

#[async_trait]
impl HttpGateway for ReqwestHttpGateway {
    async fn request(&self, request: HttpRequest) -> RoutingResult<HttpResponse> {
        let HttpRequest {
            method: m,
            url,
            headers,
            body,
            credentials,
        } = request;

        let mut builder = self.client.request(method(m), url.clone());
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        if let Some(c) = credentials {
            builder = builder.basic_auth(c.username, Some(c.password));
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| RoutingError::gateway(format!("{m:?} {url}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| RoutingError::gateway(format!("{m:?} {url}: reading body: {e}")))?;

        debug!(method = ?m, %url, status, "http request completed");
        Ok(HttpResponse { status, body })
    }
}
