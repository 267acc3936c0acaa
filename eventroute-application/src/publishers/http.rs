use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use eventroute_domain::event::Event;
use eventroute_domain::eventing::Publisher;
use eventroute_domain::http::{HttpGateway, HttpMethod, HttpRequest};
use eventroute_domain::transformation::interpolation::EventFields;
use eventroute_domain::value_object::{Address, REST_SCHEME};
use url::Url;

pub const URL_KEY: &str = "url";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";
pub const METHOD_KEY: &str = "method";

/// HTTP 推送发布器：出站地址 `rest://{name}`，目标 URL 与凭据取自出站元数据
pub struct HttpPushPublisher {
    http: Arc<dyn HttpGateway>,
}

impl HttpPushPublisher {
    pub fn new(http: Arc<dyn HttpGateway>) -> Self {
        Self { http }
    }

    fn build_request(event: &Event, destination: &Address) -> anyhow::Result<HttpRequest> {
        let template = destination
            .metadata_value(URL_KEY)
            .ok_or_else(|| anyhow!("no '{URL_KEY}' configured for {destination}"))?;
        let url = Url::parse(&EventFields::new(event).interpolate_url(template)?)?;

        let method = match destination.metadata_value(METHOD_KEY) {
            Some(raw) => HttpMethod::parse(raw).ok_or_else(|| anyhow!("unsupported method '{raw}'"))?,
            None => HttpMethod::Post,
        };

        let mut request = HttpRequest::new(method, url).with_json_body(event.payload());
        if let Some(username) = destination.metadata_value(USERNAME_KEY) {
            let password = destination.metadata_value(PASSWORD_KEY).unwrap_or_default();
            request = request.with_basic_auth(username, password);
        }
        Ok(request)
    }
}

#[async_trait]
impl Publisher for HttpPushPublisher {
    fn scheme(&self) -> &str {
        REST_SCHEME
    }

    async fn send(&self, event: &Event, destination: &Address) -> anyhow::Result<()> {
        let request = Self::build_request(event, destination)?;
        let url = request.url.clone();
        let resp = self.http.request(request).await?;
        if !(200..300).contains(&resp.status) {
            bail!("{url} responded with status {}: {}", resp.status, resp.body);
        }
        Ok(())
    }
}
