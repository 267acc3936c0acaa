use std::sync::Arc;

use async_trait::async_trait;
use eventroute_domain::event::Event;
use eventroute_domain::eventing::Publisher;
use eventroute_domain::transformation::interpolation::EventFields;
use eventroute_domain::value_object::{Address, SMS_SCHEME};

/// 出站元数据中的短信模板键，支持 `@{...}` 占位符
pub const TEMPLATE_KEY: &str = "template";

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> anyhow::Result<()>;
}

/// 短信发布器：出站地址 `sms://{phoneNumber}`
pub struct SmsPublisher {
    gateway: Arc<dyn SmsGateway>,
}

impl SmsPublisher {
    pub fn new(gateway: Arc<dyn SmsGateway>) -> Self {
        Self { gateway }
    }

    fn render(event: &Event, destination: &Address) -> anyhow::Result<String> {
        match destination.metadata_value(TEMPLATE_KEY) {
            Some(template) => Ok(EventFields::new(event).interpolate(template)?),
            None => Ok(event.payload().to_string()),
        }
    }
}

#[async_trait]
impl Publisher for SmsPublisher {
    fn scheme(&self) -> &str {
        SMS_SCHEME
    }

    async fn send(&self, event: &Event, destination: &Address) -> anyhow::Result<()> {
        let text = Self::render(event, destination)?;
        self.gateway.send(destination.path(), &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct SpySms {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsGateway for SpySms {
        async fn send(&self, to: &str, text: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((to.into(), text.into()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn sends_payload_or_rendered_template() {
        let spy = Arc::new(SpySms::default());
        let publisher = SmsPublisher::new(spy.clone());
        let event = Event::new("data", r#"{"metric":"temperature","value":30}"#);

        let plain = Address::sms("+5511999990000").unwrap();
        publisher.send(&event, &plain).await.unwrap();

        let templated = plain
            .clone()
            .with_metadata(TEMPLATE_KEY, "@{metric} is @{value} on @{channel}");
        publisher.send(&event, &templated).await.unwrap();

        let sent = spy.sent.lock().unwrap();
        assert_eq!(sent[0], ("+5511999990000".to_string(), event.payload().to_string()));
        assert_eq!(sent[1].1, "temperature is 30 on data");
    }

    #[tokio::test]
    async fn unresolved_placeholder_is_not_sent() {
        let spy = Arc::new(SpySms::default());
        let publisher = SmsPublisher::new(spy.clone());
        let to = Address::sms("+5511999990000")
            .unwrap()
            .with_metadata(TEMPLATE_KEY, "@{missing}");
        assert!(publisher.send(&Event::new("data", "{}"), &to).await.is_err());
        assert!(spy.sent.lock().unwrap().is_empty());
    }
}
