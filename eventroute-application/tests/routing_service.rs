use anyhow::Result as AnyResult;
use async_trait::async_trait;
use eventroute_application::publishers::{
    DevicePublisher, DeviceRecord, InMemoryDeviceDirectory, MessageGateway, SmsGateway,
    SmsPublisher,
};
use eventroute_application::{InMemoryRouteStore, RoutingConfig, RoutingService};
use eventroute_domain::error::{RoutingError, RoutingResult};
use eventroute_domain::event::Event;
use eventroute_domain::eventing::{Publisher, RouteOutcome};
use eventroute_domain::http::{HttpGateway, HttpRequest, HttpResponse};
use eventroute_domain::route::RouteId;
use eventroute_domain::value_object::Address;
use std::sync::{Arc, Mutex};

const ROUTES: &str = r#"[
  {
    "id": "temperature",
    "name": "temperature to dashboard",
    "incoming": {"scheme": "device", "path": "konker/sensor", "metadata": {"channel": "data"}},
    "outgoing": {"scheme": "device", "path": "konker/dashboard", "metadata": {"channel": "in"}},
    "filter_expression": "metric == 'temperature' && value > 25"
  },
  {
    "id": "humidity",
    "name": "humidity to dashboard",
    "incoming": {"scheme": "device", "path": "konker/sensor", "metadata": {"channel": "data"}},
    "outgoing": {"scheme": "device", "path": "konker/dashboard", "metadata": {"channel": "humidity"}},
    "filter_expression": "metric == 'humidity'"
  },
  {
    "id": "malformed",
    "name": "broken filter",
    "incoming": {"scheme": "device", "path": "konker/sensor", "metadata": {"channel": "data"}},
    "outgoing": {"scheme": "device", "path": "konker/dashboard", "metadata": {"channel": "in"}},
    "filter_expression": "command.type =="
  },
  {
    "id": "alert",
    "name": "enriched sms alert",
    "incoming": {"scheme": "device", "path": "konker/sensor", "metadata": {"channel": "data"}},
    "outgoing": {"scheme": "sms", "path": "+5511999990000", "metadata": {"template": "@{city}: @{metric} alert"}},
    "filter_expression": "value > 40",
    "transformation": {"steps": [
      {"kind": "REST", "attributes": {"url": "http://geo.local/@{deviceId}", "username": "geo", "password": "pw"}}
    ]}
  },
  {
    "id": "lost",
    "name": "to unknown device",
    "incoming": {"scheme": "device", "path": "konker/sensor", "metadata": {"channel": "data"}},
    "outgoing": {"scheme": "device", "path": "konker/ghost", "metadata": {"channel": "in"}},
    "filter_expression": "metric == 'pressure'"
  }
]"#;

#[derive(Default)]
struct Mqtt {
    sent: Mutex<Vec<(String, String)>>,
}
#[async_trait]
impl MessageGateway for Mqtt {
    async fn send(&self, payload: &str, topic: &str) -> AnyResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct Sms {
    sent: Mutex<Vec<(String, String)>>,
}
#[async_trait]
impl SmsGateway for Sms {
    async fn send(&self, to: &str, text: &str) -> AnyResult<()> {
        self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// 将负载改写为带城市信息的文档
struct Geo;
#[async_trait]
impl HttpGateway for Geo {
    async fn request(&self, request: HttpRequest) -> RoutingResult<HttpResponse> {
        if request.url.path() != "/sensor" {
            return Err(RoutingError::gateway(format!("unexpected url {}", request.url)));
        }
        let mut doc: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap_or("{}"))?;
        doc["city"] = "Sao Paulo".into();
        Ok(HttpResponse {
            status: 200,
            body: doc.to_string(),
        })
    }
}

struct Harness {
    service: RoutingService,
    mqtt: Arc<Mqtt>,
    sms: Arc<Sms>,
}

fn harness() -> AnyResult<Harness> {
    let store = Arc::new(InMemoryRouteStore::from_json(ROUTES)?);
    let devices = Arc::new(InMemoryDeviceDirectory::new());
    devices.upsert(DeviceRecord {
        tenant: "konker".into(),
        device_id: "dashboard".into(),
        active: true,
    });
    let mqtt = Arc::new(Mqtt::default());
    let sms = Arc::new(Sms::default());
    let config = RoutingConfig::default();

    let publishers: Vec<Arc<dyn Publisher>> = vec![
        Arc::new(DevicePublisher::new(devices, mqtt.clone(), &config.mqtt_topic_prefix)),
        Arc::new(SmsPublisher::new(sms.clone())),
    ];
    let service = RoutingService::with_gateway(&config, store, Arc::new(Geo), publishers);
    Ok(Harness { service, mqtt, sms })
}

fn sensor() -> Address {
    Address::device("konker", "sensor").unwrap()
}

#[tokio::test]
async fn temperature_reading_reaches_only_matching_routes() -> AnyResult<()> {
    let h = harness()?;
    let event = Event::new("data", r#"{"deviceId":"sensor","metric":"temperature","value":30}"#);

    let out = h.service.submit(event.clone(), sensor()).join().await?;

    assert_eq!(out, vec![event.clone()]);
    assert_eq!(
        *h.mqtt.sent.lock().unwrap(),
        vec![("iot/dashboard/in".to_string(), event.payload().to_string())]
    );
    assert!(h.sms.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn hot_reading_is_enriched_before_sms() -> AnyResult<()> {
    let h = harness()?;
    let event = Event::new("data", r#"{"deviceId":"sensor","metric":"temperature","value":45}"#);

    let report = h.service.engine().run(&event, &sensor()).await;

    let alert = report
        .outcome_of(&RouteId::new("alert"))
        .and_then(RouteOutcome::produced)
        .expect("alert route produced an event");
    let enriched: serde_json::Value = serde_json::from_str(alert.payload())?;
    assert_eq!(enriched["city"], "Sao Paulo");
    assert_eq!(alert.channel(), "data");

    assert_eq!(
        *h.sms.sent.lock().unwrap(),
        vec![("+5511999990000".to_string(), "Sao Paulo: temperature alert".to_string())]
    );
    assert!(matches!(
        report.outcome_of(&RouteId::new("malformed")),
        Some(RouteOutcome::Failed(RoutingError::Evaluation { .. }))
    ));
    assert_eq!(report.produced().len(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_device_still_counts_as_produced() -> AnyResult<()> {
    let h = harness()?;
    let event = Event::new("data", r#"{"metric":"pressure","value":1}"#);

    let report = h.service.engine().run(&event, &sensor()).await;
    match report.outcome_of(&RouteId::new("lost")) {
        Some(RouteOutcome::Dispatched {
            publish_error: Some(err),
            ..
        }) => assert!(err.to_string().contains("Device is unknown"), "{err}"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(h.mqtt.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn other_channels_and_sources_produce_nothing() -> AnyResult<()> {
    let h = harness()?;
    let event = Event::new("command", r#"{"metric":"temperature","value":30}"#);
    assert!(h.service.execute(&event, &sensor()).await.is_empty());

    let stranger = Address::device("konker", "stranger")?;
    let event = Event::new("data", r#"{"metric":"temperature","value":30}"#);
    assert!(h.service.execute(&event, &stranger).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn shutdown_rejects_new_submissions() -> AnyResult<()> {
    let h = harness()?;
    h.service.shutdown();
    let result = h
        .service
        .submit(Event::new("data", "{}"), sensor())
        .join()
        .await;
    assert!(matches!(result, Err(RoutingError::PoolShutdown)));
    Ok(())
}
