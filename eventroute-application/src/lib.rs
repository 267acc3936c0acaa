pub mod config;
pub mod error;
pub mod expression;
pub mod http_gateway;
pub mod publishers;
pub mod route_store;
pub mod service;
pub mod telemetry;

pub use config::{LogFormat, RoutingConfig};
pub use expression::SimpleExpressionEvaluator;
pub use http_gateway::ReqwestHttpGateway;
pub use route_store::InMemoryRouteStore;
pub use service::RoutingService;
