//! 事件路由（eventing）
//!
//! 提供路由执行所需的协议与编排：
//! - `RouteStore`：按入站地址查询候选路由；
//! - `FilterEvaluator`：对事件负载求值过滤表达式；
//! - `PublisherRegistry`：按出站地址 scheme 解析发布器；
//! - `RouteEngine`：编排过滤、转换与投递；
//! - `RoutingWorkerPool`：以有界并发异步执行路由，并返回可等待的句柄。
//!
//! 该模块仅定义协议与引擎，不绑定具体的存储、求值器或传输实现。
//!
pub mod engine;
pub mod filter;
#[cfg(feature = "engine")]
pub mod pool;
pub mod publisher;
pub mod store;

pub use engine::{
    EngineConfig, ExecutionReport, RouteEngine, RouteOutcome, RouteReport, SkipReason,
};
pub use filter::{Document, ExpressionEvaluator, FilterEvaluator, JsonDecoder, SerdeJsonDecoder};
#[cfg(feature = "engine")]
pub use pool::{ExecutionHandle, RoutingWorkerPool};
pub use publisher::{Publisher, PublisherRegistry};
pub use store::RouteStore;
