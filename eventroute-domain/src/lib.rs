//! 事件路由领域层（eventroute-domain）
//!
//! 对每一个入站事件，找出与其来源地址匹配的路由，逐条执行：
//! - 地址与 channel 预过滤（`route`、`value_object`）
//! - 基于负载的过滤表达式（`eventing::filter`）
//! - 可选的有序转换步骤，如调用外部 REST 服务改写负载（`transformation`）
//! - 按出站地址 scheme 选择发布器投递（`eventing::publisher`）
//!
//! 编排由 `eventing::RouteEngine` 完成，异步执行与并发上限由 `eventing::RoutingWorkerPool` 提供。
//! 本 crate 只定义模型与协议（仓储、求值器、HTTP 网关、发布器），具体实现由应用层提供。
//!
//! 典型用法：
//! 1. 实现或选用 `RouteStore`、`ExpressionEvaluator`、`HttpGateway` 与若干 `Publisher`；
//! 2. 通过 `RouteEngine::builder()` 组装引擎；
//! 3. 将引擎交给 `RoutingWorkerPool`，对每个入站事件调用 `submit`。
//!
pub mod error;
pub mod event;
pub mod eventing;
pub mod http;
pub mod route;
pub mod transformation;
pub mod value_object;
