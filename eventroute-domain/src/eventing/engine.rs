//! 路由执行引擎（RouteEngine）
//!
//! 对一个入站事件编排“候选路由查询 → channel 预过滤 → 表达式过滤 → 转换 → 投递”：
//! - 候选路由按仓储返回顺序逐条串行处理；
//! - 单条路由的失败只记录在该路由的结果中，不影响其它路由；
//! - 仓储查询失败时整体放弃本次执行，返回空结果。
//!
use super::{FilterEvaluator, Publisher, PublisherRegistry, RouteStore};
use crate::error::RoutingError;
use crate::event::Event;
use crate::route::{Route, RouteId};
use crate::transformation::TransformationPipeline;
use crate::value_object::Address;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

// 导入由 bon::Builder 生成的 typestate 模块与状态转换别名
use self::route_engine_builder::{IsUnset, SetRegistry, State as BuilderState};

/// RouteEngine：
/// - 从 RouteStore 拉取候选路由
/// - 逐条路由执行过滤、转换并通过 PublisherRegistry 投递
#[derive(Builder)]
pub struct RouteEngine {
    route_store: Arc<dyn RouteStore>,
    filter: FilterEvaluator,
    pipeline: TransformationPipeline,
    #[builder(setters(vis = "pub(crate)"))]
    registry: PublisherRegistry,
    #[builder(default)]
    config: EngineConfig,
}

impl<S: BuilderState> RouteEngineBuilder<S> {
    /// 以发布器列表构建注册表（按各自声明的 scheme）
    pub fn publishers(self, publishers: Vec<Arc<dyn Publisher>>) -> RouteEngineBuilder<SetRegistry<S>>
    where
        <S as BuilderState>::Registry: IsUnset,
    {
        self.registry(PublisherRegistry::new(publishers))
    }

    pub fn publisher_registry(
        self,
        registry: PublisherRegistry,
    ) -> RouteEngineBuilder<SetRegistry<S>>
    where
        <S as BuilderState>::Registry: IsUnset,
    {
        self.registry(registry)
    }
}

impl RouteEngine {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行路由，返回实际产出的事件（按路由顺序）
    pub async fn execute(&self, event: &Event, source: &Address) -> Vec<Event> {
        self.run(event, source).await.into_events()
    }

    /// 执行路由，返回每条候选路由的处理结果
    #[tracing::instrument(skip_all, fields(source = %source, channel = %event.channel()))]
    pub async fn run(&self, event: &Event, source: &Address) -> ExecutionReport {
        let routes = match self.route_store.find_by_incoming_address(source).await {
            Ok(routes) => routes,
            Err(err) => {
                error!(error = %err, "route lookup failed, event not routed");
                return ExecutionReport::aborted(err);
            }
        };

        let mut report = ExecutionReport::with_capacity(routes.len());
        for route in &routes {
            let outcome = self.process(route, event).await;
            log_outcome(route, &outcome);
            report.push(route, outcome);
        }
        report
    }

    async fn process(&self, route: &Route, event: &Event) -> RouteOutcome {
        if !route.is_active() {
            return RouteOutcome::Skipped(SkipReason::Inactive);
        }
        if !route.accepts_channel(event.channel()) {
            return RouteOutcome::Skipped(SkipReason::ChannelMismatch);
        }

        match self.filter.matches(event, route.filter_expression()).await {
            Ok(true) => {}
            Ok(false) => return RouteOutcome::Skipped(SkipReason::FilterMismatch),
            Err(err) => return RouteOutcome::Failed(err),
        }

        let outgoing = match route.transformation() {
            Some(t) => match self.pipeline.try_apply(event, t).await {
                Ok(transformed) => transformed,
                Err(err) => return RouteOutcome::Failed(err),
            },
            None => event.clone(),
        };

        let destination = route.outgoing();
        let publisher = match self.registry.resolve(destination.scheme()) {
            Ok(p) => p,
            Err(err) => return RouteOutcome::Failed(err),
        };

        let publish_error = publisher
            .send(&outgoing, destination)
            .await
            .err()
            .map(|e| RoutingError::Publish {
                scheme: destination.scheme().to_string(),
                reason: format!("{e:#}"),
            });

        RouteOutcome::Dispatched {
            event: outgoing,
            publish_error,
        }
    }
}

fn log_outcome(route: &Route, outcome: &RouteOutcome) {
    let id = route.id().as_str();
    let name = route.name();
    match outcome {
        RouteOutcome::Dispatched {
            publish_error: None,
            ..
        } => debug!(route.id = id, route.name = name, to = %route.outgoing(), "event dispatched"),
        RouteOutcome::Dispatched {
            publish_error: Some(err),
            ..
        } => warn!(route.id = id, route.name = name, error = %err, "event produced but publish failed"),
        RouteOutcome::Skipped(SkipReason::Inactive) => {}
        RouteOutcome::Skipped(reason) => {
            debug!(route.id = id, route.name = name, ?reason, filter = route.filter_expression(), "route dropped")
        }
        RouteOutcome::Failed(err) => {
            warn!(route.id = id, route.name = name, error = %err, "route failed, continuing with next")
        }
    }
}

/// 路由被跳过的原因（非错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    ChannelMismatch,
    FilterMismatch,
}

/// 单条路由的处理结果
#[derive(Debug)]
pub enum RouteOutcome {
    /// 已交给发布器；发布失败不影响事件被视为已产出
    Dispatched {
        event: Event,
        publish_error: Option<RoutingError>,
    },
    Skipped(SkipReason),
    /// 路由级失败：求值、转换或未知 scheme
    Failed(RoutingError),
}

impl RouteOutcome {
    pub fn produced(&self) -> Option<&Event> {
        match self {
            Self::Dispatched { event, .. } => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct RouteReport {
    pub route_id: RouteId,
    pub route_name: String,
    pub outcome: RouteOutcome,
}

/// 一次执行的完整结果
#[derive(Debug, Default)]
pub struct ExecutionReport {
    store_error: Option<RoutingError>,
    routes: Vec<RouteReport>,
}

impl ExecutionReport {
    fn with_capacity(n: usize) -> Self {
        Self {
            store_error: None,
            routes: Vec::with_capacity(n),
        }
    }

    fn aborted(err: RoutingError) -> Self {
        Self {
            store_error: Some(err),
            routes: Vec::new(),
        }
    }

    fn push(&mut self, route: &Route, outcome: RouteOutcome) {
        self.routes.push(RouteReport {
            route_id: route.id().clone(),
            route_name: route.name().to_string(),
            outcome,
        });
    }

    pub fn store_error(&self) -> Option<&RoutingError> {
        self.store_error.as_ref()
    }

    pub fn routes(&self) -> &[RouteReport] {
        &self.routes
    }

    pub fn outcome_of(&self, id: &RouteId) -> Option<&RouteOutcome> {
        self.routes
            .iter()
            .find(|r| &r.route_id == id)
            .map(|r| &r.outcome)
    }

    pub fn produced(&self) -> Vec<&Event> {
        self.routes.iter().filter_map(|r| r.outcome.produced()).collect()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.routes
            .into_iter()
            .filter_map(|r| match r.outcome {
                RouteOutcome::Dispatched { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }
}

/// 引擎配置
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 同时执行的路由调用上限（工作池大小）
    pub worker_pool_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 16,
        }
    }
}
