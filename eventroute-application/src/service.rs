use std::sync::Arc;

use eventroute_domain::event::Event;
use eventroute_domain::eventing::{
    ExecutionHandle, FilterEvaluator, Publisher, RouteEngine, RouteStore, RoutingWorkerPool,
};
use eventroute_domain::http::HttpGateway;
use eventroute_domain::transformation::TransformationPipeline;
use eventroute_domain::value_object::Address;
use tracing::info;

use crate::config::RoutingConfig;
use crate::error::AppResult;
use crate::expression::SimpleExpressionEvaluator;
use crate::http_gateway::ReqwestHttpGateway;

/// 路由服务：组装引擎与工作池，对外提供提交入口
pub struct RoutingService {
    engine: Arc<RouteEngine>,
    pool: RoutingWorkerPool,
}

impl RoutingService {
    /// 使用 reqwest 网关与内置表达式求值器
    pub fn new(
        config: &RoutingConfig,
        store: Arc<dyn RouteStore>,
        publishers: Vec<Arc<dyn Publisher>>,
    ) -> AppResult<Self> {
        let http = Arc::new(ReqwestHttpGateway::new(config.http_timeout())?);
        Ok(Self::with_gateway(config, store, http, publishers))
    }

    pub fn with_gateway(
        config: &RoutingConfig,
        store: Arc<dyn RouteStore>,
        http: Arc<dyn HttpGateway>,
        publishers: Vec<Arc<dyn Publisher>>,
    ) -> Self {
        let engine = Arc::new(
            RouteEngine::builder()
                .route_store(store)
                .filter(FilterEvaluator::new(Arc::new(SimpleExpressionEvaluator::new())))
                .pipeline(TransformationPipeline::new(http))
                .publishers(publishers)
                .config(config.engine_config())
                .build(),
        );
        let pool = RoutingWorkerPool::new(engine.clone());
        info!(
            worker_pool_size = engine.config().worker_pool_size,
            "routing service ready"
        );
        Self { engine, pool }
    }

    /// 异步提交，立即返回句柄
    pub fn submit(&self, event: Event, source: Address) -> ExecutionHandle {
        self.pool.submit(event, source)
    }

    /// 在当前任务中同步执行（不经过工作池）
    pub async fn execute(&self, event: &Event, source: &Address) -> Vec<Event> {
        self.engine.execute(event, source).await
    }

    pub fn engine(&self) -> &Arc<RouteEngine> {
        &self.engine
    }

    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
