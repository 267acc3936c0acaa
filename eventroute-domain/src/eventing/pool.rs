use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::RouteEngine;
use crate::error::{RoutingError, RoutingResult};
use crate::event::Event;
use crate::value_object::Address;

/// 路由执行工作池：每次提交在独立任务中运行，同时执行数受 `worker_pool_size` 限制，
/// 调用方拿到句柄后可等待结果，也可直接丢弃。
#[derive(Clone)]
pub struct RoutingWorkerPool {
    engine: Arc<RouteEngine>,
    permits: Arc<Semaphore>,
    token: CancellationToken,
}

impl RoutingWorkerPool {
    pub fn new(engine: Arc<RouteEngine>) -> Self {
        let size = engine.config().worker_pool_size.max(1);
        Self {
            engine,
            permits: Arc::new(Semaphore::new(size)),
            token: CancellationToken::new(),
        }
    }

    /// 提交一次执行；未拿到工作名额前池被关闭则以 `PoolShutdown` 结束
    pub fn submit(&self, event: Event, source: Address) -> ExecutionHandle {
        let engine = self.engine.clone();
        let permits = self.permits.clone();
        let token = self.token.clone();

        let task = tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RoutingError::PoolShutdown),
                permit = permits.acquire_owned() => {
                    permit.map_err(|_| RoutingError::PoolShutdown)?
                }
            };
            Ok(engine.execute(&event, &source).await)
        });

        ExecutionHandle { task }
    }

    /// 停止接收新任务；已在执行的调用会跑完
    pub fn shutdown(&self) {
        debug!("routing worker pool shutting down");
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// 等待一批句柄，结果顺序与输入一致
    pub async fn join_all(handles: Vec<ExecutionHandle>) -> Vec<RoutingResult<Vec<Event>>> {
        futures_util::future::join_all(handles.into_iter().map(ExecutionHandle::join)).await
    }
}

/// 一次提交的执行句柄
pub struct ExecutionHandle {
    task: JoinHandle<RoutingResult<Vec<Event>>>,
}

impl ExecutionHandle {
    pub fn is_done(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> RoutingResult<Vec<Event>> {
        self.task.await.map_err(|e| RoutingError::Execution {
            reason: e.to_string(),
        })?
    }

    /// 放弃结果。已发出的投递不会回滚，执行中的路由处理继续跑完。
    pub fn cancel(self) {
        drop(self.task);
    }
}
