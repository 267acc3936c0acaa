//! 路由仓储（RouteStore）
//!
//! 负责路由的持久化与按入站地址查询候选路由；引擎每次执行都重新查询，
//! 不跨调用缓存路由，因此两次执行之间的修改会在下一个事件上生效。
//!
use crate::{error::RoutingResult as Result, route::Route, value_object::Address};
use async_trait::async_trait;

/// 路由仓储：按入站地址返回候选路由（含未激活路由，按存储顺序）
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn find_by_incoming_address(&self, address: &Address) -> Result<Vec<Route>>;
}
