use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use eventroute_domain::error::RoutingResult;
use eventroute_domain::eventing::RouteStore;
use eventroute_domain::route::{Route, RouteId};
use eventroute_domain::value_object::Address;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 基于内存的路由仓储
/// - 以入站地址的 scheme+path 为键，同一键下保持注册顺序
/// - 查询返回快照（克隆），之后的修改对下一次查询可见
#[derive(Default)]
pub struct InMemoryRouteStore {
    by_endpoint: DashMap<String, Vec<Route>>,
    endpoint_of: DashMap<RouteId, String>,
}

fn endpoint_key(address: &Address) -> String {
    format!("{}://{}", address.scheme(), address.path())
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 JSON 数组初始化，例如配置文件中的路由定义
    pub fn from_json(json: &str) -> AppResult<Self> {
        let routes: Vec<Route> = serde_json::from_str(json)?;
        let store = Self::new();
        for route in routes {
            store.register(route)?;
        }
        Ok(store)
    }

    pub fn register(&self, route: Route) -> AppResult<()> {
        let key = endpoint_key(route.incoming());
        match self.endpoint_of.entry(route.id().clone()) {
            Entry::Occupied(e) => {
                return Err(AppError::RouteAlreadyRegistered(e.key().to_string()));
            }
            Entry::Vacant(e) => {
                e.insert(key.clone());
            }
        }
        debug!(route.id = %route.id(), endpoint = %key, "route registered");
        self.by_endpoint.entry(key).or_default().push(route);
        Ok(())
    }

    /// 替换同 id 的路由；入站地址不变时保留原有位置
    pub fn update(&self, route: Route) -> AppResult<()> {
        let new_key = endpoint_key(route.incoming());
        let old_key = self
            .endpoint_of
            .get(route.id())
            .map(|k| k.value().clone())
            .ok_or_else(|| AppError::RouteNotFound(route.id().to_string()))?;

        if old_key == new_key {
            let mut routes = self
                .by_endpoint
                .get_mut(&old_key)
                .ok_or_else(|| AppError::RouteNotFound(route.id().to_string()))?;
            let slot = routes
                .iter_mut()
                .find(|r| r.id() == route.id())
                .ok_or_else(|| AppError::RouteNotFound(route.id().to_string()))?;
            *slot = route;
            return Ok(());
        }

        self.detach(&old_key, route.id());
        self.endpoint_of.insert(route.id().clone(), new_key.clone());
        self.by_endpoint.entry(new_key).or_default().push(route);
        Ok(())
    }

    pub fn remove(&self, id: &RouteId) -> AppResult<Route> {
        let (_, key) = self
            .endpoint_of
            .remove(id)
            .ok_or_else(|| AppError::RouteNotFound(id.to_string()))?;
        self.detach(&key, id)
            .ok_or_else(|| AppError::RouteNotFound(id.to_string()))
    }

    pub fn get(&self, id: &RouteId) -> Option<Route> {
        let key = self.endpoint_of.get(id)?.value().clone();
        self.by_endpoint
            .get(&key)?
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.endpoint_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint_of.is_empty()
    }

    fn detach(&self, key: &str, id: &RouteId) -> Option<Route> {
        let removed = {
            let mut routes = self.by_endpoint.get_mut(key)?;
            let pos = routes.iter().position(|r| r.id() == id)?;
            routes.remove(pos)
        };
        self.by_endpoint.remove_if(key, |_, routes| routes.is_empty());
        Some(removed)
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn find_by_incoming_address(&self, address: &Address) -> RoutingResult<Vec<Route>> {
        Ok(self
            .by_endpoint
            .get(&endpoint_key(address))
            .map(|routes| routes.clone())
            .unwrap_or_default())
    }
}
