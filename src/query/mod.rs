//! Thin query/mutation layer over [`ApiClient`].
//!
//! Reads go through a [`QueryCache`]; mutations invalidate the cache of the
//! resource they touched and come back as explicit outcomes that carry the
//! [`Notice`] the presentation layer should show.

pub mod cache;
pub mod notice;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::client::decode;
use crate::api::{
    ApiClient, Faction, FactionFilter, FactionUpdate, Geometry, GeometryFilter, GeometryUpdate, NewFaction,
    NewGeometry, NewUser, Region, RegionFilter, User, UserFilter, UserUpdate,
};
use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};

pub use cache::{QueryCache, Resource, Ticket};
pub use notice::{failure_message, success_message, Notice, NoticeLevel, Operation};

/// A mutation that went through.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutated<T> {
    pub value: T,
    pub notice: Notice,
}

/// A mutation that did not. The notice carries the backend's message when it sent one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{notice}: {error}")]
pub struct MutationFailed {
    pub error: AdminError,
    pub notice: Notice,
}

pub type MutationResult<T> = Result<Mutated<T>, MutationFailed>;

fn params_of<P: Serialize + ?Sized>(p: &P) -> AdminResult<String> {
    serde_json::to_string(p).map_err(|e| AdminError::malformed(format!("cannot serialize query params: {}", e)))
}

#[derive(Clone)]
pub struct QueryClient {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl QueryClient {
    pub fn new(api: ApiClient, stale_time: Duration) -> Self {
        Self { api, cache: Arc::new(QueryCache::new(stale_time)) }
    }

    pub fn from_config(api: ApiClient, config: &AdminConfig) -> Self {
        Self::new(api, config.query_stale_time())
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn invalidate(&self, resource: Resource) -> usize {
        self.cache.invalidate(resource)
    }

    async fn cached<T, P, F, Fut>(&self, resource: Resource, params: &P, fetch: F) -> AdminResult<T>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AdminResult<T>>,
    {
        let key = params_of(params)?;
        if let Some(hit) = self.cache.get(resource, &key) {
            return decode(resource.as_str(), hit);
        }
        let ticket = self.cache.ticket(resource, &key);
        let value = fetch().await?;
        if let Ok(v) = serde_json::to_value(&value) {
            self.cache.store(ticket, v);
        }
        Ok(value)
    }

    async fn mutate<T, Fut>(&self, resource: Resource, op: Operation, call: Fut) -> MutationResult<T>
    where
        Fut: Future<Output = AdminResult<T>>,
    {
        match call.await {
            Ok(value) => {
                let dropped = self.cache.invalidate(resource);
                info!(resource = resource.as_str(), op = op.as_str(), dropped, "mutation succeeded");
                Ok(Mutated { value, notice: Notice::success(success_message(resource, op)) })
            }
            Err(error) => {
                let message = error
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| failure_message(resource, op).to_string());
                warn!(resource = resource.as_str(), op = op.as_str(), code = error.code_str(), "mutation failed");
                Err(MutationFailed { error, notice: Notice::error(message) })
            }
        }
    }

    // reads

    pub async fn users(&self, filter: &UserFilter) -> AdminResult<Vec<User>> {
        self.cached(Resource::Users, filter, || self.api.list_users(filter)).await
    }

    pub async fn user(&self, id: &str) -> AdminResult<User> {
        self.cached(Resource::Users, &json!({ "id": id }), || self.api.get_user(id)).await
    }

    pub async fn factions(&self, filter: &FactionFilter) -> AdminResult<Vec<Faction>> {
        self.cached(Resource::Factions, filter, || self.api.list_factions(filter)).await
    }

    pub async fn faction(&self, id: &str) -> AdminResult<Faction> {
        self.cached(Resource::Factions, &json!({ "id": id }), || self.api.get_faction(id)).await
    }

    pub async fn geometries(&self, filter: &GeometryFilter) -> AdminResult<Vec<Geometry>> {
        self.cached(Resource::Geometries, filter, || self.api.list_geometries(filter)).await
    }

    pub async fn geometry(&self, id: &str) -> AdminResult<Geometry> {
        self.cached(Resource::Geometries, &json!({ "id": id }), || self.api.get_geometry(id)).await
    }

    pub async fn regions(&self, filter: &RegionFilter) -> AdminResult<Vec<Region>> {
        self.cached(Resource::Regions, filter, || self.api.list_regions(filter)).await
    }

    pub async fn region(&self, id: &str) -> AdminResult<Region> {
        self.cached(Resource::Regions, &json!({ "id": id }), || self.api.get_region(id)).await
    }

    // mutations

    pub async fn create_user(&self, draft: &NewUser) -> MutationResult<User> {
        self.mutate(Resource::Users, Operation::Create, self.api.create_user(draft)).await
    }

    pub async fn update_user(&self, id: &str, changes: &UserUpdate) -> MutationResult<User> {
        self.mutate(Resource::Users, Operation::Update, self.api.update_user(id, changes)).await
    }

    pub async fn delete_user(&self, id: &str) -> MutationResult<()> {
        self.mutate(Resource::Users, Operation::Delete, self.api.delete_user(id)).await
    }

    pub async fn create_faction(&self, draft: &NewFaction) -> MutationResult<Faction> {
        self.mutate(Resource::Factions, Operation::Create, self.api.create_faction(draft)).await
    }

    pub async fn update_faction(&self, id: &str, changes: &FactionUpdate) -> MutationResult<Faction> {
        self.mutate(Resource::Factions, Operation::Update, self.api.update_faction(id, changes)).await
    }

    pub async fn delete_faction(&self, id: &str) -> MutationResult<()> {
        self.mutate(Resource::Factions, Operation::Delete, self.api.delete_faction(id)).await
    }

    pub async fn create_geometry(&self, draft: &NewGeometry) -> MutationResult<Geometry> {
        self.mutate(Resource::Geometries, Operation::Create, self.api.create_geometry(draft)).await
    }

    pub async fn update_geometry(&self, id: &str, changes: &GeometryUpdate) -> MutationResult<Geometry> {
        self.mutate(Resource::Geometries, Operation::Update, self.api.update_geometry(id, changes)).await
    }

    pub async fn delete_geometry(&self, id: &str) -> MutationResult<()> {
        self.mutate(Resource::Geometries, Operation::Delete, self.api.delete_geometry(id)).await
    }
}
