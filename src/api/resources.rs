//! One method per backend resource, uniform verbs: list, get, create, update, delete.
//! Drafts are validated before anything goes on the wire.

use reqwest::Method;

use crate::error::AdminResult;
use crate::identity::{LoginRequest, LoginResponse, UserProfile};
use crate::validation::Validate;

use super::client::ApiClient;
use super::filters::{FactionFilter, GeometryFilter, RegionFilter, UserFilter};
use super::models::{
    Faction, FactionUpdate, Geometry, GeometryUpdate, HealthStatus, Listing, NewFaction, NewGeometry, NewUser,
    Region, User, UserUpdate,
};

fn item_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

impl ApiClient {
    // auth

    /// Raw credentials exchange through the resource client. A success does not establish a
    /// session; a 401 still ends the current one, like any other call.
    pub async fn login(&self, req: &LoginRequest) -> AdminResult<LoginResponse> {
        self.fetch(self.request(Method::POST, "/auth/login").json(req)).await
    }

    pub async fn me(&self) -> AdminResult<UserProfile> {
        self.fetch(self.request(Method::GET, "/auth/me")).await
    }

    // users

    pub async fn list_users(&self, filter: &UserFilter) -> AdminResult<Vec<User>> {
        let listing: Listing<User> = self.fetch(self.request(Method::GET, "/users").query(filter)).await?;
        Ok(listing.into_vec())
    }

    pub async fn get_user(&self, id: &str) -> AdminResult<User> {
        self.fetch(self.request(Method::GET, &item_path("/users", id))).await
    }

    pub async fn create_user(&self, draft: &NewUser) -> AdminResult<User> {
        draft.validate()?;
        self.fetch(self.request(Method::POST, "/users").json(draft)).await
    }

    pub async fn update_user(&self, id: &str, changes: &UserUpdate) -> AdminResult<User> {
        changes.validate()?;
        self.fetch(self.request(Method::PUT, &item_path("/users", id)).json(changes)).await
    }

    pub async fn delete_user(&self, id: &str) -> AdminResult<()> {
        self.discard(self.request(Method::DELETE, &item_path("/users", id))).await
    }

    // factions

    pub async fn list_factions(&self, filter: &FactionFilter) -> AdminResult<Vec<Faction>> {
        let listing: Listing<Faction> = self.fetch(self.request(Method::GET, "/factions").query(filter)).await?;
        Ok(listing.into_vec())
    }

    pub async fn get_faction(&self, id: &str) -> AdminResult<Faction> {
        self.fetch(self.request(Method::GET, &item_path("/factions", id))).await
    }

    pub async fn create_faction(&self, draft: &NewFaction) -> AdminResult<Faction> {
        draft.validate()?;
        self.fetch(self.request(Method::POST, "/factions").json(draft)).await
    }

    pub async fn update_faction(&self, id: &str, changes: &FactionUpdate) -> AdminResult<Faction> {
        changes.validate()?;
        self.fetch(self.request(Method::PUT, &item_path("/factions", id)).json(changes)).await
    }

    pub async fn delete_faction(&self, id: &str) -> AdminResult<()> {
        self.discard(self.request(Method::DELETE, &item_path("/factions", id))).await
    }

    // geometries

    pub async fn list_geometries(&self, filter: &GeometryFilter) -> AdminResult<Vec<Geometry>> {
        let listing: Listing<Geometry> = self.fetch(self.request(Method::GET, "/geometries").query(filter)).await?;
        Ok(listing.into_vec())
    }

    pub async fn get_geometry(&self, id: &str) -> AdminResult<Geometry> {
        self.fetch(self.request(Method::GET, &item_path("/geometries", id))).await
    }

    pub async fn create_geometry(&self, draft: &NewGeometry) -> AdminResult<Geometry> {
        draft.validate()?;
        self.fetch(self.request(Method::POST, "/geometries").json(draft)).await
    }

    pub async fn update_geometry(&self, id: &str, changes: &GeometryUpdate) -> AdminResult<Geometry> {
        changes.validate()?;
        self.fetch(self.request(Method::PUT, &item_path("/geometries", id)).json(changes)).await
    }

    pub async fn delete_geometry(&self, id: &str) -> AdminResult<()> {
        self.discard(self.request(Method::DELETE, &item_path("/geometries", id))).await
    }

    // regions

    pub async fn list_regions(&self, filter: &RegionFilter) -> AdminResult<Vec<Region>> {
        let listing: Listing<Region> = self.fetch(self.request(Method::GET, "/regions").query(filter)).await?;
        Ok(listing.into_vec())
    }

    pub async fn get_region(&self, id: &str) -> AdminResult<Region> {
        self.fetch(self.request(Method::GET, &item_path("/regions", id))).await
    }

    // health

    pub async fn health(&self) -> AdminResult<HealthStatus> {
        self.fetch(self.request(Method::GET, "/health")).await
    }
}
