//! REST surface of the dashboard backend: the authenticated client, its
//! per-resource methods, typed records and list filters.

pub mod client;
pub mod filters;
pub mod models;
mod resources;

pub use client::ApiClient;
pub use filters::{FactionFilter, GeometryFilter, RegionFilter, UserFilter};
pub use models::{
    Faction, FactionUpdate, Geometry, GeometryStatus, GeometryUpdate, HealthStatus, Listing, NewFaction,
    NewGeometry, NewUser, RecordId, Region, RiskLevel, User, UserUpdate,
};
