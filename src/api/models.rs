//! Typed records for every backend resource the dashboard touches.
//!
//! Deserialization is lenient about extra fields and about ids arriving as
//! numbers or strings; it is strict about the fields each record needs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::identity::Role;

pub type RecordId = String;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Uint(u64),
}

impl From<RawId> for String {
    fn from(r: RawId) -> Self {
        match r {
            RawId::Text(s) => s,
            RawId::Int(i) => i.to_string(),
            RawId::Uint(u) => u.to_string(),
        }
    }
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(d).map(|o| o.map(String::from))
}

fn yes() -> bool { true }

/// List endpoints answer either with a bare array or with `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(v) => v,
            Listing::Wrapped { data } => data,
        }
    }
}

// --- users ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// --- factions ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    pub name: String,
    pub acronym: String,
    pub color_hex: String,
    #[serde(default)]
    pub display_priority: i32,
    #[serde(default = "yes")]
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFaction {
    pub name: String,
    pub acronym: String,
    pub color_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    pub display_priority: i32,
}

impl NewFaction {
    /// Draft with the dialog defaults: active, red, priority 1.
    pub fn new(name: impl Into<String>, acronym: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            acronym: acronym.into(),
            color_hex: "#ff0000".to_string(),
            description: None,
            active: true,
            display_priority: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acronym: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_priority: Option<i32>,
}

// --- geometries & regions ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryStatus {
    #[default]
    Draft,
    Review,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub region_id: Option<RecordId>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub faction_id: Option<RecordId>,
    pub geojson: Value,
    pub geometry_type: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub status: GeometryStatus,
    #[serde(default)]
    pub validity_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validity_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub author_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGeometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<RecordId>,
    pub geojson: Value,
    pub geometry_type: String,
    pub risk_level: RiskLevel,
    pub status: GeometryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeometryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GeometryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(deserialize_with = "de_id")]
    pub id: RecordId,
    pub name: String,
    /// neighborhood, zone or custom
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: GeometryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "ok" | "healthy" | "up")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let f: Faction = serde_json::from_value(json!({
            "id": 7, "name": "Primeiro", "acronym": "P1", "color_hex": "#00ff00"
        })).unwrap();
        assert_eq!(f.id, "7");
        assert!(f.active, "active defaults to true like the backend");
        assert_eq!(f.display_priority, 0);

        let g: Geometry = serde_json::from_value(json!({
            "id": "3f6c", "faction_id": 12, "region_id": null,
            "geojson": {"type": "Polygon", "coordinates": []},
            "geometry_type": "polygon", "risk_level": "high"
        })).unwrap();
        assert_eq!(g.faction_id.as_deref(), Some("12"));
        assert!(g.region_id.is_none());
        assert_eq!(g.risk_level, RiskLevel::High);
        assert_eq!(g.status, GeometryStatus::Draft);
    }

    #[test]
    fn listing_accepts_wrapped_and_bare() {
        let wrapped: Listing<Region> = serde_json::from_value(json!({
            "data": [{"id": "r1", "name": "Centro", "type": "neighborhood", "municipality": "Fortaleza", "state": "CE"}]
        })).unwrap();
        let v = wrapped.into_vec();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, "neighborhood");

        let bare: Listing<Region> = serde_json::from_value(json!([])).unwrap();
        assert!(bare.into_vec().is_empty());
    }

    #[test]
    fn updates_only_send_present_fields() {
        let u = FactionUpdate { active: Some(false), ..Default::default() };
        assert_eq!(serde_json::to_value(&u).unwrap(), json!({"active": false}));
    }

    #[test]
    fn new_faction_wire_shape() {
        let d = NewFaction { color_hex: "#FF0000".into(), ..NewFaction::new("X", "X") };
        assert_eq!(serde_json::to_value(&d).unwrap(), json!({
            "name": "X", "acronym": "X", "color_hex": "#FF0000", "active": true, "display_priority": 1
        }));
    }

    #[test]
    fn new_user_debug_hides_password() {
        let u = NewUser { name: "A".into(), email: "a@b.com".into(), password: "hunter22".into(), role: Role::new("admin") };
        assert!(!format!("{:?}", u).contains("hunter22"));
    }

    #[test]
    fn health_keeps_extra_fields() {
        let h: HealthStatus = serde_json::from_value(json!({"status": "ok", "database": "up"})).unwrap();
        assert!(h.is_healthy());
        assert_eq!(h.details.get("database"), Some(&json!("up")));
    }
}
