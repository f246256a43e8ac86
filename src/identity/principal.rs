use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::models::de_id;

/// Permission class carried through the session. Opaque: nothing in the
/// client enforces it, the backend does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const MODERATOR: &'static str = "moderator";
    pub const COLLABORATOR: &'static str = "collaborator";
    pub const CITIZEN: &'static str = "citizen";

    pub fn new(s: impl Into<String>) -> Self { Role(s.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn is(&self, name: &str) -> bool { self.0.eq_ignore_ascii_case(name) }
}

// Backend default for accounts created without an explicit role.
impl Default for Role {
    fn default() -> Self { Role(Self::CITIZEN.to_string()) }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self { Role(s.to_string()) }
}

/// The `user` object of a login response, and the body of `GET /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: Option<String>,
}
