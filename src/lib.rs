//! Client side of the faction/territory mapping admin dashboard: session
//! lifecycle, an authenticated REST client with typed resource records, a
//! cached query/mutation layer, and a terminal front end.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod query;
pub mod validation;

pub use api::ApiClient;
pub use config::{AdminConfig, ExecutionContext};
pub use error::{AdminError, AdminResult, AuthFailure};
pub use identity::{Session, SessionEnd, SessionManager, SessionState, SessionStore};
pub use query::{MutationFailed, Mutated, Notice, QueryClient};
