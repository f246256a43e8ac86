//! Session and credentials handling for the admin dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod session;
mod token;

pub use principal::{Role, UserProfile};
pub use provider::{CredentialsProvider, LoginRequest, LoginResponse};
pub use session::{Session, SessionEnd, SessionManager, SessionState, SessionStore};
pub use token::jwt_expiry;
