// Authentication: session tokens, the request gate, and the /api/auth endpoints

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AuthError, AuthState, AuthUser};
pub use routes::routes;
