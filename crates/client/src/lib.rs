// FitSync client
//
// Session-aware client for the FitSync API, the part of the mobile app that
// keeps a user signed in across restarts.
//
// Key design decisions:
// - The session (token + user summary) lives in a SessionClient, not in globals
// - Token and user summary are persisted together under two fixed keys
// - A 401 from the server clears the session, except on the auth endpoints,
//   the profile fetch, and shortly after a fresh login
// - Network errors and timeouts are retried; server rejections never are

pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod transport;

pub use config::{ClientConfig, RetryPolicy};
pub use error::ClientError;
pub use session::{Session, SessionClient, SessionStatus};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
pub use transport::ApiClient;
