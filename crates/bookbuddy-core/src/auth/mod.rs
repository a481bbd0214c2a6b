//! Authentication: credential storage and the session lifecycle.
//!
//! This module provides:
//! - `TokenStore`: access/refresh token storage with per-key expiry, with
//!   in-memory, file and OS keychain backends
//! - `SessionManager`: login, registration, OAuth callback and logout
//! - `SessionState`: the shared signed-in user value
//!
//! Access tokens live for one hour and refresh tokens for seven days.

pub mod cookie;
pub mod credentials;
pub mod file_store;
pub mod oauth;
pub mod session;
pub mod tokens;

pub use cookie::CookiePolicy;
pub use credentials::KeyringTokenStore;
pub use file_store::FileTokenStore;
pub use session::{SessionManager, SessionState};
pub use tokens::{MemoryTokenStore, StoredToken, TokenKind, TokenStore};
