//! Navigation side effects requested by the client.
//!
//! Session termination sends the user back to the root view, OAuth login
//! leaves for an external entry point, and an OAuth callback replaces the
//! current location with one that no longer carries tokens. How that
//! happens is up to the host, so it is injected.

use tracing::info;

/// Path of the root (unauthenticated) view
pub const ROOT_PATH: &str = "/";

pub trait Navigator: Send + Sync {
    /// Move to `location`, either an app path or an absolute URL.
    fn redirect(&self, location: &str);
}

/// Navigator for hosts without a location bar; records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, location: &str) {
        info!(location, "Navigation requested");
    }
}
