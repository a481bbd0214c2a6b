//! BookBuddy client core.
//!
//! Authenticated access to the BookBuddy recommendation service: token
//! storage, an HTTP client that renews expired access tokens on its own,
//! the session lifecycle and the assistant/book queries the views render.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use bookbuddy_core::{BookBuddy, Config, LogNavigator};
//!
//! let config = Config::load()?;
//! let client = BookBuddy::new(&config, BookBuddy::token_store(&config)?, Arc::new(LogNavigator))?;
//! client.session.check_session().await;
//! let books = client.books.search("space adventure", 6).await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod books;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;

pub use api::{ApiClient, ApiError, ReqwestTransport, Transport};
pub use auth::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, SessionManager, SessionState, TokenKind,
    TokenStore,
};
pub use books::BookService;
pub use config::{Config, TokenStorage};
pub use error::ClientError;
pub use navigation::{LogNavigator, Navigator};

/// A fully wired client: one shared session and API client, and the two
/// services built on them.
pub struct BookBuddy {
    pub session: SessionManager,
    pub books: BookService,
}

impl BookBuddy {
    /// Client talking to `config.api_url` over HTTP
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.api_url, config.request_timeout())?;
        Ok(Self::with_transport(&config.api_url, Arc::new(transport), tokens, navigator))
    }

    pub fn with_transport(
        api_url: &str,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let api = Arc::new(ApiClient::new(
            transport,
            tokens,
            navigator,
            Arc::new(SessionState::new()),
        ));
        Self {
            session: SessionManager::new(api.clone(), api_url),
            books: BookService::new(api),
        }
    }

    /// The token store selected by the configuration
    pub fn token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
        Ok(match config.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(config.cache_dir()?)),
            TokenStorage::Keyring => Arc::new(KeyringTokenStore::default()),
            TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}
