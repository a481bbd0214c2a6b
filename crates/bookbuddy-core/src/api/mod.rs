//! REST API client module for the BookBuddy backend.
//!
//! This module provides the `ApiClient`, which wraps a `Transport` with
//! bearer authentication and the refresh-on-401 protocol.
//!
//! The backend issues JWT access tokens through `/auth/login` and renews
//! them through `/auth/refresh`.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
