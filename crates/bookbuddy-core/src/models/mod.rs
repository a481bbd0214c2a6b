//! Data models for the BookBuddy API.
//!
//! - `Book`: catalog rows from `/books/*` and assistant sources
//! - `BookRecommendation`: normalized search result card
//! - Assistant request/response types and `FollowUpAnswer`
//! - Auth payloads and the signed-in `User`

pub mod assistant;
pub mod auth;
pub mod book;
mod de;
pub mod user;

pub use assistant::{AskRequest, AskResponse, FollowUpAnswer};
pub use auth::{Credentials, RefreshRequest, TokenResponse};
pub use book::{category, short_reason, Book, BookRecommendation, ContextBook, DEFAULT_RATING};
pub(crate) use book::BookList;
pub use user::User;
