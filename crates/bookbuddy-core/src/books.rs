//! Book lookups and assistant questions.
//!
//! Wraps the assistant and catalog endpoints and turns their responses
//! into the records the views render. Failures never escape as transport
//! errors: each operation logs the cause and returns a short
//! [`ClientError`] suitable for showing inline.

use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::{debug, error};

use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::auth::{TokenKind, TokenStore};
use crate::error::ClientError;
use crate::models::{
    AskRequest, AskResponse, Book, BookList, BookRecommendation, ContextBook, FollowUpAnswer,
};

const ASK_PATH: &str = "/assistant/ask";

/// Number of results requested by a dashboard search
pub const DEFAULT_TOP_K: usize = 6;

/// Results requested by a follow-up with no books in context
const FOLLOW_UP_DEFAULT_TOP_K: usize = 5;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

/// State of the most recent search, for views that re-render it.
#[derive(Debug, Default)]
struct SearchState {
    is_searching: bool,
    last_query: String,
    results: Vec<BookRecommendation>,
}

pub struct BookService {
    api: Arc<ApiClient>,
    search: RwLock<SearchState>,
}

impl BookService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            search: RwLock::new(SearchState::default()),
        }
    }

    /// Ask the assistant for recommendations.
    ///
    /// Each source book becomes one card; the single answer and citation
    /// map from the response are copied onto every card.
    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<BookRecommendation>, ClientError> {
        {
            let mut state = self.search.write().unwrap_or_else(|e| e.into_inner());
            state.is_searching = true;
            state.last_query = question.to_string();
        }

        let request = AskRequest {
            question,
            top_k,
            book_ids: None,
        };
        let result = self
            .api
            .get_json::<AskResponse>(ApiRequest::post(ASK_PATH, json!(request)))
            .await
            .map(recommendations_from);

        let mut state = self.search.write().unwrap_or_else(|e| e.into_inner());
        state.is_searching = false;
        match result {
            Ok(books) => {
                debug!(count = books.len(), "Search returned sources");
                state.results = books.clone();
                Ok(books)
            }
            Err(e) => {
                error!(error = %e, "Search failed");
                Err(self.boundary_error(&e, ClientError::Transient("Search failed")))
            }
        }
    }

    /// Fetch one book. Any failure, including an empty record, is "not found".
    pub async fn get_by_id(&self, book_id: &str) -> Result<Book, ClientError> {
        let request = ApiRequest::get(format!("/books/{}", encode_segment(book_id)));
        match self.api.get_json::<Book>(request).await {
            Ok(book) if book.book_id.is_some() => Ok(book),
            Ok(_) => {
                debug!(book_id, "Empty book record");
                Err(ClientError::NotFound("Book not found"))
            }
            Err(e) => {
                error!(error = %e, book_id, "Failed to fetch book");
                Err(ClientError::NotFound("Book not found"))
            }
        }
    }

    /// Ask a question scoped to the books currently in view.
    pub async fn ask_follow_up(&self, question: &str, context: &[ContextBook]) -> Result<FollowUpAnswer, ClientError> {
        let request = follow_up_request(question, context);
        match self
            .api
            .get_json::<AskResponse>(ApiRequest::post(ASK_PATH, json!(request)))
            .await
        {
            Ok(response) => Ok(FollowUpAnswer {
                answer: response.answer.unwrap_or_default(),
                citations: response.citations.unwrap_or_default(),
            }),
            Err(e) => {
                error!(error = %e, "Follow-up failed");
                Err(self.boundary_error(&e, ClientError::Transient("Failed to get answer")))
            }
        }
    }

    pub async fn list_by_genre(&self, genre: &str, page: u32, limit: u32) -> Result<Vec<Book>, ClientError> {
        let path = format!("/books/by-genre/{}", encode_segment(genre));
        self.list(path, page, limit).await
    }

    pub async fn list_books(&self, page: u32, limit: u32) -> Result<Vec<Book>, ClientError> {
        self.list("/books/".to_string(), page, limit).await
    }

    async fn list(&self, path: String, page: u32, limit: u32) -> Result<Vec<Book>, ClientError> {
        let request = ApiRequest::get(path).query("page", page).query("limit", limit);
        match self.api.get_json::<BookList>(request).await {
            Ok(list) => Ok(list.into_books()),
            Err(e) => {
                error!(error = %e, "Failed to fetch books");
                Err(self.boundary_error(&e, ClientError::Transient("Failed to fetch books")))
            }
        }
    }

    /// A 401 only means an expired session when the client has ended it;
    /// a 401 on a retry with fresh tokens gets the operation's own message.
    fn boundary_error(&self, error: &ApiError, fallback: ClientError) -> ClientError {
        if error.is_unauthorized() && !self.api.tokens().has(TokenKind::Access) {
            ClientError::SessionExpired
        } else {
            fallback
        }
    }

    pub fn is_searching(&self) -> bool {
        self.search.read().unwrap_or_else(|e| e.into_inner()).is_searching
    }

    pub fn last_query(&self) -> String {
        self.search.read().unwrap_or_else(|e| e.into_inner()).last_query.clone()
    }

    pub fn last_results(&self) -> Vec<BookRecommendation> {
        self.search.read().unwrap_or_else(|e| e.into_inner()).results.clone()
    }
}

/// Normalize an assistant response into one card per source
pub fn recommendations_from(response: AskResponse) -> Vec<BookRecommendation> {
    let answer = response.answer.unwrap_or_default();
    let citations = response.citations.unwrap_or_default();
    response
        .sources
        .unwrap_or_default()
        .into_iter()
        .map(|source| BookRecommendation::from_source(source, &answer, &citations))
        .collect()
}

/// Build a follow-up request: ids from the context books, `top_k` equal
/// to the id count (5 when there are none), `book_ids` only when non-empty.
pub fn follow_up_request<'a>(question: &'a str, context: &[ContextBook]) -> AskRequest<'a> {
    let ids: Vec<String> = context
        .iter()
        .filter_map(ContextBook::resolved_id)
        .map(str::to_string)
        .collect();
    AskRequest {
        question,
        top_k: if ids.is_empty() { FOLLOW_UP_DEFAULT_TOP_K } else { ids.len() },
        book_ids: (!ids.is_empty()).then_some(ids),
    }
}

/// Percent-encode a value for use as a single path segment
fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
