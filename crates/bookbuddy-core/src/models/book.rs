use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::de::{deserialize_null_as_empty, deserialize_page_count, deserialize_string_or_number};
use crate::utils::{first_segment, truncate_with_ellipsis};

/// Number of description characters shown as a recommendation teaser
const SHORT_REASON_CHARS: usize = 120;

const NO_DESCRIPTION: &str = "No description available";

const DEFAULT_CATEGORY: &str = "General";

/// Rating shown when the catalog has none for a book
pub const DEFAULT_RATING: f32 = 4.5;

/// A catalog row, as returned by `/books/*` and in assistant `sources`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Book {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub book_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub author: String,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_page_count")]
    pub num_pages: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "average_rating")]
    pub rating: Option<f32>,
}

/// A normalized search result card.
///
/// The assistant's answer and citations are copied onto every card so
/// each one can surface them on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookRecommendation {
    pub id: String,
    pub title: String,
    pub author: String,
    pub short_reason: String,
    pub category: String,
    pub rating: f32,
    pub description: Option<String>,
    pub genres: Option<String>,
    pub num_pages: Option<u32>,
    pub image_url: Option<String>,
    pub answer: String,
    /// Citation label (e.g. "[1]") to book id
    pub citations: BTreeMap<String, String>,
}

/// Teaser text: the first 120 characters of the description with an
/// ellipsis, or a fixed fallback when there is no description.
pub fn short_reason(description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(d) => truncate_with_ellipsis(d, SHORT_REASON_CHARS),
        None => NO_DESCRIPTION.to_string(),
    }
}

/// Display category: the first entry of a comma-separated genre list.
pub fn category(genres: Option<&str>) -> String {
    genres
        .and_then(|g| first_segment(g, ','))
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

impl BookRecommendation {
    pub fn from_source(source: Book, answer: &str, citations: &BTreeMap<String, String>) -> Self {
        Self {
            id: source.book_id.unwrap_or_default(),
            short_reason: short_reason(source.description.as_deref()),
            category: category(source.genres.as_deref()),
            rating: source.rating.unwrap_or(DEFAULT_RATING),
            title: source.title,
            author: source.author,
            description: source.description,
            genres: source.genres,
            num_pages: source.num_pages,
            image_url: source.image_url,
            answer: answer.to_string(),
            citations: citations.clone(),
        }
    }
}

/// Identity of a book used to scope a follow-up question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBook {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub book_id: Option<String>,
}

impl ContextBook {
    pub fn from_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            book_id: None,
        }
    }

    /// `id` if set and non-empty, else `book_id`
    pub fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.book_id.as_deref().filter(|id| !id.is_empty()))
    }
}

impl From<&Book> for ContextBook {
    fn from(book: &Book) -> Self {
        Self {
            id: None,
            book_id: book.book_id.clone(),
        }
    }
}

impl From<&BookRecommendation> for ContextBook {
    fn from(book: &BookRecommendation) -> Self {
        Self {
            id: Some(book.id.clone()),
            book_id: None,
        }
    }
}

/// Book listing responses come either as a bare list or wrapped with
/// paging metadata.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BookList {
    Bare(Vec<Book>),
    Paged {
        #[serde(alias = "items")]
        books: Vec<Book>,
    },
}

impl BookList {
    pub(crate) fn into_books(self) -> Vec<Book> {
        match self {
            BookList::Bare(books) | BookList::Paged { books } => books,
        }
    }
}
