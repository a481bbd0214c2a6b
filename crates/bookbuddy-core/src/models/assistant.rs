use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::book::Book;

/// Body of `/assistant/ask`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_ids: Option<Vec<String>>,
}

/// Response of `/assistant/ask`. Every part is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub citations: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub sources: Option<Vec<Book>>,
}

/// The assistant's answer to a follow-up question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FollowUpAnswer {
    pub answer: String,
    pub citations: BTreeMap<String, String>,
}
