use serde::{Deserialize, Serialize};

/// The signed-in user as returned by `/users/me`.
///
/// The backend currently returns only the email; anything else it adds is
/// kept in `extra` for the profile view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.extra
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Reader")
    }
}
