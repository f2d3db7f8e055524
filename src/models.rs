use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One scraped post, normalized. Every field is optional because the
/// scraper omits whatever it could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Post {
    pub text: Option<String>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub shares: Option<i64>,
}

impl Post {
    /// Pull the four known fields out of a raw dataset item. Missing keys,
    /// nulls and values of the wrong type all come out as `None`.
    pub fn from_item(item: &Value) -> Self {
        Post {
            text: item.get("text").and_then(Value::as_str).map(str::to_string),
            likes: item.get("likes").and_then(Value::as_i64),
            comments: item.get("comments").and_then(Value::as_i64),
            shares: item.get("shares").and_then(Value::as_i64),
        }
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Everything the user sees and edits during one session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub posts: Vec<Post>,
    pub suggested_subject: String,
    pub new_post: String,
}
