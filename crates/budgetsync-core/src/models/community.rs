//! Community feed models.
//!
//! The server returns posts with the author either as a bare id or populated
//! with the author's name, depending on the endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Populated {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Id(String),
}

impl AuthorRef {
    pub fn id(&self) -> &str {
        match self {
            AuthorRef::Populated { id, .. } => id,
            AuthorRef::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            AuthorRef::Populated { name, .. } => name.as_deref(),
            AuthorRef::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(alias = "user")]
    pub author: AuthorRef,
    pub text: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(alias = "user")]
    pub author: AuthorRef,
    /// User ids; treated as a set.
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating or editing a post.
#[derive(Debug, Clone, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_with_populated_author() {
        let json = r#"{
            "_id": "p1",
            "title": "Saving tips",
            "content": "Pay yourself first",
            "category": "Savings Tips",
            "user": {"_id": "u1", "name": "Jo"},
            "likes": ["u2", "u3"],
            "comments": [{"_id": "c1", "user": "u2", "text": "Nice", "createdAt": "2024-02-01T10:00:00Z"}]
        }"#;
        let post: CommunityPost = serde_json::from_str(json).expect("parse post");
        assert_eq!(post.author.id(), "u1");
        assert_eq!(post.author.name(), Some("Jo"));
        assert_eq!(post.likes.len(), 2);
        assert_eq!(post.comments[0].author, AuthorRef::Id("u2".to_string()));
    }

    #[test]
    fn test_parse_post_with_bare_author() {
        let json = r#"{"_id":"p2","content":"Hello","author":"u9"}"#;
        let post: CommunityPost = serde_json::from_str(json).expect("parse post");
        assert_eq!(post.author.id(), "u9");
        assert!(post.author.name().is_none());
        assert!(post.comments.is_empty());
    }
}
