use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    pub fn generate() -> Self {
        BookId(Uuid::new_v4())
    }

    /// Returns `None` when `raw` is not a well-formed id.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(BookId)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A stored book and its comment log.
///
/// `comment_count` is persisted alongside `comments` and must always equal
/// `comments.len()`; [`Book::add_comment`] is the only mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub comments: Vec<String>,
    pub comment_count: i64,
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>) -> Self {
        Book {
            id,
            title: title.into(),
            comments: vec![],
            comment_count: 0,
        }
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
        self.comment_count += 1;
    }

    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id,
            title: self.title.clone(),
            comment_count: self.comment_count,
        }
    }

    pub fn into_detail(self) -> BookDetail {
        BookDetail {
            id: self.id,
            title: self.title,
            comments: self.comments,
        }
    }
}

/// Collection listing entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    #[serde(rename = "commentcount")]
    pub comment_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedBook {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookDetail {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub comments: Vec<String>,
}
