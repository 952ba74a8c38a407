//! Post models

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::richtext::RichTextBlock;

/// A fully projected blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Stable document identifier; doubles as the URL slug
    pub id: String,

    /// First publication timestamp; `None` means not yet published
    pub published_at: Option<DateTime<FixedOffset>>,

    /// Last edit timestamp; `None` means never edited after publication
    pub edited_at: Option<DateTime<FixedOffset>>,

    /// Post title
    pub title: String,

    /// Post subtitle
    pub subtitle: String,

    /// Author display name
    pub author: String,

    /// Banner image URL
    pub banner: Option<String>,

    /// Ordered content sections; order is render order
    pub content: Vec<ContentBlock>,
}

/// One section of a post: a heading plus its rich-text body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// Listing-page projection of a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Adjacent post (by listing order) for prev/next navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingRef {
    pub id: String,
    pub title: String,
}
