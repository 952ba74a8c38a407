//! Content module - post models, raw documents and rich text rendering

pub mod document;
mod post;
pub mod richtext;

pub use document::RawDocument;
pub use post::{ContentBlock, Post, PostSummary, SiblingRef};
