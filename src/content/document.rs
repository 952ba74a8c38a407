//! Raw source documents and their projection to domain models
//!
//! The content API returns loosely-typed documents. Everything here is
//! tolerant at the deserialization layer and strict at projection time, so
//! one malformed document never poisons a whole response page.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::post::{ContentBlock, Post, PostSummary, SiblingRef};
use super::richtext::RichTextBlock;
use crate::source::SourceError;

/// A document exactly as the content API delivers it
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    /// Internal document id, only used to label errors when `uid` is absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: RawData,
}

/// Custom fields of a post document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawData {
    #[serde(default, deserialize_with = "string_or_richtext")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_richtext")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "string_or_richtext")]
    pub author: Option<String>,
    #[serde(default)]
    pub banner: Option<RawImage>,
    #[serde(default)]
    pub content: Option<Vec<RawSection>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub url: Option<String>,
}

/// One content section: a heading and its rich text body
#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    #[serde(default, deserialize_with = "string_or_richtext")]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Vec<RichTextBlock>,
}

impl RawDocument {
    /// Decode one raw API result on its own
    ///
    /// A wrong-typed field surfaces as [`SourceError::MalformedDocument`]
    /// naming the document, so callers can skip it and keep the rest of
    /// the page.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SourceError> {
        let label = value
            .get("uid")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("id").and_then(|v| v.as_str()))
            .unwrap_or("unknown")
            .to_string();
        serde_json::from_value(value).map_err(|e| {
            debug!("Document `{}` failed to decode: {}", label, e);
            malformed(&label, "data")
        })
    }

    /// Project into a full post, requiring `uid`, `title` and `content`
    pub fn into_post(self) -> Result<Post, SourceError> {
        let label = self.label();
        let uid = self
            .uid
            .filter(|u| !u.is_empty())
            .ok_or_else(|| malformed(&label, "uid"))?;
        let title = self.data.title.ok_or_else(|| malformed(&label, "title"))?;
        let sections = self.data.content.unwrap_or_default();
        if sections.is_empty() {
            return Err(malformed(&label, "content"));
        }

        Ok(Post {
            id: uid,
            published_at: self
                .first_publication_date
                .as_deref()
                .and_then(parse_timestamp),
            edited_at: self
                .last_publication_date
                .as_deref()
                .and_then(parse_timestamp),
            title,
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
            banner: self.data.banner.and_then(|b| b.url),
            content: sections
                .into_iter()
                .map(|s| ContentBlock {
                    heading: s.heading.unwrap_or_default(),
                    body: s.body,
                })
                .collect(),
        })
    }

    /// Project into a listing summary, requiring `uid` and `title`
    pub fn into_summary(self) -> Result<PostSummary, SourceError> {
        let label = self.label();
        let uid = self
            .uid
            .filter(|u| !u.is_empty())
            .ok_or_else(|| malformed(&label, "uid"))?;
        let title = self.data.title.ok_or_else(|| malformed(&label, "title"))?;

        Ok(PostSummary {
            id: uid,
            published_at: self
                .first_publication_date
                .as_deref()
                .and_then(parse_timestamp),
            title,
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
        })
    }

    /// Project into a navigation entry, requiring `uid` and `title`
    pub fn into_sibling(self) -> Result<SiblingRef, SourceError> {
        let label = self.label();
        let uid = self
            .uid
            .filter(|u| !u.is_empty())
            .ok_or_else(|| malformed(&label, "uid"))?;
        let title = self.data.title.ok_or_else(|| malformed(&label, "title"))?;

        Ok(SiblingRef { id: uid, title })
    }

    fn label(&self) -> String {
        self.uid
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn malformed(id: &str, field: &'static str) -> SourceError {
    SourceError::MalformedDocument {
        id: id.to_string(),
        field,
    }
}

/// Parse an API timestamp, accepting both `+00:00` and `+0000` offsets
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Accept a field delivered either as a plain string or as rich text blocks
///
/// Rich text is flattened to plain text, one space between blocks. Empty
/// values collapse to `None` so required-field checks catch them.
fn string_or_richtext<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrRichText;

    impl<'de> Visitor<'de> for StringOrRichText {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of rich text blocks")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut parts: Vec<String> = Vec::new();
            while let Some(block) = seq.next_element::<RichTextBlock>()? {
                if let Some(text) = block.text {
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }
            if parts.is_empty() {
                Ok(None)
            } else {
                Ok(Some(parts.join(" ")))
            }
        }
    }

    deserializer.deserialize_any(StringOrRichText)
}
