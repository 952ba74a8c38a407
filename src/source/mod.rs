//! Source module - HTTP client for the headless content API
//!
//! All network access goes through [`SourceClient`]. Queries hit the
//! `documents/search` endpoint; paging follows the opaque `next_page`
//! cursor the API hands back, byte for byte.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::SourceConfig;
use crate::content::RawDocument;

/// Listing order: newest first, uid as tie-breaker so paging is stable
pub const DEFAULT_ORDERINGS: &str = "[document.first_publication_date desc,document.uid]";

/// Errors from the content source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("content source unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("document `{uid}` of type `{doc_type}` not found")]
    NotFound { doc_type: String, uid: String },

    #[error("post `{uid}` missing from the navigation index")]
    InconsistentIndex { uid: String },

    #[error("document `{id}` is malformed: bad or missing `{field}`")]
    MalformedDocument { id: String, field: &'static str },

    #[error("no further page to load")]
    ExhaustedCursor,
}

/// One page of API results plus the cursor to the next one
///
/// Results stay as raw JSON values here; each one is decoded on its own
/// through [`RawDocument::from_value`], so a single bad document cannot
/// sink the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Builder for a `documents/search` query
#[derive(Debug, Clone)]
pub struct Query {
    doc_type: String,
    predicates: Vec<String>,
    fetch: Vec<String>,
    page_size: Option<u32>,
    orderings: Option<String>,
    content_ref: Option<String>,
}

impl Query {
    /// All documents of one type
    pub fn for_type(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            predicates: vec![format!(r#"at(document.type, "{}")"#, doc_type)],
            fetch: Vec::new(),
            page_size: None,
            orderings: None,
            content_ref: None,
        }
    }

    /// The single document of one type carrying the given uid
    pub fn by_uid(doc_type: &str, uid: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            predicates: vec![format!(r#"at(my.{}.uid, "{}")"#, doc_type, uid)],
            fetch: Vec::new(),
            page_size: Some(1),
            orderings: None,
            content_ref: None,
        }
    }

    /// Restrict returned fields; names are prefixed with the document type
    pub fn fetch(mut self, fields: &[&str]) -> Self {
        self.fetch = fields
            .iter()
            .map(|f| format!("{}.{}", self.doc_type, f))
            .collect();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn orderings(mut self, orderings: &str) -> Self {
        self.orderings = Some(orderings.to_string());
        self
    }

    /// Pin the query to a content ref, used for previewing drafts
    pub fn content_ref(mut self, content_ref: Option<&str>) -> Self {
        self.content_ref = content_ref.map(|r| r.to_string());
        self
    }

    fn params(&self) -> Vec<(String, String)> {
        let q = format!(
            "[{}]",
            self.predicates
                .iter()
                .map(|p| format!("[{}]", p))
                .collect::<String>()
        );
        let mut params = vec![("q".to_string(), q)];
        if !self.fetch.is_empty() {
            params.push(("fetch".to_string(), self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize".to_string(), size.to_string()));
        }
        if let Some(orderings) = &self.orderings {
            params.push(("orderings".to_string(), orderings.clone()));
        }
        if let Some(content_ref) = &self.content_ref {
            params.push(("ref".to_string(), content_ref.clone()));
        }
        params
    }
}

/// HTTP client bound to one content API endpoint
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl SourceClient {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Run a search query and return the first page of results
    pub async fn query(&self, query: &Query) -> Result<DocumentPage, SourceError> {
        let url = format!("{}/documents/search", self.endpoint);
        let mut params = query.params();
        if let Some(token) = &self.access_token {
            params.push(("access_token".to_string(), token.clone()));
        }
        debug!("GET {} ({} params)", url, params.len());
        let page = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<DocumentPage>()
            .await?;
        Ok(page)
    }

    /// Follow a `next_page` cursor exactly as the API handed it out
    pub async fn next_page(&self, cursor: &str) -> Result<DocumentPage, SourceError> {
        debug!("GET {}", cursor);
        let page = self
            .http
            .get(cursor)
            .send()
            .await?
            .error_for_status()?
            .json::<DocumentPage>()
            .await?;
        Ok(page)
    }

    /// Fetch a single document by uid
    pub async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<RawDocument, SourceError> {
        let query = Query::by_uid(doc_type, uid).content_ref(content_ref);
        let page = self.query(&query).await?;
        let value = page
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })?;
        RawDocument::from_value(value)
    }
}
