//! Listing module - the paginated post feed
//!
//! The home page shows summaries newest-first, one API page at a time.
//! [`ListingFeed`] owns the loaded summaries plus the cursor to the next
//! page and grows through [`ListingFeed::load_more`].

use std::collections::HashSet;

use tracing::warn;

use crate::config::SiteConfig;
use crate::content::{PostSummary, RawDocument};
use crate::source::{DocumentPage, Query, SourceClient, SourceError, DEFAULT_ORDERINGS};

/// One projected page of feed items plus the cursor to the next page
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

/// Fetch the first page of the feed
pub async fn initial_page(
    client: &SourceClient,
    config: &SiteConfig,
    content_ref: Option<&str>,
) -> Result<Page<PostSummary>, SourceError> {
    let source = &config.source;
    let query = Query::for_type(&source.document_type)
        .fetch(&["title", "subtitle", "author"])
        .page_size(source.page_size as u32)
        .orderings(DEFAULT_ORDERINGS)
        .content_ref(content_ref);
    let page = client.query(&query).await?;
    Ok(project_page(page))
}

/// Fetch the page behind a cursor
pub async fn next_listing_page(
    client: &SourceClient,
    cursor: &str,
) -> Result<Page<PostSummary>, SourceError> {
    let page = client.next_page(cursor).await?;
    Ok(project_page(page))
}

/// Append an incoming page to the already loaded summaries
///
/// Pure concatenation: the result keeps both orders and its length is the
/// sum of both inputs. Duplicate filtering happens before merging, in
/// [`ListingFeed::load_more`].
pub fn merge(existing: Vec<PostSummary>, incoming: Vec<PostSummary>) -> Vec<PostSummary> {
    let mut merged = existing;
    merged.extend(incoming);
    merged
}

fn project_page(page: DocumentPage) -> Page<PostSummary> {
    let mut items = Vec::with_capacity(page.results.len());
    for raw in page.results {
        match RawDocument::from_value(raw).and_then(RawDocument::into_summary) {
            Ok(summary) => items.push(summary),
            Err(e) => warn!("Skipping listing entry: {}", e),
        }
    }
    Page {
        items,
        cursor: page.next_page,
    }
}

/// The growing feed behind the home page
#[derive(Debug, Clone)]
pub struct ListingFeed {
    posts: Vec<PostSummary>,
    cursor: Option<String>,
}

impl ListingFeed {
    /// Load the first page of the feed
    pub async fn initial(
        client: &SourceClient,
        config: &SiteConfig,
        content_ref: Option<&str>,
    ) -> Result<Self, SourceError> {
        let page = initial_page(client, config, content_ref).await?;
        Ok(Self {
            posts: page.items,
            cursor: page.cursor,
        })
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn can_load_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Load the next page into the feed, returning how many posts were added
    ///
    /// Summaries whose id is already in the feed are dropped with a warning.
    /// The cursor is only advanced on success, so a failed load can simply
    /// be retried.
    pub async fn load_more(&mut self, client: &SourceClient) -> Result<usize, SourceError> {
        let cursor = match &self.cursor {
            Some(cursor) => cursor.clone(),
            None => return Err(SourceError::ExhaustedCursor),
        };

        let page = next_listing_page(client, &cursor).await?;
        let mut incoming = page.items;
        let before = incoming.len();
        {
            let seen: HashSet<&str> = self.posts.iter().map(|p| p.id.as_str()).collect();
            incoming.retain(|p| !seen.contains(p.id.as_str()));
        }
        if incoming.len() < before {
            warn!(
                "Dropped {} duplicate posts from the feed",
                before - incoming.len()
            );
        }

        let appended = incoming.len();
        self.posts = merge(std::mem::take(&mut self.posts), incoming);
        self.cursor = page.cursor;
        Ok(appended)
    }
}
