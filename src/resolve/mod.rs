//! Resolve module - single post lookup with sibling navigation
//!
//! A resolved post carries references to its neighbors in listing order,
//! found by walking the full identifier index.

use tracing::warn;

use crate::config::SiteConfig;
use crate::content::{Post, RawDocument, SiblingRef};
use crate::source::{Query, SourceClient, SourceError, DEFAULT_ORDERINGS};

/// Page size used while walking the full index
const INDEX_PAGE_SIZE: u32 = 100;

/// Ordered identifier/title index of every published post
///
/// Entries appear in the same order the listing uses, newest first.
#[derive(Debug, Clone)]
pub struct PostIndex {
    entries: Vec<SiblingRef>,
}

impl PostIndex {
    /// Fetch the full index, following every result page
    pub async fn fetch(
        client: &SourceClient,
        config: &SiteConfig,
        content_ref: Option<&str>,
    ) -> Result<Self, SourceError> {
        let source = &config.source;
        let query = Query::for_type(&source.document_type)
            .fetch(&["title"])
            .page_size(INDEX_PAGE_SIZE)
            .orderings(DEFAULT_ORDERINGS)
            .content_ref(content_ref);

        let mut entries = Vec::new();
        let mut page = client.query(&query).await?;
        loop {
            for raw in page.results {
                match RawDocument::from_value(raw).and_then(RawDocument::into_sibling) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!("Skipping index entry: {}", e),
                }
            }
            match page.next_page {
                Some(cursor) => page = client.next_page(&cursor).await?,
                None => break,
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SiblingRef] {
        &self.entries
    }

    /// Neighbors of a post in index order
    ///
    /// `previous` sits right before the post in the index, `next` right
    /// after it. Either is absent at the matching end of the index.
    pub fn neighbors(
        &self,
        uid: &str,
    ) -> Result<(Option<&SiblingRef>, Option<&SiblingRef>), SourceError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == uid)
            .ok_or_else(|| SourceError::InconsistentIndex {
                uid: uid.to_string(),
            })?;
        let previous = pos.checked_sub(1).map(|i| &self.entries[i]);
        let next = self.entries.get(pos + 1);
        Ok((previous, next))
    }
}

/// A post plus its neighbors in listing order
#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub post: Post,
    pub previous: Option<SiblingRef>,
    pub next: Option<SiblingRef>,
}

/// Fetch one post by uid and derive its navigation references
///
/// A post missing from the index keeps rendering, just without navigation.
pub async fn resolve(
    client: &SourceClient,
    config: &SiteConfig,
    uid: &str,
    content_ref: Option<&str>,
) -> Result<ResolvedPost, SourceError> {
    let raw = client
        .get_by_uid(&config.source.document_type, uid, content_ref)
        .await?;
    let post = raw.into_post()?;

    let index = PostIndex::fetch(client, config, content_ref).await?;
    let (previous, next) = match index.neighbors(&post.id) {
        Ok((previous, next)) => (previous.cloned(), next.cloned()),
        Err(SourceError::InconsistentIndex { uid }) => {
            warn!("Post `{}` is missing from the listing index", uid);
            (None, None)
        }
        Err(e) => return Err(e),
    };

    Ok(ResolvedPost {
        post,
        previous,
        next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use std::collections::HashMap;

    use axum::extract::Query as Params;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    fn sibling(id: &str, title: &str) -> SiblingRef {
        SiblingRef {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    fn index_of(ids: &[&str]) -> PostIndex {
        PostIndex {
            entries: ids.iter().map(|id| sibling(id, id)).collect(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config_for(base: &str) -> SiteConfig {
        SiteConfig {
            source: SourceConfig {
                endpoint: format!("{}/api/v2", base),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sibling_doc(uid: &str, title: &str) -> serde_json::Value {
        json!({"uid": uid, "data": {"title": title}})
    }

    fn full_doc(uid: &str, title: &str) -> serde_json::Value {
        json!({
            "uid": uid,
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": title,
                "subtitle": "sub",
                "author": "Autor",
                "content": [{"heading": "h", "body": [{"type": "paragraph", "text": "corpo", "spans": []}]}]
            }
        })
    }

    #[test]
    fn test_neighbors_middle() {
        let index = index_of(&["a", "b", "c"]);
        let (previous, next) = index.neighbors("b").unwrap();
        assert_eq!(previous.unwrap().id, "a");
        assert_eq!(next.unwrap().id, "c");
    }

    #[test]
    fn test_neighbors_first_has_no_previous() {
        let index = index_of(&["a", "b", "c"]);
        let (previous, next) = index.neighbors("a").unwrap();
        assert!(previous.is_none());
        assert_eq!(next.unwrap().id, "b");
    }

    #[test]
    fn test_neighbors_last_has_no_next() {
        let index = index_of(&["a", "b", "c"]);
        let (previous, next) = index.neighbors("c").unwrap();
        assert_eq!(previous.unwrap().id, "b");
        assert!(next.is_none());
    }

    #[test]
    fn test_neighbors_single_entry() {
        let index = index_of(&["only"]);
        let (previous, next) = index.neighbors("only").unwrap();
        assert!(previous.is_none());
        assert!(next.is_none());
    }

    #[test]
    fn test_neighbors_missing_uid() {
        let index = index_of(&["a", "b"]);
        match index.neighbors("fantasma") {
            Err(SourceError::InconsistentIndex { uid }) => assert_eq!(uid, "fantasma"),
            other => panic!("expected InconsistentIndex, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_follows_every_page() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{}", addr);

        let page2_url = format!("{}/page2", base);
        let router = Router::new()
            .route(
                "/api/v2/documents/search",
                get(move || {
                    let next = page2_url.clone();
                    async move {
                        Json(json!({
                            "results": [sibling_doc("a", "A"), sibling_doc("b", "B")],
                            "next_page": next
                        }))
                    }
                }),
            )
            .route(
                "/page2",
                get(|| async {
                    Json(json!({"results": [sibling_doc("c", "C")], "next_page": null}))
                }),
            );
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = config_for(&base);
        let client = SourceClient::new(&config.source).unwrap();
        let index = PostIndex::fetch(&client, &config, None).await.unwrap();

        let ids: Vec<_> = index.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_skips_wrong_typed_documents() {
        let router = Router::new().route(
            "/api/v2/documents/search",
            get(|| async {
                Json(json!({
                    "results": [
                        sibling_doc("a", "A"),
                        {"uid": "ruim", "data": {"title": 42}},
                        sibling_doc("b", "B")
                    ],
                    "next_page": null
                }))
            }),
        );
        let base = serve(router).await;

        let config = config_for(&base);
        let client = SourceClient::new(&config.source).unwrap();
        let index = PostIndex::fetch(&client, &config, None).await.unwrap();

        let ids: Vec<_> = index.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    /// Stub that answers uid lookups with one document and everything else
    /// with the given index listing
    fn search_router(uid_result: serde_json::Value, listing: Vec<serde_json::Value>) -> Router {
        Router::new().route(
            "/api/v2/documents/search",
            get(move |Params(params): Params<HashMap<String, String>>| {
                let uid_result = uid_result.clone();
                let listing = listing.clone();
                async move {
                    let q = params.get("q").cloned().unwrap_or_default();
                    if q.contains(".uid") {
                        Json(json!({"results": [uid_result], "next_page": null}))
                    } else {
                        Json(json!({"results": listing, "next_page": null}))
                    }
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_resolve_middle_post() {
        let router = search_router(
            full_doc("b", "Post B"),
            vec![
                sibling_doc("a", "Post A"),
                sibling_doc("b", "Post B"),
                sibling_doc("c", "Post C"),
            ],
        );
        let base = serve(router).await;

        let config = config_for(&base);
        let client = SourceClient::new(&config.source).unwrap();
        let resolved = resolve(&client, &config, "b", None).await.unwrap();

        assert_eq!(resolved.post.id, "b");
        assert_eq!(resolved.post.title, "Post B");
        assert_eq!(resolved.previous.unwrap().id, "a");
        assert_eq!(resolved.next.unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let router = Router::new().route(
            "/api/v2/documents/search",
            get(|| async { Json(json!({"results": [], "next_page": null})) }),
        );
        let base = serve(router).await;

        let config = config_for(&base);
        let client = SourceClient::new(&config.source).unwrap();
        match resolve(&client, &config, "nao-existe", None).await {
            Err(SourceError::NotFound { uid, .. }) => assert_eq!(uid, "nao-existe"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_from_index_degrades() {
        let router = search_router(
            full_doc("fantasma", "Fantasma"),
            vec![sibling_doc("a", "Post A"), sibling_doc("b", "Post B")],
        );
        let base = serve(router).await;

        let config = config_for(&base);
        let client = SourceClient::new(&config.source).unwrap();
        let resolved = resolve(&client, &config, "fantasma", None).await.unwrap();

        assert_eq!(resolved.post.id, "fantasma");
        assert!(resolved.previous.is_none());
        assert!(resolved.next.is_none());
    }
}
