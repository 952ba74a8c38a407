//! Generator module - renders the fetched posts to static HTML files

use anyhow::Result;
use std::fs;

use tera::Context;
use tracing::{debug, info, warn};

use crate::content::richtext;
use crate::content::{Post, PostSummary, SiblingRef};
use crate::helpers::{
    date_xml, format_date_ptbr, format_edited_ptbr, full_url_for, post_url, reading_time, url_for,
};
use crate::listing::ListingFeed;
use crate::resolve::PostIndex;
use crate::source::{SourceClient, SourceError};
use crate::templates::{
    CommentsData, ConfigData, NavData, PostData, SectionData, SummaryData, TemplateRenderer,
    STYLESHEET,
};
use crate::Comet;

/// Number of posts included in the Atom feed
const FEED_ENTRIES: usize = 20;

/// Static site generator using Tera templates
pub struct Generator {
    app: Comet,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &Comet) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        Ok(Self {
            app: app.clone(),
            renderer,
        })
    }

    /// Generate the entire site
    ///
    /// A `content_ref` switches every query to that ref and marks the build
    /// as a preview. Preview builds never publish a feed.
    pub async fn generate(&self, client: &SourceClient, content_ref: Option<&str>) -> Result<()> {
        fs::create_dir_all(&self.app.public_dir)?;
        self.write_stylesheet()?;

        let feed = ListingFeed::initial(client, &self.app.config, content_ref).await?;
        let index = PostIndex::fetch(client, &self.app.config, content_ref).await?;
        info!("Fetched {} posts from the content source", index.entries().len());

        self.generate_index_page(&feed, content_ref)?;
        let posts = self.generate_post_pages(client, &index, content_ref).await?;

        if self.app.config.feed && content_ref.is_none() {
            self.generate_atom_feed(&posts)?;
        }

        Ok(())
    }

    fn write_stylesheet(&self) -> Result<()> {
        let css_dir = self.app.public_dir.join("css");
        fs::create_dir_all(&css_dir)?;
        fs::write(css_dir.join("style.css"), STYLESHEET)?;
        Ok(())
    }

    /// Create a base context with common variables
    fn base_context(&self, preview: bool) -> Context {
        let config = &self.app.config;
        let mut context = Context::new();
        context.insert(
            "config",
            &ConfigData {
                title: config.title.clone(),
                description: config.description.clone(),
                language: config.language.clone(),
            },
        );
        context.insert("root_url", &url_for(config, ""));
        context.insert("css_url", &url_for(config, "css/style.css"));
        let atom_url = if config.feed && !preview {
            url_for(config, "atom.xml")
        } else {
            String::new()
        };
        context.insert("atom_url", &atom_url);
        context.insert("preview", &preview);
        context.insert("exit_preview_url", &config.exit_preview_path);
        context
    }

    /// Generate the home page listing
    fn generate_index_page(&self, feed: &ListingFeed, content_ref: Option<&str>) -> Result<()> {
        let config = &self.app.config;
        let posts: Vec<SummaryData> = feed
            .posts()
            .iter()
            .map(|p| self.summary_to_data(p))
            .collect();

        let mut context = self.base_context(content_ref.is_some());
        context.insert("posts", &posts);
        context.insert("next_page", &feed.cursor().unwrap_or(""));
        context.insert(
            "post_base_url",
            &url_for(config, &format!("{}/", config.post_dir)),
        );

        let html = self.renderer.render("index.html", &context)?;
        let output_path = self.app.public_dir.join("index.html");
        fs::write(&output_path, html)?;
        debug!("Generated: {:?}", output_path);

        Ok(())
    }

    /// Generate one page per indexed post, returning the posts that rendered
    ///
    /// A post that fails to fetch or project is skipped with a warning; only
    /// an unavailable source aborts the build.
    async fn generate_post_pages(
        &self,
        client: &SourceClient,
        index: &PostIndex,
        content_ref: Option<&str>,
    ) -> Result<Vec<Post>> {
        let config = &self.app.config;
        let doc_type = &config.source.document_type;
        let mut posts = Vec::with_capacity(index.entries().len());

        for entry in index.entries() {
            let raw = match client.get_by_uid(doc_type, &entry.id, content_ref).await {
                Ok(raw) => raw,
                Err(e @ SourceError::Unavailable(_)) => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping post `{}`: {}", entry.id, e);
                    continue;
                }
            };
            let post = match raw.into_post() {
                Ok(post) => post,
                Err(e) => {
                    warn!("Skipping post `{}`: {}", entry.id, e);
                    continue;
                }
            };

            let (previous, next) = match index.neighbors(&post.id) {
                Ok(neighbors) => neighbors,
                Err(e) => {
                    warn!("Post `{}`: {}", post.id, e);
                    (None, None)
                }
            };

            let mut context = self.base_context(content_ref.is_some());
            context.insert("post", &self.post_to_data(&post));
            if let Some(previous) = previous {
                context.insert("previous", &self.nav_data(previous));
            }
            if let Some(next) = next {
                context.insert("next", &self.nav_data(next));
            }
            if !config.comments.repo.is_empty() {
                context.insert(
                    "comments",
                    &CommentsData {
                        repo: config.comments.repo.clone(),
                        issue_term: config.comments.issue_term.clone(),
                        theme: config.comments.theme.clone(),
                        script_url: config.comments.script_url.clone(),
                    },
                );
            }

            let html = self.renderer.render("post.html", &context)?;

            let output_path = self
                .app
                .public_dir
                .join(&config.post_dir)
                .join(&post.id)
                .join("index.html");
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, html)?;
            debug!("Generated post: {:?}", output_path);

            posts.push(post);
        }

        Ok(posts)
    }

    fn summary_to_data(&self, summary: &PostSummary) -> SummaryData {
        SummaryData {
            url: post_url(&self.app.config, &summary.id),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: summary
                .published_at
                .map(|d| format_date_ptbr(&d))
                .unwrap_or_default(),
        }
    }

    fn post_to_data(&self, post: &Post) -> PostData {
        // The edit label only appears when the post changed after publication
        let edited = match (post.published_at, post.edited_at) {
            (Some(published), Some(edited)) if edited > published => format_edited_ptbr(&edited),
            _ => String::new(),
        };

        PostData {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            banner: post.banner.clone(),
            date: post
                .published_at
                .map(|d| format_date_ptbr(&d))
                .unwrap_or_default(),
            edited,
            reading_time: reading_time(&post.content),
            sections: post
                .content
                .iter()
                .map(|section| SectionData {
                    heading: section.heading.clone(),
                    body: richtext::as_html(&section.body),
                })
                .collect(),
        }
    }

    fn nav_data(&self, entry: &SiblingRef) -> NavData {
        NavData {
            title: entry.title.clone(),
            url: post_url(&self.app.config, &entry.id),
        }
    }

    /// Generate the Atom feed
    fn generate_atom_feed(&self, posts: &[Post]) -> Result<()> {
        let config = &self.app.config;
        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, "atom.xml")
        ));
        feed.push_str(&format!(
            "  <link href=\"{}\"/>\n",
            full_url_for(config, "")
        ));
        feed.push_str(&format!(
            "  <updated>{}</updated>\n",
            chrono::Utc::now().to_rfc3339()
        ));
        feed.push_str(&format!("  <id>{}</id>\n", full_url_for(config, "")));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in posts.iter().take(FEED_ENTRIES) {
            let link = full_url_for(config, &format!("{}/{}/", config.post_dir, post.id));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            if let Some(published) = post.published_at {
                feed.push_str(&format!(
                    "    <published>{}</published>\n",
                    date_xml(&published)
                ));
            }
            if let Some(updated) = post.edited_at.or(post.published_at) {
                feed.push_str(&format!("    <updated>{}</updated>\n", date_xml(&updated)));
            }
            if !post.author.is_empty() {
                feed.push_str(&format!(
                    "    <author><name>{}</name></author>\n",
                    escape_xml(&post.author)
                ));
            }

            let mut content = String::new();
            for section in &post.content {
                if !section.heading.is_empty() {
                    content.push_str(&format!("<h2>{}</h2>", escape_xml(&section.heading)));
                }
                content.push_str(&richtext::as_html(&section.body));
            }
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content)
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        let output_path = self.app.public_dir.join("atom.xml");
        fs::write(&output_path, feed)?;
        info!("Generated atom.xml");

        Ok(())
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::collections::HashMap;

    use axum::extract::Query as Params;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn uid_from_q(q: &str) -> Option<String> {
        let start = q.find(".uid, \"")? + 7;
        let rest = &q[start..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }

    fn title_for(uid: &str) -> &'static str {
        match uid {
            "primeiro" => "Primeiro Post",
            "segundo" => "Segundo Post",
            _ => "Outro Post",
        }
    }

    fn full_doc(uid: &str) -> Value {
        if uid == "quebrado" {
            // Missing content, fails projection
            return json!({"uid": uid, "data": {"title": "Quebrado"}});
        }
        json!({
            "uid": uid,
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-16T10:02:51+0000",
            "data": {
                "title": title_for(uid),
                "subtitle": "Um subtítulo",
                "author": "Joseph Oliveira",
                "banner": {"url": "https://images.example.com/banner.png"},
                "content": [{
                    "heading": "Primeira seção",
                    "body": [{"type": "paragraph", "text": "Texto do corpo do post.", "spans": []}]
                }]
            }
        })
    }

    fn listing_doc(uid: &str) -> Value {
        json!({
            "uid": uid,
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {"title": title_for(uid), "subtitle": "Um subtítulo", "author": "Joseph Oliveira"}
        })
    }

    /// Stub content API serving the given uids in listing order
    async fn serve_site(uids: &'static [&'static str], listing_next: bool) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{}", addr);

        let next_url = format!("{}/page2", base);
        let router = Router::new().route(
            "/api/v2/documents/search",
            get(move |Params(params): Params<HashMap<String, String>>| {
                let next_url = next_url.clone();
                async move {
                    let q = params.get("q").cloned().unwrap_or_default();
                    if let Some(uid) = uid_from_q(&q) {
                        return Json(json!({"results": [full_doc(&uid)], "next_page": null}));
                    }
                    let results: Vec<Value> = uids.iter().map(|u| listing_doc(u)).collect();
                    // The small page size marks the listing query; the index
                    // walker asks for bigger pages
                    let is_listing = params.get("pageSize").map(String::as_str) == Some("5");
                    let next = if is_listing && listing_next {
                        json!(next_url)
                    } else {
                        json!(null)
                    };
                    Json(json!({"results": results, "next_page": next}))
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        base
    }

    fn app_for(base: &str, dir: &TempDir) -> Comet {
        let mut config = SiteConfig::default();
        config.source.endpoint = format!("{}/api/v2", base);
        config.url = "https://blog.example.com".to_string();
        config.author = "Bruno".to_string();
        config.comments.repo = "someone/comments".to_string();
        Comet::with_config(dir.path(), config)
    }

    #[tokio::test]
    async fn test_generate_writes_the_whole_site() {
        let base = serve_site(&["primeiro", "segundo"], true).await;
        let dir = TempDir::new().unwrap();
        let app = app_for(&base, &dir);

        let client = SourceClient::new(&app.config.source).unwrap();
        let generator = Generator::new(&app).unwrap();
        generator.generate(&client, None).await.unwrap();

        let index = fs::read_to_string(app.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Primeiro Post"));
        assert!(index.contains("Segundo Post"));
        assert!(index.contains("15 mar 2021"));
        assert!(index.contains("Carregar mais posts"));
        assert!(index.contains(&format!("data-next-page=\"{}/page2\"", base)));
        assert!(!index.contains("Sair do modo Preview"));

        let first = fs::read_to_string(
            app.public_dir.join("post").join("primeiro").join("index.html"),
        )
        .unwrap();
        assert!(first.contains("<h1>Primeiro Post</h1>"));
        assert!(first.contains("Joseph Oliveira"));
        assert!(first.contains("1 min"));
        assert!(first.contains("* editado em 16 mar 2021, às 10:02"));
        assert!(first.contains("https://images.example.com/banner.png"));
        // First in listing order has a next neighbor but no previous
        assert!(first.contains("Próximo post"));
        assert!(first.contains("Segundo Post"));
        assert!(!first.contains("Post anterior"));
        assert!(first.contains("repo=\"someone/comments\""));

        let second = fs::read_to_string(
            app.public_dir.join("post").join("segundo").join("index.html"),
        )
        .unwrap();
        assert!(second.contains("Post anterior"));
        assert!(second.contains("Primeiro Post"));
        assert!(!second.contains("Próximo post"));

        assert!(app.public_dir.join("css").join("style.css").exists());

        let atom = fs::read_to_string(app.public_dir.join("atom.xml")).unwrap();
        assert!(atom.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\">"));
        assert!(atom.contains("<title>Primeiro Post</title>"));
        assert!(atom.contains("https://blog.example.com/post/primeiro/"));
        assert!(atom.contains("<published>2021-03-15T19:25:28+00:00</published>"));
    }

    #[tokio::test]
    async fn test_preview_build_shows_exit_link_and_skips_feed() {
        let base = serve_site(&["primeiro"], false).await;
        let dir = TempDir::new().unwrap();
        let app = app_for(&base, &dir);

        let client = SourceClient::new(&app.config.source).unwrap();
        let generator = Generator::new(&app).unwrap();
        generator.generate(&client, Some("draft-ref")).await.unwrap();

        let index = fs::read_to_string(app.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Sair do modo Preview"));
        assert!(!app.public_dir.join("atom.xml").exists());
    }

    #[tokio::test]
    async fn test_malformed_post_is_skipped() {
        let base = serve_site(&["primeiro", "quebrado"], false).await;
        let dir = TempDir::new().unwrap();
        let app = app_for(&base, &dir);

        let client = SourceClient::new(&app.config.source).unwrap();
        let generator = Generator::new(&app).unwrap();
        generator.generate(&client, None).await.unwrap();

        assert!(app
            .public_dir
            .join("post")
            .join("primeiro")
            .join("index.html")
            .exists());
        assert!(!app.public_dir.join("post").join("quebrado").exists());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b < c"), "a &amp; b &lt; c");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_strip_invalid_xml_chars() {
        assert_eq!(strip_invalid_xml_chars("ok\u{0008}text"), "oktext");
        assert_eq!(strip_invalid_xml_chars("tab\tand\nnewline"), "tab\tand\nnewline");
    }
}
