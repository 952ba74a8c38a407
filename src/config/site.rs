//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    /// Path segment for post pages: `/{post_dir}/{uid}/`
    pub post_dir: String,

    // Content source
    pub source: SourceConfig,

    // Comment widget
    pub comments: CommentsConfig,

    // Atom feed
    pub feed: bool,

    /// Where the "exit preview" link on preview builds points to
    pub exit_preview_path: String,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: String::new(),
            language: "pt-br".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            post_dir: "post".to_string(),

            source: SourceConfig::default(),
            comments: CommentsConfig::default(),

            feed: true,

            exit_preview_path: "/".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Content source (document API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Document API root, e.g. `https://myrepo.cdn.example.com/api/v2`
    pub endpoint: String,
    /// Access token appended to every request, if the repository requires one
    pub access_token: Option<String>,
    /// Document type queried for posts
    pub document_type: String,
    /// Listing page size
    pub page_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 5,
            timeout_secs: 30,
        }
    }
}

/// Comment widget (utterances-style) configuration
///
/// The widget is a third-party script attached to an anchor element on post
/// pages. An empty `repo` disables the embed entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub script_url: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "photon-dark".to_string(),
            script_url: "https://utteranc.es/client.js".to_string(),
        }
    }
}
