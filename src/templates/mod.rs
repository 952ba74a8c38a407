//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary; the generated site
//! needs no theme directory on disk.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Embedded stylesheet, copied into the generated site
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Disable autoescaping for HTML templates since we're generating HTML
        // and URLs/paths should not be escaped
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
}

/// One entry of the home page feed
#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

/// A full post page
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Option<String>,
    pub date: String,
    pub edited: String,
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

/// One content section with its body already rendered to HTML
#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub body: String,
}

/// Previous/next navigation target
#[derive(Debug, Clone, Serialize)]
pub struct NavData {
    pub title: String,
    pub url: String,
}

/// Comment widget embed attributes
#[derive(Debug, Clone, Serialize)]
pub struct CommentsData {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub script_url: String,
}
