//! Rich text blocks and rendering
//!
//! The content source delivers post bodies as sequences of typed rich-text
//! blocks (paragraphs, headings, list items, images) carrying plain text plus
//! inline span markup. This module renders block sequences to plain text (for
//! word counting) and to HTML (for the page templates).

use serde::{Deserialize, Serialize};

/// One rich-text block as delivered by the content source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Plain text content; absent for non-text blocks such as images
    #[serde(default)]
    pub text: Option<String>,

    /// Inline markup over `text`
    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image or embed URL
    #[serde(default)]
    pub url: Option<String>,

    /// Image alt text
    #[serde(default)]
    pub alt: Option<String>,
}

impl RichTextBlock {
    /// A plain paragraph with no inline markup
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: Some(text.into()),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

/// Block-level type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    ListItem,
    OListItem,
    Preformatted,
    Image,
    Embed,
    /// Unrecognized block types degrade to paragraphs instead of failing
    #[serde(other)]
    Other,
}

/// Inline span over a block's text, addressed by offsets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

/// Inline span type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    #[serde(other)]
    Other,
}

/// Extra span payload (hyperlink target)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
}

/// Render a block sequence as plain text, one space between blocks
pub fn as_text(body: &[RichTextBlock]) -> String {
    body.iter()
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a block sequence as HTML, grouping consecutive list items
pub fn as_html(body: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in body {
        let wanted = list_tag(block.kind);
        if open_list != wanted {
            if let Some(tag) = open_list {
                html.push_str("</");
                html.push_str(tag);
                html.push('>');
            }
            if let Some(tag) = wanted {
                html.push('<');
                html.push_str(tag);
                html.push('>');
            }
            open_list = wanted;
        }
        html.push_str(&render_block(block));
    }

    if let Some(tag) = open_list {
        html.push_str("</");
        html.push_str(tag);
        html.push('>');
    }

    html
}

/// List container tag for list-item blocks
fn list_tag(kind: BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::ListItem => Some("ul"),
        BlockKind::OListItem => Some("ol"),
        _ => None,
    }
}

/// Render a single block to HTML
fn render_block(block: &RichTextBlock) -> String {
    let inner = || render_spans(block.text.as_deref().unwrap_or(""), &block.spans);

    match block.kind {
        BlockKind::Paragraph | BlockKind::Other => format!("<p>{}</p>", inner()),
        BlockKind::Heading1 => format!("<h1>{}</h1>", inner()),
        BlockKind::Heading2 => format!("<h2>{}</h2>", inner()),
        BlockKind::Heading3 => format!("<h3>{}</h3>", inner()),
        BlockKind::Heading4 => format!("<h4>{}</h4>", inner()),
        BlockKind::Heading5 => format!("<h5>{}</h5>", inner()),
        BlockKind::Heading6 => format!("<h6>{}</h6>", inner()),
        BlockKind::ListItem | BlockKind::OListItem => format!("<li>{}</li>", inner()),
        BlockKind::Preformatted => format!("<pre>{}</pre>", inner()),
        BlockKind::Image => match &block.url {
            Some(url) => format!(
                r#"<img src="{}" alt="{}">"#,
                escape_html(url),
                escape_html(block.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Embed => String::new(),
    }
}

/// Apply inline spans to a block's text, escaping the text itself
///
/// Offsets arrive as UTF-16 unit counts; indexing by char matches for the
/// BMP text this site carries.
fn render_spans(text: &str, spans: &[Span]) -> String {
    if spans.is_empty() {
        return escape_html(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut opens: Vec<Vec<usize>> = vec![Vec::new(); chars.len() + 1];
    let mut closes: Vec<Vec<usize>> = vec![Vec::new(); chars.len() + 1];

    for (idx, span) in spans.iter().enumerate() {
        let start = span.start.min(chars.len());
        let end = span.end.min(chars.len());
        if start >= end {
            continue;
        }
        opens[start].push(idx);
        closes[end].push(idx);
    }

    // Longer spans open first so nested markup stays well-formed
    for list in &mut opens {
        list.sort_by(|&a, &b| spans[b].end.cmp(&spans[a].end));
    }

    // Number spans in the order their tags open; closing tags then emit
    // in reverse of that order, so tags sharing a boundary never cross
    let mut open_seq = vec![0usize; spans.len()];
    let mut seq = 0;
    for list in &opens {
        for &idx in list {
            open_seq[idx] = seq;
            seq += 1;
        }
    }
    for list in &mut closes {
        list.sort_by(|&a, &b| open_seq[b].cmp(&open_seq[a]));
    }

    let mut out = String::new();
    for i in 0..=chars.len() {
        for &idx in &closes[i] {
            out.push_str(close_tag(&spans[idx]));
        }
        for &idx in &opens[i] {
            out.push_str(&open_tag(&spans[idx]));
        }
        if i < chars.len() {
            push_escaped(&mut out, chars[i]);
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let url = span
                .data
                .as_ref()
                .and_then(|d| d.url.as_deref())
                .unwrap_or("#");
            format!(r#"<a href="{}">"#, escape_html(url))
        }
        SpanKind::Other => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Other => "",
    }
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}
