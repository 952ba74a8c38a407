//! Show a single post with its navigation references

use anyhow::Result;

use crate::helpers::reading_time;
use crate::resolve;
use crate::source::{SourceClient, SourceError};
use crate::Comet;

/// Fetch one post by uid and print it
pub async fn run(app: &Comet, client: &SourceClient, uid: &str) -> Result<()> {
    let resolved = match resolve::resolve(client, &app.config, uid, None).await {
        Ok(resolved) => resolved,
        Err(SourceError::NotFound { uid, .. }) => {
            anyhow::bail!("No post with uid `{}`", uid);
        }
        Err(e) => return Err(e.into()),
    };

    let post = &resolved.post;
    println!("{}", post.title);
    if !post.subtitle.is_empty() {
        println!("{}", post.subtitle);
    }
    println!();
    if let Some(date) = post.published_at {
        println!("  published: {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(date) = post.edited_at {
        println!("  edited:    {}", date.format("%Y-%m-%d %H:%M"));
    }
    println!("  author:    {}", post.author);
    println!("  reading:   {} min", reading_time(&post.content));
    println!("  sections:  {}", post.content.len());

    if let Some(previous) = &resolved.previous {
        println!("  previous:  {} ({})", previous.title, previous.id);
    }
    if let Some(next) = &resolved.next {
        println!("  next:      {} ({})", next.title, next.id);
    }

    Ok(())
}
