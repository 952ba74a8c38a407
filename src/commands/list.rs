//! List posts from the content source

use anyhow::Result;

use crate::listing::ListingFeed;
use crate::source::SourceClient;
use crate::Comet;

/// Print the post feed, one line per post
///
/// Shows the first listing page by default; `all` keeps following the
/// pagination cursor until the feed is exhausted.
pub async fn run(app: &Comet, client: &SourceClient, all: bool) -> Result<()> {
    let mut feed = ListingFeed::initial(client, &app.config, None).await?;
    if all {
        while feed.can_load_more() {
            feed.load_more(client).await?;
        }
    }

    println!("Posts ({}):", feed.posts().len());
    for post in feed.posts() {
        let date = post
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());
        println!("  {} - {} [{}]", date, post.title, post.author);
    }
    if feed.can_load_more() {
        println!("  (more posts available, use --all)");
    }

    Ok(())
}
