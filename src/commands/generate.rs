//! Generate the static site from the content source

use anyhow::Result;

use crate::generator::Generator;
use crate::source::SourceClient;
use crate::Comet;

/// Run the generate command
///
/// Fetches every published post from the document API and renders the whole
/// site into the public directory. With a `content_ref` the same pipeline
/// produces a preview build against that ref instead of the published
/// content.
pub async fn run(app: &Comet, client: &SourceClient, content_ref: Option<&str>) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(app)?;
    generator.generate(client, content_ref).await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
