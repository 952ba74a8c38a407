//! CLI entry point for comet-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comet_rs::source::SourceClient;
use comet_rs::Comet;

#[derive(Parser)]
#[command(name = "comet-rs")]
#[command(author = "Bruno Becoski")]
#[command(version = "0.1.0")]
#[command(about = "A fast static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate the static site from the content source
    #[command(alias = "g")]
    Generate {
        /// Build a preview against this content ref instead of the
        /// published content
        #[arg(long)]
        preview_ref: Option<String>,
    },

    /// Generate the site and serve it locally
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List posts from the content source
    List {
        /// Follow the pagination cursor until the feed is exhausted
        #[arg(short, long)]
        all: bool,
    },

    /// Show a single post with its navigation references
    Show {
        /// The uid of the post
        uid: String,
    },

    /// Display version information
    Version,
}

/// Build the document API client, refusing to run without an endpoint
fn build_client(app: &Comet) -> Result<SourceClient> {
    if app.config.source.endpoint.is_empty() {
        anyhow::bail!("No content source configured. Set `source.endpoint` in _config.yml");
    }
    Ok(SourceClient::new(&app.config.source)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "comet_rs=debug,info"
    } else {
        "comet_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = cli.cwd.unwrap_or_else(|| std::env::current_dir().unwrap());

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            comet_rs::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Generate { preview_ref } => {
            let app = Comet::new(&base_dir)?;
            let client = build_client(&app)?;
            tracing::info!("Generating static files...");

            app.generate(&client, preview_ref.as_deref()).await?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip, open } => {
            let app = Comet::new(&base_dir)?;
            let client = build_client(&app)?;

            // Generate first
            tracing::info!("Generating static files...");
            app.generate(&client, None).await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            comet_rs::server::start(&app, &ip, port, open).await?;
        }

        Commands::Clean => {
            let app = Comet::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            app.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { all } => {
            let app = Comet::new(&base_dir)?;
            let client = build_client(&app)?;
            comet_rs::commands::list::run(&app, &client, all).await?;
        }

        Commands::Show { uid } => {
            let app = Comet::new(&base_dir)?;
            let client = build_client(&app)?;
            comet_rs::commands::show::run(&app, &client, &uid).await?;
        }

        Commands::Version => {
            println!("comet-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
