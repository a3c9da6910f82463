//! CLI entry point for inkfeed

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "inkfeed")]
#[command(author = "Yukang Chen")]
#[command(version = "0.1.0")]
#[command(about = "Markdown blog content pipeline", long_about = None)]
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
    /// List posts, newest first
    #[command(alias = "ls")]
    List {
        /// Print the posts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a single post
    Show {
        /// Post identifier (file name without extension)
        identifier: String,

        /// Tag blocks for scroll-reveal and preview which are visible on load
        #[arg(short, long)]
        reveal: bool,

        /// Viewport height used by the reveal preview
        #[arg(long, default_value = "600")]
        viewport_height: f64,
    },

    /// Resolve a browser path to a page
    Route {
        /// Path such as `/posts/hello-world`
        path: String,
    },

    /// Print a markdown file with browser-safe code samples
    Normalize {
        /// Markdown file to normalize
        file: PathBuf,

        /// Rewrite prose too, not only code blocks
        #[arg(long)]
        whole: bool,
    },

    /// Print the syntax highlighting stylesheet
    Css {
        /// Highlight theme (defaults to `render.highlight_theme`)
        #[arg(short, long)]
        theme: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "inkfeed=debug,info"
    } else {
        "inkfeed=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::List { json } => {
            let blog = inkfeed::Blog::new(&base_dir)?;
            inkfeed::commands::list::run(&blog, json)?;
        }

        Commands::Show {
            identifier,
            reveal,
            viewport_height,
        } => {
            let blog = inkfeed::Blog::new(&base_dir)?;
            tracing::debug!("Rendering post {}", identifier);
            inkfeed::commands::show::run(&blog, &identifier, reveal, viewport_height).await?;
        }

        Commands::Route { path } => {
            let blog = inkfeed::Blog::new(&base_dir)?;
            inkfeed::commands::route::run(&blog, &path).await?;
        }

        Commands::Normalize { file, whole } => {
            let file = if file.is_absolute() {
                file
            } else {
                base_dir.join(file)
            };
            inkfeed::commands::normalize::run(&file, whole)?;
        }

        Commands::Css { theme } => {
            let blog = inkfeed::Blog::new(&base_dir)?;
            inkfeed::commands::css::run(&blog, theme.as_deref())?;
        }

        Commands::Version => {
            println!("inkfeed version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
