//! CLI entry point for folio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::commands::show::Format;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author = "Deep Lekhak")]
#[command(version)]
#[command(about = "Portfolio blog engine", long_about = None)]
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

    /// Start a local server
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

    /// Render one post to stdout
    Show {
        /// Post slug
        slug: String,

        /// Print the view state as JSON
        #[arg(long, conflicts_with = "raw")]
        json: bool,

        /// Print the markdown body instead of the HTML page
        #[arg(long)]
        raw: bool,
    },

    /// List posts and whether they have content
    List,

    /// Copy a post's link to the clipboard
    Share {
        /// Post slug
        slug: String,
    },

    /// Browse posts interactively
    Browse,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
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
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            folio::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Server { port, ip, open } => {
            let site = folio::Folio::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio::server::start(&site, &ip, port, open).await?;
        }

        Commands::Show { slug, json, raw } => {
            let site = folio::Folio::new(&base_dir)?;
            let format = if json {
                Format::Json
            } else if raw {
                Format::Raw
            } else {
                Format::Page
            };
            folio::commands::show::run(&site, &slug, format).await?;
        }

        Commands::List => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::list::run(&site)?;
        }

        Commands::Share { slug } => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::share::run(&site, &slug).await?;
        }

        Commands::Browse => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::browse::run(&site).await?;
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
