//! compact CLI tool
//!
//! Command-line interface for compacting namespace groups declared in a TOML configuration file.
//!
//! ## Commands
//!
//! - `build --config <file>`: Compact the configured groups once and print the references
//! - `list --config <file>`: Show the registered namespaces and their resolved files
//! - `serve --config <file>`: Development server rendering the groups per request (feature `service`)

use clap::{Parser, Subcommand, ValueEnum};
use compact_core::{
    compact::Compact, config::CompactConfig, group::Group, middleware::CompactMiddleware,
    CompactError,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Parser)]
#[command(name = "compact")]
#[command(author, version, about = "Concatenate namespace groups into cached bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    /// One reference per line
    Plain,
    /// `<script>` tags
    Html,
    /// JSON array of references
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compact groups once and print their output references
    Build {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,

        /// Comma-separated group, e.g. `global,profile`. Repeatable; overrides the configured groups
        #[arg(short, long = "group")]
        groups: Vec<Group>,

        /// Copy files individually instead of writing combined bundles
        #[arg(short, long)]
        debug: bool,

        #[arg(short, long, value_enum, default_value_t = Output::Plain)]
        output: Output,
    },

    /// List registered namespaces and their resolved files
    List {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Serve the destination directory and an index page embedding the configured groups
    #[cfg(feature = "service")]
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,

        /// Port to bind to on 127.0.0.1
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Copy files individually instead of writing combined bundles
        #[arg(short, long)]
        debug: bool,
    },
}

fn load(config: &Path, debug: bool) -> Result<(CompactConfig, Compact), CompactError> {
    let mut config = CompactConfig::from_file(config)?;
    config.debug |= debug;
    let compact = Compact::new(config.clone())?;
    Ok((config, compact))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Build {
            config,
            groups,
            debug,
            output,
        } => {
            let (config, compact) = load(&config, debug)?;
            let groups = if groups.is_empty() {
                config.groups
            } else {
                groups
            };
            let middleware = CompactMiddleware::new(Arc::new(compact), groups)?;
            let assets = runtime.block_on(middleware.run())?;

            match output {
                Output::Plain => {
                    for reference in assets.js() {
                        println!("{reference}");
                    }
                }
                Output::Html => println!("{}", assets.js_html()),
                Output::Json => println!("{}", serde_json::to_string_pretty(assets.js())?),
            }
            Ok(())
        }

        Commands::List { config } => {
            let (_, compact) = load(&config, false)?;
            let registry = compact.registry();
            for name in registry.list() {
                let namespace = registry.get(name)?;
                println!("{} ({} file(s))", name, namespace.files().len());
                for file in namespace.files() {
                    println!("  {}", file.display());
                }
            }
            Ok(())
        }

        #[cfg(feature = "service")]
        Commands::Serve {
            config,
            port,
            debug,
        } => {
            let (config, compact) = load(&config, debug)?;
            let destination = compact.destination().to_path_buf();
            let middleware = CompactMiddleware::new(Arc::new(compact), config.groups)?;
            let app = compact_core::service::dev_router(middleware, &destination);

            runtime.block_on(async move {
                let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
                let listener = tokio::net::TcpListener::bind(addr).await?;
                tracing::info!("Dev server starting on http://{}", addr);
                println!("Serving {} at http://{}", destination.display(), addr);

                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(async {
                        let _ = tokio::signal::ctrl_c().await;
                        println!("\nShutting down...");
                    })
                    .await?;
                tracing::info!("Dev server shut down");
                Ok::<(), Box<dyn std::error::Error>>(())
            })
        }
    }
}
