//! trellis command line.
//!
//! ```text
//! trellis check trellis.toml     validate, list the files each pattern matches
//! trellis serve trellis.toml     boot with the built-in status controller
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};

use axum::{routing::get, Extension, Json};
use clap::{Parser, Subcommand};
use serde_json::json;

use trellis::app::SharedContext;
use trellis::config::load_config;
use trellis::lifecycle::stop_signal;
use trellis::observability::format::tagged;
use trellis::{Bootstrap, BoxError, ControllerExport, ControllerOptions, LoggerFactory, Scope};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about = "Glob-registered controllers on axum", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and list the files its controller patterns match
    Check {
        /// Path to the TOML config
        config: PathBuf,
    },
    /// Serve until Ctrl+C, with `GET /status` mounted under the global prefix
    Serve {
        /// Path to the TOML config
        config: PathBuf,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Serve { config, port } => serve(&config, port).await,
    }
}

fn check(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config(path)?;
    println!("{}: ok", path.display());

    for pattern in config.patterns() {
        println!("{}", pattern);
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(file) => println!("  {}", file.display()),
                Err(e) => println!("  unreadable: {}", e),
            }
        }
    }
    Ok(())
}

async fn serve(path: &Path, port: Option<u16>) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let logger = LoggerFactory::create(&config.logger);
    logger.install_global()?;

    let config = config.controller(ControllerExport::new(status_controller).named("status"));
    let mut app = Bootstrap::new(config).logger(logger.clone()).build()?;

    let address = app.start().await?;
    logger.info(tagged(&["Serving on", &address], logger.ansi()));

    let signal = stop_signal().await?;
    logger.info(tagged(&[&signal.to_string(), "received, shutting down"], logger.ansi()));
    app.close().await?;
    Ok(())
}

fn status_controller(scope: &mut Scope, options: &ControllerOptions) -> Result<(), BoxError> {
    let prefix = options.prefix.clone();
    scope.route(
        "/status",
        get(move |Extension(ctx): Extension<SharedContext>| {
            let prefix = prefix.clone();
            async move {
                Json(json!({
                    "status": "ok",
                    "prefix": prefix,
                    "context": ctx.snapshot(),
                }))
            }
        }),
    );
    Ok(())
}
