//! `schoolmap` command-line entry point.
//!
//! # Responsibility
//! - Load configuration and start process logging.
//! - Dispatch to the serve, import and preview commands.

mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::AppConfig;
use log::info;
use schoolmap_core::{init_logging, PageRequest, StoreSession};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "schoolmap", version, about = "School map directory")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the listing API.
    Serve,
    /// Upsert schools from a JSON array file into the store.
    Import { file: PathBuf },
    /// Render one page from a running server on an in-memory map.
    Preview {
        /// Server origin; defaults to `preview.base_url`.
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Marker index to click before printing the detail panel.
        #[arg(long)]
        select: Option<usize>,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging_config()?)
        .map_err(anyhow::Error::msg)
        .context("failed to start logging")?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        schoolmap_core::core_version()
    );

    match cli.command {
        Command::Serve => commands::serve(&config.server, config.db_path()?).await,
        Command::Import { file } => {
            let session = StoreSession::file(config.db_path()?);
            let summary = commands::import(&session, &file)?;
            println!("imported={} rejected={}", summary.imported, summary.rejected);
            Ok(())
        }
        Command::Preview {
            base_url,
            limit,
            skip,
            select,
        } => {
            let base_url = base_url.unwrap_or_else(|| config.preview.base_url.clone());
            let page = PageRequest::new(limit.unwrap_or(config.preview.limit), skip);
            let rendered = commands::preview(&base_url, page, select).await?;
            print!("{rendered}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_preview_flags() {
        let cli = Cli::parse_from([
            "schoolmap", "--config", "app.toml", "preview", "--limit", "5", "--select", "2",
        ]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("app.toml")));
        let Command::Preview {
            limit, skip, select, base_url,
        } = cli.command
        else {
            panic!("expected preview");
        };
        assert_eq!((limit, skip, select), (Some(5), 0, Some(2)));
        assert!(base_url.is_none());
    }
}
