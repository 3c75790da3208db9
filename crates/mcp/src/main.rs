use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use std::io;
use std::path::PathBuf;

use lecture_notes_core::{Config, NoteService};
use lecture_notes_mcp::server::McpServer;

#[derive(Parser)]
#[command(name = "lecture-notes-mcp")]
#[command(version)]
#[command(about = "MCP server that turns lecture transcripts into course notes")]
struct Cli {
    #[arg(short, long, env = "LECTURE_NOTES_CONFIG", help = "Config file (.json, .yaml or .yml)")]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info", help = "Log filter when RUST_LOG is unset")]
    log_level: String,
    #[arg(long, help = "Print the course table and exit")]
    list_courses: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol; logs go to stderr only.
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str()))
        .target(Target::Stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            log::warn!("no config file given, using built-in defaults");
            Config::default()
        }
    };

    let service = NoteService::from_config(&config).context("invalid configuration")?;
    log::info!("loaded {} course mappings", service.courses().len());

    if cli.list_courses {
        print!("{}", service.list_courses());
        return Ok(());
    }

    let mut server = McpServer::new(service);
    server
        .serve(io::stdin().lock(), io::stdout())
        .context("stdio transport failed")?;

    log::info!("stdin closed, shutting down");
    Ok(())
}
