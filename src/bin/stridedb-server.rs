//! StrideDB statement server
//!
//! Serves the line protocol in `stridedb::server` over TCP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use stridedb::{logging, server, DbConfig};

#[derive(Parser, Debug)]
#[command(name = "stridedb-server", version, about = "Serve StrideDB statements over TCP")]
struct Args {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the table files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:7878.
    #[arg(long)]
    listen: Option<String>,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(logging::parse_level(&args.log_level)).context("installing logger")?;

    let mut config = match &args.config {
        Some(path) => DbConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => DbConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    info!("durability: {}", config.durability.description());
    server::run(config).context("server stopped")
}
