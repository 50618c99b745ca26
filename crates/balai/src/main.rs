//! `balai` - CLI for the village hall website
//!
//! Runs the web server and offers a few maintenance commands for the data
//! files and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use balai::cli::{Cli, Command, ConfigCommand, ServeCommand};
use balai::{init_logging, Config, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // `config path` and `config validate` must work even when the active
    // configuration does not load.
    let config_path = cli.config;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(load_config(config_path)?, serve_cmd).await,
        Command::Init => handle_init(&load_config(config_path)?),
        Command::Status(status_cmd) => {
            handle_status(&load_config(config_path)?, status_cmd.json)
        }
        Command::Config(ConfigCommand::Path) => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
            Ok(())
        }
        Command::Config(ConfigCommand::Validate { file }) => {
            handle_validate(file.or(config_path))
        }
        Command::Config(ConfigCommand::Show { json }) => {
            handle_show(&load_config(config_path)?, json)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("loading configuration")
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    balai::serve(&config).await?;
    Ok(())
}

fn handle_init(config: &Config) -> anyhow::Result<()> {
    let store = Store::open(&config.storage.data_dir).with_context(|| {
        format!(
            "initializing data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    println!("Data directory ready: {}", store.data_dir().display());
    println!("  {}", store.news().path().display());
    println!("  {}", store.complaints().path().display());
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let stats = Store::new(&config.storage.data_dir).stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("balai status");
    println!("------------");
    println!("Data directory: {}", stats.data_dir.display());
    println!("News items:     {}", stats.news_count);
    println!("Complaints:     {}", stats.complaint_count);
    for (status, count) in &stats.complaints_by_status {
        println!("  {status:<14}{count}");
    }
    if let Some(newest) = stats.newest_news {
        println!("Latest news:    {}", newest.to_rfc3339());
    }
    if let Some(newest) = stats.newest_complaint {
        println!("Latest complaint: {}", newest.to_rfc3339());
    }
    Ok(())
}

fn handle_show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("Current Configuration");
        println!("=====================");
        println!();
        println!("[Server]");
        println!("  Listen address:     {}", config.listen_addr());
        println!();
        println!("[Storage]");
        println!("  Data directory:     {}", config.storage.data_dir.display());
        println!("  News file:          {}", config.news_path().display());
        println!("  Complaints file:    {}", config.complaints_path().display());
        println!();
        println!("[Admin]");
        println!("  Username:           {}", config.admin_credentials().username);
        println!(
            "  Default credential: {}",
            config.uses_default_credentials()
        );
        println!(
            "  Require explicit:   {}",
            config.admin.require_credentials
        );
    }
    Ok(())
}

fn handle_validate(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
    Ok(())
}
