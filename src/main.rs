//! route53-ddns - Dynamic DNS updater for AWS Route 53.

use clap::{Parser, Subcommand};
use route53_ddns::config::{self, Config};
use route53_ddns::logging;
use route53_ddns::storage::Storage;
use route53_ddns::updater::{Outcome, Updater};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "route53-ddns")]
#[command(about = "Point a Route 53 A record at this host's public IPv4 address")]
#[command(version)]
struct Cli {
    /// Storage root holding logs/ and cache/
    #[arg(short, long, global = true, env = "ROUTE53_DDNS_STORAGE")]
    storage: Option<PathBuf>,

    /// Read settings from this .env file instead of ./.env
    #[arg(short, long, global = true)]
    env_file: Option<PathBuf>,

    /// Show debug output on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the record if the public address changed (default)
    Run,

    /// Show the public and cached addresses without updating anything
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let storage = Storage::new(cli.storage.unwrap_or_else(Storage::default_root));

    if let Err(e) = logging::init(&storage.logs_dir(), cli.verbose) {
        eprintln!("route53-ddns: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(cli.env_file, &storage).await,
        Commands::Status => cmd_status(cli.env_file, &storage).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::record_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(env_file: Option<PathBuf>) -> route53_ddns::Result<Config> {
    config::load_env_file(env_file.as_deref())?;
    Config::from_env()
}

async fn cmd_run(env_file: Option<PathBuf>, storage: &Storage) -> route53_ddns::Result<()> {
    let config = load_config(env_file)?;
    let updater = Updater::new(&config, storage);

    match updater.run().await? {
        Outcome::Unchanged { address } => {
            tracing::info!("{} already points at {}", config.target.record_name, address);
        }
        Outcome::Updated { old, new, change } => {
            tracing::info!(
                "{} updated {} -> {} (change {} {})",
                config.target.record_name,
                old,
                new,
                change.id,
                change.status
            );
        }
    }

    Ok(())
}

async fn cmd_status(env_file: Option<PathBuf>, storage: &Storage) -> route53_ddns::Result<()> {
    let config = load_config(env_file)?;
    let updater = Updater::new(&config, storage);
    let status = updater.status().await?;

    println!("route53-ddns Status");
    println!("===================\n");
    println!("Record:            {}", config.target.record_name);
    println!("Hosted zone:       {}", config.target.zone_id);
    println!("Current Public IP: {}", status.public);
    println!("Cached IP:         {}", status.cached);
    println!(
        "Update pending:    {}",
        if status.update_pending() { "yes" } else { "no" }
    );

    Ok(())
}
