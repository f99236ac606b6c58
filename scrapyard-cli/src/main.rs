//! scrapyard CLI
//!
//! Command-line interface for scraping game metadata and artwork.

mod chooser;
mod cli_types;
mod commands;
mod error;

use std::io::Write;

use clap::Parser;
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::cli_types::{CacheAction, Cli, Commands, ConfigAction, CredentialsAction};
pub(crate) use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Scrape(args) => commands::scrape::run_scrape(args, cli.quiet),
        Commands::Cache { action } => match action {
            CacheAction::Stats { platform } => commands::cache::run_cache_stats(&platform),
            CacheAction::Clear { platform, source } => {
                commands::cache::run_cache_clear(&platform, source.as_deref())
            }
            CacheAction::Path { platform } => commands::cache::run_cache_path(platform.as_deref()),
        },
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::run_config_path(),
            ConfigAction::Show => commands::config::run_config_show(),
        },
        Commands::Credentials { action } => match action {
            CredentialsAction::Show => commands::credentials::run_credentials_show(),
            CredentialsAction::Set {
                dev_id,
                dev_password,
                user_id,
                user_password,
            } => commands::credentials::run_credentials_set(
                dev_id,
                dev_password,
                user_id,
                user_password,
            ),
        },
    };

    if let Err(e) = result {
        log::error!(
            "{} {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            e
        );
        std::process::exit(1);
    }
}

/// Messages only by default; `--verbose` adds timestamps, levels and debug
/// output. `RUST_LOG` still wins when set.
fn init_logger(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if !verbose {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.parse_default_env();
    builder.init();
}

/// Print an empty line through the logger.
pub(crate) fn log_blank() {
    log::info!("");
}
