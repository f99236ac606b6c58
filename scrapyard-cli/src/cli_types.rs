//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scrapyard")]
#[command(about = "Scrape game metadata and artwork into a local cache", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging (with timestamps)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Scrape the game files of one platform
    Scrape(ScrapeArgs),

    /// Inspect or clear the resource cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show or store ScreenScraper credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Args, Clone)]
pub(crate) struct ScrapeArgs {
    /// Platform of the files (e.g. snes, megadrive, psx)
    #[arg(short, long)]
    pub platform: String,

    /// Source to scrape from: screenscraper, import or cache
    #[arg(short, long, default_value = "screenscraper")]
    pub source: String,

    /// Folder containing the game files (default: settings or current directory)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Only scan files with these extensions (e.g. sfc,smc,zip)
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Number of workers (capped by the source's allowance)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Media kinds to store (e.g. covers,screenshots,wheels,videos)
    #[arg(long, value_delimiter = ',')]
    pub media: Option<Vec<String>>,

    /// Re-search every file even when cached
    #[arg(long)]
    pub rescan: bool,

    /// Refresh what this source stored before
    #[arg(long)]
    pub refresh: bool,

    /// Only process files this source has no data for
    #[arg(long)]
    pub only_missing: bool,

    /// Revisit files whose cached record is incomplete
    #[arg(long)]
    pub get_missing_resources: bool,

    /// Pick the matching game by hand
    #[arg(long)]
    pub interactive: bool,

    /// Minimum title match percentage (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_match: Option<u8>,

    /// Only process files matching these comma-separated patterns
    #[arg(long)]
    pub include: Option<String>,

    /// Skip files matching these comma-separated patterns
    #[arg(long)]
    pub exclude: Option<String>,

    /// Compose export artwork from cached records (cache source only)
    #[arg(long)]
    pub export: bool,

    /// Directory for exported artwork
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Preferred region for names and media (e.g. us, eu, jp)
    #[arg(long)]
    pub region: Option<String>,

    /// Preferred language for descriptions (e.g. en, fr, de)
    #[arg(long)]
    pub lang: Option<String>,

    /// Folder for the import source
    #[arg(long)]
    pub import_dir: Option<PathBuf>,

    /// Cache directory root (a folder per platform is created inside)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Do not write the run log file
    #[arg(long)]
    pub no_log: bool,
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show record and resource counts for a platform
    Stats {
        /// Platform cache to inspect
        platform: String,
    },

    /// Delete a platform's cache, or only what one source stored
    Clear {
        platform: String,

        /// Only remove resources stored by this source
        #[arg(long)]
        source: Option<String>,
    },

    /// Print the cache directory
    Path {
        platform: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the settings file path
    Path,

    /// Print the current settings
    Show,
}

#[derive(Subcommand)]
pub(crate) enum CredentialsAction {
    /// Show each credential and where it comes from
    Show,

    /// Write credentials to the config file, keeping fields not given
    Set {
        #[arg(long)]
        dev_id: Option<String>,

        #[arg(long)]
        dev_password: Option<String>,

        /// ScreenScraper account name
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        user_password: Option<String>,
    },
}
