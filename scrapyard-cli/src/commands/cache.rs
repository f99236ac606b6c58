use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scrapyard_lib::settings::{self, data_dir};
use scrapyard_lib::{CACHE_SOURCE, CacheStore, EngineConfig, ResourceCache};

use super::format_bytes;
use crate::CliError;

/// Cache directory of `platform`, honouring the settings file.
fn platform_cache_dir(platform: &str) -> Result<PathBuf, CliError> {
    let mut config = EngineConfig::new(platform, CACHE_SOURCE);
    config.apply_settings(&settings::load_settings()?)?;
    Ok(config.cache_dir)
}

pub(crate) fn run_cache_stats(platform: &str) -> Result<(), CliError> {
    let dir = platform_cache_dir(platform)?;
    if !dir.exists() {
        log::info!(
            "{}",
            format!("No cache for '{}' yet.", platform).if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }
    let stats = ResourceCache::open(&dir)?.stats();

    log::info!(
        "{} {}",
        "Cache:".if_supports_color(Stdout, |t| t.bold()),
        dir.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    crate::log_blank();
    log::info!("  Records:    {}", stats.records);
    log::info!("  Resources:  {}", stats.resources);
    for (source, count) in &stats.per_source {
        let label = format!("{:<12}", source);
        log::info!(
            "    {} {}",
            label.if_supports_color(Stdout, |t| t.dimmed()),
            count
        );
    }
    log::info!("  Unmatched:  {}", stats.unmatched);
    log::info!("  Quick ids:  {}", stats.quick_ids);
    log::info!("  Disk usage: {}", format_bytes(stats.disk_bytes));
    Ok(())
}

pub(crate) fn run_cache_clear(platform: &str, source: Option<&str>) -> Result<(), CliError> {
    let dir = platform_cache_dir(platform)?;
    match source {
        Some(source) => {
            let cache = ResourceCache::open(&dir)?;
            let removed = cache.clear_source(source)?;
            cache.flush()?;
            log::info!(
                "{} Removed {} resource(s) stored by {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                removed,
                source.if_supports_color(Stdout, |t| t.bold()),
            );
        }
        None => {
            let freed = scrapyard_lib::cache::clear(&dir)?;
            log::info!(
                "{} Cache for {} cleared ({} freed)",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                platform.if_supports_color(Stdout, |t| t.bold()),
                format_bytes(freed),
            );
        }
    }
    Ok(())
}

pub(crate) fn run_cache_path(platform: Option<&str>) -> Result<(), CliError> {
    let dir = match platform {
        Some(platform) => platform_cache_dir(platform)?,
        None => settings::load_settings()?
            .main
            .cache_dir
            .unwrap_or_else(|| data_dir().join("cache")),
    };
    println!("{}", dir.display());
    Ok(())
}
