use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scrapyard_frontend::{ArtworkCompositor, ArtworkLayout};
use scrapyard_lib::session_log::LogEntry;
use scrapyard_lib::settings::{self, SettingsFile};
use scrapyard_lib::{
    CACHE_SOURCE, CacheSource, CacheStore, EngineConfig, EngineContext, FileOutcome, LowMatchLog,
    ResourceCache, ScrapeLog, ScrapePool, SourceAdapter, StopReason, WorkQueue, WorkerEvent,
};
use scrapyard_scraper::screenscraper::connect;
use scrapyard_scraper::{IMPORT_SOURCE, ImportSource, SCREENSCRAPER_SOURCE, ScrapeError, ScreenScraper};

use crate::chooser::StdinChooser;
use crate::cli_types::ScrapeArgs;
use crate::CliError;

const SOURCES: &[&str] = &[SCREENSCRAPER_SOURCE, IMPORT_SOURCE, CACHE_SOURCE];

/// Run the scrape command.
pub(crate) fn run_scrape(args: ScrapeArgs, quiet: bool) -> Result<(), CliError> {
    let settings = settings::load_settings()?;
    let mut config = build_config(&args, &settings)?;

    let queue = WorkQueue::from_folder(&config.input_dir, &config.extensions)?;
    if let Some(patterns) = &config.include {
        queue.filter_files(patterns, true)?;
    }
    if let Some(patterns) = &config.exclude {
        let dropped = queue.filter_files(patterns, false)?;
        log::debug!("{} file(s) excluded", dropped);
    }
    let total = queue.len();

    log::info!(
        "Scraping {} ({} file(s)) from {}",
        config.input_dir.display().if_supports_color(Stdout, |t| t.cyan()),
        total,
        config.source.if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "Cache: {}",
        config.cache_dir.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
    crate::log_blank();
    if total == 0 {
        log::info!(
            "{}",
            "Nothing to do.".if_supports_color(Stdout, |t| t.dimmed())
        );
        return Ok(());
    }

    let compositor = if config.export_artwork {
        match ArtworkLayout::load_or_create().and_then(|l| ArtworkCompositor::new(l, &config.export_dir)) {
            Ok(c) => Some(Arc::new(c)),
            Err(e) => {
                log::warn!(
                    "{} Failed to load artwork layout, export disabled: {}",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                    e,
                );
                config.export_artwork = false;
                None
            }
        }
    } else {
        None
    };

    let cache = Arc::new(ResourceCache::open(&config.cache_dir)?);
    let queue = Arc::new(queue);
    let rt = tokio::runtime::Runtime::new().map_err(|e| CliError::runtime(e.to_string()))?;

    let (run_log, reasons) = rt.block_on(async {
        let adapters = build_adapters(&mut config, quiet).await?;
        let config = Arc::new(config.clone());
        let mut ctx = EngineContext::new(queue.clone(), cache.clone(), config.clone())
            .with_match_log(Arc::new(LowMatchLog::in_dir(&config.log_dir)));
        if config.interactive {
            ctx = ctx.with_chooser(Arc::new(StdinChooser::new()));
        }
        if let Some(compositor) = compositor {
            ctx = ctx.with_compositor(compositor);
        }
        // Prompts and the progress bar would overwrite each other
        let hide_progress = quiet || config.interactive;
        Ok::<_, CliError>(run_pool(adapters, ctx, total, hide_progress).await)
    })?;
    cache.flush()?;

    print_summary(&run_log, &reasons, queue.len());

    if !args.no_log {
        let path = config.log_dir.join(format!(
            "scrape-{}-{}.log",
            config.platform,
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ));
        match run_log.write_to_file(&path) {
            Ok(()) => log::info!(
                "Log: {}",
                path.display().if_supports_color(Stdout, |t| t.dimmed())
            ),
            Err(e) => log::warn!("Could not write log {}: {}", path.display(), e),
        }
    }

    if reasons.iter().all(|r| *r == StopReason::SetupFailed) {
        return Err(CliError::config(format!(
            "{} could not be set up, no file was processed",
            config.source
        )));
    }
    Ok(())
}

/// Defaults, then the settings file, then command-line flags.
fn build_config(args: &ScrapeArgs, settings: &SettingsFile) -> Result<EngineConfig, CliError> {
    let source = args.source.trim().to_ascii_lowercase();
    if !SOURCES.contains(&source.as_str()) {
        return Err(CliError::config(format!(
            "unknown source '{}' (expected one of: {})",
            args.source,
            SOURCES.join(", ")
        )));
    }

    let mut config = EngineConfig::new(args.platform.trim().to_ascii_lowercase(), source);
    config.apply_settings(settings)?;

    if let Some(dir) = &args.input {
        config.input_dir = dir.clone();
        if settings.main.export_dir.is_none() {
            config.export_dir = dir.join("media");
        }
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.join(&config.platform);
    }
    if let Some(dir) = &args.export_dir {
        config.export_dir = dir.clone();
    }
    if let Some(dir) = &args.import_dir {
        config.import_dir = Some(dir.clone());
    }
    if let Some(exts) = &args.extensions {
        config.extensions = exts.clone();
    }
    if let Some(n) = args.threads {
        config.threads = n.max(1);
    }
    if let Some(media) = &args.media {
        config.set_media(media)?;
    }
    if let Some(n) = args.min_match {
        config.match_params.min_match = n;
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    if let Some(lang) = &args.lang {
        config.lang = lang.clone();
    }
    if args.include.is_some() {
        config.include = args.include.clone();
    }
    if args.exclude.is_some() {
        config.exclude = args.exclude.clone();
    }
    config.rescan = args.rescan;
    config.refresh = args.refresh;
    config.only_missing = args.only_missing;
    config.get_missing_resources = args.get_missing_resources;
    config.interactive = args.interactive;
    config.export_artwork = args.export;

    if config.export_artwork && config.source != CACHE_SOURCE {
        return Err(CliError::config("--export only applies to the cache source"));
    }
    if config.source == IMPORT_SOURCE && config.import_dir.is_none() {
        return Err(CliError::config(
            "the import source needs --import-dir or [import] dir in the settings file",
        ));
    }
    if !config.input_dir.is_dir() {
        return Err(CliError::config(format!(
            "input folder {} does not exist",
            config.input_dir.display()
        )));
    }
    Ok(config)
}

/// One adapter per worker. A source that cannot be set up still gets one
/// adapter; its worker reports the setup failure and stops.
async fn build_adapters(
    config: &mut EngineConfig,
    quiet: bool,
) -> Result<Vec<Box<dyn SourceAdapter>>, CliError> {
    let source = config.source.clone();
    let adapters: Vec<Box<dyn SourceAdapter>> = match source.as_str() {
        SCREENSCRAPER_SOURCE => match connect_screenscraper(quiet).await {
            Ok((client, max_threads)) => {
                if config.threads > max_threads {
                    log::warn!(
                        "{} ScreenScraper allows {} thread(s), using {}",
                        "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                        max_threads,
                        max_threads,
                    );
                    config.threads = max_threads;
                }
                (0..config.worker_count())
                    .map(|_| Box::new(ScreenScraper::new(client.for_worker(), config)) as Box<dyn SourceAdapter>)
                    .collect()
            }
            Err(e) => vec![Box::new(ScreenScraper::unavailable(config, &e))],
        },
        IMPORT_SOURCE => {
            let dir = config
                .import_dir
                .clone()
                .ok_or_else(|| CliError::config("no import folder configured"))?;
            (0..config.worker_count())
                .map(|_| Box::new(ImportSource::new(dir.clone(), config.naming())) as Box<dyn SourceAdapter>)
                .collect()
        }
        _ => (0..config.worker_count())
            .map(|_| Box::new(CacheSource::new(config.naming())) as Box<dyn SourceAdapter>)
            .collect(),
    };
    Ok(adapters)
}

async fn connect_screenscraper(
    quiet: bool,
) -> Result<(scrapyard_scraper::ScreenScraperClient, usize), ScrapeError> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message("Connecting to ScreenScraper...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let result = connect().await;
    pb.finish_and_clear();
    match result {
        Ok((client, user)) => {
            log::info!(
                "{} Connected to ScreenScraper (requests today: {}/{})",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                user.quota().requests_today(),
                user.quota().max_requests_per_day(),
            );
            Ok((client, user.max_threads().max(1) as usize))
        }
        Err(e) => {
            log::error!(
                "{} Failed to connect to ScreenScraper: {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                e,
            );
            if matches!(e, ScrapeError::Config(_) | ScrapeError::InvalidCredentials(_)) {
                crate::log_blank();
                log::error!("Set credentials via environment variables:");
                log::error!("  SCREENSCRAPER_DEVID, SCREENSCRAPER_DEVPASSWORD");
                log::error!("  SCREENSCRAPER_SSID, SCREENSCRAPER_SSPASSWORD (optional)");
                log::error!("Or add a [screenscraper] table to the file shown by 'scrapyard credentials'.");
            }
            Err(e)
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {msg}")
        .map(|s| s.tick_chars("/-\\|"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

async fn run_pool(
    adapters: Vec<Box<dyn SourceAdapter>>,
    ctx: EngineContext,
    total: usize,
    hide_progress: bool,
) -> (ScrapeLog, Vec<StopReason>) {
    let pb = if hide_progress {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(bar_style());
        pb
    };

    let mut run_log = ScrapeLog::new();
    let reasons = ScrapePool::start(adapters, ctx)
        .run_to_end(|event| match event {
            WorkerEvent::FileStarted { file, .. } => pb.set_message(file.file_name().to_string()),
            WorkerEvent::FileFinished(outcome) => {
                pb.inc(1);
                let line = outcome_line(outcome);
                pb.suspend(|| log::info!("{}", line));
                for warning in outcome.report.warnings() {
                    log::debug!("  {}: {}", outcome.file.file_name(), warning);
                }
                run_log.add_outcome(outcome);
            }
            WorkerEvent::Finished {
                worker,
                processed,
                reason,
            } => log::debug!("Worker {} done after {} file(s): {}", worker, processed, reason),
        })
        .await;
    pb.finish_and_clear();

    for reason in &reasons {
        run_log.add_stop(reason.clone());
    }
    (run_log, reasons)
}

/// One status line per processed file.
fn outcome_line(outcome: &FileOutcome) -> String {
    let ok = "\u{2714}".if_supports_color(Stdout, |t| t.green()).to_string();
    let warn = "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()).to_string();
    let fail = "\u{2718}".if_supports_color(Stdout, |t| t.red()).to_string();

    match LogEntry::from_outcome(outcome) {
        LogEntry::Matched {
            file,
            title,
            score,
            completeness,
            warnings,
        } => {
            let symbol = if warnings.is_empty() { ok } else { warn };
            format!(
                "{} {} {} {} {}",
                symbol,
                file,
                "->".if_supports_color(Stdout, |t| t.dimmed()),
                title.if_supports_color(Stdout, |t| t.bold()),
                format!("({}% match, {}% complete)", score, completeness)
                    .if_supports_color(Stdout, |t| t.dimmed()),
            )
        }
        LogEntry::Cached { file, title, exported } => {
            let artwork = exported
                .map(|p| format!(" [{}]", p.display()))
                .unwrap_or_default();
            format!("{} {} {} {}{}", ok, file, "=".if_supports_color(Stdout, |t| t.dimmed()), title, artwork)
        }
        LogEntry::LowMatch { file, candidate, score } => format!(
            "{} {}: best candidate '{}' only {}%",
            warn, file, candidate, score
        ),
        LogEntry::NotFound { file } => format!("{} {}: not found", fail, file),
        LogEntry::Skipped { file, reason } => format!(
            "{}",
            format!("- {}: {}", file, reason).if_supports_color(Stdout, |t| t.dimmed())
        ),
        LogEntry::Failed { file, message } => format!("{} {}: {}", fail, file, message),
    }
}

fn print_summary(run_log: &ScrapeLog, reasons: &[StopReason], left: usize) {
    let summary = run_log.summary();
    crate::log_blank();
    log::info!("{}", "Summary".if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  Matched:   {} ({} with warnings)",
        summary.matched,
        summary.with_warnings
    );
    if summary.cached > 0 {
        log::info!(
            "  Cached:    {} ({} exported)",
            summary.cached,
            summary.exported
        );
    }
    log::info!("  Low match: {}", summary.low_match);
    log::info!("  Not found: {}", summary.not_found);
    log::info!("  Skipped:   {}", summary.skipped);
    if summary.failed > 0 {
        log::info!("  Failed:    {}", summary.failed);
    }

    if reasons.contains(&StopReason::QuotaExhausted) {
        log::warn!(
            "{} Request quota exhausted, {} file(s) left unprocessed",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            left,
        );
    }
    for reason in reasons {
        if let StopReason::Fatal(msg) = reason {
            log::error!(
                "{} Worker stopped: {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                msg
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/scrape_tests.rs"]
mod tests;
