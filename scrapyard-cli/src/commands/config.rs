use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scrapyard_lib::settings;

use crate::CliError;

pub(crate) fn run_config_path() -> Result<(), CliError> {
    println!("{}", settings::settings_path().display());
    Ok(())
}

/// Print the settings file, after checking that it parses.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = settings::settings_path();
    if !path.exists() {
        log::info!(
            "{} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found, defaults in use)".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }
    settings::load_settings_from(&path)?;

    log::info!(
        "{}",
        path.display().if_supports_color(Stdout, |t| t.cyan())
    );
    crate::log_blank();
    match settings::load_settings_string() {
        Some(contents) => println!("{}", contents.trim_end()),
        None => log::warn!("Could not read {}", path.display()),
    }
    Ok(())
}
