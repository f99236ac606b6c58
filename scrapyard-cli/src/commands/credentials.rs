use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scrapyard_scraper::{
    CredentialSource, Credentials, config_path, credential_sources, save_to_file,
};

use crate::CliError;

/// First two characters, the rest hidden.
fn mask_value(s: &str) -> String {
    let shown: String = s.chars().take(2).collect();
    if shown.chars().count() == s.chars().count() {
        "****".to_string()
    } else {
        format!("{}****", shown)
    }
}

/// Show each ScreenScraper credential and where it comes from.
pub(crate) fn run_credentials_show() -> Result<(), CliError> {
    log::info!(
        "{}",
        "ScreenScraper credentials".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    match config_path() {
        Some(p) => {
            let status = if p.exists() { "(exists)" } else { "(not found)" };
            log::info!(
                "  Config file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                status.if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        None => log::info!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    crate::log_blank();

    let sources = credential_sources();
    // Fails when a required field is missing; the sources still tell why
    let creds = Credentials::load().ok();
    let value = |get: fn(&Credentials) -> Option<String>| creds.as_ref().and_then(get);

    let fields: [(&str, &CredentialSource, Option<String>, bool); 5] = [
        ("dev_id", &sources.dev_id, value(|c| Some(c.dev_id.clone())), false),
        (
            "dev_password",
            &sources.dev_password,
            value(|c| Some(c.dev_password.clone())),
            true,
        ),
        (
            "soft_name",
            &sources.soft_name,
            value(|c| Some(c.soft_name.clone())),
            false,
        ),
        ("user_id", &sources.user_id, value(|c| c.user_id.clone()), false),
        (
            "user_password",
            &sources.user_password,
            value(|c| c.user_password.clone()),
            true,
        ),
    ];

    for (name, source, value, secret) in fields {
        let label = format!("{:<15}", format!("{}:", name));
        let shown = match (source, value) {
            (CredentialSource::Missing, _) | (_, None) => {
                "not set".if_supports_color(Stdout, |t| t.yellow()).to_string()
            }
            (_, Some(v)) if secret => mask_value(&v),
            (_, Some(v)) => v,
        };
        log::info!(
            "  {} {} {}",
            label.if_supports_color(Stdout, |t| t.cyan()),
            shown,
            format!("({})", source).if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}

/// Merge the given fields into the stored credentials and save them.
pub(crate) fn run_credentials_set(
    dev_id: Option<String>,
    dev_password: Option<String>,
    user_id: Option<String>,
    user_password: Option<String>,
) -> Result<(), CliError> {
    let base = match Credentials::load() {
        Ok(existing) => existing,
        Err(_) => match (&dev_id, &dev_password) {
            (Some(id), Some(pw)) => Credentials::new(id.clone(), pw.clone()),
            _ => {
                return Err(CliError::config(
                    "No developer credentials stored yet; pass --dev-id and --dev-password",
                ));
            }
        },
    };
    let creds = base.with_overrides(dev_id, dev_password, user_id, user_password);
    let path = save_to_file(&creds)?;
    log::info!(
        "{} Credentials saved to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display(),
    );
    Ok(())
}
