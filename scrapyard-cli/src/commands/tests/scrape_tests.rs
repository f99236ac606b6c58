use super::*;
use clap::Parser;

use crate::cli_types::{Cli, Commands};

fn parse(extra: &[&str]) -> ScrapeArgs {
    let mut argv = vec!["scrapyard", "scrape", "-p", "SNES"];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Scrape(args) => args,
        _ => panic!("not a scrape command"),
    }
}

fn input_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn test_flags_override_defaults() {
    let dir = input_dir();
    let input = dir.path().to_str().unwrap();
    let args = parse(&[
        "-i", input, "-t", "3", "--rescan", "--min-match", "80", "--media", "covers,videos",
        "--region", "eu", "--exclude", "*(Beta)*",
    ]);
    let config = build_config(&args, &SettingsFile::default()).unwrap();

    assert_eq!(config.platform, "snes");
    assert_eq!(config.source, SCREENSCRAPER_SOURCE);
    assert_eq!(config.input_dir, dir.path());
    assert_eq!(config.export_dir, dir.path().join("media"));
    assert_eq!(config.threads, 3);
    assert!(config.rescan);
    assert!(!config.refresh);
    assert_eq!(config.match_params.min_match, 80);
    assert_eq!(config.region, "eu");
    assert_eq!(config.exclude.as_deref(), Some("*(Beta)*"));
    assert!(config.caches(scrapyard_core::FieldKind::Video));
    assert!(!config.caches(scrapyard_core::FieldKind::Screenshot));
}

#[test]
fn test_settings_fill_in_unset_flags() {
    let dir = input_dir();
    let mut settings = SettingsFile::default();
    settings.main.threads = Some(4);
    settings.main.lang = Some("fr".into());
    settings.main.export_dir = Some(dir.path().join("exports"));

    let args = parse(&["-i", dir.path().to_str().unwrap(), "--lang", "de"]);
    let config = build_config(&args, &settings).unwrap();
    assert_eq!(config.threads, 4);
    assert_eq!(config.lang, "de");
    // An export folder from the settings file is kept
    assert_eq!(config.export_dir, dir.path().join("exports"));
}

#[test]
fn test_unknown_source_is_rejected() {
    let dir = input_dir();
    let args = parse(&["-i", dir.path().to_str().unwrap(), "-s", "mobygames"]);
    assert!(matches!(
        build_config(&args, &SettingsFile::default()),
        Err(CliError::Config(_))
    ));
}

#[test]
fn test_export_needs_the_cache_source() {
    let dir = input_dir();
    let input = dir.path().to_str().unwrap();
    let args = parse(&["-i", input, "--export"]);
    assert!(build_config(&args, &SettingsFile::default()).is_err());

    let args = parse(&["-i", input, "-s", "cache", "--export"]);
    let config = build_config(&args, &SettingsFile::default()).unwrap();
    assert!(config.export_artwork);
}

#[test]
fn test_import_needs_a_folder() {
    let dir = input_dir();
    let input = dir.path().to_str().unwrap();
    let args = parse(&["-i", input, "-s", "import"]);
    assert!(build_config(&args, &SettingsFile::default()).is_err());

    let import = dir.path().join("import");
    let args = parse(&["-i", input, "-s", "import", "--import-dir", import.to_str().unwrap()]);
    let config = build_config(&args, &SettingsFile::default()).unwrap();
    assert_eq!(config.import_dir, Some(import));
}

#[test]
fn test_missing_input_folder_is_an_error() {
    let dir = input_dir();
    let missing = dir.path().join("nope");
    let args = parse(&["-i", missing.to_str().unwrap()]);
    assert!(build_config(&args, &SettingsFile::default()).is_err());
}

#[test]
fn test_non_media_kind_is_rejected() {
    let dir = input_dir();
    let args = parse(&["-i", dir.path().to_str().unwrap(), "--media", "covers,title"]);
    assert!(matches!(
        build_config(&args, &SettingsFile::default()),
        Err(CliError::Engine(_))
    ));
}

#[test]
fn test_min_match_range() {
    let argv = ["scrapyard", "scrape", "-p", "snes", "--min-match", "101"];
    assert!(Cli::try_parse_from(argv).is_err());
}
