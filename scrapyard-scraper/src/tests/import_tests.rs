use super::*;
use std::collections::HashSet;

use scrapyard_lib::adapter::fetch_game_data;

fn write(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("textual").join("Super Game 2 (USA).toml"),
        br#"
title = "Super Game 2: The Return"
developer = "Studio"
release_date = "1993"
tags = ["Platform", " "]
"#,
    );
    write(
        &dir.path().join("cover").join("Super Game 2 (USA).png"),
        b"png",
    );
    write(
        &dir.path().join("wheel").join("Other Game.png"),
        b"png",
    );
    dir
}

fn rom(name: &str) -> FileDescriptor {
    FileDescriptor::new(format!("/roms/snes/{}", name)).unwrap()
}

#[tokio::test]
async fn test_single_pass_on_base_name() {
    let dir = folder();
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let file = rom("Super Game 2 (USA).sfc");
    let mut candidates = Vec::new();
    let mut report = FileReport::new(file.file_name());

    let pass = source
        .run_passes(&mut candidates, &file, &file, &mut report)
        .await
        .unwrap();
    assert_eq!(pass, Some(1));
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "Super Game 2 (USA)");
    assert_eq!(candidates[0].title, source.compare_title(&file));
}

#[tokio::test]
async fn test_no_data_means_no_candidates() {
    let dir = folder();
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let file = rom("Unknown (USA).sfc");
    let mut candidates = Vec::new();
    let mut report = FileReport::new(file.file_name());

    let pass = source
        .run_passes(&mut candidates, &file, &file, &mut report)
        .await
        .unwrap();
    assert_eq!(pass, None);
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn test_media_only_entry_is_found() {
    let dir = folder();
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let found = source.search("Other Game", &rom("Other Game.sfc")).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_fetches_text_lists_and_files() {
    let dir = folder();
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let candidate = CandidateEntry::new("Super Game 2", "Super Game 2 (USA)", "");
    let mut record = ResolvedRecord::new("snes", IMPORT_SOURCE);

    let warnings = fetch_game_data(&mut source, &candidate, &mut record, &HashSet::new(), None)
        .await
        .unwrap();
    assert!(warnings.is_empty());

    assert_eq!(record.title(), Some("Super Game 2: The Return"));
    assert_eq!(record.text(FieldKind::Developer), Some("Studio"));
    assert_eq!(record.list(FieldKind::Tags), Some(&["Platform".to_string()][..]));
    assert_eq!(
        record.media(FieldKind::Cover),
        Some(&Media::File(
            dir.path().join("cover").join("Super Game 2 (USA).png")
        ))
    );
    assert!(!record.has(FieldKind::Wheel));
    assert!(!record.has(FieldKind::Publisher));
}

#[tokio::test]
async fn test_incremental_skips_cached_fields() {
    let dir = folder();
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let candidate = CandidateEntry::new("Super Game 2", "Super Game 2 (USA)", "");
    let mut cached = ResolvedRecord::new("snes", IMPORT_SOURCE);
    cached.set_text(FieldKind::Developer, "Old Studio", IMPORT_SOURCE);
    let mut record = ResolvedRecord::new("snes", IMPORT_SOURCE);

    fetch_game_data(&mut source, &candidate, &mut record, &HashSet::new(), Some(&cached))
        .await
        .unwrap();
    assert!(!record.has(FieldKind::Developer));
    assert!(record.has(FieldKind::Title));
}

#[tokio::test]
async fn test_broken_textual_file_is_a_warning() {
    let dir = folder();
    write(
        &dir.path().join("textual").join("Broken.toml"),
        b"title = [unterminated",
    );
    let mut source = ImportSource::new(dir.path(), NamingOptions::default());
    let candidate = CandidateEntry::new("Broken", "Broken", "");
    let mut record = ResolvedRecord::new("snes", IMPORT_SOURCE);

    let warnings = fetch_game_data(&mut source, &candidate, &mut record, &HashSet::new(), None)
        .await
        .unwrap();
    assert!(!warnings.is_empty());
    assert!(warnings[0].starts_with("title:"));
}

#[tokio::test]
async fn test_missing_folder_fails_setup() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = ImportSource::new(dir.path().join("nope"), NamingOptions::default());
    assert!(source.quota().is_exhausted());

    let file = rom("Game.sfc");
    let mut report = FileReport::new(file.file_name());
    let err = source
        .run_passes(&mut Vec::new(), &file, &file, &mut report)
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}
