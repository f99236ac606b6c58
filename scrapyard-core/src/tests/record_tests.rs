use super::*;

#[test]
fn test_field_kind_parses_plural_names() {
    assert_eq!("covers".parse::<FieldKind>().unwrap(), FieldKind::Cover);
    assert_eq!("Screenshots".parse::<FieldKind>().unwrap(), FieldKind::Screenshot);
    assert_eq!("wheel".parse::<FieldKind>().unwrap(), FieldKind::Wheel);
    assert!("boxart".parse::<FieldKind>().is_err());
}

#[test]
fn test_field_kind_names_round_trip() {
    for kind in FieldKind::ALL {
        assert_eq!(kind.name().parse::<FieldKind>().unwrap(), *kind);
    }
}

#[test]
fn test_media_and_text_partition() {
    for kind in FieldKind::ALL {
        assert_ne!(kind.is_media(), FieldKind::TEXT.contains(kind));
    }
}

#[test]
fn test_set_ignores_empty_values() {
    let mut record = ResolvedRecord::new("snes", "test");
    assert!(!record.set_text(FieldKind::Developer, "   ", "test"));
    assert!(!record.set_list(FieldKind::Tags, vec![" ".to_string()], "test"));
    assert!(!record.has(FieldKind::Developer));
    assert!(!record.has(FieldKind::Tags));
}

#[test]
fn test_merge_keeps_existing_and_provenance() {
    let mut fresh = ResolvedRecord::new("snes", "live");
    fresh.set_text(FieldKind::Title, "Super Game", "live");

    let mut cached = ResolvedRecord::new("snes", "cache");
    cached.set_text(FieldKind::Title, "Old Title", "import");
    cached.set_text(FieldKind::Developer, "Acme", "import");

    let copied = fresh.merge_missing_from(&cached);
    assert_eq!(copied, 1);
    assert_eq!(fresh.title(), Some("Super Game"));
    assert_eq!(fresh.get(FieldKind::Developer).unwrap().source, "import");
}

#[test]
fn test_completeness() {
    let mut record = ResolvedRecord::new("snes", "test");
    let expected = [FieldKind::Title, FieldKind::Description, FieldKind::Cover, FieldKind::Screenshot];
    assert_eq!(record.compute_completeness(&expected), 0);

    record.set_text(FieldKind::Title, "Game", "test");
    record.set_media(
        FieldKind::Cover,
        Media::Data {
            bytes: vec![1, 2, 3],
            extension: "png".to_string(),
        },
        "test",
    );
    assert_eq!(record.compute_completeness(&expected), 50);
    assert_eq!(record.compute_completeness(&[]), 100);
}

#[test]
fn test_meaningful_requires_more_than_title() {
    let mut record = ResolvedRecord::new("snes", "test");
    record.set_text(FieldKind::Title, "Game", "test");
    assert!(!record.is_meaningful());
    record.set_text(FieldKind::Publisher, "Acme", "test");
    assert!(record.is_meaningful());
}

#[test]
fn test_skipped_record() {
    let record = ResolvedRecord::skipped("snes");
    assert!(record.is_skipped());
    assert!(!record.found);
    assert_eq!(record.title(), None);
}
