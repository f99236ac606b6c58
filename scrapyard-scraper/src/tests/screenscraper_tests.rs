use super::*;
use crate::types::{IdText, LangueText, RegionText};

fn config() -> EngineConfig {
    let mut config = EngineConfig::new("snes", SCREENSCRAPER_SOURCE);
    config.lang = "fr".to_string();
    config
}

fn adapter() -> ScreenScraper {
    let client = ScreenScraperClient::new(Credentials::new("dev", "pw")).unwrap();
    ScreenScraper::new(client, &config())
}

fn game(system: &str) -> GameInfo {
    GameInfo {
        id: "3".into(),
        noms: vec![RegionText {
            region: "ss".into(),
            text: "Super Game 2".into(),
        }],
        synopsis: vec![LangueText {
            langue: "en".into(),
            text: "A game.".into(),
        }],
        developpeur: Some(IdText {
            id: None,
            text: "Studio".into(),
        }),
        note: Some(IdText {
            id: None,
            text: "15".into(),
        }),
        systeme: Some(IdText {
            id: Some(system.into()),
            text: "Super Nintendo".into(),
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_text_fields_come_from_payload() {
    let mut adapter = adapter();
    let candidate = adapter.candidate(&game("4")).unwrap();
    assert_eq!(candidate.title, "Super Game 2");
    assert_eq!(candidate.platform, "Super Nintendo");

    let mut record = ResolvedRecord::new("snes", SCREENSCRAPER_SOURCE);
    for kind in [
        FieldKind::Title,
        FieldKind::Description,
        FieldKind::Developer,
        FieldKind::Rating,
    ] {
        assert!(adapter.fetch_field(kind, &candidate, &mut record).await.unwrap());
    }
    assert!(!adapter
        .fetch_field(FieldKind::Publisher, &candidate, &mut record)
        .await
        .unwrap());
    assert!(!adapter
        .fetch_field(FieldKind::Tags, &candidate, &mut record)
        .await
        .unwrap());

    assert_eq!(record.title(), Some("Super Game 2"));
    // No French synopsis, English is used
    assert_eq!(record.text(FieldKind::Description), Some("A game."));
    assert_eq!(record.text(FieldKind::Rating), Some("15/20"));
    assert_eq!(
        record.get(FieldKind::Developer).unwrap().source,
        SCREENSCRAPER_SOURCE
    );
}

#[tokio::test]
async fn test_missing_media_is_not_an_error() {
    let mut adapter = adapter();
    let candidate = adapter.candidate(&game("4")).unwrap();
    let mut record = ResolvedRecord::new("snes", SCREENSCRAPER_SOURCE);
    let found = adapter
        .fetch_field(FieldKind::Cover, &candidate, &mut record)
        .await
        .unwrap();
    assert!(!found);
    assert!(!record.has(FieldKind::Cover));
}

#[tokio::test]
async fn test_bad_payload_is_a_response_error() {
    let mut adapter = adapter();
    let candidate = CandidateEntry::new("X", "9", "snes").with_payload(serde_json::json!([1, 2]));
    let mut record = ResolvedRecord::new("snes", SCREENSCRAPER_SOURCE);
    let err = adapter
        .fetch_field(FieldKind::Title, &candidate, &mut record)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Response(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_other_systems_are_rejected() {
    let adapter = adapter();
    assert!(adapter.accepts(&game("4")));
    assert!(!adapter.accepts(&game("3")));
    let mut unknown = game("4");
    unknown.systeme = None;
    assert!(adapter.accepts(&unknown));
}

#[test]
fn test_failed_setup_has_no_budget() {
    let adapter = ScreenScraper::unavailable(
        &config(),
        &ScrapeError::InvalidCredentials("rejected".into()),
    );
    assert!(adapter.quota().is_exhausted());
    assert!(matches!(adapter.client(), Err(AdapterError::Setup(_))));
}

#[test]
fn test_unknown_platform_has_no_budget() {
    let client = ScreenScraperClient::new(Credentials::new("dev", "pw")).unwrap();
    let adapter = ScreenScraper::new(client, &EngineConfig::new("amiga", SCREENSCRAPER_SOURCE));
    assert!(adapter.quota().is_exhausted());
}

#[test]
fn test_fresh_client_is_unlimited() {
    let adapter = adapter();
    assert!(!adapter.quota().is_exhausted());
    assert!(adapter.supports_incremental());
    assert_eq!(adapter.fetch_order().first(), Some(&FieldKind::Title));
}

#[test]
fn test_text_field_lists() {
    let mut game = game("4");
    game.genres = vec![crate::types::Genre {
        id: "1".into(),
        noms: vec![LangueText {
            langue: "fr".into(),
            text: "Plates-formes".into(),
        }],
    }];
    assert_eq!(
        text_field(&game, FieldKind::Tags, "us", "fr"),
        Some(FieldValue::List(vec!["Plates-formes".into()]))
    );
    assert_eq!(text_field(&game, FieldKind::Cover, "us", "fr"), None);
}
