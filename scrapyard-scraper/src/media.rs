use scrapyard_core::FieldKind;

use crate::types::{GameInfo, Media};

/// ScreenScraper media type strings for a field, most preferred first.
/// Empty for kinds ScreenScraper does not carry.
pub fn ss_media_types(kind: FieldKind) -> &'static [&'static str] {
    match kind {
        FieldKind::Cover => &["box-2D"],
        FieldKind::Screenshot => &["ss", "sstitle"],
        FieldKind::Wheel => &["wheel-hd", "wheel"],
        FieldKind::Marquee => &["screenmarquee", "screenmarqueesmall"],
        FieldKind::Texture => &["support-2D", "support-texture"],
        FieldKind::Video => &["video-normalized", "video"],
        FieldKind::Manual => &["manuel"],
        _ => &[],
    }
}

/// Pick the media for a field, trying each type in order.
pub fn select_media<'a>(game: &'a GameInfo, kind: FieldKind, region: &str) -> Option<&'a Media> {
    ss_media_types(kind)
        .iter()
        .find_map(|t| game.media_for_region(t, region))
}

/// File extension for downloaded media. Falls back to the kind's default
/// when the server does not report a format.
pub fn media_extension(media: &Media, kind: FieldKind) -> String {
    let format = media.format.trim().trim_start_matches('.');
    if format.is_empty() {
        kind.default_extension().to_string()
    } else {
        format.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(media_type: &str, region: &str, format: &str) -> Media {
        Media {
            media_type: media_type.into(),
            url: format!("https://x.invalid/{media_type}-{region}"),
            region: region.into(),
            format: format.into(),
            crc: None,
            size: None,
        }
    }

    #[test]
    fn test_select_uses_fallback_type() {
        let game = GameInfo {
            id: "1".into(),
            medias: vec![media("wheel", "wor", "png"), media("sstitle", "us", "PNG")],
            ..Default::default()
        };
        let wheel = select_media(&game, FieldKind::Wheel, "us").unwrap();
        assert_eq!(wheel.media_type, "wheel");
        let shot = select_media(&game, FieldKind::Screenshot, "us").unwrap();
        assert_eq!(media_extension(shot, FieldKind::Screenshot), "png");
        assert!(select_media(&game, FieldKind::Cover, "us").is_none());
        assert!(select_media(&game, FieldKind::Chiptune, "us").is_none());
    }

    #[test]
    fn test_extension_defaults_per_kind() {
        let video = media("video", "wor", "");
        assert_eq!(media_extension(&video, FieldKind::Video), "mp4");
    }
}
