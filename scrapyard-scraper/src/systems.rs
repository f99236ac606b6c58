/// Map a platform name to its ScreenScraper system ID.
///
/// Accepts the short folder names frontends use ("snes", "megadrive",
/// "psx") and is case-insensitive.
pub fn screenscraper_system_id(platform: &str) -> Option<u32> {
    let id = match platform.trim().to_ascii_lowercase().as_str() {
        // Nintendo
        "nes" | "famicom" => 3,
        "snes" | "sfc" | "superfamicom" => 4,
        "n64" => 14,
        "gc" | "gamecube" | "ngc" => 13,
        "wii" => 16,
        "wiiu" => 18,
        "gb" | "gameboy" => 9,
        "gbc" | "gameboycolor" => 10,
        "gba" | "gameboyadvance" => 12,
        "nds" | "ds" => 15,
        "3ds" | "n3ds" => 17,

        // Sony
        "psx" | "ps1" | "playstation" => 57,
        "ps2" => 58,
        "ps3" => 59,
        "psp" => 61,
        "psvita" | "vita" => 62,

        // Sega
        "sg-1000" | "sg1000" => 109,
        "mastersystem" | "sms" => 2,
        "genesis" | "megadrive" | "md" => 1,
        "segacd" | "megacd" => 20,
        "sega32x" | "32x" => 19,
        "saturn" => 22,
        "dreamcast" | "dc" => 23,
        "gamegear" | "gg" => 21,

        // Microsoft
        "xbox" => 32,
        "xbox360" => 33,

        _ => return None,
    };
    Some(id)
}

/// Additional ScreenScraper system IDs that count as a match for a platform.
///
/// A Game Boy folder often holds GBC-compatible dumps that ScreenScraper
/// files under system 10.
pub fn acceptable_system_ids(system_id: u32) -> &'static [u32] {
    match system_id {
        9 => &[10],
        10 => &[9],
        _ => &[],
    }
}

/// Whether a game's reported system fits the requested one.
pub fn system_matches(expected: u32, returned: u32) -> bool {
    expected == returned || acceptable_system_ids(expected).contains(&returned)
}

/// Map a user region setting to a ScreenScraper region code.
pub fn preferred_ss_region(region: &str) -> &'static str {
    match region.to_lowercase().as_str() {
        "us" | "usa" | "united states" => "us",
        "eu" | "europe" => "eu",
        "jp" | "japan" => "jp",
        "wor" | "world" => "wor",
        "au" | "australia" => "au",
        "kr" | "korea" => "kr",
        "br" | "brazil" => "br",
        _ => "us",
    }
}
