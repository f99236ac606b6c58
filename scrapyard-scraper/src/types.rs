use serde::{Deserialize, Serialize};

/// Top-level response wrapper from jeuInfos.php.
#[derive(Debug, Deserialize)]
pub struct JeuInfosResponse {
    pub response: JeuInfosData,
}

#[derive(Debug, Deserialize)]
pub struct JeuInfosData {
    #[serde(default)]
    pub ssuser: Option<UserQuota>,
    pub jeu: GameInfo,
}

/// Top-level response wrapper from jeuRecherche.php.
#[derive(Debug, Deserialize)]
pub struct JeuRechercheResponse {
    pub response: JeuRechercheData,
}

#[derive(Debug, Deserialize)]
pub struct JeuRechercheData {
    #[serde(default)]
    pub ssuser: Option<UserQuota>,
    #[serde(default)]
    pub jeux: Vec<GameInfo>,
}

/// Game info from ScreenScraper. Fields use nested arrays with typed objects.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GameInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub romid: Option<String>,
    #[serde(default)]
    pub notgame: Option<String>,
    #[serde(default)]
    pub noms: Vec<RegionText>,
    #[serde(default)]
    pub synopsis: Vec<LangueText>,
    #[serde(default)]
    pub dates: Vec<RegionText>,
    #[serde(default)]
    pub medias: Vec<Media>,
    #[serde(default)]
    pub editeur: Option<IdText>,
    #[serde(default)]
    pub developpeur: Option<IdText>,
    #[serde(default)]
    pub joueurs: Option<IdText>,
    #[serde(default)]
    pub note: Option<IdText>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub familles: Vec<Genre>,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub systeme: Option<IdText>,
}

impl GameInfo {
    /// Search results for unknown titles come back as a single empty game.
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty() || self.noms.is_empty()
    }

    /// Get the game name for a preferred region, falling back to the first available.
    pub fn name_for_region(&self, preferred: &str) -> Option<&str> {
        self.noms
            .iter()
            .find(|n| n.region == preferred)
            .or_else(|| self.noms.iter().find(|n| n.region == "wor"))
            .or_else(|| self.noms.iter().find(|n| n.region == "ss"))
            .or_else(|| self.noms.first())
            .map(|n| n.text.as_str())
    }

    /// Synopsis in the preferred language, then English.
    pub fn synopsis_for_language(&self, preferred: &str) -> Option<&str> {
        self.synopsis
            .iter()
            .find(|s| s.langue == preferred)
            .or_else(|| self.synopsis.iter().find(|s| s.langue == "en"))
            .map(|s| s.text.as_str())
    }

    /// Get the release date for a preferred region.
    pub fn date_for_region(&self, preferred: &str) -> Option<&str> {
        self.dates
            .iter()
            .find(|d| d.region == preferred)
            .or_else(|| self.dates.iter().find(|d| d.region == "wor"))
            .or_else(|| self.dates.first())
            .map(|d| d.text.as_str())
    }

    /// Get all media of a given type (e.g., "ss", "box-2D", "wheel").
    pub fn media_by_type(&self, media_type: &str) -> Vec<&Media> {
        self.medias
            .iter()
            .filter(|m| m.media_type == media_type)
            .collect()
    }

    /// Get a single media of a given type, preferring a specific region.
    pub fn media_for_region(&self, media_type: &str, preferred_region: &str) -> Option<&Media> {
        let matches: Vec<_> = self.media_by_type(media_type);
        matches
            .iter()
            .find(|m| m.region == preferred_region)
            .or_else(|| matches.iter().find(|m| m.region == "us"))
            .or_else(|| matches.iter().find(|m| m.region == "wor"))
            .or_else(|| matches.iter().find(|m| m.region == "ss"))
            .or_else(|| matches.first())
            .copied()
    }

    /// Genre names in the preferred language, then English.
    pub fn genres_for_language(&self, preferred: &str) -> Vec<String> {
        names_for_language(&self.genres, preferred)
    }

    pub fn franchises_for_language(&self, preferred: &str) -> Vec<String> {
        names_for_language(&self.familles, preferred)
    }

    /// First ESRB rating, then PEGI, then whatever is listed first.
    pub fn age_rating(&self) -> Option<&str> {
        let by_type = |t: &str| self.classifications.iter().find(|c| c.rating_type == t);
        by_type("ESRB")
            .or_else(|| by_type("PEGI"))
            .or_else(|| self.classifications.first())
            .map(|c| c.text.as_str())
    }

    /// Rating as "n/20" (ScreenScraper uses a 0-20 scale).
    pub fn rating(&self) -> Option<String> {
        let note = self.note.as_ref()?;
        let value: f32 = note.text.trim().parse().ok()?;
        Some(format!("{}/20", value))
    }

    pub fn system_id(&self) -> Option<u32> {
        self.systeme.as_ref()?.id.as_ref()?.parse().ok()
    }
}

fn names_for_language(items: &[Genre], preferred: &str) -> Vec<String> {
    items
        .iter()
        .filter_map(|g| {
            g.noms
                .iter()
                .find(|n| n.langue == preferred)
                .or_else(|| g.noms.iter().find(|n| n.langue == "en"))
                .map(|n| n.text.clone())
        })
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegionText {
    pub region: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LangueText {
    pub langue: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdText {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub crc: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// Genre or franchise ("famille") entry.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Genre {
    pub id: String,
    #[serde(default)]
    pub noms: Vec<LangueText>,
}

/// Age classification (ESRB, PEGI, CERO, ...).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Classification {
    #[serde(rename = "type")]
    pub rating_type: String,
    pub text: String,
}

/// User info response from ssuserInfos.php.
#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    pub response: UserInfoData,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoData {
    pub ssuser: UserInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub maxthreads: Option<String>,
    #[serde(default)]
    pub requeststoday: Option<String>,
    #[serde(default)]
    pub maxrequestsperday: Option<String>,
    #[serde(default)]
    pub requestskotoday: Option<String>,
    #[serde(default)]
    pub maxrequestskoperday: Option<String>,
}

impl UserInfo {
    pub fn max_threads(&self) -> u32 {
        parse_or(&self.maxthreads, 1)
    }

    pub fn quota(&self) -> UserQuota {
        UserQuota {
            requeststoday: self.requeststoday.clone(),
            maxrequestsperday: self.maxrequestsperday.clone(),
            requestskotoday: self.requestskotoday.clone(),
            maxrequestskoperday: self.maxrequestskoperday.clone(),
        }
    }
}

/// Embedded user quota info returned in game lookup responses.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserQuota {
    #[serde(default)]
    pub requeststoday: Option<String>,
    #[serde(default)]
    pub maxrequestsperday: Option<String>,
    /// Failed ("KO") requests today
    #[serde(default)]
    pub requestskotoday: Option<String>,
    #[serde(default)]
    pub maxrequestskoperday: Option<String>,
}

impl UserQuota {
    pub fn requests_today(&self) -> u32 {
        parse_or(&self.requeststoday, 0)
    }

    pub fn max_requests_per_day(&self) -> u32 {
        parse_or(&self.maxrequestsperday, 20000)
    }

    pub fn failed_today(&self) -> u32 {
        parse_or(&self.requestskotoday, 0)
    }

    pub fn max_failed_per_day(&self) -> u32 {
        parse_or(&self.maxrequestskoperday, 2000)
    }

    pub fn requests_left(&self) -> u32 {
        self.max_requests_per_day()
            .saturating_sub(self.requests_today())
    }

    pub fn failures_left(&self) -> u32 {
        self.max_failed_per_day().saturating_sub(self.failed_today())
    }
}

fn parse_or(value: &Option<String>, default: u32) -> u32 {
    value
        .as_ref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
