//! ScreenScraper as a [`SourceAdapter`].
//!
//! A file is first looked up by checksum (reported as pass 0); when that
//! finds nothing the usual name passes run against jeuRecherche.php. The
//! chosen game's JSON travels in the candidate payload, so textual fields
//! cost no extra request. Media is downloaded per field.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use scrapyard_core::{
    CandidateEntry, FieldKind, FieldValue, FileDescriptor, Media, QuotaState, ResolvedRecord,
};
use scrapyard_lib::adapter::{SourceAdapter, run_search_passes};
use scrapyard_lib::hasher::{self, FileHashes};
use scrapyard_lib::{AdapterError, EngineConfig, FileReport, NamingOptions};

use crate::client::ScreenScraperClient;
use crate::credentials::Credentials;
use crate::error::ScrapeError;
use crate::media::{media_extension, select_media};
use crate::systems::{preferred_ss_region, screenscraper_system_id, system_matches};
use crate::types::{GameInfo, UserInfo};

pub const SCREENSCRAPER_SOURCE: &str = "screenscraper";

/// Pass number reported for a checksum hit.
pub const CHECKSUM_PASS: usize = 0;

/// Files above this size are not hashed; name passes only.
const MAX_CHECKSUM_SIZE: u64 = 64 * 1024 * 1024;

const FETCH_ORDER: &[FieldKind] = &[
    FieldKind::Title,
    FieldKind::Description,
    FieldKind::Developer,
    FieldKind::Publisher,
    FieldKind::ReleaseDate,
    FieldKind::Players,
    FieldKind::AgeRating,
    FieldKind::Tags,
    FieldKind::Franchises,
    FieldKind::Rating,
    FieldKind::Cover,
    FieldKind::Screenshot,
    FieldKind::Wheel,
    FieldKind::Marquee,
    FieldKind::Texture,
    FieldKind::Video,
    FieldKind::Manual,
];

/// Load credentials and validate them against the API.
///
/// Workers take their own client with [`ScreenScraperClient::for_worker`].
pub async fn connect() -> Result<(ScreenScraperClient, UserInfo), ScrapeError> {
    let creds = Credentials::load()?;
    let client = ScreenScraperClient::new(creds)?;
    let user = client.user_info().await?;
    log::info!(
        "ScreenScraper: {}/{} requests used today, {} thread(s) allowed",
        user.quota().requests_today(),
        user.quota().max_requests_per_day(),
        user.max_threads()
    );
    Ok((client, user))
}

pub struct ScreenScraper {
    client: Option<ScreenScraperClient>,
    system_id: Option<u32>,
    region: &'static str,
    lang: String,
    naming: NamingOptions,
    checksums: bool,
    /// Parsed payload of the last candidate fields were fetched for
    current: Option<GameInfo>,
}

impl ScreenScraper {
    pub fn new(client: ScreenScraperClient, config: &EngineConfig) -> Self {
        let system_id = screenscraper_system_id(&config.platform);
        if system_id.is_none() {
            log::error!(
                "ScreenScraper: unknown platform '{}', source disabled",
                config.platform
            );
        }
        Self {
            client: Some(client),
            system_id,
            region: preferred_ss_region(&config.region),
            lang: config.lang.clone(),
            naming: config.naming(),
            checksums: true,
            current: None,
        }
    }

    /// An instance whose setup failed. Its quota is zero, so a worker
    /// owning it stops before the first file.
    pub fn unavailable(config: &EngineConfig, reason: &ScrapeError) -> Self {
        log::error!("ScreenScraper unavailable: {}", reason);
        Self {
            client: None,
            system_id: screenscraper_system_id(&config.platform),
            region: preferred_ss_region(&config.region),
            lang: config.lang.clone(),
            naming: config.naming(),
            checksums: false,
            current: None,
        }
    }

    /// Skip the checksum lookup and search by name only.
    pub fn without_checksums(mut self) -> Self {
        self.checksums = false;
        self
    }

    fn client(&self) -> Result<&ScreenScraperClient, AdapterError> {
        self.client
            .as_ref()
            .ok_or_else(|| AdapterError::setup("ScreenScraper client not available"))
    }

    fn system_id(&self) -> Result<u32, AdapterError> {
        self.system_id
            .ok_or_else(|| AdapterError::setup("platform not supported by ScreenScraper"))
    }

    fn candidate(&self, game: &GameInfo) -> Result<CandidateEntry, AdapterError> {
        let title = game.name_for_region(self.region).unwrap_or_default();
        let platform = game
            .systeme
            .as_ref()
            .map(|s| s.text.clone())
            .unwrap_or_default();
        let payload = serde_json::to_value(game)
            .map_err(|e| AdapterError::response(format!("unserializable game: {}", e)))?;
        Ok(CandidateEntry::new(title, game.id.clone(), platform).with_payload(payload))
    }

    fn accepts(&self, game: &GameInfo) -> bool {
        match (self.system_id, game.system_id()) {
            (Some(expected), Some(returned)) => system_matches(expected, returned),
            _ => true,
        }
    }

    async fn checksum_lookup(&self, path: &Path) -> Result<Option<GameInfo>, AdapterError> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CHECKSUM_SIZE {
            log::debug!("{}: {} bytes, not hashing", path.display(), size);
            return Ok(None);
        }

        let owned = path.to_path_buf();
        let hashes: FileHashes = tokio::task::spawn_blocking(move || hasher::compute_hashes(&owned))
            .await
            .map_err(|e| AdapterError::request(format!("hashing task failed: {}", e)))??;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut params = HashMap::new();
        params.insert("systemeid", self.system_id()?.to_string());
        params.insert("crc", hashes.crc32.to_uppercase());
        params.insert("md5", hashes.md5);
        params.insert("sha1", hashes.sha1);
        params.insert("romnom", file_name);
        params.insert("romtaille", hashes.size.to_string());
        params.insert("romtype", "rom".to_string());

        match self.client()?.lookup_game(params).await {
            Ok(game) => Ok(Some(game)),
            Err(ScrapeError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Make `current` hold the game behind `candidate`.
    async fn load_game(&mut self, candidate: &CandidateEntry) -> Result<&GameInfo, AdapterError> {
        let cached = self.current.as_ref().is_some_and(|g| g.id == candidate.id);
        if !cached {
            let game = match &candidate.payload {
                Some(payload) => serde_json::from_value::<GameInfo>(payload.clone())
                    .map_err(|e| AdapterError::response(format!("bad candidate payload: {}", e)))?,
                None => {
                    let mut params = HashMap::new();
                    params.insert("gameid", candidate.id.clone());
                    params.insert("systemeid", self.system_id()?.to_string());
                    self.client()?.lookup_game(params).await?
                }
            };
            self.current = Some(game);
        }
        self.current
            .as_ref()
            .ok_or_else(|| AdapterError::response("no game loaded"))
    }
}

/// The value of a textual field, if the game has one.
pub fn text_field(game: &GameInfo, kind: FieldKind, region: &str, lang: &str) -> Option<FieldValue> {
    let text = |s: &str| Some(FieldValue::Text(s.to_string()));
    match kind {
        FieldKind::Title => game.name_for_region(region).and_then(text),
        FieldKind::Description => game.synopsis_for_language(lang).and_then(text),
        FieldKind::Developer => game.developpeur.as_ref().and_then(|d| text(&d.text)),
        FieldKind::Publisher => game.editeur.as_ref().and_then(|p| text(&p.text)),
        FieldKind::ReleaseDate => game.date_for_region(region).and_then(text),
        FieldKind::Players => game.joueurs.as_ref().and_then(|p| text(&p.text)),
        FieldKind::AgeRating => game.age_rating().and_then(text),
        FieldKind::Tags => Some(FieldValue::List(game.genres_for_language(lang))),
        FieldKind::Franchises => Some(FieldValue::List(game.franchises_for_language(lang))),
        FieldKind::Rating => game.rating().map(FieldValue::Text),
        _ => None,
    }
}

#[async_trait]
impl SourceAdapter for ScreenScraper {
    fn name(&self) -> &str {
        SCREENSCRAPER_SOURCE
    }

    fn naming(&self) -> &NamingOptions {
        &self.naming
    }

    fn fetch_order(&self) -> &[FieldKind] {
        FETCH_ORDER
    }

    fn quota(&self) -> QuotaState {
        match (&self.client, self.system_id) {
            (Some(client), Some(_)) => client.quota_state(),
            _ => QuotaState::exhausted(),
        }
    }

    fn supports_incremental(&self) -> bool {
        true
    }

    async fn search(
        &mut self,
        query: &str,
        _file: &FileDescriptor,
    ) -> Result<Vec<CandidateEntry>, AdapterError> {
        let system_id = self.system_id()?;
        let games = self.client()?.search_games(system_id, query).await?;
        let mut candidates = Vec::with_capacity(games.len());
        for game in games.iter().filter(|g| self.accepts(g)) {
            candidates.push(self.candidate(game)?);
        }
        Ok(candidates)
    }

    async fn run_passes(
        &mut self,
        candidates: &mut Vec<CandidateEntry>,
        search_file: &FileDescriptor,
        original_file: &FileDescriptor,
        report: &mut FileReport,
    ) -> Result<Option<usize>, AdapterError> {
        if self.checksums && !self.quota().is_exhausted() {
            match self.checksum_lookup(original_file.path()).await {
                Ok(Some(game)) if self.accepts(&game) => {
                    let candidate = self.candidate(&game)?;
                    report.line(format!("Checksum match: '{}'", candidate.title));
                    candidates.push(candidate);
                    return Ok(Some(CHECKSUM_PASS));
                }
                Ok(Some(game)) => report.warn(format!(
                    "Checksum matched '{}' on another system, ignored",
                    game.name_for_region(self.region).unwrap_or(&game.id)
                )),
                Ok(None) => log::debug!("{}: no checksum match", original_file),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.warn(format!("Checksum lookup: {}", e)),
            }
        }
        run_search_passes(self, candidates, search_file, original_file, report).await
    }

    async fn fetch_field(
        &mut self,
        kind: FieldKind,
        candidate: &CandidateEntry,
        record: &mut ResolvedRecord,
    ) -> Result<bool, AdapterError> {
        let region = self.region;
        let lang = self.lang.clone();
        let game = self.load_game(candidate).await?;

        if !kind.is_media() {
            return Ok(match text_field(game, kind, region, &lang) {
                Some(value) => record.set(kind, value, SCREENSCRAPER_SOURCE),
                None => false,
            });
        }

        let Some(media) = select_media(game, kind, region) else {
            return Ok(false);
        };
        let url = media.url.clone();
        let extension = media_extension(media, kind);

        let bytes = self.client()?.download_media(&url).await?;
        Ok(record.set_media(kind, Media::Data { bytes, extension }, SCREENSCRAPER_SOURCE))
    }
}

#[cfg(test)]
#[path = "tests/screenscraper_tests.rs"]
mod tests;
