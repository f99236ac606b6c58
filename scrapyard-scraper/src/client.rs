use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use scrapyard_core::{Budget, QuotaState};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::credentials::Credentials;
use crate::error::ScrapeError;
use crate::types::{
    GameInfo, JeuInfosResponse, JeuRechercheResponse, UserInfo, UserInfoResponse, UserQuota,
};

const BASE_URL: &str = "https://api.screenscraper.fr/api2";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1200);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Attempts per API call for rate-limit and 5xx answers.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// HTTP client for the ScreenScraper API with rate limiting and quota tracking.
///
/// The request gate and the quota belong to one client. Workers get their
/// own client from [`for_worker`](Self::for_worker), which only shares the
/// connection pool and the credentials.
pub struct ScreenScraperClient {
    http: reqwest::Client,
    creds: Arc<Credentials>,
    last_request: Mutex<Instant>,
    quota: std::sync::Mutex<Option<UserQuota>>,
}

impl ScreenScraperClient {
    /// Build a client. No request is sent until [`user_info`](Self::user_info)
    /// or a lookup.
    pub fn new(creds: Credentials) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_parts(http, Arc::new(creds), None))
    }

    /// A client for another worker: same connection pool and credentials,
    /// its own request gate, and a copy of the last reported quota.
    pub fn for_worker(&self) -> Self {
        Self::with_parts(self.http.clone(), self.creds.clone(), self.current_quota())
    }

    fn with_parts(http: reqwest::Client, creds: Arc<Credentials>, quota: Option<UserQuota>) -> Self {
        // The first request never waits
        let start = Instant::now()
            .checked_sub(MIN_REQUEST_INTERVAL)
            .unwrap_or_else(Instant::now);
        Self {
            http,
            creds,
            last_request: Mutex::new(start),
            quota: std::sync::Mutex::new(quota),
        }
    }

    /// Validate credentials and read the quota via ssuserInfos.php.
    pub async fn user_info(&self) -> Result<UserInfo, ScrapeError> {
        let text = self.get_api("ssuserInfos.php", HashMap::new()).await?;
        let info: UserInfoResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::api(format!(
                "Failed to parse user info: {e}. Response: {}",
                excerpt(&text)
            ))
        })?;
        let user = info.response.ssuser;
        self.set_quota(user.quota());
        Ok(user)
    }

    /// Look up a single game via jeuInfos.php (by id, checksums or ROM name).
    pub async fn lookup_game(&self, params: HashMap<&str, String>) -> Result<GameInfo, ScrapeError> {
        let text = self.get_api("jeuInfos.php", params).await?;
        let response: JeuInfosResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::api(format!(
                "Failed to parse game info: {e}. Response: {}",
                excerpt(&text)
            ))
        })?;

        if let Some(user) = response.response.ssuser {
            self.set_quota(user);
        }
        Ok(response.response.jeu)
    }

    /// Search games by name on one system via jeuRecherche.php.
    pub async fn search_games(&self, system_id: u32, query: &str) -> Result<Vec<GameInfo>, ScrapeError> {
        let mut params = HashMap::new();
        params.insert("systemeid", system_id.to_string());
        params.insert("recherche", query.to_string());

        let text = match self.get_api("jeuRecherche.php", params).await {
            Ok(text) => text,
            Err(ScrapeError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let response: JeuRechercheResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::api(format!(
                "Failed to parse search results: {e}. Response: {}",
                excerpt(&text)
            ))
        })?;

        if let Some(user) = response.response.ssuser {
            self.set_quota(user);
        }
        Ok(response
            .response
            .jeux
            .into_iter()
            .filter(|g| !g.is_placeholder())
            .collect())
    }

    /// Download a media file from a URL. Media CDN downloads don't count against
    /// the API rate limit, so no rate limiting is applied here.
    pub async fn download_media(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::ServerError {
                status: status.as_u16(),
                message: format!("media download failed: {}", url),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Get current quota info if available.
    pub fn current_quota(&self) -> Option<UserQuota> {
        self.quota
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remaining daily budget. Unlimited until the server has reported one.
    pub fn quota_state(&self) -> QuotaState {
        match self.current_quota() {
            Some(quota) => QuotaState {
                requests: Budget::Remaining(quota.requests_left()),
                errors: Budget::Remaining(quota.failures_left()),
            },
            None => QuotaState::unlimited(),
        }
    }

    fn set_quota(&self, quota: UserQuota) {
        log::trace!(
            "ScreenScraper quota: {}/{} requests today",
            quota.requests_today(),
            quota.max_requests_per_day()
        );
        *self.quota.lock().unwrap_or_else(PoisonError::into_inner) = Some(quota);
    }

    /// Record that the server refused further requests today.
    fn mark_exhausted(&self) {
        let mut guard = self.quota.lock().unwrap_or_else(PoisonError::into_inner);
        let mut quota = guard.take().unwrap_or_default();
        quota.requeststoday = Some(quota.max_requests_per_day().to_string());
        *guard = Some(quota);
    }

    /// GET an API endpoint, retrying rate-limit and 5xx answers.
    async fn get_api(
        &self,
        endpoint: &str,
        params: HashMap<&str, String>,
    ) -> Result<String, ScrapeError> {
        let mut all_params = self.base_params();
        all_params.insert("output", "json".to_string());
        all_params.extend(params);

        let mut attempt = 1;
        loop {
            match self.get_once(endpoint, &all_params).await {
                Err(ScrapeError::RateLimit) | Err(ScrapeError::ServerError { .. })
                    if attempt < MAX_ATTEMPTS =>
                {
                    log::debug!("{}: attempt {} failed, retrying", endpoint, attempt);
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(ScrapeError::QuotaExceeded { used, max }) => {
                    self.mark_exhausted();
                    return Err(ScrapeError::QuotaExceeded { used, max });
                }
                other => return other,
            }
        }
    }

    async fn get_once(
        &self,
        endpoint: &str,
        params: &HashMap<&str, String>,
    ) -> Result<String, ScrapeError> {
        self.rate_limit().await;

        let resp = self
            .http
            .get(format!("{}/{}", BASE_URL, endpoint))
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        check_response(status, text)
    }

    /// Enforce rate limiting: wait until at least MIN_REQUEST_INTERVAL has
    /// passed since the last API request.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < MIN_REQUEST_INTERVAL {
            tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
        }
        *last = Instant::now();
    }

    fn base_params(&self) -> HashMap<&str, String> {
        let mut params = HashMap::new();
        params.insert("devid", self.creds.dev_id.clone());
        params.insert("devpassword", self.creds.dev_password.clone());
        params.insert("softname", self.creds.soft_name.clone());
        if let Some(ref id) = self.creds.user_id {
            params.insert("ssid", id.clone());
        }
        if let Some(ref pw) = self.creds.user_password {
            params.insert("sspassword", pw.clone());
        }
        params
    }
}

/// Map HTTP status and the server's plain-text error answers to errors.
/// ScreenScraper answers most failures with HTTP 200 and a French message.
pub(crate) fn check_response(status: reqwest::StatusCode, text: String) -> Result<String, ScrapeError> {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ScrapeError::InvalidCredentials(
            "Credentials rejected".to_string(),
        ));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ScrapeError::RateLimit);
    }
    if text.contains("Le quota de scrape journalier") {
        return Err(ScrapeError::QuotaExceeded { used: 0, max: 0 });
    }
    if text.contains("API fermé") || text.contains("API closed") {
        return Err(ScrapeError::ServerClosed(
            "ScreenScraper API is temporarily closed".to_string(),
        ));
    }
    if status.is_server_error() {
        return Err(ScrapeError::ServerError {
            status: status.as_u16(),
            message: excerpt(&text).to_string(),
        });
    }
    let is_json = text.trim_start().starts_with('{');
    if status == reqwest::StatusCode::NOT_FOUND
        || text.trim().is_empty()
        || (!is_json && (text.contains("Erreur") || text.contains("Jeu non trouvé")))
    {
        return Err(ScrapeError::NotFound);
    }
    Ok(text)
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_check_response_errors() {
        assert!(matches!(
            check_response(StatusCode::FORBIDDEN, String::new()),
            Err(ScrapeError::InvalidCredentials(_))
        ));
        assert!(matches!(
            check_response(StatusCode::TOO_MANY_REQUESTS, String::new()),
            Err(ScrapeError::RateLimit)
        ));
        assert!(matches!(
            check_response(StatusCode::OK, "Erreur : Jeu non trouvé !".into()),
            Err(ScrapeError::NotFound)
        ));
        assert!(matches!(
            check_response(
                StatusCode::OK,
                "Le quota de scrape journalier est dépassé".into()
            ),
            Err(ScrapeError::QuotaExceeded { .. })
        ));
        assert!(matches!(
            check_response(StatusCode::BAD_GATEWAY, "oops".into()),
            Err(ScrapeError::ServerError { status: 502, .. })
        ));
        assert_eq!(
            check_response(StatusCode::OK, "{}".into()).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_quota_state_tracks_server_report() {
        let client = ScreenScraperClient::new(Credentials::new("dev", "pw")).unwrap();
        assert_eq!(client.quota_state(), QuotaState::unlimited());

        client.set_quota(UserQuota {
            requeststoday: Some("10".into()),
            maxrequestsperday: Some("12".into()),
            ..Default::default()
        });
        assert_eq!(client.quota_state().requests, Budget::Remaining(2));

        client.mark_exhausted();
        assert!(client.quota_state().is_exhausted());
    }

    #[test]
    fn test_worker_clients_keep_their_own_quota() {
        let client = ScreenScraperClient::new(Credentials::new("dev", "pw")).unwrap();
        client.set_quota(UserQuota {
            requeststoday: Some("1".into()),
            maxrequestsperday: Some("5".into()),
            ..Default::default()
        });
        let a = client.for_worker();
        let b = client.for_worker();
        assert_eq!(b.quota_state().requests, Budget::Remaining(4));

        a.mark_exhausted();
        assert!(a.quota_state().is_exhausted());
        assert!(!b.quota_state().is_exhausted());
        assert!(!client.quota_state().is_exhausted());
    }

    #[tokio::test]
    async fn test_worker_clients_rate_limit_independently() {
        let client = ScreenScraperClient::new(Credentials::new("dev", "pw")).unwrap();
        let a = client.for_worker();
        let b = client.for_worker();

        let start = Instant::now();
        a.rate_limit().await;
        b.rate_limit().await;
        assert!(start.elapsed() < MIN_REQUEST_INTERVAL);

        // The same client still waits between its own requests
        a.rate_limit().await;
        assert!(start.elapsed() >= MIN_REQUEST_INTERVAL);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(300);
        assert_eq!(excerpt(&text).chars().count(), 200);
    }
}
