use scrapyard_lib::AdapterError;

/// Errors that can occur while talking to a metadata source.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by ScreenScraper API")]
    RateLimit,

    #[error("Daily quota exceeded ({used}/{max} requests)")]
    QuotaExceeded { used: u32, max: u32 },

    #[error("Game not found in ScreenScraper database")]
    NotFound,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("ScreenScraper server is closed: {0}")]
    ServerClosed(String),

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<ScrapeError> for AdapterError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::QuotaExceeded { .. } => AdapterError::QuotaExhausted,
            ScrapeError::InvalidCredentials(_)
            | ScrapeError::ServerClosed(_)
            | ScrapeError::Config(_) => AdapterError::setup(e.to_string()),
            ScrapeError::Io(io) => AdapterError::Io(io),
            ScrapeError::Api(_) | ScrapeError::Json(_) => AdapterError::response(e.to_string()),
            ScrapeError::Http(_)
            | ScrapeError::RateLimit
            | ScrapeError::NotFound
            | ScrapeError::ServerError { .. } => AdapterError::request(e.to_string()),
        }
    }
}
