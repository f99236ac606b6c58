use thiserror::Error;

/// Errors that end a CLI command with a non-zero exit status.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] scrapyard_lib::EngineError),

    #[error(transparent)]
    Scrape(#[from] scrapyard_scraper::ScrapeError),

    #[error(transparent)]
    Frontend(#[from] scrapyard_frontend::FrontendError),

    /// Invalid flag combination or settings value
    #[error("Config error: {0}")]
    Config(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
