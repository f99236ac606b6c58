//! Concrete metadata sources for the scrapyard engine.
//!
//! [`ScreenScraper`] talks to the ScreenScraper web API and [`ImportSource`]
//! reads a local import folder. Both implement
//! [`SourceAdapter`](scrapyard_lib::SourceAdapter).

pub mod client;
pub mod credentials;
pub mod error;
pub mod import;
pub mod media;
pub mod screenscraper;
pub mod systems;
pub mod types;

pub use client::ScreenScraperClient;
pub use credentials::{
    CredentialSource, CredentialSources, Credentials, config_path, credential_sources,
    save_to_file,
};
pub use error::ScrapeError;
pub use import::{IMPORT_SOURCE, ImportSource};
pub use screenscraper::{SCREENSCRAPER_SOURCE, ScreenScraper};
pub use systems::screenscraper_system_id;
