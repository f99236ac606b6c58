use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

const DEFAULT_SOFT_NAME: &str = "scrapyard";

const ENV_DEV_ID: &str = "SCREENSCRAPER_DEVID";
const ENV_DEV_PASSWORD: &str = "SCREENSCRAPER_DEVPASSWORD";
const ENV_SOFT_NAME: &str = "SCREENSCRAPER_SOFTNAME";
const ENV_USER_ID: &str = "SCREENSCRAPER_SSID";
const ENV_USER_PASSWORD: &str = "SCREENSCRAPER_SSPASSWORD";

/// Credentials for authenticating with the ScreenScraper API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub dev_id: String,
    pub dev_password: String,
    pub soft_name: String,
    pub user_id: Option<String>,
    pub user_password: Option<String>,
}

/// Where a credential field's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Hard-coded default value.
    Default,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of each credential field.
#[derive(Debug)]
pub struct CredentialSources {
    pub dev_id: CredentialSource,
    pub dev_password: CredentialSource,
    pub soft_name: CredentialSource,
    pub user_id: CredentialSource,
    pub user_password: CredentialSource,
}

/// TOML config file format.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct ConfigFile {
    screenscraper: Option<ScreenScraperConfig>,
}

#[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
struct ScreenScraperConfig {
    dev_id: Option<String>,
    dev_password: Option<String>,
    soft_name: Option<String>,
    user_id: Option<String>,
    user_password: Option<String>,
}

impl Credentials {
    /// Developer credentials only, default software name.
    pub fn new(dev_id: impl Into<String>, dev_password: impl Into<String>) -> Self {
        Self {
            dev_id: dev_id.into(),
            dev_password: dev_password.into(),
            soft_name: DEFAULT_SOFT_NAME.to_string(),
            user_id: None,
            user_password: None,
        }
    }

    /// Load credentials from environment variables or the config file.
    ///
    /// Priority: env vars > config file.
    /// Required: dev_id, dev_password.
    /// Optional: soft_name, user_id, user_password.
    pub fn load() -> Result<Self, ScrapeError> {
        let config = config_path().and_then(|p| load_config_file(&p));
        resolve(|var| std::env::var(var).ok(), config.as_ref())
    }

    /// Create credentials with explicit values (e.g., from CLI args).
    pub fn with_overrides(
        mut self,
        dev_id: Option<String>,
        dev_password: Option<String>,
        user_id: Option<String>,
        user_password: Option<String>,
    ) -> Self {
        if let Some(id) = dev_id {
            self.dev_id = id;
        }
        if let Some(pw) = dev_password {
            self.dev_password = pw;
        }
        if let Some(id) = user_id {
            self.user_id = Some(id);
        }
        if let Some(pw) = user_password {
            self.user_password = Some(pw);
        }
        self
    }
}

fn resolve(
    env: impl Fn(&str) -> Option<String>,
    config: Option<&ScreenScraperConfig>,
) -> Result<Credentials, ScrapeError> {
    let file = config.cloned().unwrap_or_default();

    let dev_id = env(ENV_DEV_ID).or(file.dev_id).ok_or_else(|| {
        ScrapeError::config(format!(
            "Missing dev_id. Set {} env var or add to config file",
            ENV_DEV_ID
        ))
    })?;

    let dev_password = env(ENV_DEV_PASSWORD).or(file.dev_password).ok_or_else(|| {
        ScrapeError::config(format!(
            "Missing dev_password. Set {} env var or add to config file",
            ENV_DEV_PASSWORD
        ))
    })?;

    let soft_name = env(ENV_SOFT_NAME)
        .or(file.soft_name)
        .unwrap_or_else(|| DEFAULT_SOFT_NAME.to_string());

    Ok(Credentials {
        dev_id,
        dev_password,
        soft_name,
        user_id: env(ENV_USER_ID).or(file.user_id),
        user_password: env(ENV_USER_PASSWORD).or(file.user_password),
    })
}

/// Return the path to the credentials config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scrapyard").join("credentials.toml"))
}

/// Save credentials to the config file, creating parent directories as needed.
/// Returns the path the file was written to.
pub fn save_to_file(creds: &Credentials) -> Result<PathBuf, ScrapeError> {
    let path = config_path()
        .ok_or_else(|| ScrapeError::config("Could not determine config directory"))?;
    write_config(creds, &path)?;
    Ok(path)
}

fn write_config(creds: &Credentials, path: &Path) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = ConfigFile {
        screenscraper: Some(ScreenScraperConfig {
            dev_id: Some(creds.dev_id.clone()),
            dev_password: Some(creds.dev_password.clone()),
            soft_name: (creds.soft_name != DEFAULT_SOFT_NAME).then(|| creds.soft_name.clone()),
            user_id: creds.user_id.clone(),
            user_password: creds.user_password.clone(),
        }),
    };

    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| ScrapeError::config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Determine where each credential field is coming from.
pub fn credential_sources() -> CredentialSources {
    let config = config_path().and_then(|p| load_config_file(&p));
    sources(|var| std::env::var(var).is_ok(), config.as_ref())
}

fn sources(
    env_set: impl Fn(&str) -> bool,
    config: Option<&ScreenScraperConfig>,
) -> CredentialSources {
    let file = config.cloned().unwrap_or_default();
    let source = |var: &'static str, in_config: bool, fallback: CredentialSource| {
        if env_set(var) {
            CredentialSource::EnvVar(var)
        } else if in_config {
            CredentialSource::ConfigFile
        } else {
            fallback
        }
    };

    CredentialSources {
        dev_id: source(ENV_DEV_ID, file.dev_id.is_some(), CredentialSource::Missing),
        dev_password: source(
            ENV_DEV_PASSWORD,
            file.dev_password.is_some(),
            CredentialSource::Missing,
        ),
        soft_name: source(
            ENV_SOFT_NAME,
            file.soft_name.is_some(),
            CredentialSource::Default,
        ),
        user_id: source(ENV_USER_ID, file.user_id.is_some(), CredentialSource::Missing),
        user_password: source(
            ENV_USER_PASSWORD,
            file.user_password.is_some(),
            CredentialSource::Missing,
        ),
    }
}

fn load_config_file(path: &Path) -> Option<ScreenScraperConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    let config: ConfigFile = match toml::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", path.display(), e);
            return None;
        }
    };
    config.screenscraper
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScreenScraperConfig {
        ScreenScraperConfig {
            dev_id: Some("file-dev".into()),
            dev_password: Some("file-pw".into()),
            user_id: Some("player".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_env_overrides_config_file() {
        let env = |var: &str| (var == ENV_DEV_ID).then(|| "env-dev".to_string());
        let creds = resolve(env, Some(&config())).unwrap();
        assert_eq!(creds.dev_id, "env-dev");
        assert_eq!(creds.dev_password, "file-pw");
        assert_eq!(creds.soft_name, DEFAULT_SOFT_NAME);
        assert_eq!(creds.user_id.as_deref(), Some("player"));
        assert!(creds.user_password.is_none());
    }

    #[test]
    fn test_missing_dev_credentials() {
        let err = resolve(|_| None, None).unwrap_err();
        assert!(err.to_string().contains("dev_id"));
    }

    #[test]
    fn test_sources_report_provenance() {
        let sources = sources(|var| var == ENV_USER_PASSWORD, Some(&config()));
        assert_eq!(sources.dev_id, CredentialSource::ConfigFile);
        assert_eq!(sources.soft_name, CredentialSource::Default);
        assert_eq!(
            sources.user_password,
            CredentialSource::EnvVar(ENV_USER_PASSWORD)
        );
        assert_eq!(sources.user_password.to_string(), "env $SCREENSCRAPER_SSPASSWORD");
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let creds = Credentials::new("dev", "pw").with_overrides(
            None,
            None,
            Some("me".into()),
            Some("secret".into()),
        );
        write_config(&creds, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        let again = resolve(|_| None, Some(&loaded)).unwrap();
        assert_eq!(again.dev_id, "dev");
        assert_eq!(again.user_password.as_deref(), Some("secret"));
        assert_eq!(again.soft_name, DEFAULT_SOFT_NAME);
    }
}
