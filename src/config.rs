use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

/// Non-secret settings, loaded from a TOML file.
///
/// The historical pipeline revisions differed only in sanitization strictness
/// and public-link behavior; those differences live here as flags.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub songs_folder: String,
    pub images_folder: String,
    pub db_table: String,
    pub gemini_model: String,
    /// Collapse non-filename-safe characters in titles instead of only slashes
    pub strict_sanitize: bool,
    /// Request public links for uploaded files
    pub public_links: bool,
    /// Abort the request when a public link cannot be fetched (otherwise the
    /// link fields are simply omitted)
    pub public_link_required: bool,
    pub resolver_base: Option<String>,
    pub storage_base: Option<String>,
    pub classifier_base: Option<String>,
    pub thumbnail_base: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 8000,
            songs_folder: "songs".to_string(),
            images_folder: "imgs".to_string(),
            db_table: "songs".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            strict_sanitize: false,
            public_links: false,
            public_link_required: false,
            resolver_base: None,
            storage_base: None,
            classifier_base: None,
            thumbnail_base: None,
        }
    }
}

/// Credentials for the four external services, read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub rapidapi_key: String,
    pub rapidapi_host: String,
    pub pcloud_auth: String,
    pub gemini_api_key: String,
    pub supabase_url: String,
    pub supabase_key: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(Credentials {
            rapidapi_key: required_var("RAPIDAPI_KEY")?,
            rapidapi_host: required_var("RAPIDAPI_HOST")?,
            pcloud_auth: required_var("PCLOUD_AUTH")?,
            gemini_api_key: required_var("GEMINI_API_KEY")?,
            supabase_url: required_var("SUPABASE_URL")?,
            supabase_key: required_var("SUPABASE_KEY")?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).wrap_err_with(|| format!("{name} environment variable not set"))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub credentials: Credentials,
}

impl Config {
    /// Load settings from the given path (or the default location) and
    /// credentials from the environment. A missing settings file is fine;
    /// defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(p) => Settings::from_file(p)?,
            None => {
                let p = config_path();
                if p.exists() {
                    Settings::from_file(&p)?
                } else {
                    debug!("No config file found at {}", p.display());
                    Settings::default()
                }
            }
        };
        let credentials = Credentials::from_env()?;
        Ok(Config { settings, credentials })
    }

    /// Base URL for the resolver, derived from the RapidAPI host unless
    /// overridden in settings.
    pub fn resolver_base(&self) -> String {
        self.settings
            .resolver_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.credentials.rapidapi_host))
    }

    pub fn storage_base(&self) -> String {
        self.settings
            .storage_base
            .clone()
            .unwrap_or_else(|| "https://api.pcloud.com".to_string())
    }

    pub fn classifier_base(&self) -> String {
        self.settings
            .classifier_base
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
    }

    pub fn thumbnail_base(&self) -> String {
        self.settings
            .thumbnail_base
            .clone()
            .unwrap_or_else(|| "https://i.ytimg.com".to_string())
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("songstash")
        .join("config.toml")
}
