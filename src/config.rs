use std::path::PathBuf;

use anyhow::Context as _;

use crate::i18n::Language;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Storefront configuration. Every knob has an environment variable; CLI
/// flags override on top.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_base_url: String,
    pub page_size: usize,
    /// Smallest selection size that permits checkout. Deployment
    /// configuration, not business logic: some storefronts require 10.
    pub min_selection: usize,
    pub default_language: Language,
    /// Directory for persisted client state (language preference). `None`
    /// disables persistence.
    pub state_dir: Option<PathBuf>,
    /// Whether to ask the server to paginate. When the paginated endpoint
    /// fails, loads degrade to the unpaginated list.
    pub server_paging: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            min_selection: 1,
            default_language: Language::Ar,
            state_dir: None,
            server_paging: true,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("PAGEWAVE_API_URL") {
            config.api_base_url = raw;
        }
        if let Ok(raw) = std::env::var("PAGEWAVE_PAGE_SIZE") {
            config.page_size = parse_positive(&raw)
                .with_context(|| format!("invalid PAGEWAVE_PAGE_SIZE={raw:?}"))?;
        }
        if let Ok(raw) = std::env::var("PAGEWAVE_MIN_SELECTION") {
            config.min_selection = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PAGEWAVE_MIN_SELECTION={raw:?}"))?;
        }
        if let Ok(raw) = std::env::var("PAGEWAVE_LANG") {
            config.default_language = Language::parse(&raw).ok_or_else(|| {
                anyhow::anyhow!("invalid PAGEWAVE_LANG={raw:?}. expected one of: ar, fr, en")
            })?;
        }
        if let Ok(raw) = std::env::var("PAGEWAVE_STATE_DIR") {
            config.state_dir = Some(PathBuf::from(raw));
        }

        Ok(config)
    }

    /// Path of the persisted language preference, when persistence is on.
    pub fn language_preference_path(&self) -> Option<PathBuf> {
        self.state_dir
            .as_ref()
            .map(|dir| dir.join("language.json"))
    }
}

fn parse_positive(raw: &str) -> anyhow::Result<usize> {
    let value: usize = raw.trim().parse().context("not an unsigned integer")?;
    if value == 0 {
        anyhow::bail!("must be at least 1");
    }
    Ok(value)
}
