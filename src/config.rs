use crate::i18n::Language;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    // Asset server
    pub asset_base_url: String,
    pub static_url: String,

    // Preference persistence
    pub preference_file: String,

    // Fetching
    pub fetch_timeout_secs: u64,
    pub fetch_max_attempts: u32,
}

impl OverlayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            asset_base_url: std::env::var("ASSET_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            static_url: normalize_static_url(
                &std::env::var("STATIC_URL").unwrap_or_else(|_| "/static/".to_string()),
            ),

            preference_file: std::env::var("PREFERENCE_FILE")
                .unwrap_or_else(|_| ".ui-lang.json".to_string()),

            fetch_timeout_secs: match std::env::var("FETCH_TIMEOUT_SECS") {
                Ok(v) => v.parse().context("FETCH_TIMEOUT_SECS must be a number")?,
                Err(_) => 10,
            },
            fetch_max_attempts: std::env::var("FETCH_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        })
    }

    /// Config pointing at a given asset origin with default everything else.
    pub fn for_base_url(asset_base_url: &str) -> Self {
        Self {
            asset_base_url: asset_base_url.to_string(),
            static_url: "/static/".to_string(),
            preference_file: ".ui-lang.json".to_string(),
            fetch_timeout_secs: 10,
            fetch_max_attempts: 2,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Structured dictionary for a language.
    pub fn dictionary_url(&self, language: Language) -> String {
        self.asset_url(&format!("core/i18n/{}.json", language.code()))
    }

    /// Phrase map translating into a language.
    pub fn phrases_url(&self, language: Language) -> String {
        self.asset_url(&format!("core/i18n/phrases.{}.json", language.code()))
    }

    pub fn lexicon_url(&self, language: Language) -> String {
        self.asset_url(&format!("core/i18n/lexicon.{}.json", language.code()))
    }

    /// Page-relative href of the right-to-left stylesheet.
    pub fn rtl_stylesheet_href(&self) -> String {
        format!("{}core/css/rtl.css", self.static_url)
    }

    fn asset_url(&self, relative: &str) -> String {
        format!(
            "{}{}{}",
            self.asset_base_url.trim_end_matches('/'),
            self.static_url,
            relative
        )
    }
}

/// Force the static prefix into `/prefix/` form.
fn normalize_static_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
