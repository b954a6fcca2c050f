//! Fetching translation resources.
//!
//! Every resource degrades to an empty mapping on failure: a missing or broken
//! file means the page stays in its original language, never a broken page.

use crate::config::OverlayConfig;
use crate::dictionary::Dictionary;
use crate::error::AssetError;
use crate::i18n::{Language, OverlayMetrics};
use crate::phrases::PhraseMap;
use crate::retry::{with_retry_if, RetryPolicy};
use anyhow::{Context, Result};
use reqwest::header::CACHE_CONTROL;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Tables needed by the sweep for one language.
#[derive(Debug, Clone, Default)]
pub struct SweepTables {
    /// Phrases translating into the active language
    pub forward: PhraseMap,
    /// Phrases translating into the other language, read backwards
    pub mirror: PhraseMap,
    pub lexicon: PhraseMap,
}

#[derive(Debug, Clone)]
pub struct AssetClient {
    client: reqwest::Client,
    config: OverlayConfig,
    retry: RetryPolicy,
}

impl AssetClient {
    pub fn new(config: OverlayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let retry = RetryPolicy::for_assets(config.fetch_max_attempts);

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// GET a JSON document, bypassing caches.
    pub async fn fetch_json(&self, url: &str) -> Result<Value, AssetError> {
        with_retry_if(
            &self.retry,
            url,
            || self.fetch_once(url),
            AssetError::is_retryable,
        )
        .await
    }

    async fn fetch_once(&self, url: &str) -> Result<Value, AssetError> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|source| AssetError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| AssetError::Transport {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| AssetError::Parse {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch, logging and counting failures, with an empty object as fallback.
    async fn load_or_empty(&self, url: &str) -> Value {
        let metrics = OverlayMetrics::global();
        metrics.record_fetch();

        match self.fetch_json(url).await {
            Ok(value) => {
                debug!("Loaded {}", url);
                value
            }
            Err(e) => {
                metrics.record_fetch_failure();
                warn!("Using empty mapping: {}", e);
                Value::Object(Map::new())
            }
        }
    }

    pub async fn dictionary(&self, language: Language) -> Dictionary {
        Dictionary::from_value(
            self.load_or_empty(&self.config.dictionary_url(language))
                .await,
        )
    }

    pub async fn phrases(&self, language: Language) -> PhraseMap {
        PhraseMap::from_value(&self.load_or_empty(&self.config.phrases_url(language)).await)
    }

    pub async fn lexicon(&self, language: Language) -> PhraseMap {
        PhraseMap::from_value(&self.load_or_empty(&self.config.lexicon_url(language)).await)
    }

    /// Both phrase maps and the lexicon, fetched concurrently.
    pub async fn sweep_tables(&self, language: Language) -> SweepTables {
        let (forward, mirror, lexicon) = futures::join!(
            self.phrases(language),
            self.phrases(language.counterpart()),
            self.lexicon(language)
        );
        SweepTables {
            forward,
            mirror,
            lexicon,
        }
    }
}
