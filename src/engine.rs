//! Translation overlay engine.
//!
//! Boot and every language switch run the same sequence: apply direction,
//! then spawn the structured pass and the sweep as independent tasks. The
//! tasks are not cancelled by a later switch; whichever applies last wins on
//! any node both touch.

use crate::assets::AssetClient;
use crate::chart_labels::translate_chart_data;
use crate::config::OverlayConfig;
use crate::dom::{Document, NodeId};
use crate::i18n::{Language, OverlayMetrics, PhraseValidator};
use crate::overlay::{self, LANG_SELECT_ATTR};
use crate::phrases::{build_pairs, SweepPlan};
use crate::preference::{resolve_language, PreferenceStore};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which of the two independent passes produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Structured,
    Sweep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub kind: PassKind,
    pub language: Language,
    /// Replacements written to the document
    pub applied: usize,
}

/// Handles for the two passes of one boot or switch.
#[derive(Debug)]
pub struct PassHandles {
    pub language: Language,
    structured: JoinHandle<PassOutcome>,
    sweep: JoinHandle<PassOutcome>,
}

impl PassHandles {
    /// Wait for both passes. A panicked task counts as zero replacements.
    pub async fn wait(self) -> (PassOutcome, PassOutcome) {
        let language = self.language;
        let structured = settle(self.structured, PassKind::Structured, language).await;
        let sweep = settle(self.sweep, PassKind::Sweep, language).await;
        (structured, sweep)
    }
}

async fn settle(handle: JoinHandle<PassOutcome>, kind: PassKind, language: Language) -> PassOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{:?} pass for {} did not finish: {}", kind, language, e);
            PassOutcome {
                kind,
                language,
                applied: 0,
            }
        }
    }
}

struct Shared {
    assets: AssetClient,
    store: Arc<dyn PreferenceStore>,
    document: Mutex<Document>,
    stylesheet_href: String,
}

/// Overlay engine bound to one document.
#[derive(Clone)]
pub struct OverlayEngine {
    shared: Arc<Shared>,
}

impl OverlayEngine {
    pub fn new(
        config: OverlayConfig,
        store: Arc<dyn PreferenceStore>,
        document: Document,
    ) -> Result<Self> {
        let stylesheet_href = config.rtl_stylesheet_href();
        let assets = AssetClient::new(config)?;
        Ok(Self {
            shared: Arc::new(Shared {
                assets,
                store,
                document: Mutex::new(document),
                stylesheet_href,
            }),
        })
    }

    /// Run the boot sequence for the persisted language.
    pub async fn boot(&self) -> PassHandles {
        let language = resolve_language(self.shared.store.as_ref());
        info!("Booting overlay in {} ({})", language.name(), language.code());
        self.run(language).await
    }

    /// Switch to `code`. Unsupported codes are ignored and return `None`.
    ///
    /// The preference is written before anything is fetched, so the stored
    /// value always matches the most recent switch.
    pub async fn switch_language(&self, code: &str) -> Option<PassHandles> {
        let language = match Language::from_code(code) {
            Ok(language) => language,
            Err(e) => {
                debug!("Ignoring language switch: {}", e);
                return None;
            }
        };

        if let Err(e) = self.shared.store.save(language.code()) {
            warn!("Failed to persist language {}: {}", language, e);
        }
        info!("Switching overlay to {} ({})", language.name(), language.code());
        Some(self.run(language).await)
    }

    /// Activate a switch element as if it were clicked.
    pub async fn click(&self, node: NodeId) -> Option<PassHandles> {
        let code = {
            let document = self.shared.document.lock().await;
            document.attr(node, LANG_SELECT_ATTR)?.to_string()
        };
        self.switch_language(&code).await
    }

    /// Switch elements on the page and the language each selects.
    pub async fn switch_controls(&self) -> Vec<(NodeId, String)> {
        let document = self.shared.document.lock().await;
        overlay::switch_targets(&document)
    }

    /// Language currently stored, without resetting bad values.
    pub fn stored_language(&self) -> Option<String> {
        self.shared.store.load()
    }

    /// Chart payload with labels translated through the stored language's
    /// phrase map.
    pub async fn chart_data(&self, data: &Value) -> Value {
        let language = resolve_language(self.shared.store.as_ref());
        if language.is_canonical() {
            return data.clone();
        }
        let labels = self.shared.assets.phrases(language).await;
        translate_chart_data(data, language, &labels)
    }

    /// Copy of the current page.
    pub async fn document(&self) -> Document {
        self.shared.document.lock().await.clone()
    }

    async fn run(&self, language: Language) -> PassHandles {
        {
            let mut document = self.shared.document.lock().await;
            overlay::apply_direction(&mut document, language, &self.shared.stylesheet_href);
        }

        let structured = tokio::spawn(structured_task(self.shared.clone(), language));
        let sweep = tokio::spawn(sweep_task(self.shared.clone(), language));

        PassHandles {
            language,
            structured,
            sweep,
        }
    }
}

async fn structured_task(shared: Arc<Shared>, language: Language) -> PassOutcome {
    let dictionary = shared.assets.dictionary(language).await;

    let mut document = shared.document.lock().await;
    let pass = overlay::structured_pass(&dictionary, &document);
    let applied = overlay::apply_replacements(&mut document, &pass.replacements);
    OverlayMetrics::global().record_structured(pass.hits, pass.misses);

    debug!(
        "Structured pass for {}: {} keys resolved, {} left as-is",
        language, pass.hits, pass.misses
    );
    PassOutcome {
        kind: PassKind::Structured,
        language,
        applied,
    }
}

async fn sweep_task(shared: Arc<Shared>, language: Language) -> PassOutcome {
    let tables = shared.assets.sweep_tables(language).await;

    for (name, table) in [("phrases", &tables.forward), ("mirror phrases", &tables.mirror)] {
        let report = PhraseValidator::validate(table);
        for warning in &report.warnings {
            debug!("{} for {}: {}", name, language, warning);
        }
        for error in &report.errors {
            warn!("{} for {}: {}", name, language, error);
        }
    }

    let pairs = build_pairs(&tables.forward, &tables.mirror);
    let plan = SweepPlan::compile(&pairs, &tables.lexicon);

    let mut document = shared.document.lock().await;
    let replacements = overlay::sweep(&plan, &document);
    let applied = overlay::apply_replacements(&mut document, &replacements);
    OverlayMetrics::global().record_sweep_rewrites(applied);

    debug!(
        "Sweep for {}: {} rules, {} rewrites",
        language,
        plan.rule_count(),
        applied
    );
    PassOutcome {
        kind: PassKind::Sweep,
        language,
        applied,
    }
}
