//! Language type: validated language representation.

use crate::i18n::{LanguageConfig, LanguageRegistry, TextDirection};
use anyhow::{bail, Result};

/// A validated language.
///
/// Only supported, enabled languages can be constructed, so a `Language`
/// always has a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "ar")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const ARABIC: Language = Language { code: "ar" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the language is enabled
    /// * `Err` if the code is not found or the language is disabled
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// The language the server renders pages in.
    pub fn canonical() -> Language {
        Language {
            code: LanguageRegistry::get().canonical().code,
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn config(&self) -> Option<&'static LanguageConfig> {
        LanguageRegistry::get().get_by_code(self.code)
    }

    /// English name of the language (e.g., "Arabic").
    pub fn name(&self) -> &'static str {
        self.config().map(|c| c.name).unwrap_or(self.code)
    }

    pub fn native_name(&self) -> &'static str {
        self.config().map(|c| c.native_name).unwrap_or(self.code)
    }

    pub fn direction(&self) -> TextDirection {
        self.config()
            .map(|c| c.direction)
            .unwrap_or(TextDirection::Ltr)
    }

    pub fn is_rtl(&self) -> bool {
        self.direction() == TextDirection::Rtl
    }

    pub fn is_canonical(&self) -> bool {
        self.config().map(|c| c.is_canonical).unwrap_or(false)
    }

    /// The other side of the EN/AR pair, used to read the mirror phrase map.
    pub fn counterpart(&self) -> Language {
        if self.is_canonical() {
            LanguageRegistry::get()
                .list_enabled()
                .into_iter()
                .find(|c| !c.is_canonical)
                .map(|c| Language { code: c.code })
                .unwrap_or(*self)
        } else {
            Language::canonical()
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}
