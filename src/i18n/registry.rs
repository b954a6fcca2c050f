//! Language registry: Single source of truth for all supported languages.
//!
//! The overlay only knows the languages listed here. A persisted preference or
//! a switch target outside this list is treated as unsupported.

use std::sync::OnceLock;

/// Writing direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Value stored under the preference key and used in resource file names
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Native name of the language (e.g., "العربية")
    pub native_name: &'static str,

    /// Layout direction applied to the page
    pub direction: TextDirection,

    /// Whether this is the language the server renders (only one should be true)
    pub is_canonical: bool,

    /// Whether this language can be selected
    pub enabled: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Selectable languages, in registry order.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Language the server renders. Falls back to the first entry.
    pub fn canonical(&self) -> &LanguageConfig {
        self.languages
            .iter()
            .find(|lang| lang.is_canonical)
            .unwrap_or(&self.languages[0])
    }
}

/// English (canonical, rendered by the server) and Arabic.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            direction: TextDirection::Ltr,
            is_canonical: true,
            enabled: true,
        },
        LanguageConfig {
            code: "ar",
            name: "Arabic",
            native_name: "العربية",
            direction: TextDirection::Rtl,
            is_canonical: false,
            enabled: true,
        },
    ]
}
