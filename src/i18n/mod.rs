//! Language support for the overlay.
//!
//! - `registry`: supported languages and their metadata (direction, names)
//! - `language`: validated `Language` type
//! - `metrics`: fetch and pass counters
//! - `validator`: phrase table diagnostics

mod language;
mod metrics;
mod registry;
mod validator;

pub use language::Language;
pub use metrics::{MetricsReport, OverlayMetrics};
pub use registry::{LanguageConfig, LanguageRegistry, TextDirection};
pub use validator::{PhraseValidator, ValidationReport};
