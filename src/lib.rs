pub mod assets;
pub mod chart_labels;
pub mod config;
pub mod dictionary;
pub mod dom;
pub mod engine;
pub mod error;
pub mod i18n;
pub mod overlay;
pub mod phrases;
pub mod preference;
pub mod retry;
