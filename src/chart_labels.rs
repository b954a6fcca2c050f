//! Label translation for dashboard chart payloads.
//!
//! The server embeds chart data as JSON (`{"labels": [...], "datasets":
//! [{"label": ...}]}`). Labels are short fixed strings (statuses, priorities,
//! month abbreviations), so they are matched exactly rather than swept.

use crate::i18n::Language;
use crate::phrases::PhraseMap;
use serde_json::Value;

/// Copy of `data` with every exactly matching label translated.
///
/// Only `labels[*]` and `datasets[*].label` are touched. Unknown labels, and
/// every other field, come back unchanged. Charts are rendered in the
/// canonical language, so for it the data is returned as is.
pub fn translate_chart_data(data: &Value, language: Language, labels: &PhraseMap) -> Value {
    let mut translated = data.clone();
    if language.is_canonical() || labels.is_empty() {
        return translated;
    }

    if let Some(items) = translated.get_mut("labels").and_then(Value::as_array_mut) {
        for item in items.iter_mut() {
            translate_in_place(item, labels);
        }
    }

    if let Some(datasets) = translated.get_mut("datasets").and_then(Value::as_array_mut) {
        for dataset in datasets.iter_mut() {
            if let Some(label) = dataset.get_mut("label") {
                translate_in_place(label, labels);
            }
        }
    }

    translated
}

fn translate_in_place(value: &mut Value, labels: &PhraseMap) {
    let replacement = value.as_str().and_then(|text| labels.get(text));
    if let Some(replacement) = replacement {
        *value = Value::String(replacement.to_string());
    }
}
