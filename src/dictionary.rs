//! Structured dictionary: nested JSON resolved by dotted key paths.

use serde_json::{Map, Value};

/// Per-language dictionary fetched from `core/i18n/{lang}.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    root: Map<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anything but a JSON object becomes an empty dictionary.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Resolve `nav.tasks.title` to its string leaf.
    ///
    /// Returns `None` for an empty key, a missing segment, or a path that ends
    /// at a number, object or other non-string value.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        if key.is_empty() {
            return None;
        }

        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        current.as_str()
    }
}
