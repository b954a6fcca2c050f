//! Phrase table diagnostics.
//!
//! The sweep applies pairs one after another, so a target that contains
//! another pair's source gets translated twice. The overlay accepts that
//! risk; this module only reports where it exists so the tables can be fixed.

use crate::phrases::PhraseMap;

/// Validation report containing errors and warnings about a phrase table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Entries the sweep cannot use at all
    pub errors: Vec<String>,

    /// Entries that can corrupt already translated text
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for phrase maps and lexicons.
pub struct PhraseValidator;

impl PhraseValidator {
    /// Check a phrase map for entries that misbehave during the sweep.
    ///
    /// - blank sources are errors (they are dropped)
    /// - empty targets are warnings (they erase text)
    /// - a target containing another entry's source is a warning (chained
    ///   translation), as is a target containing its own source
    pub fn validate(phrases: &PhraseMap) -> ValidationReport {
        let mut report = ValidationReport::new();

        let lowered: Vec<(String, String)> = phrases
            .iter()
            .map(|(s, t)| (s.to_lowercase(), t.to_lowercase()))
            .collect();

        for (source, target) in phrases.iter() {
            if source.trim().is_empty() {
                report
                    .errors
                    .push(format!("Blank source phrase mapped to {:?}", target));
                continue;
            }
            if target.is_empty() {
                report
                    .warnings
                    .push(format!("Phrase {:?} has an empty translation", source));
            }
        }

        for (source, target) in &lowered {
            if source.trim().is_empty() {
                continue;
            }
            for (other, _) in &lowered {
                if other.trim().is_empty() || !target.contains(other.as_str()) {
                    continue;
                }
                if other == source {
                    report.warnings.push(format!(
                        "Phrase {:?} translates to text containing itself",
                        source
                    ));
                } else {
                    report.warnings.push(format!(
                        "Translation of {:?} contains source phrase {:?}",
                        source, other
                    ));
                }
            }
        }

        report
    }
}
