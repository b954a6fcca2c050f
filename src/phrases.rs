//! Phrase maps, lexicons and the compiled sweep plan.
//!
//! A phrase map translates whole phrases into one language
//! (`phrases.ar.json` maps English phrases to Arabic). The lexicon holds
//! single words applied after the phrases. Both are flat JSON objects.

use regex::{NoExpand, Regex, RegexBuilder};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Flat source → target table. Also used for lexicons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseMap {
    entries: BTreeMap<String, String>,
}

impl PhraseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON document. Anything but an object yields an empty
    /// map; non-string values inside the object are skipped.
    pub fn from_value(value: &Value) -> Self {
        let entries = match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { entries }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for PhraseMap {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        }
    }
}

/// One replacement applied by the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhrasePair {
    pub source: String,
    pub target: String,
}

/// Pairs for the active language, longest source first.
///
/// `forward` is the phrase map translating into the active language.
/// `mirror` is the other language's map; its entries are read backwards so a
/// page already switched once can be switched back without a reload.
/// A source present in `forward` is not overridden by the mirror.
pub fn build_pairs(forward: &PhraseMap, mirror: &PhraseMap) -> Vec<PhrasePair> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut pairs = Vec::with_capacity(forward.len() + mirror.len());

    for (source, target) in forward.iter() {
        if source.is_empty() {
            continue;
        }
        seen.insert(source);
        pairs.push(PhrasePair {
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    for (target, source) in mirror.iter() {
        if source.is_empty() || !seen.insert(source) {
            continue;
        }
        pairs.push(PhrasePair {
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    sort_longest_first(&mut pairs);
    pairs
}

fn sort_longest_first(pairs: &mut [PhrasePair]) {
    pairs.sort_by(|a, b| {
        b.source
            .chars()
            .count()
            .cmp(&a.source.chars().count())
            .then_with(|| a.source.cmp(&b.source))
    });
}

/// Whether every letter in `key` is ASCII. Such keys get word boundaries.
pub fn is_latin(key: &str) -> bool {
    let mut letters = key.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_ascii_alphabetic())
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    target: String,
}

impl Rule {
    fn apply(&self, text: &str) -> Option<String> {
        match self
            .pattern
            .replace_all(text, NoExpand(self.target.as_str()))
        {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(replaced),
        }
    }
}

/// Compiled phrase pairs and lexicon, ready to run over text.
#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    phrases: Vec<Rule>,
    words: Vec<Rule>,
}

impl SweepPlan {
    /// Compile `pairs` in the order given, then the lexicon longest key first.
    ///
    /// Phrase pairs are case-insensitive literal matches. Latin lexicon keys
    /// are case-insensitive and bounded by word edges; other keys are plain
    /// substrings.
    pub fn compile(pairs: &[PhrasePair], lexicon: &PhraseMap) -> Self {
        let phrases = pairs
            .iter()
            .filter(|pair| !pair.source.is_empty())
            .filter_map(|pair| {
                build_rule(&regex::escape(&pair.source), true, &pair.target, &pair.source)
            })
            .collect();

        let mut lexicon_pairs: Vec<PhrasePair> = lexicon
            .iter()
            .filter(|(word, _)| !word.is_empty())
            .map(|(word, target)| PhrasePair {
                source: word.to_string(),
                target: target.to_string(),
            })
            .collect();
        sort_longest_first(&mut lexicon_pairs);

        let words = lexicon_pairs
            .iter()
            .filter_map(|pair| {
                if is_latin(&pair.source) {
                    build_rule(&bounded(&pair.source), true, &pair.target, &pair.source)
                } else {
                    build_rule(&regex::escape(&pair.source), false, &pair.target, &pair.source)
                }
            })
            .collect();

        Self { phrases, words }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.words.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.phrases.len() + self.words.len()
    }

    /// Run every phrase rule, then every lexicon rule, over `text`.
    pub fn translate(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in self.phrases.iter().chain(self.words.iter()) {
            if let Some(next) = rule.apply(&current) {
                current = next;
            }
        }
        current
    }
}

/// Escape `word` and add `\b` on each side that starts or ends with a word
/// character. A boundary next to punctuation would never match.
fn bounded(word: &str) -> String {
    let escaped = regex::escape(word);
    let starts_word = word.chars().next().is_some_and(is_word_char);
    let ends_word = word.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn build_rule(pattern: &str, case_insensitive: bool, target: &str, source: &str) -> Option<Rule> {
    match RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(pattern) => Some(Rule {
            pattern,
            target: target.to_string(),
        }),
        Err(e) => {
            warn!("Skipping phrase {:?}: {}", source, e);
            None
        }
    }
}
