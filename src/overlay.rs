//! Pure translation passes over a `Document`.
//!
//! Computing replacements never mutates the page; `apply_replacements` does.
//! The engine runs the structured pass and the sweep as separate tasks, each
//! computing and applying under one lock.

use crate::dictionary::Dictionary;
use crate::dom::{Document, NodeId};
use crate::i18n::Language;
use crate::phrases::{PhraseMap, PhrasePair, SweepPlan};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Dotted dictionary key for an element's content.
pub const KEY_ATTR: &str = "data-i18n";
/// Presence switches content replacement from text to markup.
pub const HTML_FLAG_ATTR: &str = "data-i18n-html";
/// JSON object of attribute name → dotted dictionary key.
pub const ATTR_MAP_ATTR: &str = "data-i18n-attr";
/// Marks a language switch; the value is the target language code.
pub const LANG_SELECT_ATTR: &str = "data-lang-select";

pub const RTL_CLASS: &str = "rtl-ui";
pub const RTL_STYLESHEET_ID: &str = "rtl-stylesheet";

/// Attributes the sweep rewrites on any element.
pub const SWEPT_ATTRIBUTES: [&str; 4] = ["placeholder", "title", "aria-label", "value"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// New value for a text node
    TextNode(String),
    /// Replace an element's children with text
    TextContent(String),
    /// Replace an element's children with raw markup
    Markup(String),
    Attribute { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub node: NodeId,
    pub change: Change,
}

impl Replacement {
    fn new(node: NodeId, change: Change) -> Self {
        Self { node, change }
    }
}

/// Result of the structured pass with key resolution counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredPass {
    pub replacements: Vec<Replacement>,
    pub hits: usize,
    pub misses: usize,
}

/// Set `lang`, toggle the RTL class and add or remove the RTL stylesheet link.
///
/// The link is only added when no element with its id exists, so repeated
/// calls for an RTL language keep exactly one.
pub fn apply_direction(document: &mut Document, language: Language, stylesheet_href: &str) {
    let root = document.root();
    document.set_attr(root, "lang", language.code());

    let existing = document.element_by_id(RTL_STYLESHEET_ID);
    if language.is_rtl() {
        document.add_class(root, RTL_CLASS);
        if existing.is_none() {
            let head = document.ensure_head();
            document.append_element(
                head,
                "link",
                &[
                    ("id", RTL_STYLESHEET_ID),
                    ("rel", "stylesheet"),
                    ("href", stylesheet_href),
                ],
            );
        }
    } else {
        document.remove_class(root, RTL_CLASS);
        if let Some(link) = existing {
            document.remove(link);
        }
    }
}

/// Resolve every `data-i18n` and `data-i18n-attr` annotation.
///
/// Unresolved keys produce no replacement. A malformed attribute map skips
/// that element only.
pub fn structured_pass(dictionary: &Dictionary, document: &Document) -> StructuredPass {
    let mut pass = StructuredPass::default();

    for element in document.elements_with_attr(KEY_ATTR) {
        let key = document.attr(element, KEY_ATTR).unwrap_or_default();
        match dictionary.resolve(key) {
            Some(value) => {
                pass.hits += 1;
                let change = if document.has_attr(element, HTML_FLAG_ATTR) {
                    Change::Markup(value.to_string())
                } else {
                    Change::TextContent(value.to_string())
                };
                pass.replacements.push(Replacement::new(element, change));
            }
            None => pass.misses += 1,
        }
    }

    for element in document.elements_with_attr(ATTR_MAP_ATTR) {
        let raw = document.attr(element, ATTR_MAP_ATTR).unwrap_or_default();
        let mapping = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(mapping)) => mapping,
            Ok(_) => {
                warn!("Ignoring {} that is not a JSON object: {}", ATTR_MAP_ATTR, raw);
                continue;
            }
            Err(e) => {
                warn!("Ignoring malformed {} {:?}: {}", ATTR_MAP_ATTR, raw, e);
                continue;
            }
        };

        for (name, key) in &mapping {
            match key.as_str().and_then(|key| dictionary.resolve(key)) {
                Some(value) => {
                    pass.hits += 1;
                    pass.replacements.push(Replacement::new(
                        element,
                        Change::Attribute {
                            name: name.clone(),
                            value: value.to_string(),
                        },
                    ));
                }
                None => pass.misses += 1,
            }
        }
    }

    pass
}

/// Whether an element's `name` follows a CSRF token convention
/// (`csrfmiddlewaretoken`, `_csrf`, `csrf_token`).
pub fn is_csrf_field(document: &Document, element: NodeId) -> bool {
    document
        .attr(element, "name")
        .map(|name| name.to_ascii_lowercase().contains("csrf"))
        .unwrap_or(false)
}

/// Run the phrase/lexicon plan over body text nodes and swept attributes.
///
/// Only values that actually change are returned. Whitespace-only text nodes
/// are skipped.
pub fn sweep(plan: &SweepPlan, document: &Document) -> Vec<Replacement> {
    let mut replacements = Vec::new();
    if plan.is_empty() {
        return replacements;
    }

    if let Some(body) = document.body() {
        for node in document.text_nodes(body) {
            let Some(text) = document.text(node) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let translated = plan.translate(text);
            if translated != text {
                replacements.push(Replacement::new(node, Change::TextNode(translated)));
            }
        }
    }

    for element in document.elements() {
        for name in SWEPT_ATTRIBUTES {
            let Some(value) = document.attr(element, name) else {
                continue;
            };
            if name == "value" && is_csrf_field(document, element) {
                continue;
            }
            let translated = plan.translate(value);
            if translated != value {
                replacements.push(Replacement::new(
                    element,
                    Change::Attribute {
                        name: name.to_string(),
                        value: translated,
                    },
                ));
            }
        }
    }

    replacements
}

/// Structured replacements followed by sweep replacements, all computed
/// against the same snapshot.
///
/// Sweep rewrites of text inside an element whose content the structured pass
/// replaces are dropped, so the dictionary value wins.
pub fn compute_replacements(
    dictionary: &Dictionary,
    pairs: &[PhrasePair],
    lexicon: &PhraseMap,
    document: &Document,
) -> Vec<Replacement> {
    let mut replacements = structured_pass(dictionary, document).replacements;
    let overwritten: HashSet<NodeId> = replacements
        .iter()
        .filter(|r| matches!(r.change, Change::TextContent(_) | Change::Markup(_)))
        .map(|r| r.node)
        .collect();

    let plan = SweepPlan::compile(pairs, lexicon);
    replacements.extend(
        sweep(&plan, document)
            .into_iter()
            .filter(|r| !within(document, r.node, &overwritten)),
    );
    replacements
}

fn within(document: &Document, node: NodeId, elements: &HashSet<NodeId>) -> bool {
    let mut current = document.parent(node);
    while let Some(id) = current {
        if elements.contains(&id) {
            return true;
        }
        current = document.parent(id);
    }
    false
}

/// Apply replacements in order. Returns how many were applied.
pub fn apply_replacements(document: &mut Document, replacements: &[Replacement]) -> usize {
    for replacement in replacements {
        let node = replacement.node;
        match &replacement.change {
            Change::TextNode(text) => document.set_text(node, text),
            Change::TextContent(text) => document.set_text_content(node, text),
            Change::Markup(markup) => document.set_inner_markup(node, markup),
            Change::Attribute { name, value } => document.set_attr(node, name, value),
        }
    }
    replacements.len()
}

/// Language switch triggers and their target codes, in document order.
pub fn switch_targets(document: &Document) -> Vec<(NodeId, String)> {
    document
        .elements_with_attr(LANG_SELECT_ATTR)
        .into_iter()
        .filter_map(|node| {
            document
                .attr(node, LANG_SELECT_ATTR)
                .map(|code| (node, code.to_string()))
        })
        .collect()
}
