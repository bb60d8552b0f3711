//! # Cloze Scanning
//!
//! A cloze note produces one card per deletion group. The groups are found in
//! two steps: the first template's question format names the fields rendered
//! with the `cloze` filter, and each of those fields is scanned for
//! `{{cN::...}}` markers. Group `N` becomes card ordinal `N - 1`.
//!
//! Both the `{{cloze:Field}}` syntax (with optional extra qualifiers, e.g.
//! `{{cloze:hint:Field}}`) and the legacy `<%cloze:Field%>` syntax are
//! recognized. A note without any marker still yields a single card.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Model;

static CLOZE_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^}]*?cloze:(?:[^}:]*:)*([^}:]+)\}\}").expect("valid regex"));

static LEGACY_CLOZE_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<%cloze:(?:[^%:]*:)*([^%:]+)%>").expect("valid regex"));

static CLOZE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{c(\d+)::.+?\}\}").expect("valid regex"));

/// Field names rendered as cloze text by a question format.
pub fn cloze_field_names(qfmt: &str) -> BTreeSet<&str> {
    CLOZE_FIELD_RE
        .captures_iter(qfmt)
        .chain(LEGACY_CLOZE_FIELD_RE.captures_iter(qfmt))
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str().trim())
        .collect()
}

/// Zero-based deletion groups referenced in one field's text.
pub fn cloze_ordinals_in(text: &str) -> BTreeSet<usize> {
    CLOZE_MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|group| *group > 0)
        .map(|group| group - 1)
        .collect()
}

pub fn compute_cloze_ordinals(model: &Model, note_fields: &[String]) -> BTreeSet<usize> {
    let Some(template) = model.templates().first() else {
        return BTreeSet::from([0]);
    };

    let mut ordinals = BTreeSet::new();
    for name in cloze_field_names(&template.qfmt) {
        let value = model
            .field_index(name)
            .and_then(|index| note_fields.get(index))
            .map(String::as_str)
            .unwrap_or("");
        ordinals.extend(cloze_ordinals_in(value));
    }

    if ordinals.is_empty() {
        ordinals.insert(0);
    }
    ordinals
}
