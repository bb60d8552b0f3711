//! Malformed-markup scan for field values.
//!
//! Field values are HTML. Text pasted in without escaping (LaTeX, chemistry
//! notation, `a < b` comparisons) often contains a `<` that the card renderer
//! will read as the start of a tag, swallowing everything up to the next `>`.
//! The scan reports those fragments so the caller can escape them. Findings
//! are warnings only.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// What may legitimately follow a `<`: a plain element name with optional
/// attributes on the same line, a comment opener, or a CDATA opener.
static ALLOWED_AFTER_LT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:/?[a-zA-Z0-9]+(?: .*|/?)>|!--|!\[CDATA\[)").expect("valid regex")
});

/// Fragments that start with a `<` not opening a valid tag, each running to
/// the next `>` (possibly on a later line).
pub fn find_invalid_html_tags(field: &str) -> Vec<String> {
    let mut invalid = Vec::new();
    let mut rest = field;

    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        if ALLOWED_AFTER_LT.is_match(after) {
            rest = after;
            continue;
        }
        // Without a closing '>' nothing later can close either.
        let Some(end) = after.find('>') else {
            break;
        };
        invalid.push(rest[start..start + end + 2].to_string());
        rest = &after[end + 1..];
    }

    invalid
}

/// Invalid fragments found in one field of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    pub field: usize,
    pub invalid_tags: Vec<String>,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field {} contained the following invalid HTML tags; escape literal '<' as '&lt;': {:?}",
            self.field, self.invalid_tags
        )
    }
}

/// Scans every field, returning one warning per field with findings.
pub fn scan_fields(fields: &[String]) -> Vec<FieldWarning> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(field, value)| {
            let invalid_tags = find_invalid_html_tags(value);
            (!invalid_tags.is_empty()).then_some(FieldWarning {
                field,
                invalid_tags,
            })
        })
        .collect()
}
