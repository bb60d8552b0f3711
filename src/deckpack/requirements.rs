//! # Required Fields
//!
//! The host application decides whether a card is empty by looking at the
//! model's `req` list: for each template, which fields must be filled in for
//! the question side to show anything. A wrong list produces silently dropped
//! or blank cards after import, so it is computed the same way the host does:
//! by rendering the question format with sentinel values and watching which
//! fields make the sentinel disappear.
//!
//! ## Algorithm
//!
//! 1. Bind every field to the sentinel and blank one field at a time. A field
//!    whose absence removes every sentinel from the output is required. If any
//!    field is required the template gets mode `all`.
//! 2. Otherwise bind every field to the empty string and fill one field at a
//!    time. Each field whose sentinel shows up is an alternative; the template
//!    gets mode `any`.
//! 3. A template with no alternatives can never show content and is rejected.
//!
//! The result serializes as `[template_ord, "all"|"any", [field_ord, ...]]`.

use std::collections::HashMap;

use mustache::Template;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::error::{DeckError, Result};
use crate::model::{CardTemplate, Field};

const SENTINEL: &str = "SeNtInEl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementMode {
    All,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequirement {
    pub template_ord: usize,
    pub mode: RequirementMode,
    pub field_ords: Vec<usize>,
}

impl TemplateRequirement {
    /// Whether a note with these field values gets a card for this template.
    pub fn is_satisfied_by(&self, values: &[String]) -> bool {
        let filled = |ord: &usize| values.get(*ord).is_some_and(|value| !value.is_empty());
        match self.mode {
            RequirementMode::All => self.field_ords.iter().all(filled),
            RequirementMode::Any => self.field_ords.iter().any(filled),
        }
    }
}

impl Serialize for TemplateRequirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.template_ord)?;
        tuple.serialize_element(&self.mode)?;
        tuple.serialize_element(&self.field_ords)?;
        tuple.end()
    }
}

pub fn compute_requirements(
    fields: &[Field],
    templates: &[CardTemplate],
) -> Result<Vec<TemplateRequirement>> {
    let names: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();

    templates
        .iter()
        .enumerate()
        .map(|(template_ord, template)| -> Result<TemplateRequirement> {
            let compiled = mustache::compile_str(&template.qfmt)?;
            let (mode, field_ords) =
                requirement_for(&compiled, &names)?.ok_or_else(|| DeckError::NoRequiredFields {
                    qfmt: template.qfmt.clone(),
                })?;
            Ok(TemplateRequirement {
                template_ord,
                mode,
                field_ords,
            })
        })
        .collect()
}

/// Renders with every field set to `base` except `name`, set to `value`.
fn shows_sentinel(
    template: &Template,
    names: &[&str],
    name: &str,
    base: &str,
    value: &str,
) -> Result<bool> {
    let values: HashMap<&str, &str> = names
        .iter()
        .map(|&other| (other, if other == name { value } else { base }))
        .collect();
    Ok(template.render_to_string(&values)?.contains(SENTINEL))
}

fn requirement_for(
    template: &Template,
    names: &[&str],
) -> Result<Option<(RequirementMode, Vec<usize>)>> {
    let mut required = Vec::new();
    for (ord, name) in names.iter().copied().enumerate() {
        if !shows_sentinel(template, names, name, SENTINEL, "")? {
            required.push(ord);
        }
    }
    if !required.is_empty() {
        return Ok(Some((RequirementMode::All, required)));
    }

    let mut alternatives = Vec::new();
    for (ord, name) in names.iter().copied().enumerate() {
        if shows_sentinel(template, names, name, "", SENTINEL)? {
            alternatives.push(ord);
        }
    }
    if alternatives.is_empty() {
        Ok(None)
    } else {
        Ok(Some((RequirementMode::Any, alternatives)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<Field> {
        names.iter().map(|name| Field::new(*name)).collect()
    }

    fn single(qfmt: &str, names: &[&str]) -> Result<Vec<TemplateRequirement>> {
        compute_requirements(&fields(names), &[CardTemplate::new("t", qfmt, "")])
    }

    #[test]
    fn test_single_field_template() {
        let model = front_back_model();
        assert_eq!(
            serde_json::to_value(model.requirements().unwrap()).unwrap(),
            json!([[0, "all", [0]]])
        );
    }

    #[test]
    fn test_two_templates() {
        let model = chinese_model();
        assert_eq!(
            serde_json::to_value(model.requirements().unwrap()).unwrap(),
            json!([[0, "all", [0]], [1, "all", [1]]])
        );
    }

    #[test]
    fn test_optional_hint_section_gives_any() {
        let model = hint_model();
        assert_eq!(
            serde_json::to_value(model.requirements().unwrap()).unwrap(),
            json!([[0, "any", [0, 1]]])
        );
    }

    #[test]
    fn test_every_field_gating_the_question_is_all() {
        let req = single("{{#A}}{{#B}}{{A}}{{B}}{{/B}}{{/A}}", &["A", "B"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::All);
        assert_eq!(req[0].field_ords, vec![0, 1]);
    }

    #[test]
    fn test_independent_fields_are_alternatives() {
        // Blanking any one field still leaves the other sentinels visible.
        let req = single("{{A}} {{B}} {{C}}", &["A", "B", "C"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::Any);
        assert_eq!(req[0].field_ords, vec![0, 1, 2]);
    }

    #[test]
    fn test_any_of_sections_over_two_fields() {
        let req = single("{{#A}}{{A}}{{/A}}{{#B}}{{B}}{{/B}}", &["A", "B", "C"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::Any);
        assert_eq!(req[0].field_ords, vec![0, 1]);
    }

    #[test]
    fn test_gated_reverse_card() {
        let req = single("{{#Add Reverse}}{{Back}}{{/Add Reverse}}", &["Front", "Back", "Add Reverse"])
            .unwrap();
        assert_eq!(req[0].mode, RequirementMode::All);
        assert_eq!(req[0].field_ords, vec![1, 2]);
    }

    #[test]
    fn test_type_in_answer_only_counts_plain_field() {
        let req = single("{{Front}}\n\n{{type:Back}}", &["Front", "Back"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::All);
        assert_eq!(req[0].field_ords, vec![0]);
    }

    #[test]
    fn test_no_viable_field_set_is_fatal() {
        // Content needs two fields at once, and no single field is mandatory.
        let qfmt = "{{#A}}{{B}}{{/A}}{{#B}}{{C}}{{/B}}{{#C}}{{A}}{{/C}}";
        let err = single(qfmt, &["A", "B", "C"]).unwrap_err();
        match err {
            DeckError::NoRequiredFields { qfmt: reported } => assert_eq!(reported, qfmt),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_model_without_fields_is_fatal() {
        let err = single("static text", &[]).unwrap_err();
        assert!(matches!(err, DeckError::NoRequiredFields { .. }));
    }

    #[test]
    fn test_question_without_field_content_requires_everything() {
        // The sentinel never shows, so blanking any field "removes" it.
        let req = single("{{Nope}} static", &["Front", "Back"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::All);
        assert_eq!(req[0].field_ords, vec![0, 1]);
    }

    #[test]
    fn test_malformed_template_is_reported() {
        let err = single("{{#Front}}", &["Front"]).unwrap_err();
        assert!(matches!(err, DeckError::Template(_)));
    }

    #[test]
    fn test_inverted_section_does_not_require_its_field() {
        let req = single("{{Front}}{{^Back}}no answer yet{{/Back}}", &["Front", "Back"]).unwrap();
        assert_eq!(req[0].mode, RequirementMode::All);
        assert_eq!(req[0].field_ords, vec![0]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let req = single("{{! mentions Back }}{{Front}}", &["Front", "Back"]).unwrap();
        assert_eq!(req[0].field_ords, vec![0]);
    }

    #[test]
    fn test_is_satisfied_by() {
        let all = TemplateRequirement {
            template_ord: 0,
            mode: RequirementMode::All,
            field_ords: vec![0, 1],
        };
        let any = TemplateRequirement {
            mode: RequirementMode::Any,
            ..all.clone()
        };
        let values = vec!["x".to_string(), String::new()];

        assert!(!all.is_satisfied_by(&values));
        assert!(any.is_satisfied_by(&values));
        assert!(!any.is_satisfied_by(&[String::new(), String::new()]));
    }
}
