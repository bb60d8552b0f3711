//! # Notes
//!
//! A [`Note`] is one entry of a deck: the field values for a shared
//! [`Model`], plus tags and identity. The cards it produces and its derived
//! GUID are computed on first access and cached; changing the model, the
//! fields or the GUID method drops both caches.
//!
//! Construction never fails on a field-count mismatch, since callers often
//! fill fields in after choosing the model. [`Note::validate`] checks it, and
//! the package writer calls it before writing anything.

use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::card::{resolve_cards, Card};
use crate::error::{DeckError, Result};
use crate::guid::{derive_guid_for_model, GuidMethod};
use crate::html::{scan_fields, FieldWarning};
use crate::model::Model;
use crate::tags::Tags;

/// Separator between field values in the collection's `flds` column.
pub const FIELD_SEPARATOR: &str = "\x1f";

#[derive(Debug, Clone, Default)]
pub struct Note {
    model: Option<Arc<Model>>,
    fields: Vec<String>,
    tags: Tags,
    sort_field: Option<String>,
    guid: Option<String>,
    guid_method: GuidMethod,
    due: i64,
    cards: OnceCell<Vec<Card>>,
    derived_guid: OnceCell<String>,
}

impl Note {
    pub fn new(model: Arc<Model>, fields: Vec<String>) -> Self {
        Self {
            model: Some(model),
            fields,
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.assign(tags)?;
        Ok(self)
    }

    /// Uses this GUID verbatim instead of deriving one.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_guid_method(mut self, method: GuidMethod) -> Self {
        self.set_guid_method(method);
        self
    }

    /// Overrides the value written to the collection's sort column.
    pub fn with_sort_field(mut self, sort_field: impl Into<String>) -> Self {
        self.sort_field = Some(sort_field.into());
        self
    }

    /// Due position of the note's new cards.
    pub fn with_due(mut self, due: i64) -> Self {
        self.due = due;
        self
    }

    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    pub fn set_model(&mut self, model: Option<Arc<Model>>) {
        self.model = model;
        self.reset_derived();
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn set_fields(&mut self, fields: Vec<String>) {
        self.fields = fields;
        self.reset_derived();
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Mutable access for the validated tag operations.
    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }

    pub fn guid_method(&self) -> GuidMethod {
        self.guid_method
    }

    pub fn set_guid_method(&mut self, method: GuidMethod) {
        self.guid_method = method;
        self.derived_guid = OnceCell::new();
    }

    pub fn set_guid(&mut self, guid: Option<String>) {
        self.guid = guid;
    }

    pub fn due(&self) -> i64 {
        self.due
    }

    pub fn set_due(&mut self, due: i64) {
        self.due = due;
    }

    fn reset_derived(&mut self) {
        self.cards = OnceCell::new();
        self.derived_guid = OnceCell::new();
    }

    fn require_model(&self) -> Result<&Arc<Model>> {
        self.model.as_ref().ok_or(DeckError::NoModel)
    }

    /// The cards this note produces, resolved once.
    pub fn cards(&self) -> Result<&[Card]> {
        let model = self.require_model()?;
        self.cards
            .get_or_try_init(|| resolve_cards(model, &self.fields))
            .map(Vec::as_slice)
    }

    /// Resolved cards, open for flipping suspension before the note is
    /// written.
    pub fn cards_mut(&mut self) -> Result<&mut [Card]> {
        self.cards()?;
        Ok(self
            .cards
            .get_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or_default())
    }

    /// The explicit GUID if one was given, otherwise the derived one.
    pub fn guid(&self) -> Result<&str> {
        if let Some(guid) = &self.guid {
            return Ok(guid.as_str());
        }
        self.derived_guid
            .get_or_try_init(|| {
                derive_guid_for_model(&self.fields, self.model.as_deref(), self.guid_method)
            })
            .map(String::as_str)
    }

    /// The explicit sort value, or the field the model sorts by.
    pub fn sort_field(&self) -> &str {
        if let Some(sort_field) = &self.sort_field {
            return sort_field;
        }
        let index = self
            .model
            .as_ref()
            .map(|model| model.sort_field_index())
            .unwrap_or(0);
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// Checks the note is complete and matches its model.
    pub fn validate(&self) -> Result<()> {
        let model = self.require_model()?;
        let expected = model.fields().len();
        if self.fields.len() != expected {
            return Err(DeckError::FieldCountMismatch {
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn html_warnings(&self) -> Vec<FieldWarning> {
        scan_fields(&self.fields)
    }

    /// Field values as stored in the collection.
    pub fn format_fields(&self) -> String {
        self.fields.join(FIELD_SEPARATOR)
    }

    pub fn format_tags(&self) -> String {
        self.tags.to_field_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use crate::model::{CardTemplate, Field};

    fn values(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn argentina() -> Note {
        Note::new(simple_model(), values(&["Capital of Argentina", "Buenos Aires"]))
    }

    #[test]
    fn test_tags_validated_on_construction() {
        assert!(argentina().with_tags(["foo", "bar"]).is_ok());
        let err = argentina().with_tags(["foo", "b ar"]).unwrap_err();
        assert!(matches!(err, DeckError::InvalidTag(_)));
    }

    #[test]
    fn test_tags_validated_on_mutation() {
        let mut note = argentina().with_tags(["foo"]).unwrap();
        assert!(note.tags_mut().push("dankey kang").is_err());
        assert!(note.tags_mut().set(0, "nerf joker pls").is_err());
        assert_eq!(note.tags().as_slice(), ["foo"]);
        assert_eq!(note.format_tags(), " foo ");
    }

    #[test]
    fn test_field_count_checked_at_validation_only() {
        let model = Model::new(
            Some(1894808898),
            "Test Model",
            vec![Field::new("Question"), Field::new("Answer"), Field::new("Extra")],
            vec![CardTemplate::new("Card 1", "{{Question}}", "{{Answer}}")],
        )
        .shared();

        let short = Note::new(model.clone(), values(&["What is the capital of Taiwan?", "Taipei"]));
        assert!(matches!(
            short.validate(),
            Err(DeckError::FieldCountMismatch {
                expected: 3,
                found: 2
            })
        ));

        let long = Note::new(model.clone(), values(&["q", "a", "extra", "surplus"]));
        assert!(matches!(
            long.validate(),
            Err(DeckError::FieldCountMismatch {
                expected: 3,
                found: 4
            })
        ));

        let exact = Note::new(model, values(&["q", "a", "extra"]));
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_note_without_model() {
        let note = Note::default();
        assert!(matches!(note.validate(), Err(DeckError::NoModel)));
        assert!(matches!(note.cards(), Err(DeckError::NoModel)));
        assert!(matches!(note.guid(), Err(DeckError::NoModel)));
    }

    #[test]
    fn test_derived_guid() {
        assert_eq!(argentina().guid().unwrap(), "w%C983W&N)");
        let legacy = argentina().with_guid_method(GuidMethod::Legacy);
        assert_eq!(legacy.guid().unwrap(), "HSnG{z%dU<");
    }

    #[test]
    fn test_explicit_guid_wins() {
        let note = argentina().with_guid("custom-guid");
        assert_eq!(note.guid().unwrap(), "custom-guid");
    }

    #[test]
    fn test_setting_fields_resets_caches() {
        let mut note = Note::new(front_back_model(), values(&["front", "back"]));
        let before = note.guid().unwrap().to_string();
        assert_eq!(note.cards().unwrap().len(), 1);

        note.set_fields(values(&["", "back"]));
        assert!(note.cards().unwrap().is_empty());
        assert_ne!(note.guid().unwrap(), before);
    }

    #[test]
    fn test_setting_model_resets_caches() {
        let mut note = Note::new(front_back_model(), values(&["中國", "中国"]));
        let before = note.guid().unwrap().to_string();

        note.set_model(Some(chinese_model()));
        note.set_fields(values(&["中國", "中国", "China"]));
        assert_eq!(note.cards().unwrap().len(), 2);
        assert_ne!(note.guid().unwrap(), before);
    }

    #[test]
    fn test_suspend_through_cards_mut() {
        let mut note = Note::new(chinese_model(), values(&["中國", "中国", "China"]));
        note.cards_mut().unwrap()[1].suspend = true;

        let cards = note.cards().unwrap();
        assert!(!cards[0].suspend);
        assert!(cards[1].suspend);
        assert_eq!(cards[1].queue(), -1);
    }

    #[test]
    fn test_sort_field() {
        let note = argentina();
        assert_eq!(note.sort_field(), "Capital of Argentina");
        assert_eq!(note.with_sort_field("Argentina").sort_field(), "Argentina");

        let by_answer = Model::new(
            Some(5),
            "sorted by answer",
            vec![Field::new("Q"), Field::new("A")],
            vec![CardTemplate::new("c", "{{Q}}", "{{A}}")],
        )
        .with_sort_field_index(1)
        .shared();
        assert_eq!(Note::new(by_answer, values(&["q", "a"])).sort_field(), "a");
    }

    #[test]
    fn test_format_fields() {
        assert_eq!(argentina().format_fields(), "Capital of Argentina\x1fBuenos Aires");
    }

    #[test]
    fn test_html_warnings() {
        let note = Note::new(simple_model(), values(&["Capital of <$> Argentina", "Buenos Aires"]));
        let warnings = note.html_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, 0);
        assert!(argentina().html_warnings().is_empty());
    }

    #[test]
    fn test_due_defaults_to_zero() {
        assert_eq!(argentina().due(), 0);
        assert_eq!(argentina().with_due(7).due(), 7);
    }
}
