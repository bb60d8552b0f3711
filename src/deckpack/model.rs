//! # Note Models
//!
//! A [`Model`] is the schema shared by a family of notes: its ordered fields,
//! its card templates, its stylesheet and whether it is a standard or a cloze
//! model.
//!
//! ## Identity
//!
//! The model id is chosen by the caller and must be unique in the destination
//! collection: two different models with the same id silently overwrite each
//! other on import. A model may be built without an id (useful when notes
//! only need legacy GUIDs), but writing it to a package requires one.
//!
//! ## Immutability
//!
//! Models are assembled with the `with_*` builder methods and then shared
//! between notes behind an `Arc<Model>`. After that point they never change,
//! which is what makes the lazily computed requirement list safe to cache.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DeckError, Result};
use crate::requirements::{compute_requirements, TemplateRequirement};

pub type ModelId = i64;

pub const DEFAULT_LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";
pub const DEFAULT_LATEX_POST: &str = "\\end{document}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    #[default]
    Standard,
    Cloze,
}

impl ModelType {
    /// The integer stored in the model's `type` column.
    pub fn as_i64(self) -> i64 {
        match self {
            ModelType::Standard => 0,
            ModelType::Cloze => 1,
        }
    }
}

impl TryFrom<i64> for ModelType {
    type Error = DeckError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(ModelType::Standard),
            1 => Ok(ModelType::Cloze),
            other => Err(DeckError::UnknownModelType(other)),
        }
    }
}

fn default_font() -> String {
    "Liberation Sans".to_string()
}

fn default_size() -> u32 {
    20
}

/// One field of a model, with the rendering hints the host application keeps
/// for its editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub media: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            font: default_font(),
            size: default_size(),
            rtl: false,
            sticky: false,
            media: Vec::new(),
        }
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }
}

/// A card template: question and answer formats plus optional browser
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub name: String,
    pub qfmt: String,
    pub afmt: String,
    #[serde(default)]
    pub bqfmt: String,
    #[serde(default)]
    pub bafmt: String,
    /// Deck override for cards generated from this template.
    #[serde(default)]
    pub did: Option<i64>,
}

impl CardTemplate {
    pub fn new(name: impl Into<String>, qfmt: impl Into<String>, afmt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qfmt: qfmt.into(),
            afmt: afmt.into(),
            bqfmt: String::new(),
            bafmt: String::new(),
            did: None,
        }
    }

    pub fn with_browser_formats(
        mut self,
        bqfmt: impl Into<String>,
        bafmt: impl Into<String>,
    ) -> Self {
        self.bqfmt = bqfmt.into();
        self.bafmt = bafmt.into();
        self
    }
}

#[derive(Debug)]
pub struct Model {
    id: Option<ModelId>,
    name: String,
    fields: Vec<Field>,
    templates: Vec<CardTemplate>,
    css: String,
    model_type: ModelType,
    latex_pre: String,
    latex_post: String,
    sort_field_index: usize,
    // Computed on first use; models are immutable once shared.
    requirements: OnceCell<Vec<TemplateRequirement>>,
}

impl Model {
    pub fn new(
        id: Option<ModelId>,
        name: impl Into<String>,
        fields: Vec<Field>,
        templates: Vec<CardTemplate>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            fields,
            templates,
            css: String::new(),
            model_type: ModelType::Standard,
            latex_pre: DEFAULT_LATEX_PRE.to_string(),
            latex_post: DEFAULT_LATEX_POST.to_string(),
            sort_field_index: 0,
            requirements: OnceCell::new(),
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_latex(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.latex_pre = pre.into();
        self.latex_post = post.into();
        self
    }

    pub fn with_sort_field_index(mut self, index: usize) -> Self {
        self.sort_field_index = index;
        self
    }

    /// Finishes the builder chain, ready to be shared between notes.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn id(&self) -> Option<ModelId> {
        self.id
    }

    /// The id, or an error naming the model when it has none.
    pub fn require_id(&self) -> Result<ModelId> {
        self.id.ok_or_else(|| DeckError::MissingModelId {
            model: self.name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn templates(&self) -> &[CardTemplate] {
        &self.templates
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn latex_pre(&self) -> &str {
        &self.latex_pre
    }

    pub fn latex_post(&self) -> &str {
        &self.latex_post
    }

    pub fn sort_field_index(&self) -> usize {
        self.sort_field_index
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Required-field analysis for every template, computed once.
    pub fn requirements(&self) -> Result<&[TemplateRequirement]> {
        self.requirements
            .get_or_try_init(|| compute_requirements(&self.fields, &self.templates))
            .map(Vec::as_slice)
    }

    /// The model document stored in the collection's `models` map.
    pub fn to_json(&self, timestamp: i64, deck_id: i64) -> Result<Value> {
        let id = self.require_id()?;
        let requirements = self.requirements()?;

        let fields: Vec<Value> = self
            .fields
            .iter()
            .enumerate()
            .map(|(ord, field)| {
                json!({
                    "name": field.name,
                    "ord": ord,
                    "font": field.font,
                    "media": field.media,
                    "rtl": field.rtl,
                    "size": field.size,
                    "sticky": field.sticky,
                })
            })
            .collect();

        let templates: Vec<Value> = self
            .templates
            .iter()
            .enumerate()
            .map(|(ord, template)| {
                json!({
                    "name": template.name,
                    "ord": ord,
                    "qfmt": template.qfmt,
                    "afmt": template.afmt,
                    "bqfmt": template.bqfmt,
                    "bafmt": template.bafmt,
                    "did": template.did,
                })
            })
            .collect();

        Ok(json!({
            "css": self.css,
            "did": deck_id,
            "flds": fields,
            "id": id.to_string(),
            "latexPost": self.latex_post,
            "latexPre": self.latex_pre,
            "mod": timestamp,
            "name": self.name,
            "req": requirements,
            "sortf": self.sort_field_index,
            "tags": [],
            "tmpls": templates,
            "type": self.model_type.as_i64(),
            "usn": -1,
            "vers": [],
        }))
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Two fields, one template showing the first.
    pub fn front_back_model() -> Arc<Model> {
        Model::new(
            Some(234567),
            "foomodel",
            vec![Field::new("AField"), Field::new("BField")],
            vec![CardTemplate::new(
                "card1",
                "{{AField}}",
                "{{FrontSide}}<hr id=\"answer\">{{BField}}",
            )],
        )
        .shared()
    }

    /// Two templates, each gated on its own field.
    pub fn chinese_model() -> Arc<Model> {
        Model::new(
            Some(345678),
            "Chinese",
            vec![
                Field::new("Traditional"),
                Field::new("Simplified"),
                Field::new("English"),
            ],
            vec![
                CardTemplate::new(
                    "Traditional",
                    "{{Traditional}}",
                    "{{FrontSide}}<hr id=\"answer\">{{English}}",
                ),
                CardTemplate::new(
                    "Simplified",
                    "{{Simplified}}",
                    "{{FrontSide}}<hr id=\"answer\">{{English}}",
                ),
            ],
        )
        .shared()
    }

    /// Question shown directly, hint inside an optional section.
    pub fn hint_model() -> Arc<Model> {
        Model::new(
            Some(456789),
            "with hint",
            vec![
                Field::new("Question"),
                Field::new("Hint"),
                Field::new("Answer"),
            ],
            vec![CardTemplate::new(
                "card1",
                "{{Question}}{{#Hint}}<br>Hint: {{Hint}}{{/Hint}}",
                "{{Answer}}",
            )],
        )
        .shared()
    }

    pub fn cloze_model() -> Arc<Model> {
        Model::new(
            Some(998877661),
            "My Cloze Model",
            vec![Field::new("Text"), Field::new("Extra")],
            vec![CardTemplate::new(
                "My Cloze Card",
                "{{cloze:Text}}",
                "{{cloze:Text}}<br>{{Extra}}",
            )],
        )
        .with_model_type(ModelType::Cloze)
        .shared()
    }

    pub fn simple_model() -> Arc<Model> {
        Model::new(
            Some(1376484377),
            "Simple Model",
            vec![Field::new("Question"), Field::new("Answer")],
            vec![CardTemplate::new(
                "Card 1",
                "{{Question}}",
                "{{FrontSide}}<hr id=\"answer\">{{Answer}}",
            )],
        )
        .shared()
    }
}
