//! JSON build manifests.
//!
//! A manifest describes a whole package in one file: custom models, decks
//! with their notes, and media paths. Notes name their model either by the
//! id of a custom model or by a built-in name such as `"basic"`.
//!
//! ```json
//! {
//!   "models": [{"id": 1607392319, "name": "Simple", "fields": [{"name": "Q"}, {"name": "A"}],
//!               "templates": [{"name": "Card 1", "qfmt": "{{Q}}", "afmt": "{{A}}"}]}],
//!   "decks": [{"id": 2059400110, "name": "Capitals",
//!              "notes": [{"model": 1607392319, "fields": ["France", "Paris"], "tags": ["europe"]},
//!                        {"model": "basic", "fields": ["Peru", "Lima"]}]}],
//!   "media": ["sounds/lima.mp3"]
//! }
//! ```
//!
//! Relative media paths are resolved against the manifest's directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builtin::builtin_model;
use crate::deck::Deck;
use crate::deck_conf::DeckConf;
use crate::error::{DeckError, Result};
use crate::guid::GuidMethod;
use crate::model::{
    CardTemplate, Field, Model, ModelId, ModelType, DEFAULT_LATEX_POST, DEFAULT_LATEX_PRE,
};
use crate::note::Note;
use crate::package::Package;
use crate::tags::Tags;

fn default_latex_pre() -> String {
    DEFAULT_LATEX_PRE.to_string()
}

fn default_latex_post() -> String {
    DEFAULT_LATEX_POST.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: ModelId,
    pub name: String,
    pub fields: Vec<Field>,
    pub templates: Vec<CardTemplate>,
    #[serde(default)]
    pub css: String,
    /// 0 for standard, 1 for cloze.
    #[serde(default, rename = "type")]
    pub model_type: i64,
    #[serde(default = "default_latex_pre")]
    pub latex_pre: String,
    #[serde(default = "default_latex_post")]
    pub latex_post: String,
    #[serde(default)]
    pub sort_field_index: usize,
}

impl ModelSpec {
    pub fn build(&self) -> Result<Model> {
        Ok(Model::new(
            Some(self.id),
            self.name.clone(),
            self.fields.clone(),
            self.templates.clone(),
        )
        .with_css(self.css.clone())
        .with_model_type(ModelType::try_from(self.model_type)?)
        .with_latex(self.latex_pre.clone(), self.latex_post.clone())
        .with_sort_field_index(self.sort_field_index))
    }
}

/// How a note names its model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRef {
    Id(ModelId),
    Builtin(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSpec {
    pub model: ModelRef,
    pub fields: Vec<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub guid_method: GuidMethod,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub due: i64,
    /// Card ordinals to write as suspended.
    #[serde(default)]
    pub suspend: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSpec {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conf: Option<DeckConf>,
    #[serde(default)]
    pub notes: Vec<NoteSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub decks: Vec<DeckSpec>,
    #[serde(default)]
    pub media: Vec<PathBuf>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a manifest file; its directory becomes the media base.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(DeckError::Io)?;
        let mut manifest = Self::parse(&content)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        Ok(manifest)
    }

    fn resolve_media(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Builds the models, decks and notes the manifest describes.
    pub fn into_package(self) -> Result<Package> {
        let mut models: HashMap<ModelId, Arc<Model>> = HashMap::new();
        for spec in &self.models {
            models.insert(spec.id, spec.build()?.shared());
        }

        let resolve = |model: &ModelRef| -> Result<Arc<Model>> {
            match model {
                ModelRef::Id(id) => models
                    .get(id)
                    .cloned()
                    .ok_or(DeckError::UnknownModelRef(*id)),
                ModelRef::Builtin(name) => builtin_model(name),
            }
        };

        let mut decks = Vec::with_capacity(self.decks.len());
        for spec in &self.decks {
            let mut deck =
                Deck::new(spec.id, spec.name.clone()).with_description(spec.description.clone());
            if let Some(created_at) = spec.created_at {
                deck.created_at = created_at;
            }
            deck.conf = spec.conf.clone();

            for note_spec in &spec.notes {
                deck.add_note(build_note(resolve(&note_spec.model)?, note_spec)?);
            }
            decks.push(deck);
        }

        let media: Vec<PathBuf> = self.media.iter().map(|path| self.resolve_media(path)).collect();
        Ok(Package::new(decks).with_media_files(media))
    }
}

fn build_note(model: Arc<Model>, spec: &NoteSpec) -> Result<Note> {
    let mut note = Note::new(model, spec.fields.clone())
        .with_guid_method(spec.guid_method)
        .with_due(spec.due);
    *note.tags_mut() = spec.tags.clone();
    if let Some(guid) = &spec.guid {
        note = note.with_guid(guid.clone());
    }
    if let Some(sort_field) = &spec.sort_field {
        note = note.with_sort_field(sort_field.clone());
    }

    if !spec.suspend.is_empty() {
        for card in note.cards_mut()? {
            if spec.suspend.contains(&card.ord) {
                card.suspend = true;
            }
        }
    }
    Ok(note)
}
