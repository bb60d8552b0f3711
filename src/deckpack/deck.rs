use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::deck_conf::{DeckConf, DEFAULT_DECK_CONF_ID};
use crate::error::{DeckError, Result};
use crate::model::{Model, ModelId};
use crate::note::Note;

/// A named collection of notes.
///
/// Both the id and the name must be set before the deck can be written. The
/// id decides where re-imported notes land: a deck whose id and name match an
/// existing deck is merged into it.
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub conf: Option<DeckConf>,
    notes: Vec<Note>,
    models: BTreeMap<ModelId, Arc<Model>>,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            description: String::new(),
            created_at: Utc::now(),
            conf: None,
            notes: Vec::new(),
            models: BTreeMap::new(),
        }
    }
}

impl Deck {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_conf(mut self, conf: DeckConf) -> Self {
        self.conf = Some(conf);
        self
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Registers a model even if no note uses it yet.
    pub fn add_model(&mut self, model: Arc<Model>) -> Result<()> {
        self.models.insert(model.require_id()?, model);
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn require_id(&self) -> Result<i64> {
        self.id.ok_or(DeckError::MissingDeckId)
    }

    pub fn require_name(&self) -> Result<&str> {
        self.name.as_deref().ok_or(DeckError::MissingDeckName)
    }

    /// Explicitly added models plus the model of every note, keyed by id.
    pub fn collect_models(&self) -> Result<BTreeMap<ModelId, Arc<Model>>> {
        let mut models = self.models.clone();
        for note in &self.notes {
            let model = note.model().ok_or(DeckError::NoModel)?;
            models.insert(model.require_id()?, Arc::clone(model));
        }
        Ok(models)
    }

    /// The document stored under this deck's id in the collection's `decks`.
    pub fn to_json(&self) -> Result<Value> {
        let id = self.require_id()?;
        let name = self.require_name()?;
        let conf_id = self
            .conf
            .as_ref()
            .map(|conf| conf.id)
            .unwrap_or(DEFAULT_DECK_CONF_ID);

        Ok(json!({
            "collapsed": false,
            "conf": conf_id,
            "desc": self.description,
            "dyn": 0,
            "extendNew": 0,
            "extendRev": 50,
            "id": id,
            "lrnToday": [0, 0],
            "mod": self.created_at.timestamp(),
            "name": name,
            "newToday": [0, 0],
            "revToday": [0, 0],
            "timeToday": [0, 0],
            "usn": -1,
        }))
    }
}
