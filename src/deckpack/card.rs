use serde::Serialize;

use crate::cloze::compute_cloze_ordinals;
use crate::error::Result;
use crate::model::{Model, ModelType};

/// One reviewable card of a note.
///
/// For standard models `ord` indexes the model's template list; for cloze
/// models it is the zero-based deletion group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    pub ord: usize,
    pub suspend: bool,
}

impl Card {
    pub fn new(ord: usize) -> Self {
        Self {
            ord,
            suspend: false,
        }
    }

    /// Scheduler queue written for a freshly imported card.
    pub fn queue(&self) -> i64 {
        if self.suspend {
            -1
        } else {
            0
        }
    }
}

/// The cards a note with these field values produces, in ordinal order.
pub fn resolve_cards(model: &Model, fields: &[String]) -> Result<Vec<Card>> {
    match model.model_type() {
        ModelType::Standard => Ok(model
            .requirements()?
            .iter()
            .filter(|req| req.is_satisfied_by(fields))
            .map(|req| Card::new(req.template_ord))
            .collect()),
        ModelType::Cloze => Ok(compute_cloze_ordinals(model, fields)
            .into_iter()
            .map(Card::new)
            .collect()),
    }
}
