//! Stock models mirroring the host application's own note types.
//!
//! The host application does not give its built-in types stable ids, so
//! these carry fixed ids of their own and a "(deckpack)" suffix. Importing a
//! model named plain "Basic" with a foreign id would make the host rename it.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{DeckError, Result};
use crate::model::{CardTemplate, Field, Model, ModelType};

const CARD_CSS: &str = ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n";

const CLOZE_CSS: &str = ".cloze {\n font-weight: bold;\n color: blue;\n}\n.nightMode .cloze {\n color: lightblue;\n}";

const ANSWER_RULE: &str = "\n\n<hr id=answer>\n\n";

/// Names accepted by [`builtin_model`].
pub const BUILTIN_NAMES: [&str; 5] = [
    "basic",
    "basic-and-reversed",
    "basic-optional-reversed",
    "basic-type-in-the-answer",
    "cloze",
];

fn arial(name: &str) -> Field {
    Field::new(name).with_font("Arial")
}

fn answer_after(question: &str, answer: &str) -> String {
    format!("{{{{{}}}}}{}{{{{{}}}}}", question, ANSWER_RULE, answer)
}

pub static BASIC: Lazy<Arc<Model>> = Lazy::new(|| {
    Model::new(
        Some(1559383000),
        "Basic (deckpack)",
        vec![arial("Front"), arial("Back")],
        vec![CardTemplate::new(
            "Card 1",
            "{{Front}}",
            answer_after("FrontSide", "Back"),
        )],
    )
    .with_css(CARD_CSS)
    .shared()
});

pub static BASIC_AND_REVERSED: Lazy<Arc<Model>> = Lazy::new(|| {
    Model::new(
        Some(1485830179),
        "Basic (and reversed card) (deckpack)",
        vec![arial("Front"), arial("Back")],
        vec![
            CardTemplate::new("Card 1", "{{Front}}", answer_after("FrontSide", "Back")),
            CardTemplate::new("Card 2", "{{Back}}", answer_after("FrontSide", "Front")),
        ],
    )
    .with_css(CARD_CSS)
    .shared()
});

pub static BASIC_OPTIONAL_REVERSED: Lazy<Arc<Model>> = Lazy::new(|| {
    Model::new(
        Some(1382232460),
        "Basic (optional reversed card) (deckpack)",
        vec![arial("Front"), arial("Back"), arial("Add Reverse")],
        vec![
            CardTemplate::new("Card 1", "{{Front}}", answer_after("FrontSide", "Back")),
            CardTemplate::new(
                "Card 2",
                "{{#Add Reverse}}{{Back}}{{/Add Reverse}}",
                answer_after("FrontSide", "Front"),
            ),
        ],
    )
    .with_css(CARD_CSS)
    .shared()
});

pub static BASIC_TYPE_IN_THE_ANSWER: Lazy<Arc<Model>> = Lazy::new(|| {
    Model::new(
        Some(1305534440),
        "Basic (type in the answer) (deckpack)",
        vec![arial("Front"), arial("Back")],
        vec![CardTemplate::new(
            "Card 1",
            "{{Front}}\n\n{{type:Back}}",
            answer_after("Front", "type:Back"),
        )],
    )
    .with_css(CARD_CSS)
    .shared()
});

pub static CLOZE: Lazy<Arc<Model>> = Lazy::new(|| {
    Model::new(
        Some(1550428389),
        "Cloze (deckpack)",
        vec![arial("Text"), arial("Back Extra")],
        vec![CardTemplate::new(
            "Cloze",
            "{{cloze:Text}}",
            "{{cloze:Text}}<br>\n{{Back Extra}}",
        )],
    )
    .with_model_type(ModelType::Cloze)
    .with_css(format!("{}\n{}", CARD_CSS, CLOZE_CSS))
    .shared()
});

/// Looks up a stock model by name. Case, underscores and spaces are ignored
/// in favour of the hyphenated form.
pub fn builtin_model(name: &str) -> Result<Arc<Model>> {
    let normalized = name.trim().to_lowercase().replace(['_', ' '], "-");
    let model: &Arc<Model> = match normalized.as_str() {
        "basic" => &*BASIC,
        "basic-and-reversed" => &*BASIC_AND_REVERSED,
        "basic-optional-reversed" => &*BASIC_OPTIONAL_REVERSED,
        "basic-type-in-the-answer" => &*BASIC_TYPE_IN_THE_ANSWER,
        "cloze" => &*CLOZE,
        _ => return Err(DeckError::UnknownBuiltinModel(name.to_string())),
    };
    Ok(Arc::clone(model))
}
