//! # Deckpack Architecture
//!
//! Deckpack generates flashcard packages (`.apkg`) that the spaced-repetition
//! host application imports as-is. It is a library first: the `deckpack`
//! binary is a thin manifest-driven client over the same types.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, loads manifests and config, prints     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Writer (package.rs, collection.rs)                         │
//! │  - Validates everything, then writes SQLite + zip           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Domain (model, note, deck, deck_conf, builtin)             │
//! │  - Plain Rust values, no I/O                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Rules (requirements, cloze, card, guid,                    │
//! │         tags, html)                                         │
//! │  - Pure functions deciding cards, identity and validity     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Match the Host Exactly
//!
//! Everything the host application recomputes on import (which cards a
//! note has, how notes are identified) is computed here the same way it
//! does. A divergence does not fail loudly: it shows up later as blank
//! cards or duplicated notes in the user's collection.
//!
//! ## Module Overview
//!
//! - [`model`]: Note models, fields and card templates
//! - [`requirements`]: Which fields a template needs to produce a card
//! - [`cloze`]: Deletion groups of cloze notes
//! - [`card`]: Card resolution
//! - [`guid`]: Content-derived note identity
//! - [`note`]: Notes and their cached cards and GUID
//! - [`tags`]: Validated tag lists
//! - [`html`]: Malformed markup warnings
//! - [`deck`], [`deck_conf`]: Decks and deck options groups
//! - [`collection`], [`package`]: The collection database and the archive
//! - [`builtin`]: Stock models
//! - [`manifest`]: JSON build descriptions used by the CLI
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod builtin;
pub mod card;
pub mod cloze;
pub mod collection;
pub mod config;
pub mod deck;
pub mod deck_conf;
pub mod error;
pub mod guid;
pub mod html;
pub mod manifest;
pub mod model;
pub mod note;
pub mod package;
pub mod requirements;
pub mod tags;

pub use card::Card;
pub use config::PackConfig;
pub use deck::Deck;
pub use deck_conf::DeckConf;
pub use error::{DeckError, Result};
pub use guid::GuidMethod;
pub use model::{CardTemplate, Field, Model, ModelType};
pub use note::Note;
pub use package::{BuildReport, Package};
