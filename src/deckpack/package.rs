//! # Package Writer
//!
//! Turns decks and media files into an importable `.apkg` archive.
//!
//! ## Phases
//!
//! 1. **Prepare**: every deck, note, model and media file is checked and
//!    rendered into plain rows. All fatal errors surface here, before the
//!    temporary database or the output file exist.
//! 2. **Collection**: a scratch SQLite database receives the schema, the `col`
//!    row and the note and card rows inside one transaction.
//! 3. **Archive**: the database, the `media` index and each media file (named
//!    by its position in the index) are zipped into the output path.
//!
//! ## Identifiers
//!
//! Note and card ids are drawn from one counter seeded with the build
//! timestamp in milliseconds, so a fixed timestamp gives a byte-for-byte
//! reproducible collection.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::card::Card;
use crate::collection::{self, CollectionDocs};
use crate::config::PackConfig;
use crate::deck::Deck;
use crate::error::{DeckError, Result};
use crate::html::FieldWarning;
use crate::model::ModelId;

const COLLECTION_ENTRY: &str = "collection.anki2";
const MEDIA_ENTRY: &str = "media";

/// Latest build timestamp, in seconds, whose millisecond value still fits
/// exactly in an `f64` and leaves the id counter room to grow.
const MAX_TIMESTAMP: f64 = 9_007_199_254_740.0;

/// Malformed markup found in one note, located by deck and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteWarning {
    pub deck_id: i64,
    pub note_index: usize,
    pub warning: FieldWarning,
}

impl fmt::Display for NoteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deck {} note {}: {}", self.deck_id, self.note_index, self.warning)
    }
}

/// Summary of a written package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub decks: usize,
    pub models: usize,
    pub notes: usize,
    pub cards: usize,
    pub media: usize,
    pub warnings: Vec<NoteWarning>,
}

/// Monotonic row-id source shared by notes and cards.
struct IdGen(i64);

impl IdGen {
    fn next(&mut self) -> i64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

struct NoteRow {
    deck_id: i64,
    model_id: ModelId,
    guid: String,
    tags: String,
    fields: String,
    sort_field: String,
    due: i64,
    cards: Vec<Card>,
}

struct MediaEntry {
    path: PathBuf,
    name: String,
}

/// Everything the writer needs, validated.
struct Prepared {
    docs: CollectionDocs,
    notes: Vec<NoteRow>,
    media: Vec<MediaEntry>,
    report: BuildReport,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    decks: Vec<Deck>,
    media_files: Vec<PathBuf>,
}

impl Package {
    pub fn new(decks: Vec<Deck>) -> Self {
        Self {
            decks,
            media_files: Vec::new(),
        }
    }

    pub fn with_media_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.media_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn media_files(&self) -> &[PathBuf] {
        &self.media_files
    }

    /// Writes the package to `path`.
    ///
    /// `timestamp` is in seconds since the epoch and defaults to now; passing
    /// a fixed value makes the output reproducible.
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        config: &PackConfig,
        timestamp: Option<f64>,
    ) -> Result<BuildReport> {
        let path = path.as_ref();
        let timestamp = checked_timestamp(timestamp)?;

        let prepared = self.prepare(config, timestamp as i64)?;

        let scratch = tempfile::tempdir().map_err(DeckError::Io)?;
        let db_path = scratch.path().join(COLLECTION_ENTRY);
        write_collection(&db_path, &prepared, timestamp)?;

        if let Err(e) = write_archive(path, &db_path, &prepared.media, config) {
            let _ = fs::remove_file(path);
            return Err(e);
        }

        info!(
            "Wrote {} ({} notes, {} cards, {} media files)",
            path.display(),
            prepared.report.notes,
            prepared.report.cards,
            prepared.report.media
        );
        Ok(prepared.report)
    }

    fn prepare(&self, config: &PackConfig, mod_time: i64) -> Result<Prepared> {
        let mut docs = CollectionDocs::with_defaults();
        let mut notes = Vec::new();
        let mut report = BuildReport {
            decks: self.decks.len(),
            ..BuildReport::default()
        };

        for deck in &self.decks {
            deck.require_id()?;
            deck.require_name()?;
        }

        let mut models = BTreeMap::new();
        for deck in &self.decks {
            let deck_id = deck.require_id()?;
            docs.decks.insert(deck_id.to_string(), deck.to_json()?);
            if let Some(conf) = &deck.conf {
                docs.deck_confs.insert(conf.id.to_string(), conf.to_json());
            }

            for (model_id, model) in deck.collect_models()? {
                // A model shared by several decks is recorded under the first.
                models.entry(model_id).or_insert((model, deck_id));
            }

            for (note_index, note) in deck.notes().iter().enumerate() {
                note.validate()?;
                let model_id = note
                    .model()
                    .ok_or(DeckError::NoModel)?
                    .require_id()?;

                if config.check_html {
                    for warning in note.html_warnings() {
                        let warning = NoteWarning {
                            deck_id,
                            note_index,
                            warning,
                        };
                        warn!(target: "deckpack::html", "{}", warning);
                        report.warnings.push(warning);
                    }
                }

                let cards = note.cards()?.to_vec();
                if cards.is_empty() {
                    debug!("Note {} in deck {} produces no cards", note_index, deck_id);
                }
                report.cards += cards.len();

                notes.push(NoteRow {
                    deck_id,
                    model_id,
                    guid: note.guid()?.to_string(),
                    tags: note.format_tags(),
                    fields: note.format_fields(),
                    sort_field: note.sort_field().to_string(),
                    due: note.due(),
                    cards,
                });
            }
        }

        for (model_id, (model, deck_id)) in &models {
            docs.models
                .insert(model_id.to_string(), model.to_json(mod_time, *deck_id)?);
        }

        let media = self
            .media_files
            .iter()
            .map(|path| {
                if !path.is_file() {
                    return Err(DeckError::MediaNotFound(path.clone()));
                }
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| DeckError::MediaNotFound(path.clone()))?;
                Ok(MediaEntry {
                    path: path.clone(),
                    name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        report.models = models.len();
        report.notes = notes.len();
        report.media = media.len();

        Ok(Prepared {
            docs,
            notes,
            media,
            report,
        })
    }
}

/// The given build timestamp, or now, rejected when ids cannot be derived
/// from it.
fn checked_timestamp(timestamp: Option<f64>) -> Result<f64> {
    let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis() as f64 / 1000.0);
    if timestamp.is_finite() && (0.0..=MAX_TIMESTAMP).contains(&timestamp) {
        Ok(timestamp)
    } else {
        Err(DeckError::InvalidTimestamp {
            value: timestamp,
            max: MAX_TIMESTAMP,
        })
    }
}

fn write_collection(db_path: &Path, prepared: &Prepared, timestamp: f64) -> Result<()> {
    let mod_time = timestamp as i64;
    let mut ids = IdGen((timestamp * 1000.0) as i64);

    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;
    collection::init(&tx, &prepared.docs)?;

    {
        let mut insert_note = tx.prepare(
            "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
             VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, 0, 0, '')",
        )?;
        let mut insert_card = tx.prepare(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due,
                                ivl, factor, reps, lapses, left, odue, odid, flags, data)
             VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, ?6, ?7, 0, 0, 0, 0, 0, 0, 0, 0, '')",
        )?;

        for note in &prepared.notes {
            let note_id = ids.next();
            insert_note.execute(params![
                note_id,
                note.guid,
                note.model_id,
                mod_time,
                note.tags,
                note.fields,
                note.sort_field,
            ])?;

            for card in &note.cards {
                insert_card.execute(params![
                    ids.next(),
                    note_id,
                    note.deck_id,
                    card.ord as i64,
                    mod_time,
                    card.queue(),
                    note.due,
                ])?;
            }
        }
    }

    tx.commit()?;
    conn.close().map_err(|(_, e)| DeckError::Sqlite(e))?;
    debug!("Collection written to {}", db_path.display());
    Ok(())
}

fn media_index(media: &[MediaEntry]) -> Value {
    Value::Object(
        media
            .iter()
            .enumerate()
            .map(|(index, entry)| (index.to_string(), Value::String(entry.name.clone())))
            .collect(),
    )
}

fn write_archive(
    path: &Path,
    db_path: &Path,
    media: &[MediaEntry],
    config: &PackConfig,
) -> Result<()> {
    let file = File::create(path).map_err(DeckError::Io)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(config.compression.zip_method());

    zip.start_file(COLLECTION_ENTRY, options)?;
    io::copy(&mut File::open(db_path)?, &mut zip)?;

    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(media_index(media).to_string().as_bytes())?;

    for (index, entry) in media.iter().enumerate() {
        zip.start_file(index.to_string(), options)?;
        io::copy(&mut File::open(&entry.path)?, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use crate::note::Note;

    fn note(fields: &[&str]) -> Note {
        Note::new(simple_model(), fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_id_gen_is_monotonic() {
        let mut ids = IdGen(1_000);
        assert_eq!(ids.next(), 1_000);
        assert_eq!(ids.next(), 1_001);
    }

    #[test]
    fn test_checked_timestamp() {
        assert_eq!(checked_timestamp(Some(1_600_000_000.25)).unwrap(), 1_600_000_000.25);
        assert_eq!(checked_timestamp(Some(MAX_TIMESTAMP)).unwrap(), MAX_TIMESTAMP);
        assert!(checked_timestamp(None).unwrap() > 1_600_000_000.0);

        for bad in [1e17, f64::NAN, f64::INFINITY, -1.0] {
            assert!(
                matches!(checked_timestamp(Some(bad)), Err(DeckError::InvalidTimestamp { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_out_of_range_timestamp_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("late.apkg");
        let mut deck = Deck::new(1, "d");
        deck.add_note(note(&["Capital of Argentina", "Buenos Aires"]));

        let err = Package::new(vec![deck])
            .write_to_file(&out, &PackConfig::default(), Some(1e17))
            .unwrap_err();
        assert!(matches!(err, DeckError::InvalidTimestamp { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_prepare_counts() {
        let mut deck = Deck::new(1, "d");
        deck.add_note(note(&["Capital of Argentina", "Buenos Aires"]));
        deck.add_note(note(&["", "no question"]));

        let prepared = Package::new(vec![deck])
            .prepare(&PackConfig::default(), 0)
            .unwrap();
        assert_eq!(prepared.report.notes, 2);
        assert_eq!(prepared.report.cards, 1);
        assert_eq!(prepared.report.models, 1);
        assert!(prepared.docs.models.contains_key("1376484377"));
        assert!(prepared.docs.decks.contains_key("1"));
    }

    #[test]
    fn test_prepare_collects_html_warnings() {
        let mut deck = Deck::new(7, "d");
        deck.add_note(note(&["Capital of <$> Argentina", "Buenos Aires"]));

        let package = Package::new(vec![deck]);
        let warned = package.prepare(&PackConfig::default(), 0).unwrap();
        assert_eq!(warned.report.warnings.len(), 1);
        assert_eq!(warned.report.warnings[0].deck_id, 7);
        assert_eq!(warned.report.warnings[0].warning.field, 0);

        let quiet = PackConfig {
            check_html: false,
            ..PackConfig::default()
        };
        assert!(package.prepare(&quiet, 0).unwrap().report.warnings.is_empty());
    }

    #[test]
    fn test_prepare_rejects_bad_note() {
        let mut deck = Deck::new(1, "d");
        deck.add_note(note(&["only one field"]));
        let err = Package::new(vec![deck])
            .prepare(&PackConfig::default(), 0)
            .err()
            .unwrap();
        assert!(matches!(err, DeckError::FieldCountMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_prepare_rejects_missing_media() {
        let package = Package::new(vec![Deck::new(1, "d")])
            .with_media_files(["/definitely/not/here.mp3"]);
        assert!(matches!(
            package.prepare(&PackConfig::default(), 0),
            Err(DeckError::MediaNotFound(_))
        ));
    }

    #[test]
    fn test_media_index() {
        let media = vec![
            MediaEntry {
                path: PathBuf::from("/a/sound.mp3"),
                name: "sound.mp3".to_string(),
            },
            MediaEntry {
                path: PathBuf::from("/b/image.png"),
                name: "image.png".to_string(),
            },
        ];
        assert_eq!(
            media_index(&media),
            serde_json::json!({"0": "sound.mp3", "1": "image.png"})
        );
    }
}
