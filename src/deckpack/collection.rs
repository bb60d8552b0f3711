//! Collection database layout.
//!
//! The package's `collection.anki2` is a schema-version-11 collection. The
//! `col` table holds a single row whose JSON columns carry the collection
//! configuration, the models, the decks and the deck options groups.

use std::collections::BTreeMap;

use rusqlite::{params, Connection};
use serde_json::{json, Value};

use crate::deck_conf::{default_options, DEFAULT_DECK_CONF_ID};
use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            integer not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    time            integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
";

pub const SCHEMA_VERSION: i64 = 11;

const CREATED: i64 = 1411124400;
const MODIFIED: i64 = 1425279151694;
const SCHEMA_MODIFIED: i64 = 1425279151690;

pub const DEFAULT_DECK_ID: i64 = 1;

/// Collection-wide settings stored in `col.conf`.
pub fn default_conf() -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": DEFAULT_DECK_ID,
        "curModel": "1425279151691",
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0,
    })
}

/// The "Default" deck every collection contains.
pub fn default_deck() -> Value {
    json!({
        "collapsed": false,
        "conf": DEFAULT_DECK_CONF_ID,
        "desc": "",
        "dyn": 0,
        "extendNew": 10,
        "extendRev": 50,
        "id": DEFAULT_DECK_ID,
        "lrnToday": [0, 0],
        "mod": 1425279151,
        "name": "Default",
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
        "usn": 0,
    })
}

/// JSON documents for the `col` row, keyed by id.
#[derive(Debug, Default)]
pub struct CollectionDocs {
    pub models: BTreeMap<String, Value>,
    pub decks: BTreeMap<String, Value>,
    pub deck_confs: BTreeMap<String, Value>,
}

impl CollectionDocs {
    /// Starts from the default deck and default options group.
    pub fn with_defaults() -> Self {
        let mut docs = Self::default();
        docs.decks.insert(DEFAULT_DECK_ID.to_string(), default_deck());
        docs.deck_confs
            .insert(DEFAULT_DECK_CONF_ID.to_string(), default_options());
        docs
    }
}

/// Creates the tables and writes the single `col` row.
pub fn init(conn: &Connection, docs: &CollectionDocs) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (NULL, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, ?9)",
        params![
            CREATED,
            MODIFIED,
            SCHEMA_MODIFIED,
            SCHEMA_VERSION,
            default_conf().to_string(),
            serde_json::to_string(&docs.models)?,
            serde_json::to_string(&docs.decks)?,
            serde_json::to_string(&docs.deck_confs)?,
            "{}",
        ],
    )?;
    Ok(())
}
