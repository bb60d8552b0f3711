//! Deck options groups.
//!
//! Every deck points at an options group (`dconf` in the collection) holding
//! its scheduling settings. Group `1` is the host application's "Default"
//! group and is always present; decks that need different settings carry
//! their own [`DeckConf`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_DECK_CONF_ID: i64 = 1;

/// The host application's stock scheduling options.
pub fn default_options() -> Value {
    json!({
        "autoplay": true,
        "id": DEFAULT_DECK_CONF_ID,
        "lapse": {
            "delays": [10],
            "leechAction": 0,
            "leechFails": 8,
            "minInt": 1,
            "mult": 0
        },
        "maxTaken": 60,
        "mod": 0,
        "name": "Default",
        "new": {
            "bury": true,
            "delays": [1, 10],
            "initialFactor": 2500,
            "ints": [1, 4, 7],
            "order": 1,
            "perDay": 20,
            "separate": true
        },
        "replayq": true,
        "rev": {
            "bury": true,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "minSpace": 1,
            "perDay": 100
        },
        "timer": 0,
        "usn": 0
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConf {
    pub id: i64,
    pub name: String,
    /// Options document; `id` and `name` are overwritten on output.
    #[serde(default = "default_options")]
    pub options: Value,
}

impl DeckConf {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            options: default_options(),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// The document stored under this group's id in `dconf`.
    pub fn to_json(&self) -> Value {
        let mut options = self.options.clone();
        if let Value::Object(map) = &mut options {
            map.insert("id".to_string(), json!(self.id));
            map.insert("name".to_string(), json!(self.name));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_options() {
        let conf = DeckConf::new(1500, "Slow");
        let value = conf.to_json();
        assert_eq!(value["id"], 1500);
        assert_eq!(value["name"], "Slow");
        assert_eq!(value["new"]["perDay"], 20);
        assert_eq!(value["rev"]["maxIvl"], 36500);
    }

    #[test]
    fn test_custom_options_keep_identity() {
        let conf = DeckConf::new(7, "Cram").with_options(json!({"new": {"perDay": 999}, "id": 1}));
        let value = conf.to_json();
        assert_eq!(value["id"], 7);
        assert_eq!(value["name"], "Cram");
        assert_eq!(value["new"]["perDay"], 999);
    }

    #[test]
    fn test_deserialize_without_options() {
        let conf: DeckConf = serde_json::from_str(r#"{"id": 3, "name": "Three"}"#).unwrap();
        assert_eq!(conf.options, default_options());
    }
}
