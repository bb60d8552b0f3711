//! # Note GUIDs
//!
//! The host application deduplicates imported notes by their GUID: a note
//! whose GUID already exists in the collection updates the existing note
//! instead of creating a new one. Deriving the GUID from the note's content
//! makes re-generating a deck idempotent.
//!
//! ## Format
//!
//! The values are joined with `__`, hashed with SHA-256, and the first eight
//! bytes of the digest (big endian) are written in base 91 using the host
//! application's symbol table, most significant digit first.
//!
//! ## Derivation Methods
//!
//! - [`GuidMethod::Current`] hashes the field values followed by the model id,
//!   so identical text in two different models yields two notes.
//! - [`GuidMethod::Legacy`] hashes the field values only. Decks published
//!   with it must keep using it, otherwise re-imports create duplicates.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DeckError, Result};
use crate::model::Model;

const BASE91_TABLE: &[u8; 91] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

const SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidMethod {
    /// Field values only.
    Legacy,
    /// Field values followed by the model id.
    #[default]
    Current,
}

/// Hashes the joined values into a base-91 identifier.
pub fn guid_for<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = values
        .into_iter()
        .map(|value| value.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    let digest = Sha256::digest(joined.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    base91(u64::from_be_bytes(prefix))
}

/// Base-91 digits of `value`, most significant first. Zero encodes as "".
fn base91(mut value: u64) -> String {
    let radix = BASE91_TABLE.len() as u64;
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE91_TABLE[(value % radix) as usize]);
        value /= radix;
    }
    digits.iter().rev().map(|&b| b as char).collect()
}

/// GUID of a note with these fields under the given derivation method.
pub fn derive_guid(fields: &[String], model_id: Option<i64>, method: GuidMethod) -> Result<String> {
    match method {
        GuidMethod::Legacy => Ok(guid_for(fields)),
        GuidMethod::Current => {
            let model_id = model_id.ok_or(DeckError::GuidWithoutModelId)?;
            let model_id = model_id.to_string();
            Ok(guid_for(
                fields.iter().map(String::as_str).chain([model_id.as_str()]),
            ))
        }
    }
}

/// Like [`derive_guid`], naming the model in the error when its id is unset.
pub fn derive_guid_for_model(
    fields: &[String],
    model: Option<&Model>,
    method: GuidMethod,
) -> Result<String> {
    match (method, model) {
        (GuidMethod::Legacy, _) => derive_guid(fields, None, method),
        (GuidMethod::Current, None) => Err(DeckError::NoModel),
        (GuidMethod::Current, Some(model)) => derive_guid(fields, Some(model.require_id()?), method),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::simple_model;
    use crate::model::{CardTemplate, Field};

    fn argentina() -> Vec<String> {
        vec!["Capital of Argentina".to_string(), "Buenos Aires".to_string()]
    }

    #[test]
    fn test_table_has_91_distinct_symbols() {
        let mut symbols = BASE91_TABLE.to_vec();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), 91);
        assert!(!symbols.contains(&b'"'));
        assert!(!symbols.contains(&b'\''));
        assert!(!symbols.contains(&b'\\'));
    }

    #[test]
    fn test_base91_digits() {
        assert_eq!(base91(0), "");
        assert_eq!(base91(1), "b");
        assert_eq!(base91(90), "~");
        assert_eq!(base91(91), "ba");
    }

    #[test]
    fn test_legacy_reference_value() {
        assert_eq!(guid_for(argentina()), "HSnG{z%dU<");
        assert_eq!(
            derive_guid(&argentina(), None, GuidMethod::Legacy).unwrap(),
            "HSnG{z%dU<"
        );
    }

    #[test]
    fn test_current_reference_value() {
        assert_eq!(
            derive_guid(&argentina(), Some(1376484377), GuidMethod::Current).unwrap(),
            "w%C983W&N)"
        );
        let model = simple_model();
        assert_eq!(
            derive_guid_for_model(&argentina(), Some(&*model), GuidMethod::Current).unwrap(),
            "w%C983W&N)"
        );
    }

    #[test]
    fn test_legacy_ignores_model_id() {
        assert_eq!(
            derive_guid(&argentina(), Some(42), GuidMethod::Legacy).unwrap(),
            derive_guid(&argentina(), None, GuidMethod::Legacy).unwrap()
        );
    }

    #[test]
    fn test_methods_differ() {
        assert_ne!(
            derive_guid(&argentina(), Some(1376484377), GuidMethod::Legacy).unwrap(),
            derive_guid(&argentina(), Some(1376484377), GuidMethod::Current).unwrap()
        );
    }

    #[test]
    fn test_deterministic_and_sensitive_to_each_field() {
        let base = derive_guid(&argentina(), Some(7), GuidMethod::Current).unwrap();
        assert_eq!(base, derive_guid(&argentina(), Some(7), GuidMethod::Current).unwrap());

        let mut changed = argentina();
        changed[1].push('!');
        assert_ne!(base, derive_guid(&changed, Some(7), GuidMethod::Current).unwrap());
        assert_ne!(base, derive_guid(&argentina(), Some(8), GuidMethod::Current).unwrap());
    }

    #[test]
    fn test_current_without_model_id_fails() {
        assert!(matches!(
            derive_guid(&argentina(), None, GuidMethod::Current),
            Err(DeckError::GuidWithoutModelId)
        ));

        let anonymous = Model::new(
            None,
            "anon",
            vec![Field::new("Q"), Field::new("A")],
            vec![CardTemplate::new("c", "{{Q}}", "{{A}}")],
        );
        assert!(matches!(
            derive_guid_for_model(&argentina(), Some(&anonymous), GuidMethod::Current),
            Err(DeckError::MissingModelId { .. })
        ));
        assert!(derive_guid_for_model(&argentina(), Some(&anonymous), GuidMethod::Legacy).is_ok());
        assert!(derive_guid_for_model(&argentina(), None, GuidMethod::Legacy).is_ok());
    }

    #[test]
    fn test_method_serde_names() {
        assert_eq!(serde_json::to_string(&GuidMethod::Legacy).unwrap(), "\"legacy\"");
        let parsed: GuidMethod = serde_json::from_str("\"current\"").unwrap();
        assert_eq!(parsed, GuidMethod::Current);
        assert_eq!(GuidMethod::default(), GuidMethod::Current);
    }
}
