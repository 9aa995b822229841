//! Response shapes shared by the record endpoints
//!
//! List endpoints answer either with a bare array or with a paginated object carrying
//! `results`. Create and update answer either with the record itself or with an envelope
//! `{ "message": ..., "<kind>": record }`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Paginated { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> ListBody<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Paginated { results } => results,
            ListBody::Plain(records) => records,
        }
    }
}

/// A created or updated record, with the server's confirmation message if it sent one.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub record: T,
    pub message: Option<String>,
}

pub(crate) fn unwrap_saved<T: DeserializeOwned>(
    mut body: Value,
    kind: &str,
    path: &str,
) -> Result<Saved<T>> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    let record = if body.get(kind).is_some_and(Value::is_object) {
        body[kind].take()
    } else {
        body
    };

    let record = serde_json::from_value(record).map_err(|source| ClientError::Decode {
        url: path.to_string(),
        source,
    })?;

    Ok(Saved { record, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn list_accepts_paginated_and_plain_bodies() {
        let paginated: ListBody<Item> =
            serde_json::from_value(json!({ "count": 1, "results": [{ "id": 1 }] })).unwrap();
        let plain: ListBody<Item> = serde_json::from_value(json!([{ "id": 2 }])).unwrap();

        assert_eq!(paginated.into_vec(), vec![Item { id: 1 }]);
        assert_eq!(plain.into_vec(), vec![Item { id: 2 }]);
    }

    #[test]
    fn saved_unwraps_envelope() {
        let body = json!({ "message": "Patient created", "patient": { "id": 9 } });

        let saved: Saved<Item> = unwrap_saved(body, "patient", "/api/patients/").unwrap();

        assert_eq!(saved.record, Item { id: 9 });
        assert_eq!(saved.message.as_deref(), Some("Patient created"));
    }

    #[test]
    fn saved_accepts_bare_record() {
        let saved: Saved<Item> = unwrap_saved(json!({ "id": 4 }), "doctor", "/x").unwrap();

        assert_eq!(saved.record, Item { id: 4 });
        assert_eq!(saved.message, None);
    }
}
