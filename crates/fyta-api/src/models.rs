// ── Wire models ──
//
// The user-plant payload is loosely typed: most fields are optional and
// their shape drifts between app releases. Each record keeps its raw JSON
// object so the schema-driven normalizer can look fields up by name, and
// exposes typed accessors only for the handful of fields the sync logic
// branches on (ids, names, garden reference, nested sensor/hub).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw JSON object of a record.
pub type Fields = Map<String, Value>;

// ── RecordId ────────────────────────────────────────────────────────

/// Identifier of a garden, plant, sensor or hub.
///
/// The API emits numeric ids for gardens and plants and string ids for
/// some hardware; both compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Extract an id from a JSON value. Nulls, floats and containers yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

fn id_field(fields: &Fields, key: &str) -> Option<RecordId> {
    fields.get(key).and_then(RecordId::from_value)
}

fn string_field(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

// ── Garden ──────────────────────────────────────────────────────────

/// A garden: the root container plants are filed under.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Fields")]
pub struct Garden {
    pub id: Option<RecordId>,
    /// Display name (`garden_name`); empty when absent.
    pub name: String,
    pub fields: Fields,
}

impl From<Fields> for Garden {
    fn from(fields: Fields) -> Self {
        Self {
            id: id_field(&fields, "id"),
            name: string_field(&fields, "garden_name"),
            fields,
        }
    }
}

// ── Sensor / Hub ────────────────────────────────────────────────────

/// The soil sensor attached to a plant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub id: Option<RecordId>,
    pub fields: Fields,
}

/// The WiFi hub relaying a plant's sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub id: Option<RecordId>,
    pub fields: Fields,
}

fn nested_object(fields: &Fields, key: &str) -> Option<Fields> {
    match fields.get(key) {
        Some(Value::Object(obj)) => Some(obj.clone()),
        _ => None,
    }
}

// ── Plant ───────────────────────────────────────────────────────────

/// A plant together with its optional sensor and hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Fields")]
pub struct Plant {
    pub id: Option<RecordId>,
    pub nickname: String,
    /// `garden.id`, when the plant declares a garden association.
    pub garden_id: Option<RecordId>,
    pub sensor: Option<Sensor>,
    pub hub: Option<Hub>,
    pub fields: Fields,
}

impl From<Fields> for Plant {
    fn from(fields: Fields) -> Self {
        let garden_id = nested_object(&fields, "garden").and_then(|g| id_field(&g, "id"));
        let sensor = nested_object(&fields, "sensor").map(|obj| Sensor {
            id: id_field(&obj, "id"),
            fields: obj,
        });
        let hub = nested_object(&fields, "hub").map(|obj| Hub {
            id: id_field(&obj, "id"),
            fields: obj,
        });

        Self {
            id: id_field(&fields, "id"),
            nickname: string_field(&fields, "nickname"),
            garden_id,
            sensor,
            hub,
            fields,
        }
    }
}

// ── Inventory ───────────────────────────────────────────────────────

/// Response body of `GET /api/user-plant`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Inventory {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub gardens: Vec<Garden>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub plants: Vec<Plant>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
