// ── Schema tables ──
//
// Declarative field maps for the four record kinds. Each entry maps one
// source field of the API payload to one state under the record's node.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::store::ObjectMeta;

/// Declared value type of a state. Advisory: the normalizer never coerces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
}

/// Value written when the source field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Bool(bool),
    Number(i64),
    Text(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Number(n) => Value::from(n),
            Self::Text(s) => Value::from(s),
        }
    }
}

/// How one source field maps to one target state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemaEntry {
    pub source_field: &'static str,
    pub target_name: &'static str,
    pub value_type: ValueType,
    pub role: &'static str,
    pub default: Option<FieldDefault>,
    pub labels: Option<&'static [(i64, &'static str)]>,
}

impl SchemaEntry {
    const fn new(
        source_field: &'static str,
        target_name: &'static str,
        value_type: ValueType,
        role: &'static str,
    ) -> Self {
        Self {
            source_field,
            target_name,
            value_type,
            role,
            default: None,
            labels: None,
        }
    }

    const fn or(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    const fn labelled(mut self, labels: &'static [(i64, &'static str)]) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Creation metadata for the target state.
    pub fn meta(&self) -> ObjectMeta {
        let meta = ObjectMeta::state(self.target_name, self.value_type, self.role);
        match self.labels {
            Some(labels) => meta.with_states(labels),
            None => meta,
        }
    }
}

// ── Shorthands ───────────────────────────────────────────────────────

const fn text(field: &'static str) -> SchemaEntry {
    SchemaEntry::new(field, field, ValueType::String, "text")
}

const fn url(field: &'static str) -> SchemaEntry {
    SchemaEntry::new(field, field, ValueType::String, "url")
}

const fn date(field: &'static str) -> SchemaEntry {
    SchemaEntry::new(field, field, ValueType::String, "date")
}

const fn number(field: &'static str) -> SchemaEntry {
    SchemaEntry::new(field, field, ValueType::Number, "value")
}

const fn flag(field: &'static str) -> SchemaEntry {
    SchemaEntry::new(field, field, ValueType::Boolean, "indicator")
}

const fn id(value_type: ValueType) -> SchemaEntry {
    SchemaEntry::new("id", "ID", value_type, "value")
}

// ── Value labels ─────────────────────────────────────────────────────

/// Labels for the five per-measurement status fields.
pub const MEASUREMENT_STATUS: &[(i64, &str)] = &[
    (0, "No data"),
    (1, "Too low"),
    (2, "Low"),
    (3, "Perfect"),
    (4, "High"),
    (5, "Too high"),
];

/// Labels for the overall plant status.
pub const PLANT_STATUS: &[(i64, &str)] = &[
    (0, "Deleted"),
    (1, "Doing great"),
    (2, "Needs attention"),
    (3, "No sensor"),
];

/// Labels for sensor and hub connection status.
pub const DEVICE_STATUS: &[(i64, &str)] = &[(0, "None"), (1, "Correct"), (2, "Error")];

// ── Tables ───────────────────────────────────────────────────────────

pub static GARDEN: &[SchemaEntry] = &[
    id(ValueType::Number),
    text("garden_name"),
    url("origin_path"),
    url("thumb_path"),
    text("mac_address"),
    flag("is_shared").or(FieldDefault::Bool(false)),
];

pub static PLANT: &[SchemaEntry] = &[
    id(ValueType::Number),
    text("nickname"),
    text("scientific_name"),
    text("common_name"),
    number("status").labelled(PLANT_STATUS),
    number("wifi_status"),
    url("thumb_path"),
    url("origin_path"),
    url("plant_thumb_path"),
    url("plant_origin_path"),
    flag("is_shared").or(FieldDefault::Bool(false)),
    number("temperature_status").labelled(MEASUREMENT_STATUS),
    number("light_status").labelled(MEASUREMENT_STATUS),
    number("moisture_status").labelled(MEASUREMENT_STATUS),
    number("salinity_status").labelled(MEASUREMENT_STATUS),
    number("nutrients_status").labelled(MEASUREMENT_STATUS),
    flag("has_remote_hub").or(FieldDefault::Bool(false)),
    flag("has_remote_sensor").or(FieldDefault::Bool(false)),
    flag("isSilent"),
    flag("isDoingGreat"),
];

pub static SENSOR: &[SchemaEntry] = &[
    id(ValueType::String),
    number("status").labelled(DEVICE_STATUS),
    text("version"),
    flag("is_battery_low").or(FieldDefault::Bool(false)),
    date("received_data_at"),
];

pub static HUB: &[SchemaEntry] = &[
    id(ValueType::Number),
    text("hub_id"),
    text("hub_name"),
    text("version"),
    number("status").labelled(DEVICE_STATUS),
    date("received_data_at"),
    date("reached_hub_at"),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn target_names_are_unique_per_table() {
        for table in [GARDEN, PLANT, SENSOR, HUB] {
            let names: HashSet<_> = table.iter().map(|e| e.target_name).collect();
            assert_eq!(names.len(), table.len());
        }
    }

    #[test]
    fn target_names_are_valid_path_segments() {
        for table in [GARDEN, PLANT, SENSOR, HUB] {
            for entry in table {
                assert!(!entry.target_name.is_empty());
                assert!(!entry.target_name.contains('.'));
            }
        }
    }

    #[test]
    fn defaults_match_declared_types() {
        for table in [GARDEN, PLANT, SENSOR, HUB] {
            for entry in table {
                match entry.default {
                    Some(FieldDefault::Bool(_)) => assert_eq!(entry.value_type, ValueType::Boolean),
                    Some(FieldDefault::Number(_)) => assert_eq!(entry.value_type, ValueType::Number),
                    Some(FieldDefault::Text(_)) => assert_eq!(entry.value_type, ValueType::String),
                    None => {}
                }
            }
        }
    }

    #[test]
    fn plant_table_covers_all_status_fields() {
        let labelled: Vec<_> = PLANT
            .iter()
            .filter(|e| e.labels == Some(MEASUREMENT_STATUS))
            .map(|e| e.source_field)
            .collect();
        assert_eq!(
            labelled,
            [
                "temperature_status",
                "light_status",
                "moisture_status",
                "salinity_status",
                "nutrients_status"
            ]
        );
    }

    #[test]
    fn meta_carries_labels() {
        let entry = PLANT.iter().find(|e| e.source_field == "light_status");
        let meta = entry.map(SchemaEntry::meta);
        let states = meta.and_then(|m| m.states);
        assert_eq!(states.and_then(|s| s.get(&3).cloned()).as_deref(), Some("Perfect"));
    }

    #[test]
    fn value_type_round_trips_through_strum() {
        assert_eq!(ValueType::Boolean.to_string(), "boolean");
        assert_eq!("number".parse::<ValueType>().ok(), Some(ValueType::Number));
    }
}
