// ── Store object types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use crate::schema::ValueType;

/// Node kind in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ObjectKind {
    /// Container: garden, virtual garden, sensor, hub, info channel.
    Folder,
    /// A plant.
    Device,
    /// Leaf entry carrying a value.
    State,
}

/// Creation-time metadata. Fixed once the object exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub kind: ObjectKind,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Value labels for enum-like numeric states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<BTreeMap<i64, String>>,
    pub read_only: bool,
}

impl ObjectMeta {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Folder,
            name: name.into(),
            value_type: None,
            role: None,
            states: None,
            read_only: true,
        }
    }

    pub fn device(name: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Device,
            ..Self::folder(name)
        }
    }

    pub fn state(name: impl Into<String>, value_type: ValueType, role: &str) -> Self {
        Self {
            kind: ObjectKind::State,
            name: name.into(),
            value_type: Some(value_type),
            role: Some(role.to_owned()),
            states: None,
            read_only: true,
        }
    }

    pub fn with_states(mut self, labels: &[(i64, &str)]) -> Self {
        self.states = Some(
            labels
                .iter()
                .map(|(k, v)| (*k, (*v).to_owned()))
                .collect(),
        );
        self
    }
}

/// A persisted node: metadata plus the last written value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreObject {
    pub meta: ObjectMeta,
    #[serde(default)]
    pub value: Option<Value>,
    /// The value was written by the sync itself (authoritative).
    #[serde(default)]
    pub ack: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreObject {
    pub fn new(meta: ObjectMeta) -> Self {
        Self {
            meta,
            value: None,
            ack: false,
            updated_at: None,
        }
    }
}
