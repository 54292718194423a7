// ── State sync ──
//
// Walks the fetched inventory alongside the schema tables and mirrors it
// into the target store. Every state goes through the same two awaited
// calls: `ensure_object` (create once, never touch metadata again) and
// `write_value` (always refresh the value).

use std::collections::HashMap;
use std::sync::Arc;

use fyta_api::{Fields, Garden, Plant, RecordId};
use tracing::{debug, error, info, warn};

use crate::sanitize::sanitize;
use crate::schema::{self, SchemaEntry};
use crate::store::{ObjectMeta, StateStore, StoreError, join_path};

/// Store key of a plant's sensor folder.
pub const SENSOR_FOLDER: &str = "sensor";
/// Store key of a plant's hub folder.
pub const HUB_FOLDER: &str = "hub";

/// Per-record write tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// States written this pass.
    pub written: usize,
    /// Schema entries skipped because the source field was missing.
    pub skipped: usize,
}

impl SyncReport {
    fn merge(&mut self, other: SyncReport) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// Sync one source object against one schema table under `parent`.
///
/// A field that is absent and has no default is skipped with a warning.
/// An explicit JSON `null` counts as present and is written as-is.
pub async fn sync_fields<S: StateStore>(
    store: &S,
    parent: &str,
    source: &Fields,
    table: &[SchemaEntry],
) -> Result<SyncReport, StoreError> {
    let mut report = SyncReport::default();

    for entry in table {
        let value = match (source.get(entry.source_field), entry.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.to_value(),
            (None, None) => {
                warn!(
                    parent,
                    field = entry.source_field,
                    "field missing from API payload, state not written"
                );
                report.skipped += 1;
                continue;
            }
        };

        let path = join_path(parent, entry.target_name);
        store.ensure_object(&path, entry.meta()).await?;
        store.write_value(&path, value, true).await?;
        report.written += 1;
    }

    Ok(report)
}

// ── Garden resolution ────────────────────────────────────────────────

/// Where a plant goes in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Under a fetched garden.
    Garden { key: String, name: String },
    /// No garden association: under the virtual garden.
    Virtual,
    /// The declared garden id is not among the fetched gardens.
    UnknownGarden(RecordId),
    /// The garden exists but its name sanitizes to an empty key.
    UnkeyedGarden(RecordId),
}

/// Lookup from garden id to store key, built once per cycle.
#[derive(Debug, Clone, Default)]
pub struct GardenIndex {
    /// `None` for gardens whose name yields no usable key.
    by_id: HashMap<RecordId, Option<(String, String)>>,
}

impl GardenIndex {
    pub fn new(gardens: &[Garden]) -> Self {
        let by_id = gardens
            .iter()
            .filter_map(|g| {
                let id = g.id.clone()?;
                let key = sanitize(&g.name);
                Some((id, (!key.is_empty()).then(|| (key, g.name.clone()))))
            })
            .collect();
        Self { by_id }
    }

    pub fn resolve(&self, plant: &Plant) -> Placement {
        match &plant.garden_id {
            None => Placement::Virtual,
            Some(id) => match self.by_id.get(id) {
                Some(Some((key, name))) => Placement::Garden {
                    key: key.clone(),
                    name: name.clone(),
                },
                Some(None) => Placement::UnkeyedGarden(id.clone()),
                None => Placement::UnknownGarden(id.clone()),
            },
        }
    }
}

// ── StateSync ────────────────────────────────────────────────────────

/// A record that made it into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedNode {
    pub path: String,
    pub report: SyncReport,
}

/// Entity-level sync operations. Cheap to clone; one clone per spawned task.
pub struct StateSync<S> {
    store: Arc<S>,
    virtual_garden_name: Arc<str>,
    virtual_garden_key: Arc<str>,
}

impl<S> Clone for StateSync<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            virtual_garden_name: Arc::clone(&self.virtual_garden_name),
            virtual_garden_key: Arc::clone(&self.virtual_garden_key),
        }
    }
}

impl<S: StateStore> StateSync<S> {
    pub fn new(store: Arc<S>, virtual_garden_name: &str) -> Self {
        Self {
            store,
            virtual_garden_key: sanitize(virtual_garden_name).into(),
            virtual_garden_name: virtual_garden_name.into(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store key of the virtual garden folder.
    pub fn virtual_garden_key(&self) -> &str {
        &self.virtual_garden_key
    }

    /// Create or refresh a garden folder and its states.
    pub async fn sync_garden(&self, garden: &Garden) -> Result<Option<SyncedNode>, StoreError> {
        let key = sanitize(&garden.name);
        if key.is_empty() {
            error!(
                garden_id = ?garden.id,
                name = %garden.name,
                "garden name is empty after sanitizing, skipping garden"
            );
            return Ok(None);
        }

        self.store
            .ensure_object(&key, ObjectMeta::folder(garden.name.as_str()))
            .await?;
        let report = sync_fields(self.store.as_ref(), &key, &garden.fields, schema::GARDEN).await?;
        debug!(garden = %key, written = report.written, skipped = report.skipped, "garden synced");

        Ok(Some(SyncedNode { path: key, report }))
    }

    /// Create or refresh a plant device plus its sensor and hub folders.
    pub async fn sync_plant(
        &self,
        plant: &Plant,
        placement: Placement,
    ) -> Result<Option<SyncedNode>, StoreError> {
        let container = match placement {
            Placement::Garden { key, name } => {
                self.store.ensure_object(&key, ObjectMeta::folder(name)).await?;
                key
            }
            Placement::Virtual => self.ensure_virtual_garden().await?,
            Placement::UnknownGarden(garden_id) => {
                error!(
                    plant_id = ?plant.id,
                    nickname = %plant.nickname,
                    %garden_id,
                    "plant references an unknown garden, skipping plant"
                );
                return Ok(None);
            }
            Placement::UnkeyedGarden(garden_id) => {
                error!(
                    plant_id = ?plant.id,
                    nickname = %plant.nickname,
                    %garden_id,
                    "garden name is empty after sanitizing, skipping plant"
                );
                return Ok(None);
            }
        };

        let key = sanitize(&plant.nickname);
        if key.is_empty() {
            error!(
                plant_id = ?plant.id,
                nickname = %plant.nickname,
                "plant nickname is empty after sanitizing, skipping plant"
            );
            return Ok(None);
        }

        let path = join_path(&container, &key);
        self.store
            .ensure_object(&path, ObjectMeta::device(plant.nickname.as_str()))
            .await?;
        let mut report = sync_fields(self.store.as_ref(), &path, &plant.fields, schema::PLANT).await?;

        if let Some(sensor) = &plant.sensor {
            let sensor_path = join_path(&path, SENSOR_FOLDER);
            self.store
                .ensure_object(&sensor_path, ObjectMeta::folder("Sensor"))
                .await?;
            report.merge(
                sync_fields(self.store.as_ref(), &sensor_path, &sensor.fields, schema::SENSOR).await?,
            );
        }

        if let Some(hub) = &plant.hub {
            let hub_path = join_path(&path, HUB_FOLDER);
            self.store
                .ensure_object(&hub_path, ObjectMeta::folder("Hub"))
                .await?;
            report.merge(sync_fields(self.store.as_ref(), &hub_path, &hub.fields, schema::HUB).await?);
        }

        debug!(plant = %path, written = report.written, skipped = report.skipped, "plant synced");
        Ok(Some(SyncedNode { path, report }))
    }

    /// Create the virtual garden folder if no task has yet.
    async fn ensure_virtual_garden(&self) -> Result<String, StoreError> {
        let key = self.virtual_garden_key.to_string();
        let created = self
            .store
            .ensure_object(&key, ObjectMeta::folder(&*self.virtual_garden_name))
            .await?;
        if created {
            info!(path = %key, "virtual garden created");
        }
        Ok(key)
    }
}
