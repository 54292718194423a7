//! `fyta-sync show`: print the persisted state tree.

use fyta_core::config::SNAPSHOT_FILE;
use fyta_core::store::is_under;
use fyta_core::{MemoryStore, ObjectKind, StoreObject};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::{GlobalOpts, ShowArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Entry {
    path: String,
    #[serde(flatten)]
    object: StoreObject,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn to_row(e: &Entry) -> EntryRow {
    EntryRow {
        path: e.path.clone(),
        kind: e.object.meta.kind.to_string(),
        value: display_value(e.object.value.as_ref()),
        updated: e
            .object
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
    }
}

fn plain_line(e: &Entry) -> String {
    if e.object.meta.kind == ObjectKind::State {
        format!("{} = {}", e.path, display_value(e.object.value.as_ref()))
    } else {
        e.path.clone()
    }
}

pub async fn handle(args: &ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let path = cfg.resolved_data_dir().join(SNAPSHOT_FILE);
    let store = MemoryStore::open(&path).await?;

    let prefix = args.prefix.as_deref().unwrap_or("");
    let entries: Vec<Entry> = store
        .entries()
        .into_iter()
        .filter(|(p, _)| is_under(p, prefix))
        .map(|(path, object)| Entry { path, object })
        .collect();
    tracing::debug!(snapshot = %path.display(), entries = entries.len(), "loaded state tree");

    let out = output::render_list(&global.output, &entries, to_row, plain_line)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
