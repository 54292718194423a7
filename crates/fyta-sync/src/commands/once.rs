//! `fyta-sync once`: a single cycle, then exit with a summary.

use std::sync::Arc;

use fyta_core::session::LAST_SYNC_STATE;
use fyta_core::{CycleOutcome, CycleRunner, FetchCycle, MemoryStore, ObjectKind};
use serde::Serialize;

use crate::cli::{GlobalOpts, OnceArgs};
use crate::config::{self, Overrides};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Summary {
    plants: usize,
    objects: usize,
    last_sync: Option<String>,
    snapshot: String,
}

pub async fn handle(args: &OnceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let overrides = Overrides {
        interval: None,
        clear_on_startup: args.clear_on_startup,
    };
    let sync = config::sync_config(global, &overrides)?;
    let snapshot = sync.snapshot_path();

    let store = Arc::new(MemoryStore::open(&snapshot).await?);
    let cycle = FetchCycle::from_config(&sync, Arc::clone(&store))?;

    cycle.initialize().await?;
    let outcome = cycle.load_data().await;
    cycle.shutdown().await;

    match outcome {
        CycleOutcome::Success => {}
        CycleOutcome::HardFailure => {
            return Err(CliError::AuthFailed {
                message: "email or password rejected".into(),
            });
        }
        CycleOutcome::SoftFailure => return Err(CliError::CycleFailed),
    }

    let entries = store.entries();
    let summary = Summary {
        plants: entries
            .values()
            .filter(|o| o.meta.kind == ObjectKind::Device)
            .count(),
        objects: entries.len(),
        last_sync: store
            .value(LAST_SYNC_STATE)
            .and_then(|v| v.as_str().map(str::to_owned)),
        snapshot: snapshot.display().to_string(),
    };

    let out = output::render_single(
        &global.output,
        &summary,
        |s| {
            output::detail_lines(&[
                ("Plants", s.plants.to_string()),
                ("Objects", s.objects.to_string()),
                ("Last sync", s.last_sync.clone().unwrap_or_else(|| "-".into())),
                ("Snapshot", s.snapshot.clone()),
            ])
        },
        |s| s.plants.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
