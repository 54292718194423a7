//! `fyta-sync run`: the polling daemon.

use std::sync::Arc;
use std::time::Duration;

use fyta_core::{CoreError, CycleOutcome, CycleRunner, FetchCycle, MemoryStore, PollingScheduler, StateStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{GlobalOpts, RunArgs};
use crate::config::{self, Overrides};
use crate::error::{CliError, exit_code};

/// Quiet period after a store change before the snapshot is rewritten.
const PERSIST_DEBOUNCE: Duration = Duration::from_secs(2);

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let overrides = Overrides {
        interval: args.interval,
        clear_on_startup: args.clear_on_startup,
    };
    let sync = config::sync_config(global, &overrides)?;

    let store = Arc::new(MemoryStore::open(sync.snapshot_path()).await?);
    let cycle = FetchCycle::from_config(&sync, Arc::clone(&store))?;
    let mut scheduler = PollingScheduler::new(sync.poll_interval, sync.failure_threshold);
    let cancel = scheduler.cancel_token();

    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
        }
    });
    let persist_stop = cancel.child_token();
    let daemon = Daemon {
        cycle,
        persist_stop: persist_stop.clone(),
        persister: Mutex::new(Some(tokio::spawn(persist_snapshots(
            Arc::clone(&store),
            persist_stop,
        )))),
    };

    info!(
        base_url = %sync.base_url,
        data_dir = %sync.data_dir.display(),
        interval_secs = sync.poll_interval.as_secs(),
        "starting sync daemon"
    );
    let reason = scheduler.run(&daemon).await;
    signal.abort();

    match reason.exit_code() {
        exit_code::SUCCESS => Ok(()),
        code => Err(CliError::Halted {
            reason: reason.to_string(),
            code,
        }),
    }
}

/// The fetch cycle plus the background snapshot writer, which is stopped
/// before the cycle's final flush.
struct Daemon {
    cycle: FetchCycle<MemoryStore>,
    persist_stop: CancellationToken,
    persister: Mutex<Option<JoinHandle<()>>>,
}

impl CycleRunner for Daemon {
    async fn initialize(&self) -> Result<(), CoreError> {
        self.cycle.initialize().await
    }

    async fn run_cycle(&self) -> CycleOutcome {
        self.cycle.run_cycle().await
    }

    fn in_flight(&self) -> usize {
        self.cycle.in_flight()
    }

    async fn shutdown(&self) {
        self.persist_stop.cancel();
        let handle = self.persister.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "snapshot writer ended abnormally");
            }
        }
        self.cycle.shutdown().await;
    }
}

/// Rewrite the snapshot whenever the store settles after a burst of writes.
async fn persist_snapshots(store: Arc<MemoryStore>, cancel: CancellationToken) {
    let mut changes = store.subscribe();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            changed = changes.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(PERSIST_DEBOUNCE) => {}
        }

        let version = *changes.borrow_and_update();
        match store.flush().await {
            Ok(()) => debug!(version, "snapshot written"),
            Err(e) => warn!(error = %e, "writing snapshot failed"),
        }
    }
}
