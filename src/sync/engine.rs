//! Reconciler: change logging, full-copy reconciliation and the polling loop.
//!
//! Between two reconciliations the trees are compared every tick and each
//! distinct change is logged once. Destination-only entries that were logged
//! are queued and removed by the next reconciliation, right after the full copy.

use colored::Colorize;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::fs::LocalFs;
use crate::sync::compare::{ChangeEvent, ChangeKind, TreeComparator};
use crate::sync::journal::SyncLog;

/// Per-cycle state, reset by every successful reconciliation.
#[derive(Debug, Default)]
pub struct CycleState {
    /// Rendered descriptions already logged this cycle.
    seen: HashSet<String>,
    /// Destination directories to remove, in detection order.
    dirs_to_delete: Vec<PathBuf>,
    /// Destination files to remove, in detection order.
    files_to_delete: Vec<PathBuf>,
}

impl CycleState {
    /// Log `event` unless its description was already logged this cycle.
    /// Deletions that get logged are queued.
    pub fn observe(&mut self, log: &mut SyncLog, event: &ChangeEvent) -> bool {
        let message = event.describe();
        if self.seen.contains(&message) {
            return false;
        }

        log.info(&message);
        self.seen.insert(message);

        match event.kind {
            ChangeKind::DirectoryDeleted => self.dirs_to_delete.push(event.destination.clone()),
            ChangeKind::FileDeleted => self.files_to_delete.push(event.destination.clone()),
            _ => {}
        }

        true
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn pending_dirs(&self) -> &[PathBuf] {
        &self.dirs_to_delete
    }

    pub fn pending_files(&self) -> &[PathBuf] {
        &self.files_to_delete
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty() && self.dirs_to_delete.is_empty() && self.files_to_delete.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.dirs_to_delete.clear();
        self.files_to_delete.clear();
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Success { files_copied: usize, removed: usize },
    /// The cycle was abandoned; queued deletions and logged messages are kept.
    PartialFailure { reason: String },
}

impl ReconcileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Owns the configuration, the log sink and the per-cycle state.
pub struct Reconciler {
    config: SyncConfig,
    comparator: TreeComparator,
    log: SyncLog,
    state: CycleState,
    last_compare_error: Option<String>,
}

impl Reconciler {
    pub fn new(config: SyncConfig, log: SyncLog) -> Self {
        let comparator = TreeComparator::new(config.source.clone(), config.destination.clone())
            .with_excludes(config.excludes.clone());

        Self {
            config,
            comparator,
            log,
            state: CycleState::default(),
            last_compare_error: None,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Log a change once per cycle. Returns `true` if it was newly logged.
    pub fn observe(&mut self, event: &ChangeEvent) -> bool {
        self.state.observe(&mut self.log, event)
    }

    /// One comparison pass, feeding every change to [`Reconciler::observe`].
    /// Returns how many changes were newly logged.
    pub fn compare_once(&mut self) -> Result<usize> {
        let Self { comparator, log, state, .. } = self;

        let mut logged = 0;
        for event in comparator.changes() {
            if state.observe(log, &event?) {
                logged += 1;
            }
        }
        Ok(logged)
    }

    /// Full copy of source over destination, then removal of queued entries.
    ///
    /// On failure the per-cycle state is kept for the next attempt.
    pub fn reconcile(&mut self) -> ReconcileOutcome {
        self.log.say("Making a full copy...");

        match self.apply() {
            Ok((files_copied, removed)) => {
                tracing::debug!(files_copied, removed, "reconciliation complete");
                self.log.say("Success! All folders are up to date.");
                self.log.say("Press Ctrl-C to stop the program");
                self.log.say(&format!("Listening to {}...", self.config.source));
                self.log.info("A full copy was made");
                self.state.clear();
                ReconcileOutcome::Success { files_copied, removed }
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(error = %reason, "reconciliation abandoned");
                self.log.error(&reason);
                ReconcileOutcome::PartialFailure { reason }
            }
        }
    }

    fn apply(&self) -> Result<(usize, usize)> {
        let files_copied = LocalFs::copy_tree(
            Path::new(&self.config.source),
            Path::new(&self.config.destination),
        )?;

        let mut removed = 0;
        for dir in &self.state.dirs_to_delete {
            removed += Self::remove_queued(LocalFs::remove_dir_all(dir))?;
        }
        for file in &self.state.files_to_delete {
            removed += Self::remove_queued(LocalFs::remove_file(file))?;
        }

        Ok((files_copied, removed))
    }

    // Already gone counts as done
    fn remove_queued(result: Result<()>) -> Result<usize> {
        match result {
            Ok(()) => Ok(1),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn tick(&mut self) {
        match self.compare_once() {
            Ok(logged) => {
                if logged > 0 {
                    tracing::debug!(logged, "new changes detected");
                }
                self.last_compare_error = None;
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(error = %reason, "comparison pass skipped");
                if self.last_compare_error.as_deref() != Some(reason.as_str()) {
                    self.log.say(&format!("Comparison failed: {}", reason));
                    self.last_compare_error = Some(reason);
                }
            }
        }
    }

    fn announce(&mut self) {
        let summary = startup_summary(&self.config);
        self.log.say(&summary);
    }

    /// Reconcile, then compare every tick and reconcile every interval
    /// until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.announce();
        self.reconcile();

        loop {
            let started = Instant::now();

            while started.elapsed() < self.config.interval {
                self.tick();

                tokio::select! {
                    _ = tokio::time::sleep(self.config.tick) => {}
                    _ = &mut shutdown => {
                        self.log.say("Program finished");
                        return;
                    }
                }
            }

            self.reconcile();
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

/// Console line printed once before the first reconciliation.
fn startup_summary(config: &SyncConfig) -> String {
    format!(
        "{} {} -> {} every {} (log: {})",
        "Mirroring".green().bold(),
        config.source.bold(),
        config.destination.bold(),
        format!("{:.1}s", config.interval.as_secs_f64()).cyan(),
        config.log_path.display().to_string().dimmed()
    )
}
