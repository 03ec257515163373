//! Bookmark facade
//!
//! `Bookmarks` is the public entry point. It owns the in-memory bookmark set
//! and the pending-operation log, persists both through the [`LocalStore`],
//! and hands remote work to a background worker.
//!
//! Mutations are two-phase:
//! 1. Synchronous: quota check, in-memory update, pending operation recorded,
//!    local persistence. The caller sees the change immediately.
//! 2. Asynchronous: a message to the worker, which runs a full reconciliation
//!    (fetch, merge, push) so the write never drops entries another device
//!    added. If that fails the operation stays queued. If a run is already in
//!    flight it picks the operation up in a follow-up run. The returned
//!    [`WriteHandle`] resolves once phase 2 settles.
//!
//! A visible toggle is never rolled back because of a network failure.
//!
//! ## Usage
//!
//! ```ignore
//! let bookmarks = Bookmarks::init(store, remote, tier, auth, options).await;
//!
//! bookmarks.add("venue77").await?;
//! assert!(bookmarks.is_bookmarked("venue77"));
//!
//! bookmarks.sync().await;
//! bookmarks.dispose().await;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::auth::AuthContext;
use crate::config::Config;
use crate::models::{BookmarkId, BookmarkSet, OperationKind, PendingOperation};
use crate::queue::OperationQueue;
use crate::remote::{RemoteBookmarkService, DEFAULT_TIMEOUT};
use crate::storage::{LocalStore, StorageError};
use crate::sync::{SyncEngine, SyncRun, SyncStatus, PUSH_FAILED};
use crate::tier::{self, TierGate};

/// Errors surfaced synchronously to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookmarkError {
    /// The user's tier does not allow another bookmark
    #[error("Bookmark limit of {limit} reached. Upgrade your plan to save more.")]
    QuotaExceeded { limit: i64 },
}

/// How phase 2 of a mutation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The remote holds the change
    Confirmed,
    /// The change is saved locally and waits for the next sync
    Queued,
    /// The call did not change anything
    Unchanged,
}

/// Completion handle for a mutation's remote phase
///
/// Dropping it is fine; the write proceeds regardless.
#[derive(Debug)]
pub struct WriteHandle {
    reply: Option<oneshot::Receiver<WriteOutcome>>,
    settled: WriteOutcome,
}

impl WriteHandle {
    fn settled(outcome: WriteOutcome) -> Self {
        Self {
            reply: None,
            settled: outcome,
        }
    }

    /// Wait for the remote phase to settle
    pub async fn outcome(self) -> WriteOutcome {
        match self.reply {
            // A worker that shut down mid-write left the operation queued
            Some(rx) => rx.await.unwrap_or(WriteOutcome::Queued),
            None => self.settled,
        }
    }
}

/// Runtime options for the facade
#[derive(Debug, Clone)]
pub struct BookmarksOptions {
    /// Timeout applied to every remote call
    pub remote_timeout: Duration,
    /// Run a sync on this interval; `None` disables periodic sync
    pub sync_interval: Option<Duration>,
    /// Run a sync as soon as the worker starts
    pub sync_on_start: bool,
}

impl Default for BookmarksOptions {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_TIMEOUT,
            sync_interval: None,
            sync_on_start: false,
        }
    }
}

impl BookmarksOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            remote_timeout: config.remote_timeout(),
            sync_interval: config.sync_interval(),
            sync_on_start: false,
        }
    }
}

/// Commands sent to the write worker
#[derive(Debug)]
enum WorkerCommand {
    /// Push a freshly recorded operation
    Write {
        op: PendingOperation,
        reply: oneshot::Sender<WriteOutcome>,
    },
    Shutdown,
}

struct State {
    set: BookmarkSet,
    queue: OperationQueue,
}

struct Inner {
    state: Mutex<State>,
    store: LocalStore,
    /// Serializes local writes so the newest snapshot always lands last
    persist_lock: tokio::sync::Mutex<()>,
    engine: SyncEngine,
    /// Set by writers turned away by a running reconciliation
    follow_up: AtomicBool,
    tier: Arc<dyn TierGate>,
    auth: Mutex<AuthContext>,
}

/// The bookmark service
pub struct Bookmarks {
    inner: Arc<Inner>,
    commands: mpsc::Sender<WorkerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl Bookmarks {
    /// Load local state and start the write worker
    ///
    /// The bookmark set and the pending log load independently. An unreadable
    /// half starts empty (its content is kept aside by the store) and the next
    /// successful sync restores the remote set.
    pub async fn init(
        store: LocalStore,
        remote: Arc<dyn RemoteBookmarkService>,
        tier: Arc<dyn TierGate>,
        auth: AuthContext,
        options: BookmarksOptions,
    ) -> Self {
        let set = store.load_bookmarks().await.unwrap_or_else(|e| {
            log_storage_error("Failed to load local bookmarks, starting empty", &e);
            BookmarkSet::new()
        });
        let ops = store.load_pending_ops().await.unwrap_or_else(|e| {
            log_storage_error("Failed to load pending bookmark operations, starting empty", &e);
            Vec::new()
        });
        info!(
            "Bookmarks ready: {} saved, {} pending",
            set.len(),
            ops.len()
        );

        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                set,
                queue: OperationQueue::from_ops(ops),
            }),
            store,
            persist_lock: tokio::sync::Mutex::new(()),
            engine: SyncEngine::new(remote, options.remote_timeout),
            follow_up: AtomicBool::new(false),
            tier,
            auth: Mutex::new(auth),
        });

        let (commands, command_rx) = mpsc::channel(64);
        let worker = tokio::spawn(run_worker(inner.clone(), command_rx, options));

        Self {
            inner,
            commands,
            worker: Some(worker),
        }
    }

    /// Stop the worker and wait for in-progress work to finish
    pub async fn dispose(mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown).await;
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("Bookmark worker ended abnormally: {}", e);
            }
        }
    }

    /// Whether `id` is bookmarked. Never touches storage or network.
    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.inner.lock_state().set.contains(id)
    }

    /// Add a bookmark
    ///
    /// Fails with [`BookmarkError::QuotaExceeded`] without mutating anything
    /// when the tier cap is reached.
    pub async fn add(&self, id: impl Into<BookmarkId>) -> Result<WriteHandle, BookmarkError> {
        let id = id.into();
        let op = {
            let mut state = self.inner.lock_state();
            if state.set.contains(id.as_str()) {
                return Ok(WriteHandle::settled(WriteOutcome::Unchanged));
            }

            let limit = self.inner.tier.current_quota();
            if !tier::has_room(limit, state.set.len()) {
                debug!("Refusing to add {}: quota {} reached", id, limit);
                return Err(BookmarkError::QuotaExceeded { limit });
            }

            state.set.insert(id.clone());
            let op = PendingOperation::new(OperationKind::Add, id);
            state.queue.append(op.clone());
            op
        };

        self.inner.persist().await;
        Ok(self.dispatch(op).await)
    }

    /// Remove a bookmark
    pub async fn remove(&self, id: &str) -> WriteHandle {
        let op = {
            let mut state = self.inner.lock_state();
            if !state.set.remove(id) {
                return WriteHandle::settled(WriteOutcome::Unchanged);
            }

            let op = PendingOperation::new(OperationKind::Remove, BookmarkId::from(id));
            state.queue.append(op.clone());
            op
        };

        self.inner.persist().await;
        self.dispatch(op).await
    }

    /// Add if absent, remove if present
    pub async fn toggle(&self, id: &str) -> Result<WriteHandle, BookmarkError> {
        if self.is_bookmarked(id) {
            Ok(self.remove(id).await)
        } else {
            self.add(id).await
        }
    }

    /// Reconcile with the remote service
    ///
    /// Safe to call redundantly: a call arriving while another run is active
    /// returns [`SyncRun::AlreadyInFlight`] without effect.
    pub async fn sync(&self) -> SyncRun {
        self.inner.sync().await
    }

    /// Update the signed-in user
    ///
    /// Signing in runs a sync so local bookmarks reach the account. Switching
    /// to a different account discards the previous account's local state.
    pub async fn set_auth(&self, auth: AuthContext) -> Option<SyncRun> {
        let (signed_in, switched) = {
            let mut current = self.inner.lock_auth();
            let signed_in = current.sync_user().is_none() && auth.sync_user().is_some();
            let switched = matches!(
                (current.sync_user(), auth.sync_user()),
                (Some(old), Some(new)) if old != new
            );
            *current = auth;
            (signed_in, switched)
        };

        if switched {
            let discarded = {
                let mut state = self.inner.lock_state();
                state.set = BookmarkSet::new();
                state.queue.drain_all()
            };
            info!(
                "Account switched, discarded {} pending operations",
                discarded.len()
            );
            self.inner.persist().await;
        }

        if signed_in || switched {
            Some(self.inner.sync().await)
        } else {
            None
        }
    }

    /// Snapshot of the bookmark set
    pub fn bookmarks(&self) -> BookmarkSet {
        self.inner.lock_state().set.clone()
    }

    pub fn count(&self) -> usize {
        self.inner.lock_state().set.len()
    }

    /// Operations not yet confirmed by the remote (diagnostics)
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.inner.lock_state().queue.peek_all().to_vec()
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.engine.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.engine.subscribe_status()
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.engine.status().is_syncing
    }

    pub fn error(&self) -> Option<String> {
        self.inner.engine.status().error
    }

    async fn dispatch(&self, op: PendingOperation) -> WriteHandle {
        let (reply, rx) = oneshot::channel();
        match self.commands.send(WorkerCommand::Write { op, reply }).await {
            Ok(()) => WriteHandle {
                reply: Some(rx),
                settled: WriteOutcome::Queued,
            },
            Err(_) => {
                warn!("Bookmark worker is gone; change stays queued");
                WriteHandle::settled(WriteOutcome::Queued)
            }
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        // State is only replaced wholesale, so a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_auth(&self) -> MutexGuard<'_, AuthContext> {
        self.auth.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sync_user(&self) -> Option<String> {
        self.lock_auth().sync_user().map(str::to_string)
    }

    fn snapshot(&self) -> (BookmarkSet, Vec<PendingOperation>) {
        let state = self.lock_state();
        (state.set.clone(), state.queue.peek_all().to_vec())
    }

    /// Write the current set and log. Failures are logged, never returned.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let (set, ops) = self.snapshot();

        if let Err(e) = self.store.save(&set).await {
            log_storage_error("Failed to persist bookmarks", &e);
        }
        if let Err(e) = self.store.save_pending_ops(&ops).await {
            log_storage_error("Failed to persist pending bookmark operations", &e);
        }
    }

    async fn sync(&self) -> SyncRun {
        self.run_sync(false).await
    }

    /// Reconcile, then keep going while turned-away writers asked for another run
    async fn run_sync(&self, from_write: bool) -> SyncRun {
        let Some(user_id) = self.sync_user() else {
            debug!("Not signed in, skipping sync");
            return SyncRun::NotAuthenticated;
        };

        // Raised before trying the lock, so a holder that misses us sees the flag
        if from_write {
            self.follow_up.store(true, Ordering::SeqCst);
        }

        let mut run = self.reconcile_once(&user_id).await;
        while run.is_success() && self.follow_up.swap(false, Ordering::SeqCst) {
            debug!("Running follow-up sync for writes made during the last run");
            match self.reconcile_once(&user_id).await {
                SyncRun::AlreadyInFlight => break,
                next => run = next,
            }
        }
        run
    }

    async fn reconcile_once(&self, user_id: &str) -> SyncRun {
        let Some(flight) = self.engine.begin_sync() else {
            return SyncRun::AlreadyInFlight;
        };
        // The snapshot below covers every write recorded so far
        self.follow_up.store(false, Ordering::SeqCst);

        let (local, pending) = self.snapshot();
        let outcome = flight.reconcile(user_id, &local, &pending).await;

        if outcome.success {
            {
                let mut state = self.lock_state();
                state.queue.acknowledge(&pending);
                // Mutations made while the run was suspended stay visible
                state.set = state.queue.replay(outcome.final_set.clone());
            }
            self.persist().await;
            self.engine.record_success();
        } else {
            self.engine
                .record_error(outcome.error.clone().unwrap_or_else(|| PUSH_FAILED.to_string()));
        }

        drop(flight);
        SyncRun::Completed(outcome)
    }

    /// Phase 2 of a mutation
    async fn direct_write(&self, op: &PendingOperation) -> WriteOutcome {
        match self.run_sync(true).await {
            SyncRun::NotAuthenticated => {
                debug!("Not signed in, {} {} stays queued", op.kind, op.id);
                return WriteOutcome::Queued;
            }
            SyncRun::AlreadyInFlight => {
                debug!("Sync in flight, {} {} rides its follow-up run", op.kind, op.id);
            }
            SyncRun::Completed(_) => {}
        }

        if self.lock_state().queue.peek_all().contains(op) {
            WriteOutcome::Queued
        } else {
            WriteOutcome::Confirmed
        }
    }
}

/// Log a storage failure with its recovery hint
fn log_storage_error(context: &str, e: &StorageError) {
    let hint = e
        .recovery_suggestion()
        .map(|h| format!(" ({})", h))
        .unwrap_or_default();
    if e.is_recoverable() {
        warn!("{}: {}{}", context, e, hint);
    } else {
        error!("{}: {}{}", context, e, hint);
    }
}

/// Worker loop: direct writes, periodic sync, shutdown
async fn run_worker(
    inner: Arc<Inner>,
    mut commands: mpsc::Receiver<WorkerCommand>,
    options: BookmarksOptions,
) {
    if options.sync_on_start {
        inner.sync().await;
    }

    let mut ticker = options.sync_interval.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(WorkerCommand::Write { op, reply }) => {
                        let outcome = inner.direct_write(&op).await;
                        let _ = reply.send(outcome);
                    }
                    Some(WorkerCommand::Shutdown) | None => break,
                }
            }
            _ = next_tick(&mut ticker) => {
                debug!("Periodic bookmark sync");
                inner.sync().await;
            }
        }
    }

    debug!("Bookmark worker stopped");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
