//! Shared synchronization state
//!
//! A cloneable snapshot handle over the engine's status, progress, and
//! height counters. Progress is non-decreasing within a run and reaching
//! 1.0 always coincides with the Synced status.

use parking_lot::RwLock;
use std::sync::Arc;

/// Synchronization status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Wallet is not synchronized with the network
    NotSynced,
    /// Synchronization is in progress
    Syncing,
    /// Wallet is fully synchronized with the network
    Synced,
}

impl SyncStatus {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotSynced => "Not synced",
            Self::Syncing => "Syncing",
            Self::Synced => "Synced",
        }
    }
}

/// Point-in-time copy of the sync state.
#[derive(Debug, Clone, Copy)]
pub struct SyncSnapshot {
    /// Current status
    pub status: SyncStatus,
    /// Progress in [0.0, 1.0]
    pub progress: f32,
    /// Latest height reported by the network
    pub latest_height: u64,
    /// Highest height processed so far
    pub current_height: u64,
}

/// Shared sync state handle
#[derive(Debug, Clone)]
pub struct SyncState {
    inner: Arc<RwLock<StateInner>>,
}

#[derive(Debug)]
struct StateInner {
    status: SyncStatus,
    progress: f32,
    latest_height: u64,
    current_height: u64,
}

impl SyncState {
    /// Create state for a wallet that has processed nothing yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner {
                status: SyncStatus::NotSynced,
                progress: 0.0,
                latest_height: 0,
                current_height: 0,
            })),
        }
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.inner.read().status
    }

    /// Current progress, clamped to [0.0, 1.0].
    pub fn progress(&self) -> f32 {
        self.inner.read().progress
    }

    /// Latest network height seen.
    pub fn latest_height(&self) -> u64 {
        self.inner.read().latest_height
    }

    /// Highest processed height.
    pub fn current_height(&self) -> u64 {
        self.inner.read().current_height
    }

    /// Copy of all fields at once.
    pub fn snapshot(&self) -> SyncSnapshot {
        let inner = self.inner.read();
        SyncSnapshot {
            status: inner.status,
            progress: inner.progress,
            latest_height: inner.latest_height,
            current_height: inner.current_height,
        }
    }

    /// Enter a new run against the given network height.
    ///
    /// Recomputes progress from scratch; a tip that moved forward since the
    /// last run lowers the ratio before the run starts, never during it.
    pub(crate) fn begin(&self, latest_height: u64) {
        let mut inner = self.inner.write();
        inner.latest_height = latest_height;
        inner.status = SyncStatus::Syncing;
        inner.progress = ratio(inner.current_height, latest_height);
    }

    /// Record batch completion up to `height`.
    pub(crate) fn advance(&self, height: u64) {
        let mut inner = self.inner.write();
        inner.current_height = height;
        // Progress never moves backwards while a run is active
        inner.progress = inner.progress.max(ratio(height, inner.latest_height));
    }

    /// Mark the run complete.
    pub(crate) fn complete(&self) {
        let mut inner = self.inner.write();
        inner.current_height = inner.current_height.max(inner.latest_height);
        inner.progress = 1.0;
        inner.status = SyncStatus::Synced;
    }

    /// Revert an interrupted or failed run.
    pub(crate) fn interrupt(&self) {
        let mut inner = self.inner.write();
        if inner.status == SyncStatus::Syncing {
            inner.status = SyncStatus::NotSynced;
        }
    }

    /// Restore the processed height, e.g. from a loaded wallet.
    pub(crate) fn restore_height(&self, height: u64) {
        let mut inner = self.inner.write();
        inner.current_height = height;
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(current: u64, latest: u64) -> f32 {
    if latest == 0 {
        return 0.0;
    }
    ((current as f64 / latest as f64) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SyncState::new();
        let snap = state.snapshot();
        assert_eq!(snap.status, SyncStatus::NotSynced);
        assert_eq!(snap.progress, 0.0);
        assert_eq!(snap.latest_height, 0);
        assert_eq!(snap.current_height, 0);
    }

    #[test]
    fn test_progress_tracks_heights() {
        let state = SyncState::new();
        state.begin(200);
        assert_eq!(state.status(), SyncStatus::Syncing);

        state.advance(100);
        assert!((state.progress() - 0.5).abs() < 1e-6);

        state.advance(200);
        assert!((state.progress() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_non_decreasing_during_run() {
        let state = SyncState::new();
        state.begin(100);
        state.advance(80);
        let before = state.progress();
        state.advance(70);
        assert!(state.progress() >= before);
    }

    #[test]
    fn test_complete_sets_synced() {
        let state = SyncState::new();
        state.begin(100);
        state.advance(100);
        state.complete();
        assert_eq!(state.status(), SyncStatus::Synced);
        assert_eq!(state.progress(), 1.0);
        assert_eq!(state.current_height(), 100);
    }

    #[test]
    fn test_interrupt_reverts_only_active_runs() {
        let state = SyncState::new();
        state.begin(100);
        state.interrupt();
        assert_eq!(state.status(), SyncStatus::NotSynced);

        state.begin(100);
        state.advance(100);
        state.complete();
        state.interrupt();
        assert_eq!(state.status(), SyncStatus::Synced);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(SyncStatus::NotSynced.name(), "Not synced");
        assert_eq!(SyncStatus::Syncing.name(), "Syncing");
        assert_eq!(SyncStatus::Synced.name(), "Synced");
    }
}
