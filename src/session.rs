//! Bridge session handle and shared observable state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::BridgeError;

/// Counters describing a session's healing history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Total setup attempts, successful or not.
    pub attempts: u64,
    /// Attempts that succeeded through graph start.
    pub restores: u64,
    /// Attempts that failed at resolution or in the graph.
    pub failures: u64,
    /// Recoveries forced by the heartbeat safety net.
    pub heartbeat_recoveries: u64,
}

/// State shared between the session handle, the control thread, and the
/// monitor tasks.
pub(crate) struct SharedState {
    pub running: AtomicBool,
    pub active: AtomicBool,
    pub attempts: AtomicU64,
    pub restores: AtomicU64,
    pub failures: AtomicU64,
    pub heartbeat_recoveries: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            active: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            restores: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            heartbeat_recoveries: AtomicU64::new(0),
        }
    }
}

/// Handle to a running bridge.
///
/// Returned by [`LoopBridgeBuilder::start()`]. The supervisor keeps healing
/// the bridge in the background until [`stop()`](BridgeSession::stop) is
/// called or the session is dropped.
///
/// # Example
///
/// ```ignore
/// let session = LoopBridge::builder()
///     .capture_device("BlackHole")
///     .output_device("U2723QE")
///     .start()
///     .await?;
///
/// tokio::signal::ctrl_c().await?;
/// session.stop().await?;
/// ```
///
/// [`LoopBridgeBuilder::start()`]: crate::LoopBridgeBuilder::start
pub struct BridgeSession {
    shared: Arc<SharedState>,
    shutdown_tx: crossbeam_channel::Sender<()>,
    control_thread: Option<JoinHandle<()>>,
    monitor_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl BridgeSession {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        shutdown_tx: crossbeam_channel::Sender<()>,
        control_thread: JoinHandle<()>,
        monitor_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        Self {
            shared,
            shutdown_tx,
            control_thread: Some(control_thread),
            monitor_handles,
        }
    }

    /// Returns `true` while the supervisor is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Returns `true` iff the most recent setup attempt fully succeeded.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            attempts: self.shared.attempts.load(Ordering::SeqCst),
            restores: self.shared.restores.load(Ordering::SeqCst),
            failures: self.shared.failures.load(Ordering::SeqCst),
            heartbeat_recoveries: self.shared.heartbeat_recoveries.load(Ordering::SeqCst),
        }
    }

    /// Gracefully stops the bridge.
    ///
    /// Tears down the routing graph on the control thread, stops the monitor
    /// tasks, and waits for the control thread to exit.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` is kept for API stability.
    pub async fn stop(mut self) -> Result<(), BridgeError> {
        self.stop_internal().await
    }

    async fn stop_internal(&mut self) -> Result<(), BridgeError> {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            // Already stopped
            return Ok(());
        }

        let _ = self.shutdown_tx.try_send(());

        for handle in self.monitor_handles.drain(..) {
            handle.abort();
        }

        if let Some(thread) = self.control_thread.take() {
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }

        Ok(())
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            // Dropped without explicit stop() - trigger background cleanup
            let _ = self.shutdown_tx.try_send(());
            for handle in self.monitor_handles.drain(..) {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_state_new() {
        let state = SharedState::new();
        assert!(state.running.load(Ordering::SeqCst));
        assert!(!state.active.load(Ordering::SeqCst));
        assert_eq!(state.attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stats_default() {
        let stats = BridgeStats::default();
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.restores, 0);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.heartbeat_recoveries, 0);
    }
}
