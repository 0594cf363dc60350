//! The two trigger sources: default-output notifications and the heartbeat.
//!
//! Both monitors are deliberately dumb timers. They post a [`Trigger`] and
//! nothing else; the invariant check ("is the capture device the current
//! default, and is the bridge active?") happens on the control thread, which
//! owns the state it needs to answer.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::registry::DeviceRegistry;
use crate::session::SharedState;
use crate::supervisor::Trigger;

/// Consumes default-output change notifications, applies the debounce delay
/// (letting the OS settle device state), coalesces anything queued during
/// the delay, and posts a single recheck.
pub(crate) fn spawn_default_output_monitor<R>(
    registry: Arc<R>,
    debounce: Duration,
    trigger_tx: Sender<Trigger>,
    shared: Arc<SharedState>,
) -> JoinHandle<()>
where
    R: DeviceRegistry + 'static,
{
    // Subscribe before spawning so no notification is lost to task startup.
    let mut notifications = registry.subscribe_default_output();
    tokio::spawn(async move {
        while let Some(current) = notifications.recv().await {
            if !shared.running.load(Ordering::SeqCst) {
                break;
            }
            tracing::debug!(%current, "default output changed; scheduling recheck");
            tokio::time::sleep(debounce).await;

            // Notifications that piled up during the debounce window are
            // covered by this one recheck.
            while notifications.try_recv().is_ok() {}

            // Full queue means a recheck is already pending.
            let _ = trigger_tx.try_send(Trigger::DefaultOutputChanged);
        }
    })
}

/// Posts a heartbeat recheck on a fixed period.
///
/// The heartbeat is the redundant safety net for missed or mis-timed
/// notifications; it bounds the worst-case time-to-heal at one period.
pub(crate) fn spawn_heartbeat_monitor(
    period: Duration,
    trigger_tx: Sender<Trigger>,
    shared: Arc<SharedState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the heartbeat proper starts
        // one period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !shared.running.load(Ordering::SeqCst) {
                break;
            }
            let _ = trigger_tx.try_send(Trigger::Heartbeat);
        }
    })
}
