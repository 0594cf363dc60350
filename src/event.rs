//! Structured per-attempt status events.
//!
//! Every setup attempt reports its outcome through these events in addition
//! to plain log lines. The bridge keeps running after any event - callers
//! that need the failure reason observe it here rather than through a return
//! value, since triggers only ever see the resulting active/inactive state.

use std::sync::Arc;

use crate::registry::DeviceId;

/// Status events emitted by the bridge controller and monitors.
///
/// # Example
///
/// ```
/// use loopbridge::BridgeEvent;
///
/// fn handle_event(event: BridgeEvent) {
///     match event {
///         BridgeEvent::HardwareMissing { capture_found, output_found } => {
///             eprintln!("waiting for hardware ({capture_found}, {output_found})");
///         }
///         BridgeEvent::BridgeRestored { capture, output } => {
///             eprintln!("bridge restored: {capture} -> {output}");
///         }
///         BridgeEvent::ReconnectFailed { reason } => {
///             eprintln!("reconnect failed: {reason}");
///         }
///         BridgeEvent::HeartbeatRecovery => {
///             eprintln!("heartbeat forced a recovery attempt");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// One or both target devices were absent at resolution time.
    ///
    /// The attempt stops here; nothing was torn down beyond the eager
    /// teardown that opens every attempt.
    HardwareMissing {
        /// Whether the virtual capture device resolved.
        capture_found: bool,
        /// Whether the physical output device resolved.
        output_found: bool,
    },

    /// A setup attempt succeeded through graph start.
    ///
    /// The bridge is active: captured audio now reaches the output device.
    BridgeRestored {
        /// The resolved virtual capture device.
        capture: DeviceId,
        /// The resolved physical output device.
        output: DeviceId,
    },

    /// A setup attempt failed while configuring or starting the graph.
    ///
    /// The bridge stays inactive until the next trigger retries.
    ReconnectFailed {
        /// Description of the failure, including the stage it occurred at.
        reason: String,
    },

    /// The heartbeat found the capture device selected but the bridge
    /// inactive, and is forcing a recovery attempt.
    ///
    /// This is the safety net for missed or mis-timed notifications; it
    /// bounds the worst-case time-to-heal at one heartbeat period.
    HeartbeatRecovery,
}

/// Callback type for receiving bridge events.
///
/// Register one via [`LoopBridgeBuilder::on_event()`].
///
/// [`LoopBridgeBuilder::on_event()`]: crate::LoopBridgeBuilder::on_event
pub type EventCallback = Arc<dyn Fn(BridgeEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure without manual `Arc` wrapping.
///
/// # Example
///
/// ```
/// use loopbridge::{event_callback, BridgeEvent};
///
/// let callback = event_callback(|event| {
///     println!("bridge event: {event:?}");
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(BridgeEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_debug() {
        let event = BridgeEvent::ReconnectFailed {
            reason: "output stream refused".to_string(),
        };
        let debug = format!("{event:?}");
        assert!(debug.contains("ReconnectFailed"));
        assert!(debug.contains("output stream refused"));
    }

    #[test]
    fn test_event_clone() {
        let event = BridgeEvent::HardwareMissing {
            capture_found: true,
            output_found: false,
        };
        if let BridgeEvent::HardwareMissing {
            capture_found,
            output_found,
        } = event.clone()
        {
            assert!(capture_found);
            assert!(!output_found);
        } else {
            panic!("expected HardwareMissing variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(BridgeEvent::HeartbeatRecovery);
        assert!(called.load(Ordering::SeqCst));
    }
}
