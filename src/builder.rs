//! Builder for [`LoopBridge`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    BridgeConfig, DEFAULT_DEBOUNCE, DEFAULT_HEARTBEAT_PERIOD, DEFAULT_RING_CAPACITY,
    DEFAULT_VOLUME,
};
use crate::error::BridgeError;
use crate::event::{event_callback, BridgeEvent, EventCallback};
use crate::graph::{AudioGraph, StreamGraph};
use crate::monitor::{spawn_default_output_monitor, spawn_heartbeat_monitor};
use crate::registry::{DeviceRegistry, HostRegistry};
use crate::session::{BridgeSession, SharedState};
use crate::supervisor::spawn_supervisor;

/// Entry point for building a self-healing bridge.
///
/// # Example
///
/// ```ignore
/// use loopbridge::LoopBridge;
///
/// let session = LoopBridge::builder()
///     .capture_device("BlackHole")
///     .output_device("U2723QE")
///     .volume(0.5)
///     .on_event(|e| tracing::info!(?e, "bridge event"))
///     .start()
///     .await?;
/// ```
pub struct LoopBridge;

impl LoopBridge {
    /// Creates a new builder with default settings.
    pub fn builder() -> LoopBridgeBuilder {
        LoopBridgeBuilder::new()
    }
}

/// Builder for configuring and starting a bridge.
///
/// The two device name fragments are required; everything else has a
/// default. See [`LoopBridge::builder()`].
#[must_use]
pub struct LoopBridgeBuilder {
    capture_fragment: Option<String>,
    output_fragment: Option<String>,
    volume: f32,
    debounce: Duration,
    heartbeat_period: Duration,
    ring_capacity: usize,
    event_callback: Option<EventCallback>,
}

impl Default for LoopBridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopBridgeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            capture_fragment: None,
            output_fragment: None,
            volume: DEFAULT_VOLUME,
            debounce: DEFAULT_DEBOUNCE,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            ring_capacity: DEFAULT_RING_CAPACITY,
            event_callback: None,
        }
    }

    /// Name fragment of the virtual loopback capture device (required).
    ///
    /// Matched case-insensitively by substring against the live device list
    /// on every setup attempt.
    pub fn capture_device(mut self, fragment: impl Into<String>) -> Self {
        self.capture_fragment = Some(fragment.into());
        self
    }

    /// Name fragment of the physical output device (required).
    pub fn output_device(mut self, fragment: impl Into<String>) -> Self {
        self.output_fragment = Some(fragment.into());
        self
    }

    /// Playback gain in `0.0..=1.0`, applied after every (re)start.
    ///
    /// Default: 0.5
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Delay between a default-output change notification and the recheck.
    ///
    /// Default: 1s
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Period of the heartbeat safety net.
    ///
    /// Default: 5s
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    /// Capacity in samples of the scheduler ring buffer.
    pub fn ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    /// Sets a callback for structured per-attempt status events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(BridgeEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    fn validate(&self) -> Result<BridgeConfig, BridgeError> {
        let capture_fragment =
            self.capture_fragment
                .clone()
                .ok_or_else(|| BridgeError::InvalidConfig {
                    reason: "capture device fragment is required".to_string(),
                })?;
        let output_fragment =
            self.output_fragment
                .clone()
                .ok_or_else(|| BridgeError::InvalidConfig {
                    reason: "output device fragment is required".to_string(),
                })?;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(BridgeError::InvalidConfig {
                reason: format!("volume {} is outside 0.0..=1.0", self.volume),
            });
        }
        if self.ring_capacity == 0 {
            return Err(BridgeError::InvalidConfig {
                reason: "ring capacity must be non-zero".to_string(),
            });
        }

        Ok(BridgeConfig {
            capture_fragment,
            output_fragment,
            volume: self.volume,
            debounce: self.debounce,
            heartbeat_period: self.heartbeat_period,
            ring_capacity: self.ring_capacity,
        })
    }

    /// Starts the bridge against the system's audio devices.
    ///
    /// Spawns the supervisor control thread and the two monitor tasks, then
    /// returns a [`BridgeSession`] handle. The bridge itself activates on
    /// the first trigger whose guard passes; a successful start does not
    /// mean the devices are present yet.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if a required fragment is
    /// missing or a setting is out of range.
    pub async fn start(self) -> Result<BridgeSession, BridgeError> {
        let ring_capacity = self.ring_capacity;
        self.start_with(Arc::new(HostRegistry::new()), move || {
            StreamGraph::new(ring_capacity)
        })
        .await
    }

    /// Starts the bridge against a custom registry and graph.
    ///
    /// This is the seam used by tests ([`MockRegistry`] plus [`MockGraph`])
    /// and by alternative platform backends. The graph factory runs on the
    /// control thread, so the graph type need not be `Send`.
    ///
    /// # Errors
    ///
    /// Same as [`start()`](Self::start).
    ///
    /// [`MockRegistry`]: crate::MockRegistry
    /// [`MockGraph`]: crate::MockGraph
    pub async fn start_with<R, G, F>(
        self,
        registry: Arc<R>,
        graph_factory: F,
    ) -> Result<BridgeSession, BridgeError>
    where
        R: DeviceRegistry + 'static,
        G: AudioGraph + 'static,
        F: FnOnce() -> G + Send + 'static,
    {
        let config = self.validate()?;
        let shared = Arc::new(SharedState::new());

        let handle = spawn_supervisor(
            registry.clone(),
            graph_factory,
            config.clone(),
            shared.clone(),
            self.event_callback.clone(),
        );

        let monitors = vec![
            spawn_default_output_monitor(
                registry,
                config.debounce,
                handle.trigger_tx.clone(),
                shared.clone(),
            ),
            spawn_heartbeat_monitor(
                config.heartbeat_period,
                handle.trigger_tx.clone(),
                shared.clone(),
            ),
        ];

        tracing::info!(
            capture = %config.capture_fragment,
            output = %config.output_fragment,
            "bridge supervisor started"
        );

        Ok(BridgeSession::new(
            shared,
            handle.shutdown_tx,
            handle.thread,
            monitors,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_capture_fragment() {
        let err = LoopBridge::builder()
            .output_device("Dell")
            .validate()
            .expect_err("should reject");
        assert!(matches!(err, BridgeError::InvalidConfig { ref reason } if reason.contains("capture")));
    }

    #[test]
    fn test_requires_output_fragment() {
        let err = LoopBridge::builder()
            .capture_device("BlackHole")
            .validate()
            .expect_err("should reject");
        assert!(matches!(err, BridgeError::InvalidConfig { ref reason } if reason.contains("output")));
    }

    #[test]
    fn test_rejects_out_of_range_volume() {
        let err = LoopBridge::builder()
            .capture_device("BlackHole")
            .output_device("Dell")
            .volume(1.5)
            .validate()
            .expect_err("should reject");
        assert!(matches!(err, BridgeError::InvalidConfig { ref reason } if reason.contains("volume")));
    }

    #[test]
    fn test_builder_produces_config() {
        let config = LoopBridge::builder()
            .capture_device("BlackHole")
            .output_device("U2723QE")
            .volume(0.8)
            .debounce(Duration::from_millis(200))
            .heartbeat_period(Duration::from_secs(2))
            .validate()
            .expect("should validate");

        assert_eq!(config.capture_fragment, "BlackHole");
        assert_eq!(config.output_fragment, "U2723QE");
        assert_eq!(config.volume, 0.8);
        assert_eq!(config.debounce, Duration::from_millis(200));
        assert_eq!(config.heartbeat_period, Duration::from_secs(2));
    }
}
