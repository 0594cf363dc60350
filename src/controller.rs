//! The bridge controller: owns the state and rebuilds the routing graph.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::event::{BridgeEvent, EventCallback};
use crate::graph::AudioGraph;
use crate::registry::{DeviceId, DeviceRegistry};
use crate::session::SharedState;
use crate::state::BridgeState;
use crate::supervisor::Trigger;

/// Owns [`BridgeState`] and the audio graph, and exposes the one operation
/// that mutates them: [`attempt_setup()`](BridgeController::attempt_setup).
///
/// The controller is not reentrant-safe; the supervisor serializes all
/// calls by owning the controller on a single control thread. Tests may
/// drive a controller directly instead of going through the supervisor.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use loopbridge::{BridgeConfig, BridgeController, MockGraph, MockRegistry};
///
/// let registry = Arc::new(MockRegistry::with_devices(["BlackHole 2ch", "Dell U2723QE"]));
/// let config = BridgeConfig::new("BlackHole", "Dell");
/// let mut controller = BridgeController::new(registry, MockGraph::new(), config);
///
/// controller.attempt_setup().unwrap();
/// assert!(controller.is_active());
/// ```
pub struct BridgeController<R, G> {
    registry: Arc<R>,
    graph: G,
    config: BridgeConfig,
    state: BridgeState,
    shared: Arc<SharedState>,
    event_callback: Option<EventCallback>,
}

impl<R, G> BridgeController<R, G>
where
    R: DeviceRegistry,
    G: AudioGraph,
{
    /// Creates a controller with its own private counters.
    pub fn new(registry: Arc<R>, graph: G, config: BridgeConfig) -> Self {
        Self::with_shared(registry, graph, config, Arc::new(SharedState::new()), None)
    }

    pub(crate) fn with_shared(
        registry: Arc<R>,
        graph: G,
        config: BridgeConfig,
        shared: Arc<SharedState>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        let volume = config.volume;
        Self {
            registry,
            graph,
            config,
            state: BridgeState::new(volume),
            shared,
            event_callback,
        }
    }

    /// Sets the event callback.
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Returns `true` iff the most recent setup attempt fully succeeded.
    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// The controller's current state.
    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    /// The underlying audio graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    fn emit(&self, event: BridgeEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Best-effort initial resolution of the capture device, run once at
    /// startup before the monitors begin triggering.
    pub fn seed_capture_device(&mut self) {
        self.state.capture_device = self.registry.resolve(&self.config.capture_fragment);
        match &self.state.capture_device {
            Some(id) => tracing::debug!(%id, "seeded capture device"),
            None => tracing::debug!(
                fragment = %self.config.capture_fragment,
                "capture device not present at startup"
            ),
        }
    }

    /// Deterministically tears down and rebuilds the routing graph.
    ///
    /// Always executes in the same order: eager teardown, re-resolution of
    /// both device identifiers, device assignment, scheduler attachment, tap
    /// installation, start, volume. Any failure leaves the bridge inactive;
    /// the graph may be left partially stopped, which the next attempt's
    /// teardown cleans up.
    ///
    /// # Errors
    ///
    /// [`BridgeError::DeviceNotFound`] if either device fails to resolve,
    /// [`BridgeError::GraphConfiguration`] if a graph stage fails. Both are
    /// recoverable: the next trigger retries.
    pub fn attempt_setup(&mut self) -> Result<(), BridgeError> {
        self.shared.attempts.fetch_add(1, Ordering::Relaxed);

        // Step 1: eager teardown, so no stale graph ever coexists with a
        // new one. Runs on every attempt, successful or not.
        self.graph.teardown();
        self.set_active(false);

        // Step 2: re-resolve both identifiers; never reuse ids from a
        // previous attempt.
        let capture = self.registry.resolve(&self.config.capture_fragment);
        let output = self.registry.resolve(&self.config.output_fragment);
        self.state.capture_device.clone_from(&capture);
        self.state.output_device.clone_from(&output);

        let (capture_found, output_found) = (capture.is_some(), output.is_some());
        let (Some(capture), Some(output)) = (capture, output) else {
            tracing::warn!(capture_found, output_found, "hardware not found; waiting for devices");
            self.emit(BridgeEvent::HardwareMissing {
                capture_found,
                output_found,
            });
            self.shared.failures.fetch_add(1, Ordering::Relaxed);
            let missing = if capture_found {
                &self.config.output_fragment
            } else {
                &self.config.capture_fragment
            };
            return Err(BridgeError::DeviceNotFound {
                name: missing.clone(),
            });
        };

        // Steps 3-6: build and start the graph.
        if let Err(err) = self.build_and_start(&capture, &output) {
            tracing::warn!(error = %err, "reconnect failed; will retry on next trigger");
            self.emit(BridgeEvent::ReconnectFailed {
                reason: err.to_string(),
            });
            self.shared.failures.fetch_add(1, Ordering::Relaxed);
            return Err(err);
        }

        // Step 7: only now is the bridge considered active.
        self.set_active(true);
        self.shared.restores.fetch_add(1, Ordering::Relaxed);
        tracing::info!(%capture, %output, "bridge restored");
        self.emit(BridgeEvent::BridgeRestored { capture, output });
        Ok(())
    }

    fn build_and_start(&mut self, capture: &DeviceId, output: &DeviceId) -> Result<(), BridgeError> {
        self.graph.assign_devices(capture, output)?;
        self.graph.attach_scheduler()?;
        self.graph.install_tap()?;
        self.graph.start()?;
        self.graph.set_volume(self.state.volume);
        Ok(())
    }

    /// Handles one trigger from the monitors, re-validating the "should be
    /// active" invariant before acting.
    ///
    /// Both trigger sources run through this same check-then-act path; no
    /// ordering is guaranteed between them, and neither assumes exclusive
    /// responsibility.
    pub fn handle_trigger(&mut self, trigger: Trigger) {
        let default_output = self.registry.current_default_output();
        if default_output.is_unknown() {
            tracing::debug!("default output unknown; skipping recheck");
            return;
        }

        let Some(capture) = self.capture_target() else {
            tracing::debug!("capture device unresolved; skipping recheck");
            return;
        };
        if capture != default_output {
            // Switching away from the virtual device triggers no teardown.
            tracing::trace!(%default_output, "default output is not the capture device");
            return;
        }

        match trigger {
            Trigger::DefaultOutputChanged => {
                tracing::info!(%capture, "default output switched to capture device; rebuilding");
                let _ = self.attempt_setup();
            }
            Trigger::Heartbeat => {
                if !self.state.is_active {
                    tracing::info!("heartbeat: capture device selected but bridge inactive; forcing recovery");
                    self.shared
                        .heartbeat_recoveries
                        .fetch_add(1, Ordering::Relaxed);
                    self.emit(BridgeEvent::HeartbeatRecovery);
                    let _ = self.attempt_setup();
                }
            }
        }
    }

    /// Tears the graph down for good. Called once when the supervisor exits.
    pub fn shutdown(&mut self) {
        self.graph.teardown();
        self.set_active(false);
        tracing::debug!("bridge controller shut down");
    }

    /// The capture identifier to compare against the default output.
    ///
    /// Falls back to a live resolution when no identifier has been resolved
    /// yet, so a capture device that appears after a cold start is picked up
    /// by the next heartbeat.
    fn capture_target(&self) -> Option<DeviceId> {
        self.state
            .capture_device
            .clone()
            .or_else(|| self.registry.resolve(&self.config.capture_fragment))
    }

    fn set_active(&mut self, active: bool) {
        self.state.is_active = active;
        self.shared.active.store(active, Ordering::SeqCst);
    }
}
