//! Mock audio graph for testing the reconnection machinery without hardware.

use std::sync::Arc;

use parking_lot::Mutex;

use super::AudioGraph;
use crate::error::{BridgeError, SetupStage};
use crate::registry::DeviceId;

#[derive(Default)]
struct MockGraphInner {
    fail_stage: Option<SetupStage>,
    assigned: Option<(DeviceId, DeviceId)>,
    scheduler_attached: bool,
    tap_installed: bool,
    running: bool,
    volume: Option<f32>,
    teardowns: u32,
    tap_installs: u32,
}

/// A scriptable audio graph that records stage calls.
///
/// Cloning shares the underlying state, so tests can hand one clone to the
/// supervisor and keep another to inject failures and inspect progress.
///
/// # Example
///
/// ```
/// use loopbridge::{AudioGraph, MockGraph, SetupStage};
///
/// let mut graph = MockGraph::new();
/// let observer = graph.clone();
///
/// graph.fail_at(SetupStage::Start);
/// assert!(graph.assign_devices(&"in".into(), &"out".into()).is_ok());
/// assert!(graph.attach_scheduler().is_ok());
/// assert!(graph.install_tap().is_ok());
/// assert!(graph.start().is_err());
/// assert!(!observer.is_running());
/// ```
#[derive(Clone, Default)]
pub struct MockGraph {
    inner: Arc<Mutex<MockGraphInner>>,
}

impl MockGraph {
    /// Creates a graph that succeeds at every stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given stage fail on every future attempt until cleared.
    pub fn fail_at(&self, stage: SetupStage) {
        self.inner.lock().fail_stage = Some(stage);
    }

    /// Clears a scripted failure.
    pub fn clear_failure(&self) {
        self.inner.lock().fail_stage = None;
    }

    /// Whether the graph is currently started.
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// The devices bound by the most recent `assign_devices`, if any.
    pub fn assigned_devices(&self) -> Option<(DeviceId, DeviceId)> {
        self.inner.lock().assigned.clone()
    }

    /// The most recently applied playback gain, if any.
    pub fn current_volume(&self) -> Option<f32> {
        self.inner.lock().volume
    }

    /// How many times the graph has been torn down.
    pub fn teardowns(&self) -> u32 {
        self.inner.lock().teardowns
    }

    /// How many times a capture tap has been installed.
    pub fn tap_installs(&self) -> u32 {
        self.inner.lock().tap_installs
    }

    fn check(&self, stage: SetupStage) -> Result<(), BridgeError> {
        if self.inner.lock().fail_stage == Some(stage) {
            return Err(BridgeError::graph(stage, "scripted failure"));
        }
        Ok(())
    }
}

impl AudioGraph for MockGraph {
    fn teardown(&mut self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        inner.tap_installed = false;
        inner.scheduler_attached = false;
        inner.assigned = None;
        inner.teardowns += 1;
    }

    fn assign_devices(&mut self, capture: &DeviceId, output: &DeviceId) -> Result<(), BridgeError> {
        self.check(SetupStage::AssignDevices)?;
        self.inner.lock().assigned = Some((capture.clone(), output.clone()));
        Ok(())
    }

    fn attach_scheduler(&mut self) -> Result<(), BridgeError> {
        self.check(SetupStage::AttachScheduler)?;
        let mut inner = self.inner.lock();
        if inner.assigned.is_none() {
            return Err(BridgeError::graph(
                SetupStage::AttachScheduler,
                "devices not assigned",
            ));
        }
        inner.scheduler_attached = true;
        Ok(())
    }

    fn install_tap(&mut self) -> Result<(), BridgeError> {
        self.check(SetupStage::InstallTap)?;
        let mut inner = self.inner.lock();
        if !inner.scheduler_attached {
            return Err(BridgeError::graph(
                SetupStage::InstallTap,
                "scheduler not attached",
            ));
        }
        inner.tap_installed = true;
        inner.tap_installs += 1;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BridgeError> {
        self.check(SetupStage::Start)?;
        let mut inner = self.inner.lock();
        if !inner.tap_installed {
            return Err(BridgeError::graph(
                SetupStage::Start,
                "capture tap not installed",
            ));
        }
        inner.running = true;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.inner.lock().volume = Some(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all_stages(graph: &mut MockGraph) -> Result<(), BridgeError> {
        graph.assign_devices(&"BlackHole 2ch".into(), &"Dell U2723QE".into())?;
        graph.attach_scheduler()?;
        graph.install_tap()?;
        graph.start()
    }

    #[test]
    fn test_full_setup_runs() {
        let mut graph = MockGraph::new();
        run_all_stages(&mut graph).expect("all stages should succeed");
        assert!(graph.is_running());
        assert_eq!(graph.tap_installs(), 1);
    }

    #[test]
    fn test_scripted_failure_stops_at_stage() {
        let mut graph = MockGraph::new();
        graph.fail_at(SetupStage::AttachScheduler);

        let err = run_all_stages(&mut graph).expect_err("should fail");
        assert!(matches!(
            err,
            BridgeError::GraphConfiguration {
                stage: SetupStage::AttachScheduler,
                ..
            }
        ));
        assert!(!graph.is_running());
        assert_eq!(graph.tap_installs(), 0);
    }

    #[test]
    fn test_teardown_resets_everything() {
        let mut graph = MockGraph::new();
        run_all_stages(&mut graph).expect("setup");

        graph.teardown();
        assert!(!graph.is_running());
        assert!(graph.assigned_devices().is_none());
        assert_eq!(graph.teardowns(), 1);
    }

    #[test]
    fn test_stage_order_enforced() {
        let mut graph = MockGraph::new();
        assert!(graph.attach_scheduler().is_err());
        assert!(graph.install_tap().is_err());
        assert!(graph.start().is_err());
    }
}
