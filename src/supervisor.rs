//! The serialized control loop.
//!
//! Both trigger sources post a [`Trigger`] to one coalescing channel; the
//! control loop is the only consumer and the only caller of
//! [`attempt_setup()`](crate::BridgeController::attempt_setup), so the
//! teardown-then-rebuild sequence never overlaps itself. The loop runs on a
//! dedicated OS thread because CPAL streams must stay on the thread that
//! created them.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::config::BridgeConfig;
use crate::controller::BridgeController;
use crate::event::EventCallback;
use crate::graph::AudioGraph;
use crate::registry::DeviceRegistry;
use crate::session::SharedState;

/// A recheck request posted by one of the two monitors.
///
/// Posting is lossy by design: a full queue means a recheck is already
/// pending, and one recheck serves any number of coincident triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The OS default output device changed (debounced).
    DefaultOutputChanged,
    /// The periodic heartbeat fired.
    Heartbeat,
}

/// Capacity 1: a queued trigger already guarantees a recheck, so further
/// posts coalesce into it.
const TRIGGER_CHANNEL_CAPACITY: usize = 1;

pub(crate) struct SupervisorHandle {
    pub trigger_tx: Sender<Trigger>,
    pub shutdown_tx: Sender<()>,
    pub thread: thread::JoinHandle<()>,
}

/// Spawns the control thread.
///
/// The graph is built by `graph_factory` on the control thread itself, so
/// graph types need not be `Send`.
pub(crate) fn spawn_supervisor<R, G, F>(
    registry: Arc<R>,
    graph_factory: F,
    config: BridgeConfig,
    shared: Arc<SharedState>,
    event_callback: Option<EventCallback>,
) -> SupervisorHandle
where
    R: DeviceRegistry + 'static,
    G: AudioGraph + 'static,
    F: FnOnce() -> G + Send + 'static,
{
    let (trigger_tx, trigger_rx) = bounded::<Trigger>(TRIGGER_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

    let thread = thread::spawn(move || {
        let graph = graph_factory();
        let mut controller =
            BridgeController::with_shared(registry, graph, config, shared, event_callback);

        controller.seed_capture_device();
        run(&mut controller, &trigger_rx, &shutdown_rx);
        controller.shutdown();
    });

    SupervisorHandle {
        trigger_tx,
        shutdown_tx,
        thread,
    }
}

fn run<R, G>(
    controller: &mut BridgeController<R, G>,
    triggers: &Receiver<Trigger>,
    shutdown: &Receiver<()>,
) where
    R: DeviceRegistry,
    G: AudioGraph,
{
    loop {
        select! {
            recv(triggers) -> msg => match msg {
                Ok(trigger) => controller.handle_trigger(trigger),
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MockGraph;
    use crate::registry::MockRegistry;

    #[test]
    fn test_supervisor_processes_triggers_and_shuts_down() {
        let registry = Arc::new(MockRegistry::with_devices([
            "BlackHole 2ch",
            "Dell U2723QE",
        ]));
        registry.set_default_output("BlackHole 2ch");

        let graph = MockGraph::new();
        let observer = graph.clone();
        let shared = Arc::new(SharedState::new());

        let handle = spawn_supervisor(
            registry,
            move || graph,
            BridgeConfig::new("BlackHole", "U2723QE"),
            shared.clone(),
            None,
        );

        handle
            .trigger_tx
            .send(Trigger::Heartbeat)
            .expect("send trigger");
        handle.shutdown_tx.send(()).expect("send shutdown");
        handle.thread.join().expect("control thread");

        // The heartbeat healed the bridge, then shutdown tore it down.
        assert!(shared.attempts.load(std::sync::atomic::Ordering::SeqCst) >= 1);
        assert!(!observer.is_running());
    }

    #[test]
    fn test_trigger_posting_coalesces() {
        let (tx, rx) = bounded::<Trigger>(TRIGGER_CHANNEL_CAPACITY);

        assert!(tx.try_send(Trigger::Heartbeat).is_ok());
        // A recheck is already pending; further posts are absorbed.
        assert!(tx.try_send(Trigger::DefaultOutputChanged).is_err());

        assert_eq!(rx.recv().expect("recv"), Trigger::Heartbeat);
    }
}
