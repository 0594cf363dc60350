//! Audio routing graph abstraction.
//!
//! The controller drives the graph through the fixed setup stages of an
//! attempt; the trait keeps that sequence testable without hardware. The
//! real implementation is [`StreamGraph`], built on CPAL streams with a
//! lock-free ring buffer between the capture tap and the playback scheduler.

mod mock;
mod stream;

pub use mock::MockGraph;
pub use stream::StreamGraph;

use crate::error::BridgeError;
use crate::registry::DeviceId;

/// The live audio routing graph: capture path, playback path, and the
/// scheduler connecting them.
///
/// Stage methods must be called in order - `assign_devices`,
/// `attach_scheduler`, `install_tap`, `start` - and any of them may fail
/// with [`BridgeError::GraphConfiguration`]. A failed stage may leave the
/// graph partially stopped; that is acceptable because every attempt opens
/// with [`teardown()`](AudioGraph::teardown).
pub trait AudioGraph {
    /// Unconditionally stops and releases all live routing.
    ///
    /// Infallible and idempotent. Runs as the first step of every setup
    /// attempt so no stale graph ever coexists with a new one.
    fn teardown(&mut self);

    /// Binds the capture path to the capture device and the playback path
    /// to the output device, negotiating the playback format.
    fn assign_devices(&mut self, capture: &DeviceId, output: &DeviceId) -> Result<(), BridgeError>;

    /// Attaches the playback scheduler using the playback path's negotiated
    /// output format.
    fn attach_scheduler(&mut self) -> Result<(), BridgeError>;

    /// Removes any previously installed capture tap and installs a new one
    /// that forwards every delivered buffer into the scheduler queue.
    ///
    /// The hand-off crosses from the real-time capture callback into the
    /// scheduler and must not block or allocate.
    fn install_tap(&mut self) -> Result<(), BridgeError>;

    /// Starts the playback path, then the capture path, then the scheduler.
    fn start(&mut self) -> Result<(), BridgeError>;

    /// Applies the playback gain. Safe to call at any time; takes effect on
    /// the next delivered buffer.
    fn set_volume(&mut self, volume: f32);
}
