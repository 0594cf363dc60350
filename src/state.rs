//! The bridge's mutable state.

use crate::registry::DeviceId;

/// The sole mutable entity of the bridge, exclusively owned by the
/// [`BridgeController`](crate::BridgeController).
///
/// Device identifiers are refreshed on every setup attempt and never cached
/// across failures. `is_active` is derived state: true only after an attempt
/// has fully succeeded through graph start. There is no partially-active
/// state - any failure during setup forces it back to false.
#[derive(Debug, Clone)]
pub struct BridgeState {
    /// Identifier of the virtual loopback capture device, as resolved by the
    /// most recent attempt. `None` if the last resolution failed.
    pub capture_device: Option<DeviceId>,

    /// Identifier of the physical output device, as resolved by the most
    /// recent attempt. `None` if the last resolution failed.
    pub output_device: Option<DeviceId>,

    /// Playback gain applied after every (re)start.
    pub volume: f32,

    /// Whether the most recent setup attempt succeeded through graph start.
    pub is_active: bool,
}

impl BridgeState {
    /// Creates an inactive state with the given playback gain.
    pub fn new(volume: f32) -> Self {
        Self {
            capture_device: None,
            output_device: None,
            volume,
            is_active: false,
        }
    }
}
