//! Configuration for the bridge and its monitors.

use std::time::Duration;

/// Delay between a default-output change notification and the recheck,
/// letting the OS settle device state after hot-plug.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Period of the heartbeat safety net.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(5);

/// Scheduler ring capacity in samples. Roughly 170ms at 48kHz stereo -
/// enough to absorb callback jitter without adding noticeable latency.
pub const DEFAULT_RING_CAPACITY: usize = 16 * 1024;

/// Default playback gain.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Configuration for a bridge.
///
/// Built by [`LoopBridgeBuilder`](crate::LoopBridgeBuilder); only the two
/// device name fragments are required.
///
/// # Example
///
/// ```
/// use loopbridge::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig {
///     heartbeat_period: Duration::from_secs(2),
///     ..BridgeConfig::new("BlackHole", "U2723QE")
/// };
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Case-insensitive name fragment of the virtual loopback capture device.
    pub capture_fragment: String,

    /// Case-insensitive name fragment of the physical output device.
    pub output_fragment: String,

    /// Playback gain applied after every (re)start, in `0.0..=1.0`.
    pub volume: f32,

    /// Delay between a change notification and the debounced recheck.
    pub debounce: Duration,

    /// Period of the heartbeat trigger. This bounds the worst-case
    /// time-to-heal after a missed notification.
    pub heartbeat_period: Duration,

    /// Capacity in samples of the lock-free ring between the capture tap
    /// and the playback scheduler.
    pub ring_capacity: usize,
}

impl BridgeConfig {
    /// Creates a configuration with default timing for the given device
    /// name fragments.
    pub fn new(capture_fragment: impl Into<String>, output_fragment: impl Into<String>) -> Self {
        Self {
            capture_fragment: capture_fragment.into(),
            output_fragment: output_fragment.into(),
            volume: DEFAULT_VOLUME,
            debounce: DEFAULT_DEBOUNCE,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::new("BlackHole", "Dell");
        assert_eq!(config.capture_fragment, "BlackHole");
        assert_eq!(config.output_fragment, "Dell");
        assert_eq!(config.volume, DEFAULT_VOLUME);
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert_eq!(config.heartbeat_period, Duration::from_secs(5));
        assert_eq!(config.ring_capacity, DEFAULT_RING_CAPACITY);
    }
}
