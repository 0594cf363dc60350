//! Error types for loopbridge.
//!
//! Setup errors are recoverable by design: a failed attempt leaves the bridge
//! inactive until the next trigger (notification or heartbeat) retries it.
//! Structured per-attempt status is surfaced via
//! [`BridgeEvent`](crate::BridgeEvent) rather than through these errors.

use std::fmt;

/// The stage of a setup attempt at which the audio graph failed.
///
/// Stages correspond to the fixed order of [`attempt_setup()`]: devices are
/// assigned, the playback scheduler is attached, the capture tap is installed,
/// and finally everything is started.
///
/// [`attempt_setup()`]: crate::BridgeController::attempt_setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStage {
    /// Binding the resolved devices to the capture and playback paths.
    AssignDevices,
    /// Attaching the playback scheduler with the negotiated output format.
    AttachScheduler,
    /// Removing the previous capture tap and installing a new one.
    InstallTap,
    /// Starting playback, capture, and the scheduler.
    Start,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AssignDevices => "assign-devices",
            Self::AttachScheduler => "attach-scheduler",
            Self::InstallTap => "install-tap",
            Self::Start => "start",
        };
        f.write_str(name)
    }
}

/// Errors produced while configuring or rebuilding the bridge.
///
/// None of these terminate the supervisor loop. A [`DeviceNotFound`] or
/// [`GraphConfiguration`] error forces the bridge inactive and is retried,
/// unbounded, on the next external trigger.
///
/// [`DeviceNotFound`]: BridgeError::DeviceNotFound
/// [`GraphConfiguration`]: BridgeError::GraphConfiguration
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A target device is absent from the registry at resolution time.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name fragment that failed to resolve.
        name: String,
    },

    /// Device assignment, graph connection, or a start call failed.
    #[error("graph configuration failed at {stage}: {reason}")]
    GraphConfiguration {
        /// Stage of the setup attempt that failed.
        stage: SetupStage,
        /// Backend-supplied description of the failure.
        reason: String,
    },

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    Backend(String),

    /// The builder was given an unusable configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },
}

impl BridgeError {
    /// Creates a graph configuration error for the given stage.
    pub fn graph(stage: SetupStage, reason: impl Into<String>) -> Self {
        Self::GraphConfiguration {
            stage,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_display() {
        let err = BridgeError::DeviceNotFound {
            name: "BlackHole".to_string(),
        };
        assert_eq!(err.to_string(), "device not found: BlackHole");
    }

    #[test]
    fn test_graph_error_includes_stage() {
        let err = BridgeError::graph(SetupStage::InstallTap, "tap refused");
        assert_eq!(
            err.to_string(),
            "graph configuration failed at install-tap: tap refused"
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(SetupStage::AssignDevices.to_string(), "assign-devices");
        assert_eq!(SetupStage::Start.to_string(), "start");
    }
}
