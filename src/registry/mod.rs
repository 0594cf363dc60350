//! Device registry abstraction and its CPAL-backed implementation.
//!
//! The registry is the bridge's read-only view of the OS audio subsystem:
//! enumeration, name-fragment resolution, the current default output, and
//! default-output change notifications.

mod host;
mod mock;

pub use host::HostRegistry;
pub use mock::MockRegistry;

use std::sync::Arc;

use tokio::sync::mpsc;

/// Identifier of an audio device.
///
/// Cheap to clone (`Arc` pointer copy) and compared by value. The CPAL
/// backend identifies devices by display name, so the id carries the full
/// device name; other backends may store an opaque handle string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Creates a device id from a string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The sentinel returned when the default-output query fails.
    pub fn unknown() -> Self {
        Self(Arc::from(""))
    }

    /// Returns `true` for the unknown sentinel.
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read-only queries against the OS device registry.
///
/// All methods are side-effect free. Implementations must be shareable
/// across the control thread and the monitor tasks.
pub trait DeviceRegistry: Send + Sync {
    /// Names of all currently known devices, in enumeration order.
    fn device_names(&self) -> Vec<String>;

    /// The OS's currently selected default output device, or
    /// [`DeviceId::unknown()`] if the query fails.
    fn current_default_output(&self) -> DeviceId;

    /// Subscribes to default-output change notifications.
    ///
    /// Each message carries the new default output id. The returned receiver
    /// stays open for the life of the registry; dropping it ends the
    /// subscription.
    fn subscribe_default_output(&self) -> mpsc::Receiver<DeviceId>;

    /// Resolves a device by case-insensitive substring match against the
    /// live device list.
    ///
    /// Returns the first match in enumeration order. If two devices match,
    /// the choice is whichever the registry lists first - stable against an
    /// unchanged list, but not guaranteed stable across reboots.
    fn resolve(&self, fragment: &str) -> Option<DeviceId> {
        let needle = fragment.to_lowercase();
        self.device_names()
            .into_iter()
            .find(|name| name.to_lowercase().contains(&needle))
            .map(DeviceId::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_equality() {
        let a = DeviceId::new("BlackHole 2ch");
        let b = DeviceId::new("BlackHole 2ch");
        let c = DeviceId::new("Dell U2723QE");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_device_id_unknown_sentinel() {
        let unknown = DeviceId::unknown();
        assert!(unknown.is_unknown());
        assert!(!DeviceId::new("Speakers").is_unknown());
    }

    #[test]
    fn test_device_id_display() {
        let id = DeviceId::new("MacBook Pro Speakers");
        assert_eq!(format!("{id}"), "MacBook Pro Speakers");
    }

    #[test]
    fn test_resolve_case_insensitive_substring() {
        let registry = MockRegistry::with_devices(["MacBook Pro Speakers", "BlackHole 2ch"]);

        let id = registry.resolve("blackhole").expect("should resolve");
        assert_eq!(id.as_str(), "BlackHole 2ch");
        assert!(registry.resolve("U2723QE").is_none());
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let registry = MockRegistry::with_devices(["BlackHole 2ch", "BlackHole 16ch"]);

        // Ambiguous fragments resolve to whichever the registry lists first,
        // and repeatedly so against an unchanged list.
        for _ in 0..3 {
            let id = registry.resolve("BlackHole").expect("should resolve");
            assert_eq!(id.as_str(), "BlackHole 2ch");
        }
    }
}
