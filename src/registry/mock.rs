//! Mock device registry for testing without hardware.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{DeviceId, DeviceRegistry};

/// Capacity of a mock notification subscription.
const NOTIFY_CHANNEL_CAPACITY: usize = 16;

struct MockRegistryInner {
    devices: Vec<String>,
    default_output: DeviceId,
    watchers: Vec<mpsc::Sender<DeviceId>>,
}

/// An in-memory device registry with scriptable hot-plug behavior.
///
/// Lets tests add and remove devices, move the default output around, and
/// observe how the bridge heals - all without audio hardware.
///
/// # Example
///
/// ```
/// use loopbridge::{DeviceRegistry, MockRegistry};
///
/// let registry = MockRegistry::with_devices(["BlackHole 2ch", "Dell U2723QE"]);
/// registry.set_default_output("BlackHole 2ch");
///
/// assert_eq!(registry.resolve("blackhole").unwrap().as_str(), "BlackHole 2ch");
/// ```
pub struct MockRegistry {
    inner: Mutex<MockRegistryInner>,
}

impl MockRegistry {
    /// Creates an empty registry with an unknown default output.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockRegistryInner {
                devices: Vec::new(),
                default_output: DeviceId::unknown(),
                watchers: Vec::new(),
            }),
        }
    }

    /// Creates a registry pre-populated with the given device names.
    pub fn with_devices<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        registry.inner.lock().devices = devices.into_iter().map(Into::into).collect();
        registry
    }

    /// Plugs in a device, appending it to the enumeration order.
    pub fn add_device(&self, name: impl Into<String>) {
        self.inner.lock().devices.push(name.into());
    }

    /// Unplugs a device by exact name.
    pub fn remove_device(&self, name: &str) {
        self.inner.lock().devices.retain(|device| device != name);
    }

    /// Changes the default output device and notifies subscribers.
    ///
    /// Notification is sent even when the value is unchanged, mirroring an
    /// OS that fires its listener on every selection event.
    pub fn set_default_output(&self, name: &str) {
        self.notify(DeviceId::new(name));
    }

    /// Makes the default-output query fail, returning the unknown sentinel.
    pub fn clear_default_output(&self) {
        self.notify(DeviceId::unknown());
    }

    fn notify(&self, id: DeviceId) {
        let mut inner = self.inner.lock();
        inner.default_output = id.clone();
        inner
            .watchers
            .retain(|watcher| watcher.try_send(id.clone()).is_ok());
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for MockRegistry {
    fn device_names(&self) -> Vec<String> {
        self.inner.lock().devices.clone()
    }

    fn current_default_output(&self) -> DeviceId {
        self.inner.lock().default_output.clone()
    }

    fn subscribe_default_output(&self) -> mpsc::Receiver<DeviceId> {
        let (tx, rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        self.inner.lock().watchers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_plug() {
        let registry = MockRegistry::new();
        assert!(registry.resolve("BlackHole").is_none());

        registry.add_device("BlackHole 2ch");
        assert!(registry.resolve("BlackHole").is_some());

        registry.remove_device("BlackHole 2ch");
        assert!(registry.resolve("BlackHole").is_none());
    }

    #[test]
    fn test_default_output_query() {
        let registry = MockRegistry::new();
        assert!(registry.current_default_output().is_unknown());

        registry.set_default_output("Dell U2723QE");
        assert_eq!(registry.current_default_output().as_str(), "Dell U2723QE");

        registry.clear_default_output();
        assert!(registry.current_default_output().is_unknown());
    }

    #[tokio::test]
    async fn test_subscription_receives_changes() {
        let registry = MockRegistry::new();
        let mut rx = registry.subscribe_default_output();

        registry.set_default_output("BlackHole 2ch");

        let id = rx.recv().await.expect("should receive notification");
        assert_eq!(id.as_str(), "BlackHole 2ch");
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let registry = MockRegistry::new();
        let rx = registry.subscribe_default_output();
        drop(rx);

        // Must not error or grow the watcher list forever.
        registry.set_default_output("Speakers");
        assert!(registry.inner.lock().watchers.is_empty());
    }
}
