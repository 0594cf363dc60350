//! Self-healing audio bridge from a virtual loopback device to a physical
//! output.
//!
//! `loopbridge` keeps audio routed from a virtual loopback capture device
//! (e.g. BlackHole) into a physical output device's playback path, and keeps
//! that route alive across device hot-plug, sleep/wake, and OS default-output
//! switches. Whenever the route is found broken it is torn down and rebuilt
//! from scratch rather than patched.
//!
//! # Architecture
//!
//! ```text
//! default-output monitor ──┐  (debounced)
//!                          ├──▶ trigger channel ──▶ control thread
//! heartbeat monitor ───────┘  (periodic)               │
//!                                                      ▼
//!                                               BridgeController
//!                                               teardown ▸ resolve ▸ rebuild
//!                                                      │
//!                                    capture stream ─▶ ring ─▶ playback stream
//! ```
//!
//! Two monitor tasks post recheck requests into a single coalescing channel.
//! A dedicated control thread consumes them and owns the
//! [`BridgeController`], which owns the CPAL streams; streams stay on the
//! thread that created them. The capture callback pushes samples into a
//! lock-free ring buffer and the playback callback pops them, so the
//! real-time hand-off never locks or allocates.
//!
//! # Example
//!
//! ```ignore
//! use loopbridge::LoopBridge;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = LoopBridge::builder()
//!         .capture_device("BlackHole")
//!         .output_device("U2723QE")
//!         .volume(0.5)
//!         .on_event(|event| tracing::info!(?event, "bridge"))
//!         .start()
//!         .await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod builder;
mod config;
mod controller;
mod error;
mod event;
mod graph;
mod monitor;
mod registry;
mod session;
mod state;
mod supervisor;

pub use builder::{LoopBridge, LoopBridgeBuilder};
pub use config::{
    BridgeConfig, DEFAULT_DEBOUNCE, DEFAULT_HEARTBEAT_PERIOD, DEFAULT_RING_CAPACITY,
    DEFAULT_VOLUME,
};
pub use controller::BridgeController;
pub use error::{BridgeError, SetupStage};
pub use event::{event_callback, BridgeEvent, EventCallback};
pub use graph::{AudioGraph, MockGraph, StreamGraph};
pub use registry::{DeviceId, DeviceRegistry, HostRegistry, MockRegistry};
pub use session::{BridgeSession, BridgeStats};
pub use state::BridgeState;
pub use supervisor::Trigger;
