//! CPAL-backed audio graph.
//!
//! The capture stream's callback pushes samples into a lock-free SPSC ring;
//! the playback stream's callback pops them, applies the atomic gain, and
//! zero-fills on underrun. Neither callback blocks or allocates.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, SupportedStreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::AudioGraph;
use crate::config::DEFAULT_RING_CAPACITY;
use crate::error::{BridgeError, SetupStage};
use crate::registry::DeviceId;

/// Symmetric i16 max for sample conversion (avoids asymmetric clipping).
const I16_MAX_SYMMETRIC: f32 = i16::MAX as f32;

/// Devices and formats bound by `assign_devices`.
struct BoundDevices {
    capture: Device,
    capture_config: SupportedStreamConfig,
    playback: Device,
    playback_config: SupportedStreamConfig,
}

/// Audio graph built on CPAL streams.
///
/// Not `Send`: CPAL streams must stay on the thread that created them, so
/// the graph is constructed on the supervisor's control thread and never
/// leaves it.
pub struct StreamGraph {
    ring_capacity: usize,
    /// Playback gain as f32 bits, read by the playback callback.
    volume: Arc<AtomicU32>,
    bound: Option<BoundDevices>,
    playback: Option<Stream>,
    /// Producer side of the scheduler ring, parked between
    /// `attach_scheduler` and `install_tap`.
    pending_producer: Option<HeapProd<f32>>,
    capture: Option<Stream>,
}

impl StreamGraph {
    /// Creates a graph whose scheduler ring holds `ring_capacity` samples.
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            ring_capacity,
            volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            bound: None,
            playback: None,
            pending_producer: None,
            capture: None,
        }
    }
}

impl Default for StreamGraph {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

fn find_device<I>(devices: Result<I, cpal::DevicesError>, id: &DeviceId) -> Option<Device>
where
    I: Iterator<Item = Device>,
{
    devices
        .ok()?
        .find(|device| device.name().map(|name| name == id.as_str()).unwrap_or(false))
}

fn capture_error(err: cpal::StreamError) {
    tracing::error!(error = %err, "capture stream error");
}

fn playback_error(err: cpal::StreamError) {
    tracing::error!(error = %err, "playback stream error");
}

fn build_playback_stream(
    device: &Device,
    supported: &SupportedStreamConfig,
    mut consumer: HeapCons<f32>,
    volume: Arc<AtomicU32>,
) -> Result<Stream, BridgeError> {
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.clone().into();

    let stream = match format {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let gain = f32::from_bits(volume.load(Ordering::Relaxed));
                let filled = consumer.pop_slice(data);
                for sample in &mut data[..filled] {
                    *sample *= gain;
                }
                // Underrun plays silence rather than stale audio
                data[filled..].fill(0.0);
            },
            playback_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                let gain = f32::from_bits(volume.load(Ordering::Relaxed));
                for sample in data.iter_mut() {
                    *sample = match consumer.try_pop() {
                        Some(value) => {
                            (value * gain * I16_MAX_SYMMETRIC).clamp(-32768.0, 32767.0) as i16
                        }
                        None => 0,
                    };
                }
            },
            playback_error,
            None,
        ),
        other => {
            return Err(BridgeError::graph(
                SetupStage::AttachScheduler,
                format!("unsupported playback sample format: {other:?}"),
            ));
        }
    }
    .map_err(|err| BridgeError::graph(SetupStage::AttachScheduler, err.to_string()))?;

    Ok(stream)
}

fn build_capture_stream(
    device: &Device,
    supported: &SupportedStreamConfig,
    mut producer: HeapProd<f32>,
) -> Result<Stream, BridgeError> {
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.clone().into();

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Non-blocking push; drops samples if the scheduler is behind
                let _ = producer.push_slice(data);
            },
            capture_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Inline conversion to keep the callback allocation-free
                for &sample in data {
                    let _ = producer.try_push(f32::from(sample) / I16_MAX_SYMMETRIC);
                }
            },
            capture_error,
            None,
        ),
        other => {
            return Err(BridgeError::graph(
                SetupStage::InstallTap,
                format!("unsupported capture sample format: {other:?}"),
            ));
        }
    }
    .map_err(|err| BridgeError::graph(SetupStage::InstallTap, err.to_string()))?;

    Ok(stream)
}

impl AudioGraph for StreamGraph {
    fn teardown(&mut self) {
        // Capture first so the tap stops feeding, then the playback side.
        if let Some(stream) = self.capture.take() {
            let _ = stream.pause();
        }
        if let Some(stream) = self.playback.take() {
            let _ = stream.pause();
        }
        self.pending_producer = None;
        self.bound = None;
    }

    fn assign_devices(&mut self, capture: &DeviceId, output: &DeviceId) -> Result<(), BridgeError> {
        let host = cpal::default_host();

        // Resolution already matched by substring; the graph binds exact names.
        // A device can vanish between resolution and binding, which is a
        // graph-configuration failure, retried on the next trigger.
        let capture_device = find_device(host.input_devices(), capture).ok_or_else(|| {
            BridgeError::graph(
                SetupStage::AssignDevices,
                format!("capture device disappeared: {capture}"),
            )
        })?;
        let playback_device = find_device(host.output_devices(), output).ok_or_else(|| {
            BridgeError::graph(
                SetupStage::AssignDevices,
                format!("output device disappeared: {output}"),
            )
        })?;

        // The playback path's default config is the negotiated output format.
        let playback_config = playback_device
            .default_output_config()
            .map_err(|err| BridgeError::graph(SetupStage::AssignDevices, err.to_string()))?;
        let target_rate = playback_config.sample_rate();

        let mut capture_config = capture_device
            .default_input_config()
            .map_err(|err| BridgeError::graph(SetupStage::AssignDevices, err.to_string()))?;

        // Prefer capturing at the playback rate; loopback devices follow any
        // rate, physical microphones may not.
        if capture_config.sample_rate() != target_rate {
            if let Ok(mut ranges) = capture_device.supported_input_configs() {
                if let Some(range) = ranges
                    .find(|r| r.min_sample_rate() <= target_rate && target_rate <= r.max_sample_rate())
                {
                    capture_config = range.with_sample_rate(target_rate);
                }
            }
        }
        if capture_config.sample_rate() != target_rate {
            tracing::warn!(
                capture_rate = capture_config.sample_rate().0,
                playback_rate = target_rate.0,
                "sample rates differ; bridging without resampling"
            );
        }
        if capture_config.channels() != playback_config.channels() {
            tracing::warn!(
                capture_channels = capture_config.channels(),
                playback_channels = playback_config.channels(),
                "channel counts differ; bridging without remapping"
            );
        }

        self.bound = Some(BoundDevices {
            capture: capture_device,
            capture_config,
            playback: playback_device,
            playback_config,
        });
        Ok(())
    }

    fn attach_scheduler(&mut self) -> Result<(), BridgeError> {
        let bound = self.bound.as_ref().ok_or_else(|| {
            BridgeError::graph(SetupStage::AttachScheduler, "devices not assigned")
        })?;

        let ring = HeapRb::<f32>::new(self.ring_capacity);
        let (producer, consumer) = ring.split();

        let stream = build_playback_stream(
            &bound.playback,
            &bound.playback_config,
            consumer,
            self.volume.clone(),
        )?;

        self.pending_producer = Some(producer);
        self.playback = Some(stream);
        Ok(())
    }

    fn install_tap(&mut self) -> Result<(), BridgeError> {
        let bound = self
            .bound
            .as_ref()
            .ok_or_else(|| BridgeError::graph(SetupStage::InstallTap, "devices not assigned"))?;
        let producer = self
            .pending_producer
            .take()
            .ok_or_else(|| BridgeError::graph(SetupStage::InstallTap, "scheduler not attached"))?;

        // Dropping the previous stream detaches its callback - the CPAL
        // equivalent of removing the old tap before installing the new one.
        self.capture = None;
        let stream = build_capture_stream(&bound.capture, &bound.capture_config, producer)?;
        self.capture = Some(stream);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BridgeError> {
        let playback = self
            .playback
            .as_ref()
            .ok_or_else(|| BridgeError::graph(SetupStage::Start, "playback path not attached"))?;
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| BridgeError::graph(SetupStage::Start, "capture tap not installed"))?;

        playback
            .play()
            .map_err(|err| BridgeError::graph(SetupStage::Start, err.to_string()))?;
        capture
            .play()
            .map_err(|err| BridgeError::graph(SetupStage::Start, err.to_string()))?;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_enforced() {
        let mut graph = StreamGraph::default();

        // Scheduler and tap require assigned devices, start requires both.
        assert!(matches!(
            graph.attach_scheduler(),
            Err(BridgeError::GraphConfiguration {
                stage: SetupStage::AttachScheduler,
                ..
            })
        ));
        assert!(matches!(
            graph.install_tap(),
            Err(BridgeError::GraphConfiguration {
                stage: SetupStage::InstallTap,
                ..
            })
        ));
        assert!(matches!(
            graph.start(),
            Err(BridgeError::GraphConfiguration {
                stage: SetupStage::Start,
                ..
            })
        ));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut graph = StreamGraph::default();
        graph.teardown();
        graph.teardown();
    }

    #[test]
    fn test_volume_round_trips_through_atomic() {
        let mut graph = StreamGraph::default();
        graph.set_volume(0.25);
        assert_eq!(f32::from_bits(graph.volume.load(Ordering::Relaxed)), 0.25);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_assign_default_devices() {
        let host = cpal::default_host();
        let capture = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .map(DeviceId::from)
            .expect("default input device");
        let output = host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .map(DeviceId::from)
            .expect("default output device");

        let mut graph = StreamGraph::default();
        graph.assign_devices(&capture, &output).expect("assign");
        graph.attach_scheduler().expect("attach");
        graph.install_tap().expect("tap");
        graph.start().expect("start");
        graph.teardown();
    }
}
