//! Deterministic in-memory tracking service.
//!
//! [`SimulatedService`] stands in for a real service in tests, demos and the
//! CLI. It holds a frame history, devices, pixel buffers and a configuration
//! store, all loadable from a JSON fixture. Configuration requests are only
//! answered once [`SimulatedService::spawn_config_server`] has been called,
//! optionally after an artificial latency.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tracklink_core::{
    synthetic, BufferHandle, DeviceRecord, FailedDeviceRecord, FailureType, FrameRecord,
    HeadPoseRecord, ImageFormat, ImageRecord, Perspective, Quaternion, SharedBuffer, Vector,
};

use crate::config::{ConfigRequest, ConfigValue};
use crate::error::{ServiceError, ServiceResult};
use crate::service::{PolicyFlags, ServiceEvent, TrackingService};

/// Frames held by a simulated service unless a fixture says otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 120;

/// Queue depth of the configuration request channel.
const CONFIG_QUEUE_DEPTH: usize = 32;

// ============================================================================
// Calibration model
// ============================================================================

/// Pinhole camera model shared by both cameras of a stereo pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearCalibration {
    /// Focal length, pixels
    pub focal_length: f32,
    /// Principal point x, pixels
    pub center_x: f32,
    /// Principal point y, pixels
    pub center_y: f32,
    /// Ray slope offset of each camera from the pair's center line
    pub stereo_offset: f32,
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self {
            focal_length: 400.0,
            center_x: 320.0,
            center_y: 120.0,
            stereo_offset: 0.05,
        }
    }
}

impl LinearCalibration {
    fn offset(&self, perspective: Perspective) -> f32 {
        match perspective {
            Perspective::StereoLeft => -self.stereo_offset,
            Perspective::StereoRight => self.stereo_offset,
        }
    }

    /// Ray slopes for a pixel.
    #[must_use]
    pub fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector {
        Vector::new(
            (uv.x - self.center_x) / self.focal_length + self.offset(perspective),
            (uv.y - self.center_y) / self.focal_length,
            0.0,
        )
    }

    /// Pixel for ray slopes; the inverse of [`LinearCalibration::rectify`].
    #[must_use]
    pub fn warp(&self, perspective: Perspective, xy: Vector) -> Vector {
        Vector::new(
            (xy.x - self.offset(perspective)) * self.focal_length + self.center_x,
            xy.y * self.focal_length + self.center_y,
            0.0,
        )
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Pixel buffer entry of a fixture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureBuffer {
    /// Handle images refer to
    pub handle: BufferHandle,
    /// Pixel bytes
    pub bytes: Vec<u8>,
}

/// Everything a simulated service serves, as one JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedFixture {
    /// Frames, oldest first
    pub frames: Vec<FrameRecord>,
    /// Head poses, oldest first
    pub head_poses: Vec<HeadPoseRecord>,
    /// Connected devices
    pub devices: Vec<DeviceRecord>,
    /// Devices that failed to initialize
    pub failed_devices: Vec<FailedDeviceRecord>,
    /// Image pixel buffers
    pub buffers: Vec<FixtureBuffer>,
    /// Initial configuration
    pub config: HashMap<String, ConfigValue>,
    /// Camera model for rectify and warp
    pub calibration: LinearCalibration,
    /// Frames kept before the oldest are dropped
    pub history_limit: usize,
}

impl Default for SimulatedFixture {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            head_poses: Vec::new(),
            devices: Vec::new(),
            failed_devices: Vec::new(),
            buffers: Vec::new(),
            config: HashMap::new(),
            calibration: LinearCalibration::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl SimulatedFixture {
    /// One device, one failed device, one head pose and a single frame with
    /// two hands and a stereo image pair.
    #[must_use]
    pub fn demo() -> Self {
        let mut frame = synthetic::frame_record(1);
        let mut buffers = Vec::new();
        for (index, handle) in [(0, BufferHandle(1)), (1, BufferHandle(2))] {
            frame.images.push(demo_image(frame.id, frame.timestamp_us, index, handle));
            buffers.push(FixtureBuffer {
                handle,
                bytes: (0..DEMO_IMAGE_WIDTH * DEMO_IMAGE_HEIGHT)
                    .map(|i| (i % 251) as u8)
                    .collect(),
            });
        }

        let config = [
            ("tracking_processing_auto_flip", ConfigValue::Bool(false)),
            ("power_saving_adapter", ConfigValue::Bool(true)),
            ("robust_mode_enabled", ConfigValue::Bool(false)),
            ("image_processing_auto_exposure", ConfigValue::Int32(1)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            head_poses: vec![HeadPoseRecord {
                timestamp_us: frame.timestamp_us,
                position: Vector::new(0.0, 0.0, 0.0),
                orientation: Quaternion::identity(),
            }],
            frames: vec![frame],
            devices: vec![synthetic::device_record(1, "LP00000000001")],
            failed_devices: vec![FailedDeviceRecord {
                pnp_id: "USB\\VID_2936&PID_1202".to_string(),
                failure: FailureType::Firmware,
            }],
            buffers,
            config,
            ..Self::default()
        }
    }
}

const DEMO_IMAGE_WIDTH: usize = 64;
const DEMO_IMAGE_HEIGHT: usize = 24;

fn demo_image(frame_id: i64, timestamp_us: i64, index: i32, handle: BufferHandle) -> ImageRecord {
    let grid = 4;
    ImageRecord {
        frame_id,
        sequence_id: frame_id,
        timestamp_us,
        perspective_index: index,
        width: DEMO_IMAGE_WIDTH as i32,
        height: DEMO_IMAGE_HEIGHT as i32,
        bytes_per_pixel: 1,
        format: ImageFormat::Infrared,
        buffer: Some(handle),
        distortion: (0..grid * grid * 2).map(|i| i as f32 / (grid * grid * 2) as f32).collect(),
        distortion_width: grid,
        distortion_height: grid,
        ray_offset: [0.5, 0.5],
        ray_scale: [0.125, 0.125],
    }
}

// ============================================================================
// Service
// ============================================================================

struct SimState {
    frames: VecDeque<FrameRecord>,
    history_limit: usize,
    head_poses: Vec<HeadPoseRecord>,
    devices: Vec<DeviceRecord>,
    failed_devices: Vec<FailedDeviceRecord>,
    buffers: HashMap<BufferHandle, SharedBuffer>,
    config: HashMap<String, ConfigValue>,
    config_latency: Duration,
    calibration: LinearCalibration,
    connected: bool,
    service_connected: bool,
    policy: PolicyFlags,
    paused: bool,
    clock_us: i64,
    events: Option<mpsc::Sender<ServiceEvent>>,
}

/// In-memory [`TrackingService`].
pub struct SimulatedService {
    state: RwLock<SimState>,
    config_tx: mpsc::Sender<ConfigRequest>,
    config_rx: Mutex<Option<mpsc::Receiver<ConfigRequest>>>,
}

impl SimulatedService {
    /// Service serving `fixture`, connected and with a clock at the newest frame.
    #[must_use]
    pub fn from_fixture(fixture: SimulatedFixture) -> Self {
        let clock_us = fixture.frames.last().map_or(0, |f| f.timestamp_us);
        let mut frames: VecDeque<FrameRecord> = fixture.frames.into();
        while frames.len() > fixture.history_limit {
            frames.pop_front();
        }
        let (config_tx, config_rx) = mpsc::channel(CONFIG_QUEUE_DEPTH);
        Self {
            state: RwLock::new(SimState {
                frames,
                history_limit: fixture.history_limit,
                head_poses: fixture.head_poses,
                devices: fixture.devices,
                failed_devices: fixture.failed_devices,
                buffers: fixture
                    .buffers
                    .into_iter()
                    .map(|b| (b.handle, SharedBuffer::from(b.bytes)))
                    .collect(),
                config: fixture.config,
                config_latency: Duration::ZERO,
                calibration: fixture.calibration,
                connected: true,
                service_connected: true,
                policy: PolicyFlags::NONE,
                paused: false,
                clock_us,
                events: None,
            }),
            config_tx,
            config_rx: Mutex::new(Some(config_rx)),
        }
    }

    /// Service serving [`SimulatedFixture::demo`].
    #[must_use]
    pub fn demo() -> Self {
        Self::from_fixture(SimulatedFixture::demo())
    }

    /// Service serving a JSON fixture.
    ///
    /// # Errors
    ///
    /// `Fixture` if the document does not parse.
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        let fixture: SimulatedFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Service serving a JSON fixture file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Fixture` if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        info!("Loading fixture from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn read(&self) -> RwLockReadGuard<'_, SimState> {
        // State is plain data; a panic mid-update leaves it usable.
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SimState> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn emit(state: &SimState, event: ServiceEvent) {
        if let Some(events) = &state.events {
            if let Err(e) = events.try_send(event) {
                warn!("Dropping service event: {}", e);
            }
        }
    }

    /// Append a frame as the newest, advance the clock and announce it.
    pub fn push_frame(&self, frame: FrameRecord) {
        let mut state = self.write();
        let id = frame.id;
        state.clock_us = state.clock_us.max(frame.timestamp_us);
        state.frames.push_back(frame);
        while state.frames.len() > state.history_limit {
            state.frames.pop_front();
        }
        debug!("Pushed frame {}", id);
        Self::emit(&state, ServiceEvent::Frame { id });
    }

    /// Store pixels under `handle`.
    pub fn insert_buffer(&self, handle: BufferHandle, bytes: Vec<u8>) {
        self.write().buffers.insert(handle, SharedBuffer::from(bytes));
    }

    /// Drop the pixels under `handle`, as the service does once it recycles them.
    pub fn release_buffer(&self, handle: BufferHandle) {
        self.write().buffers.remove(&handle);
    }

    /// Attach a device and announce the change.
    pub fn attach_device(&self, device: DeviceRecord) {
        let mut state = self.write();
        state.devices.push(device);
        Self::emit(&state, ServiceEvent::DeviceChange);
    }

    /// Mark the device connection up or down and announce it.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.write();
        state.connected = connected;
        let event = if connected {
            ServiceEvent::Connect
        } else {
            ServiceEvent::Disconnect
        };
        Self::emit(&state, event);
    }

    /// Mark the service itself reachable or gone and announce it.
    pub fn set_service_connected(&self, connected: bool) {
        let mut state = self.write();
        state.service_connected = connected;
        let event = if connected {
            ServiceEvent::ServiceConnect
        } else {
            ServiceEvent::ServiceDisconnect
        };
        Self::emit(&state, event);
    }

    /// Delay every configuration reply by `latency`.
    pub fn set_config_latency(&self, latency: Duration) {
        self.write().config_latency = latency;
    }

    /// Answer configuration requests on a background task.
    ///
    /// The task holds the service weakly and ends when the service is
    /// dropped. Returns `None` if the server was already started or no
    /// tokio runtime is running.
    pub fn spawn_config_server(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let mut requests = self
            .config_rx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()?;
        let weak: Weak<Self> = Arc::downgrade(self);
        Some(runtime.spawn(async move {
            while let Some(request) = requests.recv().await {
                let Some(service) = weak.upgrade() else {
                    break;
                };
                let latency = service.read().config_latency;
                drop(service);
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                match weak.upgrade() {
                    Some(service) => service.answer(request),
                    None => break,
                }
            }
            debug!("Config server stopped");
        }))
    }

    fn answer(&self, request: ConfigRequest) {
        match request {
            ConfigRequest::Get { key, response_tx } => {
                let reply = self
                    .read()
                    .config
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| ServiceError::NotFound(format!("config key {key}")));
                let _ = response_tx.send(reply);
            }
            ConfigRequest::Set {
                key,
                value,
                response_tx,
            } => {
                debug!("Config {} = {}", key, value);
                self.write().config.insert(key, value);
                let _ = response_tx.send(Ok(()));
            }
        }
    }
}

impl TrackingService for SimulatedService {
    fn frame(&self, history: usize) -> ServiceResult<FrameRecord> {
        let state = self.read();
        if !state.service_connected {
            return Err(ServiceError::Disconnected);
        }
        history
            .checked_add(1)
            .and_then(|back| state.frames.len().checked_sub(back))
            .and_then(|i| state.frames.get(i))
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("frame history {history}")))
    }

    fn head_pose(&self, timestamp_us: i64) -> ServiceResult<HeadPoseRecord> {
        self.read()
            .head_poses
            .iter()
            .rev()
            .find(|p| p.timestamp_us <= timestamp_us)
            .copied()
            .ok_or_else(|| ServiceError::NotFound(format!("head pose at {timestamp_us}")))
    }

    fn devices(&self) -> Vec<DeviceRecord> {
        self.read().devices.clone()
    }

    fn failed_devices(&self) -> Vec<FailedDeviceRecord> {
        self.read().failed_devices.clone()
    }

    fn shared_buffer(&self, handle: BufferHandle) -> Option<SharedBuffer> {
        self.read().buffers.get(&handle).cloned()
    }

    fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector {
        self.read().calibration.rectify(perspective, uv)
    }

    fn warp(&self, perspective: Perspective, xy: Vector) -> Vector {
        self.read().calibration.warp(perspective, xy)
    }

    fn config_requests(&self) -> Option<mpsc::Sender<ConfigRequest>> {
        self.read().service_connected.then(|| self.config_tx.clone())
    }

    fn subscribe(&self, capacity: usize) -> Option<mpsc::Receiver<ServiceEvent>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.write().events = Some(tx);
        Some(rx)
    }

    fn is_connected(&self) -> bool {
        let state = self.read();
        state.connected && state.devices.iter().any(|d| d.streaming)
    }

    fn is_service_connected(&self) -> bool {
        self.read().service_connected
    }

    fn policy_flags(&self) -> PolicyFlags {
        self.read().policy
    }

    fn set_policy_flags(&self, flags: PolicyFlags) {
        let mut state = self.write();
        if state.policy != flags {
            state.policy = flags;
            Self::emit(&state, ServiceEvent::PolicyChange { flags });
        }
    }

    fn set_paused(&self, paused: bool) {
        let mut state = self.write();
        if paused && !state.policy.contains(PolicyFlags::ALLOW_PAUSE_RESUME) {
            warn!("Pause requested without the pause/resume policy");
            return;
        }
        state.paused = paused;
    }

    fn is_paused(&self) -> bool {
        self.read().paused
    }

    fn now(&self) -> i64 {
        self.read().clock_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_demo_contents() {
        let service = SimulatedService::demo();
        let frame = service.frame(0).unwrap();
        assert_eq!(frame.id, 1);
        assert_eq!(frame.hands.len(), 2);
        assert_eq!(frame.images.len(), 2);
        assert!(service.shared_buffer(BufferHandle(1)).is_some());
        assert!(service.is_connected());
        assert_eq!(service.now(), frame.timestamp_us);
        assert!(matches!(service.frame(1), Err(ServiceError::NotFound(_))));
        assert!(matches!(service.frame(usize::MAX), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let service = SimulatedService::from_fixture(SimulatedFixture {
            history_limit: 3,
            ..SimulatedFixture::default()
        });
        for id in 1..=5 {
            service.push_frame(synthetic::frame_record(id));
        }
        assert_eq!(service.frame(0).unwrap().id, 5);
        assert_eq!(service.frame(2).unwrap().id, 3);
        assert!(service.frame(3).is_err());
    }

    #[test]
    fn test_fixture_json_round_trip() {
        let json = serde_json::to_string(&SimulatedFixture::demo()).unwrap();
        let service = SimulatedService::from_json(&json).unwrap();
        assert_eq!(service.devices().len(), 1);
        assert_eq!(service.failed_devices()[0].failure, FailureType::Firmware);

        let sparse = SimulatedService::from_json(r#"{"devices": []}"#).unwrap();
        assert!(sparse.frame(0).is_err());
        assert!(!sparse.is_connected());

        assert!(matches!(
            SimulatedService::from_json("[1, 2"),
            Err(ServiceError::Fixture(_))
        ));
    }

    #[test]
    fn test_calibration_inverts() {
        let calibration = LinearCalibration::default();
        let uv = Vector::new(100.0, 50.0, 0.0);
        for perspective in [Perspective::StereoLeft, Perspective::StereoRight] {
            let back = calibration.warp(perspective, calibration.rectify(perspective, uv));
            assert!((back.x - uv.x).abs() < 1e-3);
            assert!((back.y - uv.y).abs() < 1e-3);
        }
        let left = calibration.rectify(Perspective::StereoLeft, uv);
        let right = calibration.rectify(Perspective::StereoRight, uv);
        assert!((right.x - left.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pause_requires_policy() {
        let service = SimulatedService::demo();
        service.set_paused(true);
        assert!(!service.is_paused());
        service.set_policy_flags(PolicyFlags::ALLOW_PAUSE_RESUME);
        service.set_paused(true);
        assert!(service.is_paused());
    }

    #[test]
    fn test_released_buffer_is_gone() {
        let service = SimulatedService::demo();
        service.insert_buffer(BufferHandle(9), vec![1, 2, 3]);
        assert_eq!(service.shared_buffer(BufferHandle(9)).map(|b| b.len()), Some(3));
        service.release_buffer(BufferHandle(9));
        assert!(service.shared_buffer(BufferHandle(9)).is_none());
    }

    #[tokio::test]
    async fn test_config_server_answers() {
        let service = Arc::new(SimulatedService::demo());
        let server = service.spawn_config_server();
        assert!(server.is_some());
        assert!(service.spawn_config_server().is_none());

        let config = Config::new(service.config_requests(), Duration::from_secs(1));
        assert_eq!(
            config.get("power_saving_adapter").await.unwrap(),
            ConfigValue::Bool(true)
        );
        config
            .set_value("robust_mode_enabled", ConfigValue::Bool(true))
            .await
            .unwrap();
        assert_eq!(
            config.get("robust_mode_enabled").await.unwrap(),
            ConfigValue::Bool(true)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_latency_past_deadline_times_out() {
        let service = Arc::new(SimulatedService::demo());
        service.set_config_latency(Duration::from_secs(5));
        let _server = service.spawn_config_server();

        let config = Config::new(service.config_requests(), Duration::from_secs(1));
        let result = config.value("power_saving_adapter", Duration::from_millis(500)).await;
        assert!(matches!(result, Err(ServiceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_events_follow_changes() {
        let service = SimulatedService::demo();
        let mut events = service.subscribe(8).unwrap();
        service.push_frame(synthetic::frame_record(2));
        service.set_policy_flags(PolicyFlags::IMAGES);
        service.set_connected(false);

        assert_eq!(events.recv().await, Some(ServiceEvent::Frame { id: 2 }));
        assert_eq!(
            events.recv().await,
            Some(ServiceEvent::PolicyChange {
                flags: PolicyFlags::IMAGES
            })
        );
        assert_eq!(events.recv().await, Some(ServiceEvent::Disconnect));
        assert!(!service.is_connected());
    }
}
