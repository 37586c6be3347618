//! The controller: entry point for applications.
//!
//! A [`Controller`] turns service records into handles. Frames are cached by
//! id in a bounded history, so asking twice for the same service frame
//! returns the same handle. Images produced by the controller hold it weakly
//! as their [`Calibration`] source; once the last controller clone is
//! dropped they stop rectifying.
//!
//! Listener callbacks are driven by [`Controller::dispatch`], either directly
//! or from an event pump fed by the service.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tracklink_core::{
    Calibration, Device, DeviceImpl, DeviceList, FailedDevice, FailedDeviceImpl, FailedDeviceList,
    Frame, FrameImpl, FrameRecord, HeadPose, HeadPoseImpl, Image, ImageImpl, ImageList, ImageRecord,
    Perspective, Vector,
};

use crate::config::Config;
use crate::error::ServiceResult;
use crate::listener::Listener;
use crate::service::{LogSeverity, PolicyFlags, ServiceEvent, TrackingService};
use crate::settings::ControllerSettings;

/// Shared state behind every clone of a [`Controller`].
pub struct ControllerImpl {
    service: Arc<dyn TrackingService>,
    settings: ControllerSettings,
    this: Weak<ControllerImpl>,
    frames: RwLock<VecDeque<Frame>>,
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl Calibration for ControllerImpl {
    fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector {
        self.service.rectify(perspective, uv)
    }

    fn warp(&self, perspective: Perspective, xy: Vector) -> Vector {
        self.service.warp(perspective, xy)
    }
}

/// Application handle on a tracking service. Clones share one controller.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerImpl>,
}

impl Controller {
    /// Controller over `service` with default settings.
    #[must_use]
    pub fn new(service: Arc<dyn TrackingService>) -> Self {
        Self::with_settings(service, ControllerSettings::default())
    }

    /// Controller over `service`; requests `settings.policy` if it is not empty.
    #[must_use]
    pub fn with_settings(service: Arc<dyn TrackingService>, settings: ControllerSettings) -> Self {
        info!(
            "Creating controller (history: {}, namespace: {:?})",
            settings.history_capacity, settings.server_namespace
        );
        let policy = settings.policy;
        let inner = Arc::new_cyclic(|this| ControllerImpl {
            service,
            settings,
            this: this.clone(),
            frames: RwLock::new(VecDeque::new()),
            listeners: RwLock::new(Vec::new()),
        });
        let controller = Self { inner };
        if !policy.is_empty() {
            controller.set_policy(policy);
        }
        controller
    }

    /// Settings this controller was built with.
    #[must_use]
    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    /// A device is connected and streaming.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.service.is_connected()
    }

    /// The service is reachable.
    #[must_use]
    pub fn is_service_connected(&self) -> bool {
        self.inner.service.is_service_connected()
    }

    // ========================================================================
    // Policy
    // ========================================================================

    /// Policy flags currently in effect.
    #[must_use]
    pub fn policy_flags(&self) -> PolicyFlags {
        self.inner.service.policy_flags()
    }

    /// Replace the policy flags.
    pub fn set_policy_flags(&self, flags: PolicyFlags) {
        info!("Setting policy flags to {:#x}", flags.0);
        self.inner.service.set_policy_flags(flags);
    }

    /// Add `policy` to the flags in effect.
    pub fn set_policy(&self, policy: PolicyFlags) {
        self.set_policy_flags(self.policy_flags() | policy);
    }

    /// Remove `policy` from the flags in effect.
    pub fn clear_policy(&self, policy: PolicyFlags) {
        self.set_policy_flags(self.policy_flags() & !policy);
    }

    /// Whether every bit of `policy` is in effect.
    #[must_use]
    pub fn is_policy_set(&self, policy: PolicyFlags) -> bool {
        self.policy_flags().contains(policy)
    }

    /// Pause or resume tracking.
    pub fn set_paused(&self, paused: bool) {
        info!("Tracking {}", if paused { "paused" } else { "resumed" });
        self.inner.service.set_paused(paused);
    }

    /// Whether tracking is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.service.is_paused()
    }

    /// Service clock, microseconds.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.inner.service.now()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register `listener`; false if it is already registered.
    ///
    /// Calls `on_init`, then `on_connect` if a device is already connected.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) -> bool {
        {
            let Ok(mut listeners) = self.inner.listeners.write() else {
                error!("Listener registry poisoned");
                return false;
            };
            if listeners.iter().any(|l| same_listener(l, &listener)) {
                return false;
            }
            listeners.push(Arc::clone(&listener));
            info!("Listener added ({} registered)", listeners.len());
        }
        listener.on_init(self);
        if self.is_connected() {
            listener.on_connect(self);
        }
        true
    }

    /// Unregister `listener`, calling its `on_exit`; false if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) -> bool {
        let removed = {
            let Ok(mut listeners) = self.inner.listeners.write() else {
                error!("Listener registry poisoned");
                return false;
            };
            let before = listeners.len();
            listeners.retain(|l| !same_listener(l, listener));
            before != listeners.len()
        };
        if removed {
            info!("Listener removed");
            listener.on_exit(self);
        }
        removed
    }

    /// Deliver `event` to every registered listener.
    pub fn dispatch(&self, event: &ServiceEvent) {
        // Snapshot so callbacks may add or remove listeners.
        let listeners: Vec<Arc<dyn Listener>> = match self.inner.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => {
                error!("Listener registry poisoned");
                return;
            }
        };

        if let ServiceEvent::LogMessage { severity, message, .. } = event {
            match severity {
                LogSeverity::Critical => error!("Service: {}", message),
                LogSeverity::Warning => warn!("Service: {}", message),
                LogSeverity::Information => info!("Service: {}", message),
            }
        }

        for listener in &listeners {
            match event {
                ServiceEvent::Connect => listener.on_connect(self),
                ServiceEvent::Disconnect => listener.on_disconnect(self),
                ServiceEvent::ServiceConnect => listener.on_service_connect(self),
                ServiceEvent::ServiceDisconnect => listener.on_service_disconnect(self),
                ServiceEvent::Frame { .. } => listener.on_frame(self),
                ServiceEvent::Images => listener.on_images(self),
                ServiceEvent::DeviceChange => listener.on_device_change(self),
                ServiceEvent::DeviceFailure => listener.on_device_failure(self),
                ServiceEvent::PolicyChange { .. } => listener.on_policy_change(self),
                ServiceEvent::LogMessage {
                    severity,
                    timestamp_us,
                    message,
                } => listener.on_log_message(self, *severity, *timestamp_us, message),
            }
        }
    }

    /// Dispatch events from `events` until the channel closes.
    pub async fn run_events(&self, mut events: mpsc::Receiver<ServiceEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(&event);
        }
        debug!("Event channel closed");
    }

    /// Subscribe to the service and dispatch its events on a background task.
    ///
    /// The task holds the controller weakly and stops once it is dropped.
    /// Returns `None` outside a tokio runtime or if the service publishes no
    /// events.
    pub fn spawn_event_pump(&self) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime, event pump not started");
            return None;
        };
        let mut events = self
            .inner
            .service
            .subscribe(self.inner.settings.event_channel_capacity)?;
        let weak = Arc::downgrade(&self.inner);
        Some(runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Controller { inner }.dispatch(&event);
            }
            debug!("Event pump stopped");
        }))
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Frame `history` steps back from the newest.
    ///
    /// Any service failure is logged and yields a fresh invalid frame, so a
    /// lost connection reads the same as a missing frame. Use
    /// [`Controller::try_frame`] to tell `Disconnected` from `NotFound`.
    #[must_use]
    pub fn frame(&self, history: usize) -> Frame {
        match self.try_frame(history) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame {} unavailable: {}", history, e);
                Frame::default()
            }
        }
    }

    /// Frame `history` steps back from the newest.
    ///
    /// # Errors
    ///
    /// Whatever the service reports, typically `NotFound` or `Disconnected`.
    pub fn try_frame(&self, history: usize) -> ServiceResult<Frame> {
        let record = self.inner.service.frame(history)?;
        if let Some(frame) = self.cached_frame(record.id) {
            debug!("Frame cache hit: {}", record.id);
            return Ok(frame);
        }
        debug!("Frame cache miss: {}", record.id);
        let frame = Frame::new(self.build_frame(record));
        Ok(self.cache_frame(frame))
    }

    /// Images of the newest frame.
    #[must_use]
    pub fn images(&self) -> ImageList {
        self.frame(0).images()
    }

    /// Raw images of the newest frame.
    #[must_use]
    pub fn raw_images(&self) -> ImageList {
        self.frame(0).raw_images()
    }

    /// Head pose at `timestamp_us`; a fresh invalid pose when unavailable.
    #[must_use]
    pub fn head_pose(&self, timestamp_us: i64) -> HeadPose {
        match self.inner.service.head_pose(timestamp_us) {
            Ok(record) => HeadPose::new(Arc::new(HeadPoseImpl::new(record))),
            Err(e) => {
                warn!("Head pose at {} unavailable: {}", timestamp_us, e);
                HeadPose::default()
            }
        }
    }

    fn cached_frame(&self, id: i64) -> Option<Frame> {
        let frames = self.inner.frames.read().ok()?;
        frames.iter().find(|f| f.id() == id).cloned()
    }

    /// Insert `frame`, or return the entry another caller cached for the same id first.
    fn cache_frame(&self, frame: Frame) -> Frame {
        let capacity = self.inner.settings.history_capacity;
        let Ok(mut frames) = self.inner.frames.write() else {
            return frame;
        };
        if let Some(existing) = frames.iter().find(|f| f.id() == frame.id()) {
            return existing.clone();
        }
        frames.push_back(frame.clone());
        while frames.len() > capacity {
            frames.pop_front();
        }
        frame
    }

    fn build_frame(&self, record: FrameRecord) -> Arc<FrameImpl> {
        let images = self.build_images(&record.images);
        let raw_images = self.build_images(&record.raw_images);
        FrameImpl::build(record, images, raw_images)
    }

    fn build_images(&self, records: &[ImageRecord]) -> ImageList {
        let calibration: Weak<dyn Calibration> = self.inner.this.clone();
        records
            .iter()
            .map(|record| {
                let data = record.buffer.and_then(|b| self.inner.service.shared_buffer(b));
                if record.buffer.is_some() && data.is_none() {
                    debug!("Image buffer released before frame {} was read", record.frame_id);
                }
                Image::new(Arc::new(ImageImpl::new(Some(calibration.clone()), record.clone(), data)))
            })
            .collect()
    }

    // ========================================================================
    // Devices and config
    // ========================================================================

    /// Connected devices.
    #[must_use]
    pub fn devices(&self) -> DeviceList {
        self.inner
            .service
            .devices()
            .into_iter()
            .map(|r| Device::new(Arc::new(DeviceImpl::new(r))))
            .collect()
    }

    /// Devices that failed to initialize.
    #[must_use]
    pub fn failed_devices(&self) -> FailedDeviceList {
        self.inner
            .service
            .failed_devices()
            .into_iter()
            .map(|r| FailedDevice::new(Arc::new(FailedDeviceImpl::new(r))))
            .collect()
    }

    /// Proxy for the service configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new(self.inner.service.config_requests(), self.inner.settings.config_timeout())
    }
}

fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}
