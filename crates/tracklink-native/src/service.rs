//! The seam between the controller and the tracking service.
//!
//! Everything the controller knows about the outside world arrives through
//! [`TrackingService`]. Real transports and the in-memory
//! [`SimulatedService`](crate::simulation::SimulatedService) both implement it.

use core::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use tracklink_core::{
    BufferHandle, DeviceRecord, FailedDeviceRecord, FrameRecord, HeadPoseRecord, Perspective,
    SharedBuffer, Vector,
};

use crate::config::ConfigRequest;
use crate::error::ServiceResult;

// ============================================================================
// Policy flags
// ============================================================================

/// Bit set of optional service behaviours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyFlags(pub u32);

impl PolicyFlags {
    /// No optional behaviour
    pub const NONE: Self = Self(0);
    /// Keep delivering frames while the application is in the background
    pub const BACKGROUND_FRAMES: Self = Self(0x0001);
    /// Deliver camera images with each frame
    pub const IMAGES: Self = Self(0x0002);
    /// Optimize tracking for a head-mounted device
    pub const OPTIMIZE_HMD: Self = Self(0x0004);
    /// Allow the application to pause and resume the service
    pub const ALLOW_PAUSE_RESUME: Self = Self(0x0008);
    /// Deliver environment map points
    pub const MAP_POINTS: Self = Self(0x0080);

    /// True if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PolicyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for PolicyFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for PolicyFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Severity of a service log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSeverity {
    /// The service cannot continue normally
    Critical,
    /// Something degraded but tracking continues
    Warning,
    /// Informational
    Information,
}

/// Notifications pushed by the service.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceEvent {
    /// A device connection became available
    Connect,
    /// The device connection was lost
    Disconnect,
    /// The service itself became reachable
    ServiceConnect,
    /// The service went away
    ServiceDisconnect,
    /// A new tracking frame is ready
    Frame {
        /// Id of the new frame
        id: i64,
    },
    /// New camera images are ready
    Images,
    /// A device was attached or detached
    DeviceChange,
    /// A device failed to initialize
    DeviceFailure,
    /// The active policy flags changed
    PolicyChange {
        /// Flags now in effect
        flags: PolicyFlags,
    },
    /// The service logged a message
    LogMessage {
        /// Message severity
        severity: LogSeverity,
        /// Service time of the message, microseconds
        timestamp_us: i64,
        /// Message text
        message: String,
    },
}

// ============================================================================
// Service interface
// ============================================================================

/// Connection to a tracking service.
pub trait TrackingService: Send + Sync {
    /// Frame `history` steps back from the newest (0 = newest).
    ///
    /// # Errors
    ///
    /// `NotFound` when the service no longer holds that frame, `Disconnected`
    /// without a connection.
    fn frame(&self, history: usize) -> ServiceResult<FrameRecord>;

    /// Head pose at `timestamp_us`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no pose covers that time.
    fn head_pose(&self, timestamp_us: i64) -> ServiceResult<HeadPoseRecord>;

    /// Connected devices.
    fn devices(&self) -> Vec<DeviceRecord>;

    /// Devices that failed to initialize.
    fn failed_devices(&self) -> Vec<FailedDeviceRecord>;

    /// Pixels behind `handle`, if the service still holds them.
    fn shared_buffer(&self, handle: BufferHandle) -> Option<SharedBuffer>;

    /// Ray slopes for pixel `uv` of camera `perspective`.
    fn rectify(&self, perspective: Perspective, uv: Vector) -> Vector;

    /// Pixel for ray slopes `xy` of camera `perspective`.
    fn warp(&self, perspective: Perspective, xy: Vector) -> Vector;

    /// Channel that accepts configuration requests, if config is reachable.
    fn config_requests(&self) -> Option<mpsc::Sender<ConfigRequest>>;

    /// Register for service events, buffering up to `capacity` of them.
    fn subscribe(&self, _capacity: usize) -> Option<mpsc::Receiver<ServiceEvent>> {
        None
    }

    /// A device is connected and streaming.
    fn is_connected(&self) -> bool;

    /// The service is reachable.
    fn is_service_connected(&self) -> bool;

    /// Policy flags currently in effect.
    fn policy_flags(&self) -> PolicyFlags;

    /// Request a new set of policy flags.
    fn set_policy_flags(&self, flags: PolicyFlags);

    /// Pause or resume tracking.
    fn set_paused(&self, paused: bool);

    /// Whether tracking is paused.
    fn is_paused(&self) -> bool;

    /// Service clock, microseconds.
    fn now(&self) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_flag_ops() {
        let flags = PolicyFlags::IMAGES | PolicyFlags::MAP_POINTS;
        assert!(flags.contains(PolicyFlags::IMAGES));
        assert!(!flags.contains(PolicyFlags::OPTIMIZE_HMD));
        assert_eq!(flags & !PolicyFlags::IMAGES, PolicyFlags::MAP_POINTS);
        assert_eq!(flags.0, 0x82);
        assert!(PolicyFlags::NONE.is_empty());
        assert!(flags.contains(PolicyFlags::NONE));
    }

    #[test]
    fn test_policy_flags_serialize_as_bits() {
        let json = serde_json::to_string(&PolicyFlags::ALLOW_PAUSE_RESUME).unwrap();
        assert_eq!(json, "8");
        let back: PolicyFlags = serde_json::from_str("6").unwrap();
        assert_eq!(back, PolicyFlags::IMAGES | PolicyFlags::OPTIMIZE_HMD);
    }
}
