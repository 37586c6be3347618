//! Connected and failed tracking devices.

use std::sync::OnceLock;

use crate::boundary::SensingVolume;
use crate::handle::{Handle, Implementation};
use crate::list::List;
use crate::math::Vector;
use crate::records::{DeviceRecord, DeviceType, FailedDeviceRecord, FailureType};

/// A connected device.
pub type Device = Handle<DeviceImpl>;
/// A device that failed to initialize.
pub type FailedDevice = Handle<FailedDeviceImpl>;
/// Ordered devices.
pub type DeviceList = List<DeviceImpl>;
/// Ordered failed devices.
pub type FailedDeviceList = List<FailedDeviceImpl>;

// ============================================================================
// Device
// ============================================================================

/// Backing data of a [`Device`].
#[derive(Default)]
pub struct DeviceImpl {
    record: Option<DeviceRecord>,
}

impl DeviceImpl {
    /// Device built from service data.
    #[must_use]
    pub fn new(record: DeviceRecord) -> Self {
        Self { record: Some(record) }
    }

    fn record(&self) -> &DeviceRecord {
        static INVALID: OnceLock<DeviceRecord> = OnceLock::new();
        self.record
            .as_ref()
            .unwrap_or_else(|| INVALID.get_or_init(DeviceRecord::invalid))
    }
}

impl Implementation for DeviceImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        match &self.record {
            Some(r) => format!("Device {} ({})", r.serial_number, r.device_type.as_str()),
            None => "Invalid Device".to_string(),
        }
    }

    fn sentinel() -> &'static Device {
        static INVALID: OnceLock<Device> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<DeviceImpl> {
    /// Service-assigned device id; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.implementation().record.as_ref().map_or(-1, |r| i64::from(r.id))
    }

    /// Full horizontal field of view, radians.
    #[must_use]
    pub fn horizontal_view_angle(&self) -> f32 {
        self.implementation().record().horizontal_view_angle
    }

    /// Full vertical field of view, radians.
    #[must_use]
    pub fn vertical_view_angle(&self) -> f32 {
        self.implementation().record().vertical_view_angle
    }

    /// Maximum sensing distance.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.implementation().record().range
    }

    /// Distance between the two cameras.
    #[must_use]
    pub fn baseline(&self) -> f32 {
        self.implementation().record().baseline
    }

    /// Field of view and range as a volume.
    #[must_use]
    pub fn sensing_volume(&self) -> SensingVolume {
        SensingVolume::new(self.horizontal_view_angle(), self.vertical_view_angle(), self.range())
    }

    /// Distance from `position` to the edge of the sensing volume.
    ///
    /// 0 for an invalid device and for points beyond range.
    #[must_use]
    pub fn distance_to_boundary(&self, position: &Vector) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        self.sensing_volume().distance_to_boundary(position)
    }

    /// Device is delivering frames.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.implementation().record().streaming
    }

    /// Device window is smudged.
    #[must_use]
    pub fn is_smudged(&self) -> bool {
        self.implementation().record().smudged
    }

    /// Ambient light is interfering with tracking.
    #[must_use]
    pub fn is_lighting_bad(&self) -> bool {
        self.implementation().record().lighting_bad
    }

    /// Hardware serial number; empty when invalid.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.implementation().record().serial_number
    }

    /// Hardware family.
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.implementation().record().device_type
    }
}

// ============================================================================
// Failed device
// ============================================================================

/// Backing data of a [`FailedDevice`].
#[derive(Default)]
pub struct FailedDeviceImpl {
    record: Option<FailedDeviceRecord>,
}

impl FailedDeviceImpl {
    /// Failed device built from service data.
    #[must_use]
    pub fn new(record: FailedDeviceRecord) -> Self {
        Self { record: Some(record) }
    }
}

impl Implementation for FailedDeviceImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        match &self.record {
            Some(r) => format!("FailedDevice {} ({:?})", r.pnp_id, r.failure),
            None => "Invalid FailedDevice".to_string(),
        }
    }

    fn sentinel() -> &'static FailedDevice {
        static INVALID: OnceLock<FailedDevice> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<FailedDeviceImpl> {
    /// Failure reason; unknown when invalid.
    #[must_use]
    pub fn failure(&self) -> FailureType {
        self.implementation()
            .record
            .as_ref()
            .map_or(FailureType::Unknown, |r| r.failure)
    }

    /// Plug-and-play id; empty when invalid.
    #[must_use]
    pub fn pnp_id(&self) -> &str {
        self.implementation()
            .record
            .as_ref()
            .map_or("", |r| r.pnp_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::synthetic::device_record;

    #[test]
    fn test_invalid_device_neutral_values() {
        let device = Device::invalid();
        assert!(!device.is_valid());
        assert_eq!(device.id(), -1);
        assert_eq!(Device::default().id(), -1);
        assert_eq!(device.range(), 0.0);
        assert_eq!(device.serial_number(), "");
        assert_eq!(device.device_type(), DeviceType::Unknown);
        assert!(!device.is_streaming());
        assert_eq!(device.distance_to_boundary(&Vector::new(0.0, 0.1, 0.0)), 0.0);
    }

    #[test]
    fn test_device_delegates_boundary_distance() {
        let device = Device::new(Arc::new(DeviceImpl::new(device_record(1, "LP-0001"))));
        let p = Vector::new(0.0, 540.0, 0.0);
        let expected = device.sensing_volume().distance_to_boundary(&p);
        assert!((device.distance_to_boundary(&p) - expected).abs() < f32::EPSILON);
        assert!((expected - 60.0).abs() < 1e-2);
        assert_eq!(device.id(), 1);
        assert_eq!(device.distance_to_boundary(&Vector::new(0.0, 900.0, 0.0)), 0.0);
        assert_eq!(device.to_string(), "Device LP-0001 (TYPE_RIGEL)");
    }

    #[test]
    fn test_failed_device() {
        let failed = FailedDevice::new(Arc::new(FailedDeviceImpl::new(FailedDeviceRecord {
            pnp_id: "USB\\VID_2936".to_string(),
            failure: FailureType::Firmware,
        })));
        assert_eq!(failed.failure(), FailureType::Firmware);
        assert_eq!(failed.pnp_id(), "USB\\VID_2936");
        assert_eq!(FailedDevice::invalid().failure(), FailureType::Unknown);
        assert_eq!(FailedDevice::invalid().pnp_id(), "");
    }
}
