//! Plain data delivered by the tracking service.
//!
//! Records carry no behavior beyond construction helpers. Handles wrap them
//! and derive every public property from them. Each record type exposes an
//! `invalid()` instance whose fields are the neutral values returned by
//! invalid handles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vector};

/// Shared, immutable pixel storage handed out by the service.
pub type SharedBuffer = Arc<[u8]>;

// ============================================================================
// Enumerations
// ============================================================================

/// Which hand a record describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chirality {
    /// Left hand
    #[default]
    Left,
    /// Right hand
    Right,
}

/// Anatomical finger identity, indexed from the thumb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerType {
    /// Thumb
    #[default]
    Thumb = 0,
    /// Index finger
    Index = 1,
    /// Middle finger
    Middle = 2,
    /// Ring finger
    Ring = 3,
    /// Pinky finger
    Pinky = 4,
}

impl FingerType {
    /// All finger types in digit order.
    pub const ALL: [Self; 5] = [Self::Thumb, Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    /// Finger type for a digit id, or `None` outside `0..5`.
    #[must_use]
    pub fn from_digit(digit: i32) -> Option<Self> {
        usize::try_from(digit).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Bone position along a finger, from the palm outwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoneType {
    /// Bone inside the palm
    #[default]
    Metacarpal = 0,
    /// Bone nearest the palm
    Proximal = 1,
    /// Middle bone
    Intermediate = 2,
    /// Fingertip bone
    Distal = 3,
}

impl BoneType {
    /// All bone types in anatomical order.
    pub const ALL: [Self; 4] = [Self::Metacarpal, Self::Proximal, Self::Intermediate, Self::Distal];
}

/// Hardware family of a tracking device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Unrecognized hardware
    #[default]
    Unknown,
    /// Standalone USB peripheral
    Peripheral,
    /// Second-generation embedded module
    Rigel,
    /// Wide field-of-view module
    Nightcrawler,
}

impl DeviceType {
    /// Stable string name for the device type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "TYPE_UNKNOWN",
            Self::Peripheral => "TYPE_PERIPHERAL",
            Self::Rigel => "TYPE_RIGEL",
            Self::Nightcrawler => "TYPE_NIGHTCRAWLER",
        }
    }
}

/// Reason a device could not be brought up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureType {
    /// Unspecified failure
    #[default]
    Unknown = 0,
    /// Calibration data missing or corrupt
    Calibration = 1,
    /// Firmware rejected or outdated
    Firmware = 2,
    /// Transport (USB) failure
    Transport = 3,
    /// Control channel failure
    Control = 4,
}

/// Pixel layout of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Single channel infrared
    #[default]
    Infrared,
    /// Bayer RGB-IR mosaic
    Ibrg,
}

/// Camera a stereo image came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perspective {
    /// Left camera of the stereo pair
    StereoLeft,
    /// Right camera of the stereo pair
    StereoRight,
}

impl Perspective {
    /// Perspective for an image index within a stereo pair.
    #[must_use]
    pub const fn from_index(index: i32) -> Self {
        if index == 0 {
            Self::StereoLeft
        } else {
            Self::StereoRight
        }
    }
}

/// Opaque reference to a pixel buffer held by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferHandle(pub u64);

// ============================================================================
// Hand data
// ============================================================================

/// One bone segment: two joints plus an orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    /// Joint nearest the wrist
    pub prev_joint: Vector,
    /// Joint nearest the fingertip
    pub next_joint: Vector,
    /// Average width of the flesh around the bone
    pub width: f32,
    /// Orientation of the bone
    pub rotation: Quaternion,
}

impl BoneRecord {
    /// Neutral bone.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// One digit with its four bones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DigitRecord {
    /// Digit index within the hand, 0 (thumb) to 4 (pinky)
    pub finger_id: i32,
    /// Whether the finger is considered straight
    pub is_extended: bool,
    /// Bones indexed by [`BoneType`]
    pub bones: [BoneRecord; 4],
}

impl DigitRecord {
    /// Neutral digit.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Digit record carrying only an id, with neutral bones.
    #[must_use]
    pub fn with_id(finger_id: i32) -> Self {
        Self {
            finger_id,
            ..Self::default()
        }
    }
}

/// Palm pose and kinematics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PalmRecord {
    /// Palm center
    pub position: Vector,
    /// Palm center after service-side stabilization
    pub stabilized_position: Vector,
    /// Palm velocity
    pub velocity: Vector,
    /// Unit vector out of the palm
    pub normal: Vector,
    /// Palm width
    pub width: f32,
    /// Unit vector from the palm towards the fingers
    pub direction: Vector,
    /// Palm orientation
    pub orientation: Quaternion,
}

/// A tracked hand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    /// Hand id, stable while the hand stays visible
    pub id: u32,
    /// Left or right
    pub chirality: Chirality,
    /// Tracking confidence in `[0, 1]`
    pub confidence: f32,
    /// Time the hand has been visible, microseconds
    pub visible_time_us: u64,
    /// Distance between thumb and index tips
    pub pinch_distance: f32,
    /// Average bend of the fingers, radians
    pub grab_angle: f32,
    /// Pinch strength in `[0, 1]`
    pub pinch_strength: f32,
    /// Grab strength in `[0, 1]`
    pub grab_strength: f32,
    /// Palm pose
    pub palm: PalmRecord,
    /// Digits from thumb to pinky
    pub digits: [DigitRecord; 5],
    /// Forearm, elbow to wrist
    pub arm: BoneRecord,
}

impl HandRecord {
    /// Neutral hand; its id reads back as -1.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            id: u32::MAX,
            chirality: Chirality::Left,
            confidence: 0.0,
            visible_time_us: 0,
            pinch_distance: 0.0,
            grab_angle: 0.0,
            pinch_strength: 0.0,
            grab_strength: 0.0,
            palm: PalmRecord::default(),
            digits: [DigitRecord::invalid(); 5],
            arm: BoneRecord::invalid(),
        }
    }
}

// ============================================================================
// Frame data
// ============================================================================

/// A point of the environment map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPointRecord {
    /// Point id
    pub id: u32,
    /// Point position
    pub position: Vector,
}

/// One camera image of a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Id of the tracking frame the image belongs to
    pub frame_id: i64,
    /// Monotonic image sequence number
    pub sequence_id: i64,
    /// Capture time, microseconds
    pub timestamp_us: i64,
    /// Index within the stereo pair (0 = left)
    pub perspective_index: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Bytes per pixel
    pub bytes_per_pixel: i32,
    /// Pixel layout
    pub format: ImageFormat,
    /// Service buffer holding the pixels
    pub buffer: Option<BufferHandle>,
    /// Interleaved `(x, y)` calibration grid, row major
    #[serde(default)]
    pub distortion: Vec<f32>,
    /// Grid width in `(x, y)` pairs
    pub distortion_width: i32,
    /// Grid height in rows
    pub distortion_height: i32,
    /// Ray offset `(x, y)`
    pub ray_offset: [f32; 2],
    /// Ray scale `(x, y)`
    pub ray_scale: [f32; 2],
}

impl ImageRecord {
    /// Neutral image.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            frame_id: -1,
            sequence_id: -1,
            timestamp_us: 0,
            perspective_index: -1,
            width: 0,
            height: 0,
            bytes_per_pixel: 1,
            format: ImageFormat::Infrared,
            buffer: None,
            distortion: Vec::new(),
            distortion_width: 0,
            distortion_height: 0,
            ray_offset: [0.0; 2],
            ray_scale: [0.0; 2],
        }
    }

    /// Number of floats the calibration grid must contain.
    #[must_use]
    pub fn expected_distortion_len(&self) -> usize {
        let w = usize::try_from(self.distortion_width).unwrap_or(0);
        let h = usize::try_from(self.distortion_height).unwrap_or(0);
        w * h * 2
    }
}

/// A complete tracking snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame id, increasing
    pub id: i64,
    /// Capture time, microseconds
    pub timestamp_us: i64,
    /// Instantaneous frame rate
    pub framerate: f32,
    /// Tracked hands
    #[serde(default)]
    pub hands: Vec<HandRecord>,
    /// Environment map points
    #[serde(default)]
    pub map_points: Vec<MapPointRecord>,
    /// Processed camera images
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    /// Unprocessed camera images
    #[serde(default)]
    pub raw_images: Vec<ImageRecord>,
}

impl FrameRecord {
    /// Neutral frame.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            id: -1,
            ..Self::default()
        }
    }
}

/// Headset pose at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPoseRecord {
    /// Sample time, microseconds
    pub timestamp_us: i64,
    /// Head position
    pub position: Vector,
    /// Head orientation
    pub orientation: Quaternion,
}

// ============================================================================
// Device data
// ============================================================================

/// A connected tracking device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Service-assigned device id
    pub id: u32,
    /// Hardware serial number
    pub serial_number: String,
    /// Hardware family
    pub device_type: DeviceType,
    /// Full horizontal field of view, radians
    pub horizontal_view_angle: f32,
    /// Full vertical field of view, radians
    pub vertical_view_angle: f32,
    /// Maximum sensing distance
    pub range: f32,
    /// Distance between the two cameras
    pub baseline: f32,
    /// Device is delivering frames
    pub streaming: bool,
    /// Device window is smudged
    pub smudged: bool,
    /// Ambient light is interfering with tracking
    pub lighting_bad: bool,
}

impl DeviceRecord {
    /// Neutral device.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            id: 0,
            serial_number: String::new(),
            device_type: DeviceType::Unknown,
            horizontal_view_angle: 0.0,
            vertical_view_angle: 0.0,
            range: 0.0,
            baseline: 0.0,
            streaming: false,
            smudged: false,
            lighting_bad: false,
        }
    }
}

/// A device that was detected but failed to initialize.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeviceRecord {
    /// Plug-and-play id of the failed device
    pub pnp_id: String,
    /// Failure reason
    pub failure: FailureType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_hand_id_reads_as_minus_one() {
        assert_eq!(HandRecord::invalid().id as i32, -1);
    }

    #[test]
    fn test_finger_type_from_digit() {
        assert_eq!(FingerType::from_digit(0), Some(FingerType::Thumb));
        assert_eq!(FingerType::from_digit(4), Some(FingerType::Pinky));
        assert_eq!(FingerType::from_digit(5), None);
        assert_eq!(FingerType::from_digit(-1), None);
    }

    #[test]
    fn test_failure_discriminants() {
        assert_eq!(FailureType::Unknown as i32, 0);
        assert_eq!(FailureType::Calibration as i32, 1);
        assert_eq!(FailureType::Firmware as i32, 2);
        assert_eq!(FailureType::Transport as i32, 3);
        assert_eq!(FailureType::Control as i32, 4);
    }

    #[test]
    fn test_device_type_names() {
        assert_eq!(DeviceType::Peripheral.as_str(), "TYPE_PERIPHERAL");
        assert_eq!(DeviceType::Unknown.as_str(), "TYPE_UNKNOWN");
    }

    #[test]
    fn test_frame_record_json_defaults() {
        let frame: FrameRecord =
            serde_json::from_str(r#"{"id": 7, "timestamp_us": 100, "framerate": 90.0}"#).unwrap();
        assert_eq!(frame.id, 7);
        assert!(frame.hands.is_empty());
        assert!(frame.images.is_empty());
    }
}
