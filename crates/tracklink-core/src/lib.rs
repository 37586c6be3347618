//! Tracklink Core - handle types over motion-tracking data
//!
//! This crate provides the value-like handles applications use to read hand
//! tracking data: frames, hands, fingers, bones, arms, devices, images, map
//! points and head poses. Every handle wraps a shared implementation built
//! from plain service records, and every handle type has a canonical invalid
//! instance whose getters answer with neutral values, so call sites never
//! need a null check.
//!
//! # Modules
//!
//! - [`handle`]: The `Handle` / `Implementation` pattern and equality rules
//! - [`list`]: Generic ordered lists with filtering and extremum queries
//! - [`boundary`]: Distance from a point to a device's sensing volume
//! - [`math`]: Vector, matrix and quaternion value types
//! - [`records`]: Plain data as delivered by the tracking service
//!
//! # Example
//!
//! ```rust
//! use tracklink_core::{synthetic, Frame, FrameImpl};
//!
//! let frame = Frame::new(FrameImpl::from_record(synthetic::frame_record(7)));
//! assert_eq!(frame.hands().count(), 2);
//!
//! let left = frame.hands().leftmost();
//! assert!(left.is_left());
//! assert_eq!(left.frame(), frame);
//!
//! // Out-of-range access yields the invalid sentinel, never a panic.
//! assert!(!frame.hands().get(9).is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]

pub mod boundary;
pub mod device;
pub mod error;
pub mod frame;
pub mod hand;
pub mod handle;
pub mod head_pose;
pub mod image;
pub mod list;
pub mod math;
pub mod records;
pub mod synthetic;

// Re-export commonly used types at crate root
pub use boundary::{BoundaryFace, SensingVolume};
pub use device::{Device, DeviceImpl, DeviceList, FailedDevice, FailedDeviceImpl, FailedDeviceList};
pub use error::{ImageError, ImageResult};
pub use frame::{Frame, FrameImpl, MapPoint, MapPointImpl, MapPointList};
pub use hand::{
    Arm, ArmImpl, Bone, BoneImpl, Finger, FingerImpl, FingerList, FingerPredicate, Hand, HandImpl,
    HandList,
};
pub use handle::{Handle, Implementation};
pub use head_pose::{HeadPose, HeadPoseImpl};
pub use image::{Calibration, Image, ImageImpl, ImageList};
pub use list::{List, ListIter, Positioned};
pub use math::{Matrix, Quaternion, Vector};
pub use records::{
    BoneRecord, BoneType, BufferHandle, Chirality, DeviceRecord, DeviceType, DigitRecord,
    FailedDeviceRecord, FailureType, FingerType, FrameRecord, HandRecord, HeadPoseRecord,
    ImageFormat, ImageRecord, MapPointRecord, PalmRecord, Perspective, SharedBuffer,
};
