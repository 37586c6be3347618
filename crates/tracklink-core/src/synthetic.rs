//! Synthetic records for demos and tests.
//!
//! Coordinates are millimetres in device space. A synthetic hand lies flat
//! above the device with its fingers pointing forward (-z): digit `i` starts
//! 20 mm to the right of digit `i - 1` and each bone is 30 mm long. Even
//! digits (thumb, middle, pinky) are extended.

use crate::math::{Quaternion, Vector};
use crate::records::{BoneRecord, Chirality, DeviceRecord, DeviceType, FrameRecord, HandRecord};

/// Horizontal and vertical field of view of a synthetic device, radians.
pub const VIEW_ANGLE: f32 = 120.0 * core::f32::consts::PI / 180.0;

/// Sensing range of a synthetic device, millimetres.
pub const RANGE: f32 = 600.0;

/// A flat hand whose palm sits at `(palm_x, 200, 0)`.
#[must_use]
pub fn hand_record(id: u32, chirality: Chirality, palm_x: f32) -> HandRecord {
    let mut record = HandRecord::invalid();
    record.id = id;
    record.chirality = chirality;
    record.confidence = 1.0;
    record.visible_time_us = 2_500_000;
    record.palm.position = Vector::new(palm_x, 200.0, 0.0);
    record.palm.stabilized_position = record.palm.position;
    record.palm.normal = Vector::down();
    record.palm.direction = Vector::forward();
    record.palm.width = 85.0;
    record.arm = BoneRecord {
        prev_joint: Vector::new(palm_x, 150.0, 250.0),
        next_joint: Vector::new(palm_x, 180.0, 60.0),
        width: 60.0,
        rotation: Quaternion::identity(),
    };
    for (i, digit) in record.digits.iter_mut().enumerate() {
        digit.finger_id = i as i32;
        digit.is_extended = i % 2 == 0;
        for (b, bone) in digit.bones.iter_mut().enumerate() {
            let base = Vector::new(palm_x + i as f32 * 20.0, 200.0, -(b as f32) * 30.0);
            *bone = BoneRecord {
                prev_joint: base,
                next_joint: base + Vector::new(0.0, 0.0, -30.0),
                width: 15.0 + b as f32,
                rotation: Quaternion::identity(),
            };
        }
    }
    record
}

/// A frame with a left hand (id 1) at x = -80 and a right hand (id 2) at x = 80.
#[must_use]
pub fn frame_record(id: i64) -> FrameRecord {
    FrameRecord {
        id,
        timestamp_us: id * 16_667,
        framerate: 60.0,
        hands: vec![
            hand_record(1, Chirality::Left, -80.0),
            hand_record(2, Chirality::Right, 80.0),
        ],
        ..FrameRecord::default()
    }
}

/// A streaming device with a 120 degree field of view.
#[must_use]
pub fn device_record(id: u32, serial_number: &str) -> DeviceRecord {
    DeviceRecord {
        id,
        serial_number: serial_number.to_string(),
        device_type: DeviceType::Rigel,
        horizontal_view_angle: VIEW_ANGLE,
        vertical_view_angle: VIEW_ANGLE,
        range: RANGE,
        baseline: 40.0,
        streaming: true,
        smudged: false,
        lighting_bad: false,
    }
}
