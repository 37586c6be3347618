//! Headset pose samples.

use std::sync::OnceLock;

use crate::handle::{Handle, Implementation};
use crate::math::{Quaternion, Vector};
use crate::records::HeadPoseRecord;

/// Headset pose at one point in time.
pub type HeadPose = Handle<HeadPoseImpl>;

/// Backing data of a [`HeadPose`].
#[derive(Default)]
pub struct HeadPoseImpl {
    record: Option<HeadPoseRecord>,
}

impl HeadPoseImpl {
    /// Head pose built from service data.
    #[must_use]
    pub fn new(record: HeadPoseRecord) -> Self {
        Self { record: Some(record) }
    }

    fn record(&self) -> HeadPoseRecord {
        self.record.unwrap_or_default()
    }
}

impl Implementation for HeadPoseImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        match self.record {
            Some(r) => format!("HeadPose at {}us {}", r.timestamp_us, r.position),
            None => "Invalid HeadPose".to_string(),
        }
    }

    fn sentinel() -> &'static HeadPose {
        static INVALID: OnceLock<HeadPose> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<HeadPoseImpl> {
    /// Sample time, microseconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.implementation().record().timestamp_us
    }

    /// Head position.
    #[must_use]
    pub fn position(&self) -> Vector {
        self.implementation().record().position
    }

    /// Head orientation; identity when invalid.
    #[must_use]
    pub fn orientation(&self) -> Quaternion {
        self.implementation().record().orientation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_head_pose() {
        let pose = HeadPose::new(Arc::new(HeadPoseImpl::new(HeadPoseRecord {
            timestamp_us: 77,
            position: Vector::new(0.0, 1.6, 0.0),
            orientation: Quaternion::new(0.0, 0.0, 0.0, 1.0),
        })));
        assert_eq!(pose.timestamp(), 77);
        assert_eq!(pose.position().y, 1.6);
        assert_eq!(HeadPose::invalid().orientation(), Quaternion::identity());
        assert_eq!(HeadPose::invalid().timestamp(), 0);
    }
}
