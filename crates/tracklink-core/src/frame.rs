//! Frames and map points.

use std::sync::{Arc, OnceLock, Weak};

use crate::hand::{Finger, FingerList, Hand, HandImpl, HandList};
use crate::handle::{Handle, Implementation};
use crate::image::{Image, ImageImpl, ImageList};
use crate::list::{List, Positioned};
use crate::math::Vector;
use crate::records::{FrameRecord, ImageRecord, MapPointRecord};

/// A tracking snapshot.
pub type Frame = Handle<FrameImpl>;
/// A point of the environment map.
pub type MapPoint = Handle<MapPointImpl>;
/// Ordered map points.
pub type MapPointList = List<MapPointImpl>;

// ============================================================================
// Map points
// ============================================================================

/// Backing data of a [`MapPoint`].
#[derive(Default)]
pub struct MapPointImpl {
    record: Option<MapPointRecord>,
}

impl MapPointImpl {
    /// Map point built from service data.
    #[must_use]
    pub fn new(record: MapPointRecord) -> Self {
        Self { record: Some(record) }
    }
}

impl Implementation for MapPointImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        match &self.record {
            Some(r) => format!("MapPoint Id:{} {}", r.id, r.position),
            None => "Invalid MapPoint".to_string(),
        }
    }

    fn sentinel() -> &'static MapPoint {
        static INVALID: OnceLock<MapPoint> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Positioned for MapPointImpl {
    fn position(&self) -> Vector {
        self.record.map(|r| r.position).unwrap_or_default()
    }
}

impl Handle<MapPointImpl> {
    /// Point id; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.implementation().record.map_or(-1, |r| i64::from(r.id))
    }

    /// Point position.
    #[must_use]
    pub fn position(&self) -> Vector {
        self.implementation().position()
    }
}

// ============================================================================
// Frame
// ============================================================================

#[derive(Clone, Copy)]
struct FrameHeader {
    id: i64,
    timestamp_us: i64,
    framerate: f32,
}

/// Backing data of a [`Frame`].
#[derive(Default)]
pub struct FrameImpl {
    header: Option<FrameHeader>,
    hands: HandList,
    map_points: MapPointList,
    images: ImageList,
    raw_images: ImageList,
}

impl FrameImpl {
    /// Build a frame and its hands from service data.
    ///
    /// Images are built by the caller since they need the producing
    /// controller's calibration and pixel buffers.
    #[must_use]
    pub fn build(record: FrameRecord, images: ImageList, raw_images: ImageList) -> Arc<Self> {
        let header = FrameHeader {
            id: record.id,
            timestamp_us: record.timestamp_us,
            framerate: record.framerate,
        };
        Arc::new_cyclic(|this: &Weak<Self>| Self {
            header: Some(header),
            hands: record
                .hands
                .iter()
                .map(|hand| Hand::new(HandImpl::build(this.clone(), *hand)))
                .collect(),
            map_points: record
                .map_points
                .iter()
                .map(|point| MapPoint::new(Arc::new(MapPointImpl::new(*point))))
                .collect(),
            images,
            raw_images,
        })
    }

    /// Build a frame whose images carry no calibration and no pixels.
    #[must_use]
    pub fn from_record(record: FrameRecord) -> Arc<Self> {
        let detached = |records: &[ImageRecord]| -> ImageList {
            records
                .iter()
                .map(|r| Image::new(Arc::new(ImageImpl::new(None, r.clone(), None))))
                .collect()
        };
        let images = detached(&record.images);
        let raw_images = detached(&record.raw_images);
        Self::build(record, images, raw_images)
    }
}

impl Implementation for FrameImpl {
    fn is_valid(&self) -> bool {
        self.header.is_some()
    }

    fn describe(&self) -> String {
        match self.header {
            Some(h) => format!("Frame Id:{}", h.id),
            None => "Invalid Frame".to_string(),
        }
    }

    fn sentinel() -> &'static Frame {
        static INVALID: OnceLock<Frame> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<FrameImpl> {
    /// Frame id; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.implementation().header.map_or(-1, |h| h.id)
    }

    /// Capture time, microseconds; 0 when invalid.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.implementation().header.map_or(0, |h| h.timestamp_us)
    }

    /// Instantaneous frame rate; 0 when invalid.
    #[must_use]
    pub fn current_frames_per_second(&self) -> f32 {
        self.implementation().header.map_or(0.0, |h| h.framerate)
    }

    /// Tracked hands.
    #[must_use]
    pub fn hands(&self) -> HandList {
        self.implementation().hands.clone()
    }

    /// Hand with the given id, or a fresh invalid hand.
    #[must_use]
    pub fn hand(&self, id: i32) -> Hand {
        self.implementation()
            .hands
            .iter()
            .find(|h| h.id() == id)
            .unwrap_or_default()
    }

    /// Fingers of every hand, hand by hand.
    #[must_use]
    pub fn fingers(&self) -> FingerList {
        let mut fingers = FingerList::new();
        for hand in &self.implementation().hands {
            fingers.append(&hand.fingers());
        }
        fingers
    }

    /// Finger with the given id, or a fresh invalid finger.
    #[must_use]
    pub fn finger(&self, id: i32) -> Finger {
        self.implementation()
            .hands
            .iter()
            .map(|h| h.finger(id))
            .find(Finger::is_valid)
            .unwrap_or_default()
    }

    /// Environment map points.
    #[must_use]
    pub fn map_points(&self) -> MapPointList {
        self.implementation().map_points.clone()
    }

    /// Processed camera images.
    #[must_use]
    pub fn images(&self) -> ImageList {
        self.implementation().images.clone()
    }

    /// Unprocessed camera images.
    #[must_use]
    pub fn raw_images(&self) -> ImageList {
        self.implementation().raw_images.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Chirality, FingerType};
    use crate::synthetic::{frame_record as sample_frame, hand_record as sample_hand};

    #[test]
    fn test_invalid_frame_neutral_values() {
        let frame = Frame::invalid();
        assert!(!frame.is_valid());
        assert_eq!(frame.id(), -1);
        assert_eq!(frame.timestamp(), 0);
        assert_eq!(frame.hands().count(), 0);
        assert_eq!(frame.fingers().count(), 0);
        assert_eq!(frame.images().count(), 0);
        assert_eq!(frame.map_points().count(), 0);
        assert_eq!(frame.to_string(), "Invalid Frame");
    }

    #[test]
    fn test_lookup_miss_is_not_the_sentinel() {
        let frame = Frame::default();
        let bad_finger = frame.finger(1);
        assert!(!bad_finger.is_valid());
        assert_ne!(bad_finger, *Finger::invalid());
        assert_ne!(frame.hand(1), *Hand::invalid());
        assert_eq!(Frame::invalid(), Frame::invalid());
    }

    #[test]
    fn test_frame_owns_hands_and_fingers() {
        let frame = Frame::new(FrameImpl::from_record(sample_frame(42)));
        assert_eq!(frame.id(), 42);
        assert_eq!(frame.to_string(), "Frame Id:42");
        assert_eq!(frame.hands().count(), 2);
        assert_eq!(frame.fingers().count(), 10);

        let hand = frame.hand(1);
        assert!(hand.is_valid());
        assert_eq!(hand.frame(), frame);
        assert_eq!(frame.finger(12), hand.fingers().get(2));
        assert_eq!(frame.finger(12).frame(), frame);
        assert_eq!(frame.fingers().get(7).finger_type(), FingerType::Middle);
        assert!(!frame.hand(9).is_valid());
    }

    #[test]
    fn test_hand_outlives_frame() {
        let hand = {
            let frame = Frame::new(FrameImpl::from_record(sample_frame(3)));
            frame.hands().get(0)
        };
        assert!(hand.is_valid());
        assert!(!hand.frame().is_valid());
        assert!(!hand.fingers().get(0).frame().is_valid());
    }

    #[test]
    fn test_map_points_and_detached_images() {
        let mut record = sample_frame(5);
        record.map_points.push(MapPointRecord {
            id: 11,
            position: Vector::new(1.0, 2.0, 3.0),
        });
        let mut image = ImageRecord::invalid();
        image.frame_id = 5;
        image.perspective_index = 0;
        record.images.push(image);

        let frame = Frame::new(FrameImpl::from_record(record));
        let point = frame.map_points().get(0);
        assert_eq!(point.id(), 11);
        assert_eq!(point.position(), Vector::new(1.0, 2.0, 3.0));
        assert_eq!(frame.images().count(), 1);
        assert_eq!(frame.images().get(0).id(), 0);
        assert!(frame.images().get(0).data().is_none());
        assert_eq!(frame.raw_images().count(), 0);
        assert_eq!(MapPoint::invalid().id(), -1);
    }

    #[test]
    fn test_hand_order_follows_record() {
        let mut record = sample_frame(8);
        record.hands.push(sample_hand(20, Chirality::Left, -300.0));
        let frame = Frame::new(FrameImpl::from_record(record));
        let ids: Vec<i32> = frame.hands().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![1, 2, 20]);
        assert_eq!(frame.hands().leftmost().id(), 20);
    }
}
