//! Hands, fingers, bones and arms.
//!
//! A [`HandImpl`] owns its five fingers and its arm. Each [`FingerImpl`]
//! keeps a weak reference back to its hand and owns four bones. Dropping the
//! last handle to a frame releases its hands; fingers that outlive them
//! report an invalid parent rather than dangling.

use std::sync::{Arc, OnceLock, Weak};

use crate::frame::{Frame, FrameImpl};
use crate::handle::{Handle, Implementation};
use crate::list::{List, Positioned};
use crate::math::{Matrix, Vector};
use crate::records::{BoneRecord, BoneType, Chirality, DigitRecord, FingerType, HandRecord};

/// A tracked hand.
pub type Hand = Handle<HandImpl>;
/// One finger of a hand.
pub type Finger = Handle<FingerImpl>;
/// One bone of a finger.
pub type Bone = Handle<BoneImpl>;
/// The forearm attached to a hand.
pub type Arm = Handle<ArmImpl>;

/// Ordered hands.
pub type HandList = List<HandImpl>;
/// Ordered fingers.
pub type FingerList = List<FingerImpl>;

/// Basis of a bone-like segment; x is mirrored for left hands.
fn chiral_basis(record: &BoneRecord, is_left: bool) -> Matrix {
    let mut basis = record.rotation.to_matrix();
    if is_left {
        basis.x_basis = -basis.x_basis;
    }
    basis
}

// ============================================================================
// Bone
// ============================================================================

/// Backing data of a [`Bone`].
pub struct BoneImpl {
    record: Option<BoneRecord>,
    bone_type: BoneType,
    is_left: bool,
}

impl BoneImpl {
    /// Bone built from service data.
    #[must_use]
    pub fn new(record: BoneRecord, bone_type: BoneType, is_left: bool) -> Self {
        Self {
            record: Some(record),
            bone_type,
            is_left,
        }
    }

    fn invalid_of(bone_type: BoneType) -> Self {
        Self {
            record: None,
            bone_type,
            is_left: false,
        }
    }

    fn record(&self) -> BoneRecord {
        self.record.unwrap_or_default()
    }
}

impl Default for BoneImpl {
    fn default() -> Self {
        Self::invalid_of(BoneType::Metacarpal)
    }
}

impl Implementation for BoneImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        if self.is_valid() {
            format!("Bone {:?} from {} to {}", self.bone_type, self.prev_joint(), self.next_joint())
        } else {
            "Invalid Bone".to_string()
        }
    }

    fn sentinel() -> &'static Bone {
        static INVALID: OnceLock<Bone> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl BoneImpl {
    /// Joint nearest the wrist.
    #[must_use]
    pub fn prev_joint(&self) -> Vector {
        self.record().prev_joint
    }

    /// Joint nearest the fingertip.
    #[must_use]
    pub fn next_joint(&self) -> Vector {
        self.record().next_joint
    }
}

impl Handle<BoneImpl> {
    /// Joint nearest the wrist.
    #[must_use]
    pub fn prev_joint(&self) -> Vector {
        self.implementation().prev_joint()
    }

    /// Joint nearest the fingertip.
    #[must_use]
    pub fn next_joint(&self) -> Vector {
        self.implementation().next_joint()
    }

    /// Midpoint between the joints.
    #[must_use]
    pub fn center(&self) -> Vector {
        (self.prev_joint() + self.next_joint()) * 0.5
    }

    /// Unit vector from the previous joint to the next; zero when degenerate.
    #[must_use]
    pub fn direction(&self) -> Vector {
        (self.next_joint() - self.prev_joint()).normalized()
    }

    /// Distance between the joints.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.prev_joint().distance_to(&self.next_joint())
    }

    /// Average width of the flesh around the bone.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.implementation().record().width
    }

    /// Position of this bone along its finger.
    #[must_use]
    pub fn bone_type(&self) -> BoneType {
        self.implementation().bone_type
    }

    /// Orientation basis; identity when invalid.
    #[must_use]
    pub fn basis(&self) -> Matrix {
        let imp = self.implementation();
        imp.record
            .as_ref()
            .map_or_else(Matrix::identity, |r| chiral_basis(r, imp.is_left))
    }
}

// ============================================================================
// Arm
// ============================================================================

/// Backing data of an [`Arm`].
#[derive(Default)]
pub struct ArmImpl {
    record: Option<BoneRecord>,
    is_left: bool,
}

impl ArmImpl {
    /// Arm built from service data.
    #[must_use]
    pub fn new(record: BoneRecord, is_left: bool) -> Self {
        Self {
            record: Some(record),
            is_left,
        }
    }

    fn record(&self) -> BoneRecord {
        self.record.unwrap_or_default()
    }
}

impl Implementation for ArmImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        if self.is_valid() {
            format!("Arm from {} to {}", self.record().prev_joint, self.record().next_joint)
        } else {
            "Invalid Arm".to_string()
        }
    }

    fn sentinel() -> &'static Arm {
        static INVALID: OnceLock<Arm> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Handle<ArmImpl> {
    /// Average width of the forearm.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.implementation().record().width
    }

    /// Unit vector along the forearm towards the hand: the negated z basis.
    #[must_use]
    pub fn direction(&self) -> Vector {
        -self.basis().z_basis
    }

    /// Orientation basis; identity when invalid.
    #[must_use]
    pub fn basis(&self) -> Matrix {
        let imp = self.implementation();
        imp.record
            .as_ref()
            .map_or_else(Matrix::identity, |r| chiral_basis(r, imp.is_left))
    }

    /// Elbow joint.
    #[must_use]
    pub fn elbow_position(&self) -> Vector {
        self.implementation().record().prev_joint
    }

    /// Wrist joint.
    #[must_use]
    pub fn wrist_position(&self) -> Vector {
        self.implementation().record().next_joint
    }

    /// Midpoint between elbow and wrist.
    #[must_use]
    pub fn center(&self) -> Vector {
        (self.elbow_position() + self.wrist_position()) * 0.5
    }
}

// ============================================================================
// Finger
// ============================================================================

/// Backing data of a [`Finger`].
pub struct FingerImpl {
    hand: Weak<HandImpl>,
    digit: Option<DigitRecord>,
    id: i32,
    bones: [Bone; 4],
}

impl FingerImpl {
    /// Finger with no parent hand; its id is the digit id.
    #[must_use]
    pub fn new(digit: DigitRecord) -> Self {
        Self::build(Weak::new(), 0, false, digit)
    }

    /// Finger attached to a hand that is still under construction.
    fn with_hand(hand: Weak<HandImpl>, hand_record: &HandRecord, digit: DigitRecord) -> Self {
        let hand_id = hand_record.id as i32;
        Self::build(hand, hand_id, hand_record.chirality == Chirality::Left, digit)
    }

    fn build(hand: Weak<HandImpl>, hand_id: i32, is_left: bool, digit: DigitRecord) -> Self {
        let bones = BoneType::ALL.map(|t| {
            Bone::new(Arc::new(BoneImpl::new(digit.bones[t as usize], t, is_left)))
        });
        Self {
            hand,
            id: hand_id.wrapping_mul(10).wrapping_add(digit.finger_id),
            digit: Some(digit),
            bones,
        }
    }

    fn digit(&self) -> DigitRecord {
        self.digit.unwrap_or_default()
    }

    fn bone(&self, bone_type: BoneType) -> &Bone {
        &self.bones[bone_type as usize]
    }
}

impl Default for FingerImpl {
    fn default() -> Self {
        Self {
            hand: Weak::new(),
            digit: None,
            id: -1,
            bones: BoneType::ALL.map(|t| Bone::new(Arc::new(BoneImpl::invalid_of(t)))),
        }
    }
}

impl Implementation for FingerImpl {
    fn is_valid(&self) -> bool {
        self.digit.is_some()
    }

    fn describe(&self) -> String {
        if self.is_valid() {
            format!("Finger Id:{}", self.id)
        } else {
            "Invalid Finger".to_string()
        }
    }

    fn sentinel() -> &'static Finger {
        static INVALID: OnceLock<Finger> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Positioned for FingerImpl {
    fn position(&self) -> Vector {
        self.bone(BoneType::Distal).next_joint()
    }
}

impl Handle<FingerImpl> {
    /// Finger id: parent hand id times ten plus the digit id; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i32 {
        let imp = self.implementation();
        if imp.is_valid() {
            imp.id
        } else {
            -1
        }
    }

    /// Frame of the parent hand.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.implementation()
            .hand
            .upgrade()
            .map_or_else(|| Frame::invalid().clone(), |hand| Hand::new(hand).frame())
    }

    /// Parent hand, or the invalid hand once it has been released.
    #[must_use]
    pub fn hand(&self) -> Hand {
        self.implementation()
            .hand
            .upgrade()
            .map_or_else(|| Hand::invalid().clone(), Hand::new)
    }

    /// Anatomical identity; thumb for invalid fingers.
    #[must_use]
    pub fn finger_type(&self) -> FingerType {
        FingerType::from_digit(self.implementation().digit().finger_id).unwrap_or_default()
    }

    /// Bone of the given type.
    #[must_use]
    pub fn bone(&self, bone_type: BoneType) -> Bone {
        self.implementation().bone(bone_type).clone()
    }

    /// Fingertip position.
    #[must_use]
    pub fn tip_position(&self) -> Vector {
        self.implementation().position()
    }

    /// Pointing direction of the distal bone.
    #[must_use]
    pub fn direction(&self) -> Vector {
        self.implementation().bone(BoneType::Distal).direction()
    }

    /// Width of the intermediate bone.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.implementation().bone(BoneType::Intermediate).width()
    }

    /// Visible length: proximal, intermediate and distal bones combined.
    #[must_use]
    pub fn length(&self) -> f32 {
        let imp = self.implementation();
        [BoneType::Proximal, BoneType::Intermediate, BoneType::Distal]
            .iter()
            .map(|t| imp.bone(*t).length())
            .sum()
    }

    /// Whether the finger is straight.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.implementation().digit().is_extended
    }

    /// Seconds the parent hand has been visible; 0 once it is released.
    #[must_use]
    pub fn time_visible(&self) -> f32 {
        self.implementation()
            .hand
            .upgrade()
            .map_or(0.0, |hand| Hand::new(hand).time_visible())
    }
}

/// Closed set of finger selections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FingerPredicate {
    /// Fingers that are extended
    Extended,
    /// Thumbs
    Thumb,
    /// Index fingers
    Index,
    /// Middle fingers
    Middle,
    /// Ring fingers
    Ring,
    /// Pinky fingers
    Pinky,
    /// Every finger
    All,
}

impl FingerPredicate {
    /// Whether `finger` is selected.
    #[must_use]
    pub fn matches(&self, finger: &Finger) -> bool {
        match self {
            Self::Extended => finger.is_extended(),
            Self::Thumb => finger.finger_type() == FingerType::Thumb,
            Self::Index => finger.finger_type() == FingerType::Index,
            Self::Middle => finger.finger_type() == FingerType::Middle,
            Self::Ring => finger.finger_type() == FingerType::Ring,
            Self::Pinky => finger.finger_type() == FingerType::Pinky,
            Self::All => true,
        }
    }
}

impl From<FingerType> for FingerPredicate {
    fn from(finger_type: FingerType) -> Self {
        match finger_type {
            FingerType::Thumb => Self::Thumb,
            FingerType::Index => Self::Index,
            FingerType::Middle => Self::Middle,
            FingerType::Ring => Self::Ring,
            FingerType::Pinky => Self::Pinky,
        }
    }
}

impl List<FingerImpl> {
    /// Fingers selected by `predicate`, as a new list.
    #[must_use]
    pub fn select(&self, predicate: FingerPredicate) -> Self {
        self.filter(|f| predicate.matches(f))
    }

    /// Extended fingers only.
    #[must_use]
    pub fn extended(&self) -> Self {
        self.select(FingerPredicate::Extended)
    }

    /// Fingers of one anatomical type.
    #[must_use]
    pub fn finger_type(&self, finger_type: FingerType) -> Self {
        self.select(finger_type.into())
    }
}

// ============================================================================
// Hand
// ============================================================================

/// Backing data of a [`Hand`].
#[derive(Default)]
pub struct HandImpl {
    frame: Weak<FrameImpl>,
    record: Option<HandRecord>,
    fingers: FingerList,
    arm: Arm,
}

impl HandImpl {
    /// Build a hand, its fingers and its arm from service data.
    ///
    /// `frame` is held weakly; pass `Weak::new()` for a detached hand.
    #[must_use]
    pub fn build(frame: Weak<FrameImpl>, record: HandRecord) -> Arc<Self> {
        Arc::new_cyclic(|this| {
            let fingers = record
                .digits
                .iter()
                .map(|digit| Finger::new(Arc::new(FingerImpl::with_hand(this.clone(), &record, *digit))))
                .collect();
            let arm = Arm::new(Arc::new(ArmImpl::new(record.arm, record.chirality == Chirality::Left)));
            Self {
                frame,
                record: Some(record),
                fingers,
                arm,
            }
        })
    }

    fn record(&self) -> &HandRecord {
        static INVALID: OnceLock<HandRecord> = OnceLock::new();
        self.record
            .as_ref()
            .unwrap_or_else(|| INVALID.get_or_init(HandRecord::invalid))
    }
}

impl Implementation for HandImpl {
    fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    fn describe(&self) -> String {
        if self.is_valid() {
            format!("Hand Id:{}", self.record().id as i32)
        } else {
            "Invalid Hand".to_string()
        }
    }

    fn sentinel() -> &'static Hand {
        static INVALID: OnceLock<Hand> = OnceLock::new();
        INVALID.get_or_init(Handle::default)
    }
}

impl Positioned for HandImpl {
    fn position(&self) -> Vector {
        self.record().palm.position
    }
}

impl Handle<HandImpl> {
    /// Hand id; -1 when invalid.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.implementation().record().id as i32
    }

    /// Frame this hand belongs to, or the invalid frame once released.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.implementation()
            .frame
            .upgrade()
            .map_or_else(|| Frame::invalid().clone(), Frame::new)
    }

    /// Fingers from thumb to pinky.
    #[must_use]
    pub fn fingers(&self) -> FingerList {
        self.implementation().fingers.clone()
    }

    /// Finger with the given id, or a fresh invalid finger.
    #[must_use]
    pub fn finger(&self, id: i32) -> Finger {
        self.implementation()
            .fingers
            .iter()
            .find(|f| f.id() == id)
            .unwrap_or_default()
    }

    /// Palm center.
    #[must_use]
    pub fn palm_position(&self) -> Vector {
        self.implementation().record().palm.position
    }

    /// Palm center after service-side stabilization.
    #[must_use]
    pub fn stabilized_palm_position(&self) -> Vector {
        self.implementation().record().palm.stabilized_position
    }

    /// Palm velocity.
    #[must_use]
    pub fn palm_velocity(&self) -> Vector {
        self.implementation().record().palm.velocity
    }

    /// Unit vector out of the palm.
    #[must_use]
    pub fn palm_normal(&self) -> Vector {
        self.implementation().record().palm.normal
    }

    /// Palm width.
    #[must_use]
    pub fn palm_width(&self) -> f32 {
        self.implementation().record().palm.width
    }

    /// Unit vector from the palm towards the fingers.
    #[must_use]
    pub fn direction(&self) -> Vector {
        self.implementation().record().palm.direction
    }

    /// Palm orientation basis; x is mirrored for left hands, identity when invalid.
    #[must_use]
    pub fn basis(&self) -> Matrix {
        let imp = self.implementation();
        let Some(record) = imp.record.as_ref() else {
            return Matrix::identity();
        };
        let mut basis = record.palm.orientation.to_matrix();
        if record.chirality == Chirality::Left {
            basis.x_basis = -basis.x_basis;
        }
        basis
    }

    /// Forearm of this hand.
    #[must_use]
    pub fn arm(&self) -> Arm {
        self.implementation().arm.clone()
    }

    /// Wrist joint, shared with the arm.
    #[must_use]
    pub fn wrist_position(&self) -> Vector {
        self.implementation().arm.wrist_position()
    }

    /// Distance between thumb and index tips.
    #[must_use]
    pub fn pinch_distance(&self) -> f32 {
        self.implementation().record().pinch_distance
    }

    /// Average finger bend, radians.
    #[must_use]
    pub fn grab_angle(&self) -> f32 {
        self.implementation().record().grab_angle
    }

    /// Pinch strength in `[0, 1]`.
    #[must_use]
    pub fn pinch_strength(&self) -> f32 {
        self.implementation().record().pinch_strength
    }

    /// Grab strength in `[0, 1]`.
    #[must_use]
    pub fn grab_strength(&self) -> f32 {
        self.implementation().record().grab_strength
    }

    /// Seconds this hand has been visible.
    #[must_use]
    pub fn time_visible(&self) -> f32 {
        self.implementation().record().visible_time_us as f32 * 1e-6
    }

    /// Tracking confidence in `[0, 1]`.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.implementation().record().confidence
    }

    /// True for a valid left hand.
    #[must_use]
    pub fn is_left(&self) -> bool {
        self.is_valid() && self.implementation().record().chirality == Chirality::Left
    }

    /// True for a valid right hand.
    #[must_use]
    pub fn is_right(&self) -> bool {
        self.is_valid() && self.implementation().record().chirality == Chirality::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::hand_record as sample_hand;

    #[test]
    fn test_invalid_hand_neutral_values() {
        let hand = Hand::invalid();
        assert!(!hand.is_valid());
        assert_eq!(hand.id(), -1);
        assert_eq!(hand.basis(), Matrix::identity());
        assert_eq!(hand.fingers().count(), 0);
        assert_eq!(hand.direction(), Vector::zero());
        assert_eq!(hand.palm_normal(), Vector::zero());
        assert!(!hand.frame().is_valid());
        assert!(!hand.is_left());
        assert!(!hand.is_right());
        assert!(!hand.finger(0).is_valid());

        let fresh = Hand::default();
        assert_eq!(fresh.id(), -1);
        assert_eq!(fresh.palm_position(), Vector::zero());
        assert_eq!(fresh.grab_strength(), 0.0);
    }

    #[test]
    fn test_invalid_arm_neutral_values() {
        let arm = Arm::invalid();
        assert!(!arm.is_valid());
        assert_eq!(arm.basis(), Matrix::identity());
        assert_eq!(arm.center(), Vector::zero());
        assert_eq!(arm.direction(), -Vector::new(0.0, 0.0, 1.0));
        assert_eq!(arm.elbow_position(), Vector::zero());
        assert_eq!(arm.wrist_position(), Vector::zero());

        let hand_arm = Hand::default().arm();
        assert_ne!(hand_arm, *Arm::invalid());
        assert_eq!(hand_arm.basis(), Matrix::identity());
    }

    #[test]
    fn test_invalid_finger_and_bones() {
        let finger = Finger::invalid();
        assert_eq!(finger.id(), -1);
        assert_eq!(finger.finger_type(), FingerType::Thumb);
        assert_eq!(finger.tip_position(), Vector::zero());
        assert_eq!(finger.time_visible(), 0.0);

        let bone_a = Finger::default().bone(BoneType::Metacarpal);
        let bone_b = finger.bone(BoneType::Metacarpal);
        assert_ne!(bone_a, bone_b);
        assert!(!bone_b.is_valid());
        assert_eq!(bone_b.basis(), Matrix::identity());
        assert_eq!(bone_b.bone_type(), BoneType::Metacarpal);
        assert_eq!(finger.bone(BoneType::Distal).bone_type(), BoneType::Distal);
    }

    #[test]
    fn test_detached_finger_uses_digit_id() {
        let finger = Finger::new(Arc::new(FingerImpl::new(DigitRecord::with_id(3))));
        assert!(finger.is_valid());
        assert_eq!(finger.id(), 3);
        assert_eq!(finger.finger_type(), FingerType::Ring);
        assert!(!finger.hand().is_valid());
    }

    #[test]
    fn test_hand_properties_and_finger_ids() {
        let hand = Hand::new(HandImpl::build(Weak::new(), sample_hand(7, Chirality::Right, 10.0)));
        assert!(hand.is_valid());
        assert!(hand.is_right());
        assert_eq!(hand.id(), 7);
        assert!((hand.time_visible() - 2.5).abs() < 1e-6);
        assert_eq!(hand.fingers().count(), 5);
        assert_eq!(hand.fingers().get(2).id(), 72);
        assert_eq!(hand.finger(74), hand.fingers().get(4));
        assert!(!hand.finger(99).is_valid());
        assert_eq!(hand.wrist_position(), Vector::new(10.0, 180.0, 60.0));
        assert_eq!(hand.arm().direction(), Vector::forward());
        // No frame was attached.
        assert_eq!(hand.frame(), *Frame::invalid());
    }

    #[test]
    fn test_finger_geometry() {
        let hand = Hand::new(HandImpl::build(Weak::new(), sample_hand(1, Chirality::Right, 0.0)));
        let index = hand.fingers().finger_type(FingerType::Index).get(0);
        assert_eq!(index.finger_type(), FingerType::Index);
        assert_eq!(index.tip_position(), Vector::new(20.0, 200.0, -120.0));
        assert_eq!(index.direction(), Vector::forward());
        assert!((index.length() - 90.0).abs() < 1e-4);
        assert_eq!(index.width(), 17.0);
        let distal = index.bone(BoneType::Distal);
        assert!((distal.length() - 30.0).abs() < 1e-4);
        assert_eq!(distal.center(), Vector::new(20.0, 200.0, -105.0));
    }

    #[test]
    fn test_left_hand_basis_is_mirrored() {
        let left = Hand::new(HandImpl::build(Weak::new(), sample_hand(2, Chirality::Left, 0.0)));
        assert!(left.is_left());
        assert_eq!(left.basis().x_basis, -Vector::x_axis());
        assert_eq!(left.fingers().get(0).bone(BoneType::Proximal).basis().x_basis, -Vector::x_axis());
        assert_eq!(left.arm().basis().x_basis, -Vector::x_axis());
    }

    #[test]
    fn test_finger_outlives_hand() {
        let finger = {
            let hand = Hand::new(HandImpl::build(Weak::new(), sample_hand(4, Chirality::Right, 0.0)));
            let finger = hand.fingers().get(1);
            assert_eq!(finger.hand(), hand);
            assert!((finger.time_visible() - 2.5).abs() < 1e-6);
            finger
        };
        assert!(finger.is_valid());
        assert!(!finger.hand().is_valid());
        assert_eq!(finger.time_visible(), 0.0);
        assert!(!finger.frame().is_valid());
        assert_eq!(finger.id(), 41);
    }

    #[test]
    fn test_finger_filters() {
        let hand = Hand::new(HandImpl::build(Weak::new(), sample_hand(3, Chirality::Right, 0.0)));
        let fingers = hand.fingers();

        let extended = fingers.extended();
        assert_eq!(extended.count(), 3);
        assert!(extended.iter().all(|f| f.is_extended()));
        assert_eq!(extended.get(1), fingers.get(2));

        for finger_type in FingerType::ALL {
            let selected = fingers.finger_type(finger_type);
            assert_eq!(selected.count(), 1);
            assert_eq!(selected.get(0).finger_type(), finger_type);
        }

        let all = fingers.select(FingerPredicate::All);
        assert_eq!(all.count(), fingers.count());
        assert_eq!(fingers.count(), 5);
    }

    #[test]
    fn test_hand_extremum_by_palm() {
        let hands: HandList = [-50.0, 80.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, x)| Hand::new(HandImpl::build(Weak::new(), sample_hand(i as u32, Chirality::Right, *x))))
            .collect();
        assert_eq!(hands.leftmost().id(), 0);
        assert_eq!(hands.rightmost().id(), 1);
    }

    #[test]
    fn test_finger_extremum_by_tip() {
        let hand = Hand::new(HandImpl::build(Weak::new(), sample_hand(5, Chirality::Right, 0.0)));
        let fingers = hand.fingers();
        assert_eq!(fingers.leftmost().finger_type(), FingerType::Thumb);
        assert_eq!(fingers.rightmost().finger_type(), FingerType::Pinky);
        // Every tip shares z, so the first finger wins the tie.
        assert_eq!(fingers.frontmost(), fingers.get(0));
    }

    #[test]
    fn test_iterate_detached_fingers() {
        let fingers: FingerList = (0..5)
            .map(|i| Finger::new(Arc::new(FingerImpl::new(DigitRecord::with_id(i)))))
            .collect();
        assert_eq!(fingers.count(), 5);

        let mut it = fingers.begin();
        for expected in 0..5 {
            assert_ne!(it, fingers.end());
            assert_eq!(it.next().map(|f| f.id()), Some(expected));
        }
        assert_eq!(it, fingers.end());
        assert_eq!(it.next(), None);

        let types: Vec<FingerType> = (&fingers).into_iter().map(|f| f.finger_type()).collect();
        assert_eq!(types, FingerType::ALL.to_vec());
    }
}
