//! Sensing-volume geometry.
//!
//! A device senses inside the intersection of two angular wedges (horizontal
//! and vertical field of view) and a sphere of radius `range`, all with their
//! apex at the device origin and opening along +y.
//!
//! [`SensingVolume::distance_to_boundary`] estimates how far a point is from
//! the nearest surface of that volume using three closed-form candidates: the
//! spherical cap and the two nearest wedge walls.
//!
//! Points further than `range` from the origin report a distance of 0 rather
//! than a distance to the far surface. Callers rely on that.

use serde::{Deserialize, Serialize};

use crate::math::Vector;

/// Which surface of the sensing volume a closest point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryFace {
    /// Spherical cap at `range`
    Top,
    /// Wall of the horizontal (x) wedge
    Horizontal,
    /// Wall of the vertical (z) wedge
    Vertical,
}

/// Field of view and range of a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensingVolume {
    /// Full horizontal field of view, radians
    pub horizontal_view_angle: f32,
    /// Full vertical field of view, radians
    pub vertical_view_angle: f32,
    /// Maximum sensing distance
    pub range: f32,
}

impl SensingVolume {
    /// Create a new sensing volume.
    #[must_use]
    pub const fn new(horizontal_view_angle: f32, vertical_view_angle: f32, range: f32) -> Self {
        Self {
            horizontal_view_angle,
            vertical_view_angle,
            range,
        }
    }

    /// True if `position` is no further than `range` from the origin.
    #[must_use]
    pub fn within_range(&self, position: &Vector) -> bool {
        position.magnitude_squared() <= self.range * self.range
    }

    /// Distance from `position` to the nearest boundary surface.
    ///
    /// Returns 0 when `position` lies beyond `range`.
    #[must_use]
    pub fn distance_to_boundary(&self, position: &Vector) -> f32 {
        if !self.within_range(position) {
            return 0.0;
        }
        let (point, _) = self.closest_point_on_boundary(position);
        (*position - point).magnitude()
    }

    /// Closest candidate point on the boundary and the face it lies on.
    ///
    /// Candidates are compared by squared distance with strict `<`, in the
    /// priority order top, horizontal, vertical.
    #[must_use]
    pub fn closest_point_on_boundary(&self, position: &Vector) -> (Vector, BoundaryFace) {
        let tan_h = (self.horizontal_view_angle * 0.5).tan();
        let tan_v = (self.vertical_view_angle * 0.5).tan();

        // Horizontal walls: project (|x|, y) onto the line y = m x.
        let m = 1.0 / tan_h;
        let x = (m * position.y + position.x.abs()) / (m * m + 1.0);
        let mut horiz = Vector::new(x, m * x, position.z);
        if position.x < 0.0 {
            horiz.x = -horiz.x;
        }

        // Vertical walls: same construction on (|z|, y).
        let m = 1.0 / tan_v;
        let z = (m * position.y + position.z.abs()) / (m * m + 1.0);
        let mut vert = Vector::new(position.x, m * z, z);
        if position.z < 0.0 {
            vert.z = -vert.z;
        }

        let top = position.normalized() * self.range;

        let dist_sq_top = (top - *position).magnitude_squared();
        let dist_sq_horiz = (horiz - *position).magnitude_squared();
        let dist_sq_vert = (vert - *position).magnitude_squared();

        if dist_sq_top < dist_sq_horiz && dist_sq_top < dist_sq_vert {
            (top, BoundaryFace::Top)
        } else if dist_sq_horiz < dist_sq_vert {
            (horiz, BoundaryFace::Horizontal)
        } else {
            (vert, BoundaryFace::Vertical)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEG_120: f32 = 120.0 * core::f32::consts::PI / 180.0;

    fn wide() -> SensingVolume {
        SensingVolume::new(DEG_120, DEG_120, 1.0)
    }

    #[test]
    fn test_point_beyond_range_is_zero() {
        let volume = wide();
        assert_eq!(volume.distance_to_boundary(&Vector::new(0.0, 2.0, 0.0)), 0.0);
        assert_eq!(volume.distance_to_boundary(&Vector::new(1.5, 1.5, -1.5)), 0.0);
    }

    #[test]
    fn test_near_range_top_cap_wins() {
        let volume = wide();
        let p = Vector::new(0.0, 0.9, 0.0);
        let (point, face) = volume.closest_point_on_boundary(&p);
        assert_eq!(face, BoundaryFace::Top);
        assert!((point.y - 1.0).abs() < 1e-6);
        assert!((volume.distance_to_boundary(&p) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_mid_axis_walls_win_over_cap() {
        // Walls sit at 60 degrees from +y, so the wall distance is 0.5 * sin(60).
        let volume = wide();
        let p = Vector::new(0.0, 0.5, 0.0);
        let d = volume.distance_to_boundary(&p);
        assert!((d - 0.5 * (60.0_f32).to_radians().sin()).abs() < 1e-5);
    }

    #[test]
    fn test_equal_walls_tie_goes_to_vertical() {
        let volume = wide();
        let (_, face) = volume.closest_point_on_boundary(&Vector::new(0.0, 0.5, 0.0));
        assert_eq!(face, BoundaryFace::Vertical);
    }

    #[test]
    fn test_horizontal_wall_sign_follows_query() {
        let volume = SensingVolume::new(1.0, 3.0, 1.0);
        let right = Vector::new(0.2, 0.3, 0.0);
        let left = Vector::new(-0.2, 0.3, 0.0);

        let (pr, fr) = volume.closest_point_on_boundary(&right);
        let (pl, fl) = volume.closest_point_on_boundary(&left);
        assert_eq!(fr, BoundaryFace::Horizontal);
        assert_eq!(fl, BoundaryFace::Horizontal);
        assert!(pr.x > 0.0);
        assert!(pl.x < 0.0);
        assert!((pr.x + pl.x).abs() < 1e-6);
        assert_eq!(pr.z, right.z);

        let dr = volume.distance_to_boundary(&right);
        let dl = volume.distance_to_boundary(&left);
        assert!((dr - dl).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_wall_sign_follows_query() {
        let volume = SensingVolume::new(3.0, 1.2, 1.0);
        let p = Vector::new(0.05, 0.3, -0.25);
        let (point, face) = volume.closest_point_on_boundary(&p);
        assert_eq!(face, BoundaryFace::Vertical);
        assert!(point.z < 0.0);
        assert_eq!(point.x, p.x);
    }

    #[test]
    fn test_origin_is_on_boundary() {
        let volume = wide();
        assert_eq!(volume.distance_to_boundary(&Vector::zero()), 0.0);
    }

    #[test]
    fn test_distance_never_exceeds_range() {
        let volume = SensingVolume::new(2.0, 1.6, 0.6);
        for i in 0..20 {
            let t = i as f32 / 20.0;
            let p = Vector::new(0.2 * t - 0.1, 0.55 * t, 0.1 - 0.2 * t);
            let d = volume.distance_to_boundary(&p);
            assert!(d >= 0.0);
            assert!(d <= volume.range);
        }
    }
}
