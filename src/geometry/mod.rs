//! Joint angles, body centroids and face crop placement.

use crate::landmark::{BodyLandmarks, Landmark, LandmarkKind};

mod point;
mod roi;

pub use point::Point;
pub use roi::{BoundingBox, Roi, PAD_HEIGHT, PAD_WIDTH};

/// Angle reported for a joint that cannot be measured: fully extended.
pub const EXTENDED_ANGLE: f32 = 180.0;

fn usable(landmark: Option<&Landmark>) -> Option<Point> {
    landmark.and_then(|l| Point::from_landmark(l).ok())
}

/// Angle in degrees at `vertex` between the rays towards `a` and `c`, in
/// `[0, 180]`. Any missing point yields [`EXTENDED_ANGLE`].
pub fn joint_angle(a: Option<&Landmark>, vertex: Option<&Landmark>, c: Option<&Landmark>) -> f32 {
    match (usable(a), usable(vertex), usable(c)) {
        (Some(a), Some(vertex), Some(c)) => {
            let ba = a - vertex;
            let bc = c - vertex;
            let radians = bc.y().atan2(bc.x()) - ba.y().atan2(ba.x());
            let degrees = radians.to_degrees().abs();
            if degrees > 180.0 {
                360.0 - degrees
            } else {
                degrees
            }
        }
        _ => EXTENDED_ANGLE,
    }
}

/// The more bent of the two knees (hip, knee, ankle).
pub fn knee_angle(body: &BodyLandmarks) -> f32 {
    use LandmarkKind::*;

    let left = joint_angle(body.get(LeftHip), body.get(LeftKnee), body.get(LeftAnkle));
    let right = joint_angle(body.get(RightHip), body.get(RightKnee), body.get(RightAnkle));
    left.min(right)
}

/// Midpoint of the two hips, used as the body's position for matching.
pub fn hip_centroid(body: &BodyLandmarks) -> Option<Point> {
    let left = usable(body.get(LandmarkKind::LeftHip))?;
    let right = usable(body.get(LandmarkKind::RightHip))?;
    Some(left.midpoint(right))
}
