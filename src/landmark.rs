use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Body joints in the order the pose estimator emits them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LandmarkKind {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkKind {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }
}

pub const NUM_LANDMARKS: usize = LandmarkKind::RightFootIndex as usize + 1;

/// Face and shoulder landmarks, used to place the face crop.
pub const HEAD_AND_SHOULDERS: Range<usize> = 0..LandmarkKind::RightShoulder as usize + 1;

/// A single normalized landmark. `x` and `y` are in `[0, 1]` relative to the
/// frame (or crop) they were detected in; `z` is relative depth.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detected body. Indices follow [`LandmarkKind`]; an estimator may emit
/// fewer points than [`NUM_LANDMARKS`], in which case the trailing joints are
/// treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyLandmarks(Vec<Landmark>);

impl BodyLandmarks {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.0.get(kind.idx())
    }

    pub fn as_slice(&self) -> &[Landmark] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The leading landmarks that cover the face and shoulders.
    pub fn head_and_shoulders(&self) -> &[Landmark] {
        let end = HEAD_AND_SHOULDERS.end.min(self.0.len());
        &self.0[..end]
    }
}

impl From<Vec<Landmark>> for BodyLandmarks {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self::new(landmarks)
    }
}
