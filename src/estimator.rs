//! Seams to the external collaborators: the video frame, the body and face
//! landmark estimators, and whatever draws the results.

use crate::{
    engine::Status, error::BoxError, expression::FaceDetection, geometry::Roi,
    landmark::BodyLandmarks, tracker::TrackedIdentity,
};
use std::{collections::BTreeMap, time::Duration};

/// A captured video frame.
pub trait Frame {
    /// A square region cut out of the frame, fed to the face estimator.
    type Crop;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn crop(&self, roi: &Roi) -> Result<Self::Crop, BoxError>;
}

/// Finds every body in a frame. Results carry no identity and no ordering.
pub trait BodyEstimator {
    type Frame: Frame;

    fn detect(
        &mut self,
        frame: &Self::Frame,
        timestamp: Duration,
    ) -> Result<Vec<BodyLandmarks>, BoxError>;

    /// Release any resources held by the estimator.
    fn close(&mut self) {}
}

/// Finds at most one face in a crop.
pub trait FaceEstimator {
    type Crop;

    fn detect(&mut self, crop: &Self::Crop) -> Result<Option<FaceDetection>, BoxError>;

    /// Release any resources held by the estimator.
    fn close(&mut self) {}
}

/// Per-frame information handed to a [`Render`] alongside the identities.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo<'a> {
    pub frame_num: u64,
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    pub status: &'a Status,
}

/// Consumes the identity snapshot after every frame. Read only.
pub trait Render {
    fn render(
        &mut self,
        info: FrameInfo<'_>,
        identities: &BTreeMap<u32, TrackedIdentity>,
    ) -> Result<(), BoxError>;
}
