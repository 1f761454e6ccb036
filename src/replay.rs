//! Recorded landmark streams, replayed through the engine as if they came
//! from live estimators.
//!
//! A recording is JSON lines, one frame per line:
//!
//! ```json
//! {"timestamp_ms": 33, "width": 1280, "height": 720,
//!  "bodies": [[{"x": 0.5, "y": 0.2, "z": -0.1}, ...]],
//!  "faces": [{"landmarks": [...], "blendshapes": [{"name": "mouthSmileLeft", "score": 0.7}]}]}
//! ```
//!
//! Face landmarks are stored in frame-normalized coordinates. Cropping a
//! recorded frame keeps the faces centered inside the crop and re-expresses
//! them relative to it.

use crate::{
    error::{BoxError, Error},
    estimator::{BodyEstimator, FaceEstimator, Frame},
    expression::FaceDetection,
    geometry::Roi,
    landmark::BodyLandmarks,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub bodies: Vec<BodyLandmarks>,
    #[serde(default)]
    pub faces: Vec<FaceDetection>,
}

impl RecordedFrame {
    pub fn timestamp(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }
}

/// The faces of a [`RecordedFrame`] that fall inside one crop, in crop-local
/// coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedCrop {
    pub faces: Vec<FaceDetection>,
}

fn face_center(face: &FaceDetection) -> Option<(f32, f32)> {
    let mut sum = (0.0, 0.0);
    let mut count = 0u32;
    for landmark in face
        .landmarks
        .iter()
        .filter(|l| l.x.is_finite() && l.y.is_finite())
    {
        sum.0 += landmark.x;
        sum.1 += landmark.y;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some((sum.0 / count as f32, sum.1 / count as f32))
    }
}

impl Frame for RecordedFrame {
    type Crop = RecordedCrop;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn crop(&self, roi: &Roi) -> Result<RecordedCrop, BoxError> {
        let (w, h) = (self.width, self.height);
        let faces = self
            .faces
            .iter()
            .filter(|face| {
                face_center(face)
                    .map(|(x, y)| roi.contains(x, y, w, h))
                    .unwrap_or(false)
            })
            .map(|face| FaceDetection {
                landmarks: face
                    .landmarks
                    .iter()
                    .map(|l| roi.to_crop(l, w, h))
                    .collect(),
                blendshapes: face.blendshapes.clone(),
            })
            .collect();
        Ok(RecordedCrop { faces })
    }
}

/// Body estimator that returns the bodies stored in each recorded frame.
#[derive(Debug, Default)]
pub struct ReplayBodies;

impl BodyEstimator for ReplayBodies {
    type Frame = RecordedFrame;

    fn detect(
        &mut self,
        frame: &RecordedFrame,
        _timestamp: Duration,
    ) -> Result<Vec<BodyLandmarks>, BoxError> {
        Ok(frame.bodies.clone())
    }
}

/// Face estimator that returns the first recorded face inside the crop.
#[derive(Debug, Default)]
pub struct ReplayFaces;

impl FaceEstimator for ReplayFaces {
    type Crop = RecordedCrop;

    fn detect(&mut self, crop: &RecordedCrop) -> Result<Option<FaceDetection>, BoxError> {
        Ok(crop.faces.first().cloned())
    }
}

/// Iterator over the frames of a recording.
pub struct Recording<R> {
    lines: io::Lines<R>,
    line: usize,
    path: PathBuf,
}

impl Recording<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::ReadRecording(e, path.to_path_buf()))?;
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> Recording<R> {
    pub fn from_reader<P: AsRef<Path>>(reader: R, path: P) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Pairs every frame with its recorded timestamp, as [`crate::Engine::run`]
    /// expects.
    pub fn timed(self) -> impl Iterator<Item = Result<(RecordedFrame, Duration), Error>> {
        self.map(|frame| {
            frame.map(|frame| {
                let timestamp = frame.timestamp();
                (frame, timestamp)
            })
        })
    }

    fn parse(&self, text: &str) -> Result<RecordedFrame, Error> {
        let frame: RecordedFrame =
            serde_json::from_str(text).map_err(|e| Error::ParseRecordedFrame(e, self.line))?;
        if frame.width == 0 || frame.height == 0 {
            return Err(Error::EmptyRecordedFrame(self.line));
        }
        Ok(frame)
    }
}

impl<R: BufRead> Iterator for Recording<R> {
    type Item = Result<RecordedFrame, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line += 1;
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(Error::ReadRecording(e, self.path.clone()))),
            };
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&text));
        }
    }
}
