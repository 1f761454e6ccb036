use crate::landmark::Landmark;
use serde::Serialize;

/// Horizontal padding applied to the head/shoulder box, as a fraction of its width.
pub const PAD_WIDTH: f32 = 0.8;
/// Vertical padding applied to the head/shoulder box, as a fraction of its height.
pub const PAD_HEIGHT: f32 = 1.0;

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Pixel-space box around every finite landmark. `None` with fewer than
    /// two usable points.
    pub fn from_landmarks(landmarks: &[Landmark], frame_w: u32, frame_h: u32) -> Option<Self> {
        let fw = frame_w as f32;
        let fh = frame_h as f32;

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut count = 0u32;

        for landmark in landmarks
            .iter()
            .filter(|l| l.x.is_finite() && l.y.is_finite())
        {
            let px = landmark.x * fw;
            let py = landmark.y * fh;
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
            count += 1;
        }

        if count < 2 {
            return None;
        }

        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Square crop region in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Roi {
    /// Square face crop around the head and shoulders.
    ///
    /// The landmark box is padded, squared on its center and then translated
    /// so that it lies inside the frame. The side is never larger than the
    /// shorter frame dimension. Coordinates are whole pixels.
    pub fn for_face(landmarks: &[Landmark], frame_w: u32, frame_h: u32) -> Option<Self> {
        let bbox = BoundingBox::from_landmarks(landmarks, frame_w, frame_h)?;
        let fw = frame_w as f32;
        let fh = frame_h as f32;

        let padded_w = bbox.width * (1.0 + PAD_WIDTH);
        let padded_h = bbox.height * (1.0 + PAD_HEIGHT);
        let size = padded_w.max(padded_h).min(fw.min(fh)).floor();
        if !(size >= 1.0) {
            return None;
        }

        let (cx, cy) = bbox.center();
        let x = (cx - size / 2.0).round().max(0.0).min(fw - size);
        let y = (cy - size / 2.0).round().max(0.0).min(fh - size);

        Some(Self { x, y, size })
    }

    pub fn is_within(&self, frame_w: u32, frame_h: u32) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.size <= frame_w as f32
            && self.y + self.size <= frame_h as f32
    }

    /// Maps a landmark detected inside this crop back to frame-normalized
    /// coordinates.
    pub fn to_frame(&self, landmark: &Landmark, frame_w: u32, frame_h: u32) -> Landmark {
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        Landmark {
            x: (self.x + landmark.x * self.size) / fw,
            y: (self.y + landmark.y * self.size) / fh,
            z: landmark.z * self.size / fw,
        }
    }

    /// Inverse of [`Roi::to_frame`].
    pub fn to_crop(&self, landmark: &Landmark, frame_w: u32, frame_h: u32) -> Landmark {
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        Landmark {
            x: (landmark.x * fw - self.x) / self.size,
            y: (landmark.y * fh - self.y) / self.size,
            z: landmark.z * fw / self.size,
        }
    }

    /// Whether a frame-normalized point falls inside the crop.
    pub fn contains(&self, x: f32, y: f32, frame_w: u32, frame_h: u32) -> bool {
        let px = x * frame_w as f32;
        let py = y * frame_h as f32;
        px >= self.x && px <= self.x + self.size && py >= self.y && py <= self.y + self.size
    }
}
