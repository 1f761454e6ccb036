use crate::{geometry::Roi, landmark::Landmark};
use serde::{Deserialize, Serialize};

pub const SMILE_LEFT: &str = "mouthSmileLeft";
pub const SMILE_RIGHT: &str = "mouthSmileRight";

/// Smile scores strictly above this count as smiling.
pub const SMILE_THRESHOLD: f32 = 0.45;

/// One named blendshape score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub score: f32,
}

impl Category {
    pub fn new<S: Into<String>>(name: S, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// What the face estimator found in one crop. Landmarks are normalized to the
/// crop; either part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub blendshapes: Vec<Category>,
}

fn category_score(categories: &[Category], name: &str) -> f32 {
    categories
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.score)
        .filter(|score| score.is_finite())
        .unwrap_or(0.0)
}

/// Mean of the left and right smile scores, missing categories counting as 0.
pub fn smile_score(categories: &[Category]) -> f32 {
    let left = category_score(categories, SMILE_LEFT);
    let right = category_score(categories, SMILE_RIGHT);
    ((left + right) / 2.0).max(0.0).min(1.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub smile_score: f32,
    pub is_smiling: bool,
    /// Face landmarks in frame-normalized coordinates.
    pub face_landmarks: Option<Vec<Landmark>>,
}

impl Expression {
    /// No face: zero smile, no landmarks.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn classify(
        detection: Option<&FaceDetection>,
        roi: &Roi,
        frame_w: u32,
        frame_h: u32,
    ) -> Self {
        let detection = match detection {
            Some(detection) => detection,
            None => return Self::none(),
        };

        let smile_score = smile_score(&detection.blendshapes);
        let face_landmarks = if detection.landmarks.is_empty() {
            None
        } else {
            Some(
                detection
                    .landmarks
                    .iter()
                    .map(|l| roi.to_frame(l, frame_w, frame_h))
                    .collect(),
            )
        };

        Self {
            smile_score,
            is_smiling: smile_score > SMILE_THRESHOLD,
            face_landmarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn smile(left: f32, right: f32) -> Vec<Category> {
        vec![
            Category::new("jawOpen", 0.9),
            Category::new(SMILE_LEFT, left),
            Category::new(SMILE_RIGHT, right),
        ]
    }

    #[test]
    fn score_is_mean_of_both_sides() {
        assert_approx_eq!(smile_score(&smile(0.4, 0.8)), 0.6);
    }

    #[test]
    fn missing_side_counts_as_zero() {
        let categories = vec![Category::new(SMILE_LEFT, 0.8)];
        assert_approx_eq!(smile_score(&categories), 0.4);
        assert_eq!(smile_score(&[]), 0.0);
    }

    #[test]
    fn threshold_is_strict() {
        let roi = Roi {
            x: 0.0,
            y: 0.0,
            size: 100.0,
        };
        let at = FaceDetection {
            landmarks: vec![],
            blendshapes: smile(0.45, 0.45),
        };
        assert!(!Expression::classify(Some(&at), &roi, 200, 100).is_smiling);

        let above = FaceDetection {
            landmarks: vec![],
            blendshapes: smile(0.5, 0.45),
        };
        assert!(Expression::classify(Some(&above), &roi, 200, 100).is_smiling);
    }

    #[test]
    fn no_face_resets() {
        let roi = Roi {
            x: 0.0,
            y: 0.0,
            size: 100.0,
        };
        let expression = Expression::classify(None, &roi, 200, 100);
        assert_eq!(expression, Expression::none());
        assert!(!expression.is_smiling);
        assert!(expression.face_landmarks.is_none());
    }

    #[test]
    fn landmarks_are_remapped_to_frame() {
        let roi = Roi {
            x: 100.0,
            y: 50.0,
            size: 50.0,
        };
        let detection = FaceDetection {
            landmarks: vec![Landmark::new(0.0, 0.0, 0.0), Landmark::new(1.0, 0.5, 0.0)],
            blendshapes: smile(0.9, 0.9),
        };
        let expression = Expression::classify(Some(&detection), &roi, 200, 100);
        assert!(expression.is_smiling);

        let landmarks = expression.face_landmarks.unwrap();
        assert_approx_eq!(landmarks[0].x, 0.5);
        assert_approx_eq!(landmarks[0].y, 0.5);
        assert_approx_eq!(landmarks[1].x, 0.75);
        assert_approx_eq!(landmarks[1].y, 0.75);
    }
}
