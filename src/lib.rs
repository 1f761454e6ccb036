//! Per-frame identity tracking and smile-gated squat counting on top of an
//! external body/face landmark estimator.

pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod expression;
pub mod geometry;
pub mod landmark;
pub mod replay;
pub mod squat;
pub mod tracker;

pub use config::TrackerConfig;
pub use engine::{Engine, FrameReport, Status, Timing};
pub use error::{BoxError, Error};
pub use estimator::{BodyEstimator, FaceEstimator, Frame, FrameInfo, Render};
pub use tracker::{IdentityTracker, TrackedIdentity};
