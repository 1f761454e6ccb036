use crate::{
    config::TrackerConfig,
    error::Error,
    estimator::{BodyEstimator, FaceEstimator, Frame, FrameInfo, Render},
    expression::{Expression, FaceDetection},
    geometry::Roi,
    squat::Transition,
    tracker::{Association, IdentityTracker, TrackedIdentity},
};
use std::{
    collections::BTreeMap,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use tracing::{debug, info, trace, warn};

type FrameOf<B> = <B as BodyEstimator>::Frame;
type CropOf<B> = <FrameOf<B> as Frame>::Crop;

/// Health of the external estimators, as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    /// At least one estimator call failed in each of the last
    /// `consecutive_failures` frames.
    Degraded {
        consecutive_failures: u32,
        last_error: String,
    },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Degraded {
                consecutive_failures,
                last_error,
            } => write!(
                f,
                "degraded ({} failed frames): {}",
                consecutive_failures, last_error
            ),
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    pub body: Duration,
    pub face: Duration,
    pub frames: u64,
}

/// What happened during one [`Engine::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame_num: u64,
    pub association: Association,
    /// Identities whose squat was counted this frame.
    pub counted: Vec<u32>,
    /// Identities that stood up without smiling this frame.
    pub withheld: Vec<u32>,
    pub body_failed: bool,
    pub face_failures: usize,
}

/// Runs the per-frame pipeline: body estimation, identity association, then
/// face crop, smile classification and squat counting for every identity
/// matched this frame.
///
/// The engine is driven by exactly one caller, one frame at a time. Estimator
/// failures never escape [`Engine::step`]; they degrade [`Engine::status`]
/// instead.
pub struct Engine<B, F> {
    tracker: IdentityTracker,
    body: B,
    face: F,
    status: Status,
    timing: Timing,
    frame_num: u64,
}

fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn detect_face<B, F>(
    face: &mut F,
    frame: &FrameOf<B>,
    roi: &Roi,
    id: u32,
) -> Result<Option<FaceDetection>, Error>
where
    B: BodyEstimator,
    F: FaceEstimator<Crop = CropOf<B>>,
{
    let crop = frame.crop(roi).map_err(|e| Error::CropFrame(e, id))?;
    face.detect(&crop).map_err(|e| Error::EstimateFace(e, id))
}

impl<B, F> Engine<B, F>
where
    B: BodyEstimator,
    F: FaceEstimator<Crop = CropOf<B>>,
{
    pub fn new(config: TrackerConfig, body: B, face: F) -> Result<Self, Error> {
        Ok(Self {
            tracker: IdentityTracker::new(config)?,
            body,
            face,
            status: Status::Running,
            timing: Default::default(),
            frame_num: 0,
        })
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn frame_num(&self) -> u64 {
        self.frame_num
    }

    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    pub fn identities(&self) -> &BTreeMap<u32, TrackedIdentity> {
        self.tracker.identities()
    }

    /// Applied when the next frame assigns identities.
    pub fn set_max_identities(&mut self, max_identities: u32) -> Result<(), Error> {
        self.tracker.set_max_identities(max_identities)
    }

    pub fn step(&mut self, frame: &FrameOf<B>, timestamp: Duration) -> FrameReport {
        self.frame_num += 1;
        let mut report = FrameReport {
            frame_num: self.frame_num,
            ..Default::default()
        };
        let mut failure = None;

        let start_body = Instant::now();
        let detections = match self.body.detect(frame, timestamp) {
            Ok(detections) => detections,
            Err(source) => {
                let error = Error::EstimateBody(source);
                warn!(
                    message = "body estimation failed, treating frame as empty",
                    frame_num = self.frame_num,
                    error = %describe(&error)
                );
                report.body_failed = true;
                failure = Some(error);
                Vec::new()
            }
        };
        self.timing.body += start_body.elapsed();

        report.association = self.tracker.update(detections, timestamp);

        let (width, height) = (frame.width(), frame.height());
        for identity in self.tracker.matched_mut() {
            let roi = Roi::for_face(identity.body_landmarks.head_and_shoulders(), width, height);
            let expression = match roi {
                Some(ref roi) => {
                    let start_face = Instant::now();
                    let detected = detect_face::<B, F>(&mut self.face, frame, roi, identity.id);
                    self.timing.face += start_face.elapsed();

                    match detected {
                        Ok(detection) => {
                            Expression::classify(detection.as_ref(), roi, width, height)
                        }
                        Err(error) => {
                            warn!(
                                message = "face estimation failed, treating face as absent",
                                id = identity.id,
                                error = %describe(&error)
                            );
                            report.face_failures += 1;
                            failure = Some(error);
                            Expression::none()
                        }
                    }
                }
                None => Expression::none(),
            };
            identity.apply_expression(roi, expression);

            match identity.update_squat() {
                Some(Transition::Counted) => {
                    info!(
                        message = "squat counted",
                        id = identity.id,
                        count = identity.squat_count()
                    );
                    report.counted.push(identity.id);
                }
                Some(Transition::Withheld) => {
                    debug!(
                        message = "squat not counted, not smiling",
                        id = identity.id,
                        smile_score = identity.smile_score
                    );
                    report.withheld.push(identity.id);
                }
                Some(Transition::Descended) => {
                    trace!(
                        message = "squat down",
                        id = identity.id,
                        knee_angle = identity.knee_angle
                    );
                }
                None => {}
            }
        }

        self.timing.frames += 1;
        self.record(failure);
        report
    }

    fn record(&mut self, failure: Option<Error>) {
        match failure {
            None => {
                if let Status::Degraded {
                    consecutive_failures,
                    ..
                } = self.status
                {
                    info!(message = "estimators recovered", consecutive_failures);
                    self.status = Status::Running;
                }
            }
            Some(error) => {
                let consecutive_failures = match self.status {
                    Status::Running => 1,
                    Status::Degraded {
                        consecutive_failures,
                        ..
                    } => consecutive_failures.saturating_add(1),
                };
                self.status = Status::Degraded {
                    consecutive_failures,
                    last_error: describe(&error),
                };
            }
        }
    }

    /// Steps through `frames` one at a time, rendering after each, until the
    /// source is exhausted or `running` is cleared. Returns the number of
    /// frames processed.
    pub fn run<I, R>(
        &mut self,
        frames: I,
        renderer: &mut R,
        running: &AtomicBool,
    ) -> Result<u64, Error>
    where
        I: IntoIterator<Item = Result<(FrameOf<B>, Duration), Error>>,
        R: Render,
    {
        let mut processed = 0;
        for next in frames {
            if !running.load(Ordering::SeqCst) {
                info!(message = "stop requested", frame_num = self.frame_num);
                break;
            }

            let (frame, timestamp) = next?;
            self.step(&frame, timestamp);

            let info = FrameInfo {
                frame_num: self.frame_num,
                timestamp,
                width: frame.width(),
                height: frame.height(),
                status: &self.status,
            };
            renderer
                .render(info, self.tracker.identities())
                .map_err(|e| Error::Render(e, self.frame_num))?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Releases both estimators and hands back the final identity state.
    pub fn shutdown(mut self) -> IdentityTracker {
        self.body.close();
        self.face.close();
        info!(
            message = "engine stopped",
            frames = self.timing.frames,
            identities = self.tracker.len()
        );
        self.tracker
    }
}
