use crate::{
    config::{self, TrackerConfig},
    error::Error,
    expression::Expression,
    geometry::{self, Roi, EXTENDED_ANGLE},
    landmark::{BodyLandmarks, Landmark},
    squat::{RepCounter, SquatState, Transition},
};
use bitvec::bitvec;
use ordered_float::NotNan;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, info, trace};

/// One person followed across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedIdentity {
    pub id: u32,
    /// Landmarks from the last frame this person was matched in.
    pub body_landmarks: BodyLandmarks,
    pub last_seen: Duration,
    /// Consecutive frames without a match; 0 when matched this frame.
    pub missing_frames: u32,
    pub squat: RepCounter,
    pub smile_score: f32,
    pub is_smiling: bool,
    pub knee_angle: f32,
    pub face_roi: Option<Roi>,
    pub face_landmarks: Option<Vec<Landmark>>,
}

impl TrackedIdentity {
    fn new(id: u32, body_landmarks: BodyLandmarks, timestamp: Duration) -> Self {
        Self {
            id,
            body_landmarks,
            last_seen: timestamp,
            missing_frames: 0,
            squat: RepCounter::new(),
            smile_score: 0.0,
            is_smiling: false,
            knee_angle: EXTENDED_ANGLE,
            face_roi: None,
            face_landmarks: None,
        }
    }

    pub fn squat_state(&self) -> SquatState {
        self.squat.state()
    }

    pub fn squat_count(&self) -> u32 {
        self.squat.count()
    }

    pub fn is_matched(&self) -> bool {
        self.missing_frames == 0
    }

    pub(crate) fn apply_expression(&mut self, roi: Option<Roi>, expression: Expression) {
        self.face_roi = roi;
        self.smile_score = expression.smile_score;
        self.is_smiling = expression.is_smiling;
        self.face_landmarks = expression.face_landmarks;
    }

    /// Measures the knees on the current landmarks and advances the squat
    /// counter, gated on the current smile.
    pub(crate) fn update_squat(&mut self) -> Option<Transition> {
        self.knee_angle = geometry::knee_angle(&self.body_landmarks);
        self.squat.update(self.knee_angle, self.is_smiling)
    }
}

/// What one call to [`IdentityTracker::update`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Association {
    pub matched: Vec<u32>,
    pub created: Vec<u32>,
    pub retired: Vec<u32>,
    /// Identities removed because the capacity shrank below their id.
    pub evicted: Vec<u32>,
    /// Detections that did not end up attached to any identity.
    pub dropped: usize,
}

/// Labels each frame's anonymous bodies with small, recycled integer ids by
/// greedy nearest-hip-centroid matching.
///
/// Live identities are visited in ascending id order and each takes the
/// closest still-unclaimed detection, if it is nearer than the configured
/// match distance. This is not an optimal assignment: an early identity can
/// claim a detection that a later identity needed more.
#[derive(Debug, Clone)]
pub struct IdentityTracker {
    config: TrackerConfig,
    identities: BTreeMap<u32, TrackedIdentity>,
}

impl IdentityTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            identities: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Takes effect at the next [`IdentityTracker::update`].
    pub fn set_max_identities(&mut self, max_identities: u32) -> Result<(), Error> {
        config::validate_capacity(max_identities)?;
        self.config.max_identities = max_identities;
        Ok(())
    }

    pub fn identities(&self) -> &BTreeMap<u32, TrackedIdentity> {
        &self.identities
    }

    pub fn get(&self, id: u32) -> Option<&TrackedIdentity> {
        self.identities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub(crate) fn matched_mut(&mut self) -> impl Iterator<Item = &mut TrackedIdentity> + '_ {
        self.identities.values_mut().filter(|i| i.is_matched())
    }

    pub fn update(&mut self, detections: Vec<BodyLandmarks>, timestamp: Duration) -> Association {
        let capacity = self.config.max_identities;
        let mut association = Association::default();

        let evicted: Vec<u32> = self
            .identities
            .keys()
            .copied()
            .filter(|&id| id > capacity)
            .collect();
        for id in evicted {
            self.identities.remove(&id);
            info!(message = "evicted identity above capacity", id, capacity);
            association.evicted.push(id);
        }

        let mut pending = Vec::with_capacity(detections.len());
        for body in detections {
            match geometry::hip_centroid(&body) {
                Some(centroid) => pending.push(Some((centroid, body))),
                None => {
                    debug!(message = "dropping detection without hip centroid");
                    association.dropped += 1;
                }
            }
        }

        let match_distance = self.config.match_distance;
        for identity in self.identities.values_mut() {
            let nearest = geometry::hip_centroid(&identity.body_landmarks).and_then(|previous| {
                pending
                    .iter()
                    .enumerate()
                    .filter_map(|(i, detection)| {
                        let (centroid, _) = detection.as_ref()?;
                        let distance = NotNan::new(previous.distance(*centroid)).ok()?;
                        Some((i, distance))
                    })
                    .min_by_key(|&(_, distance)| distance)
            });

            let claimed = match nearest {
                Some((i, distance)) if distance.into_inner() < match_distance => pending[i].take(),
                _ => None,
            };

            match claimed {
                Some((_, body)) => {
                    identity.body_landmarks = body;
                    identity.last_seen = timestamp;
                    identity.missing_frames = 0;
                    trace!(message = "matched identity", id = identity.id);
                    association.matched.push(identity.id);
                }
                None => {
                    identity.missing_frames = identity.missing_frames.saturating_add(1);
                    trace!(
                        message = "identity unmatched",
                        id = identity.id,
                        missing_frames = identity.missing_frames
                    );
                }
            }
        }

        let retire_threshold = self.config.retire_threshold;
        let retired: Vec<u32> = self
            .identities
            .values()
            .filter(|i| i.missing_frames >= retire_threshold)
            .map(|i| i.id)
            .collect();
        for id in retired {
            self.identities.remove(&id);
            info!(message = "retired identity", id);
            association.retired.push(id);
        }

        // the lowest free ids for every new detection lie within this prefix
        let unclaimed = pending.iter().filter(|p| p.is_some()).count();
        let slots = (self.identities.len() + unclaimed).min(capacity as usize) as u32;
        let mut used = bitvec![0; slots as usize + 1];
        for &id in self.identities.keys().take_while(|&&id| id <= slots) {
            used.set(id as usize, true);
        }

        for (centroid, body) in pending.into_iter().flatten() {
            match (1..=slots).find(|&id| !used[id as usize]) {
                Some(id) => {
                    used.set(id as usize, true);
                    info!(
                        message = "new identity",
                        id,
                        x = centroid.x(),
                        y = centroid.y()
                    );
                    self.identities
                        .insert(id, TrackedIdentity::new(id, body, timestamp));
                    association.created.push(id);
                }
                None => {
                    debug!(
                        message = "capacity exhausted, dropping detection",
                        capacity,
                        x = centroid.x(),
                        y = centroid.y()
                    );
                    association.dropped += 1;
                }
            }
        }

        association
    }
}
