use serde::Serialize;
use std::fmt;

/// Knee angle (degrees) below which a standing body is considered squatting.
pub const DOWN_BELOW: f32 = 100.0;
/// Knee angle (degrees) above which a squatting body is considered standing.
pub const UP_ABOVE: f32 = 160.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SquatState {
    Up,
    Down,
}

impl Default for SquatState {
    fn default() -> Self {
        Self::Up
    }
}

impl fmt::Display for SquatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
        }
    }
}

/// A state change produced by [`RepCounter::update`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// UP -> DOWN.
    Descended,
    /// DOWN -> UP, with the repetition counted.
    Counted,
    /// DOWN -> UP while not smiling; the repetition is not counted.
    Withheld,
}

/// Two-state squat counter with hysteresis between [`DOWN_BELOW`] and
/// [`UP_ABOVE`]. A repetition only counts if the gate holds on the frame the
/// body stands back up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepCounter {
    state: SquatState,
    count: u32,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SquatState {
        self.state
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn update(&mut self, knee_angle: f32, smiling: bool) -> Option<Transition> {
        match self.state {
            SquatState::Up if knee_angle < DOWN_BELOW => {
                self.state = SquatState::Down;
                Some(Transition::Descended)
            }
            SquatState::Down if knee_angle > UP_ABOVE => {
                self.state = SquatState::Up;
                if smiling {
                    self.count = self.count.saturating_add(1);
                    Some(Transition::Counted)
                } else {
                    Some(Transition::Withheld)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(samples: &[(f32, bool)]) -> RepCounter {
        let mut counter = RepCounter::new();
        for &(angle, smiling) in samples {
            counter.update(angle, smiling);
        }
        counter
    }

    #[test]
    fn starts_up() {
        let counter = RepCounter::new();
        assert_eq!(counter.state(), SquatState::Up);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn smiling_rep_counts() {
        let counter = run(&[(170.0, false), (90.0, false), (170.0, true)]);
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.state(), SquatState::Up);
    }

    #[test]
    fn rep_without_smile_is_withheld() {
        let counter = run(&[(170.0, true), (90.0, true), (170.0, false)]);
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.state(), SquatState::Up);
    }

    #[test]
    fn smile_only_matters_when_standing_up() {
        let mut counter = RepCounter::new();
        assert_eq!(counter.update(90.0, true), Some(Transition::Descended));
        assert_eq!(counter.update(120.0, true), None);
        assert_eq!(counter.update(170.0, false), Some(Transition::Withheld));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn dead_zone_holds_state() {
        let mut counter = RepCounter::new();
        for &angle in &[100.0, 130.0, 160.0] {
            assert_eq!(counter.update(angle, true), None);
            assert_eq!(counter.state(), SquatState::Up);
        }
        counter.update(99.0, true);
        for &angle in &[100.0, 130.0, 160.0] {
            assert_eq!(counter.update(angle, true), None);
            assert_eq!(counter.state(), SquatState::Down);
        }
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn jitter_near_a_threshold_does_not_flutter() {
        let counter = run(&[
            (99.0, true),
            (101.0, true),
            (99.0, true),
            (101.0, true),
            (161.0, true),
            (159.0, true),
            (161.0, true),
        ]);
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.state(), SquatState::Up);
    }

    #[test]
    fn count_is_monotonic_and_steps_by_one() {
        let mut counter = RepCounter::new();
        let mut previous = 0;
        let angles = [170.0, 80.0, 175.0, 95.0, 150.0, 165.0, 60.0, 179.0, 90.0, 180.0];
        for (i, &angle) in angles.iter().enumerate() {
            counter.update(angle, i % 3 != 0);
            assert!(counter.count() >= previous);
            assert!(counter.count() - previous <= 1);
            previous = counter.count();
        }
    }

    #[test]
    fn display() {
        assert_eq!(SquatState::Up.to_string(), "UP");
        assert_eq!(SquatState::Down.to_string(), "DOWN");
    }
}
