//! # Moving ball classification
//!
//! Colour and shape alone cannot tell a ball in flight from a lamp, a reflection or an orange
//! sticker on the wall. This module keeps a short memory of where candidates were seen, and uses
//! it to suppress the ones that keep reappearing at the same place.
//!
//! Every candidate sighting is matched against a registry of [`StaticObjectRecord`] entries.
//! A ball in flight moves further than the position tolerance between passes and therefore never
//! matches an existing record, while clutter matches on every pass. Locations matched more often
//! than the static threshold are promoted to confirmed background, which suppresses them until
//! they age out.

use crate::candidate::Candidate;
use crate::config::ClassifierConfig;
use log::*;
use nalgebra as na;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A location tracked across frames for persistence analysis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticObjectRecord {
    pub position: na::Point2<f32>,
    pub radius: f32,
    /// Timestamp of the sighting that created the record.
    pub first_seen: f64,
    /// Number of passes the location was seen in. Never decreases.
    pub consecutive_matches: usize,
    /// Cleared as soon as the location is seen a second time.
    pub is_moving: bool,
}

impl StaticObjectRecord {
    fn new(candidate: &Candidate, timestamp: f64) -> Self {
        Self {
            position: candidate.position,
            radius: candidate.radius,
            first_seen: timestamp,
            consecutive_matches: 1,
            is_moving: true,
        }
    }

    /// Seconds (or whatever unit timestamps are in) since the record was created.
    pub fn age(&self, timestamp: f64) -> f64 {
        timestamp - self.first_seen
    }
}

/// Temporal filter separating moving balls from static look-alikes.
#[derive(Clone, Debug, Default)]
pub struct MotionClassifier {
    config: ClassifierConfig,
    registry: Vec<StaticObjectRecord>,
    background: Vec<StaticObjectRecord>,
    last_pass: Option<f64>,
}

impl From<ClassifierConfig> for MotionClassifier {
    fn from(config: ClassifierConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

impl MotionClassifier {
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Locations currently under observation.
    pub fn records(&self) -> &[StaticObjectRecord] {
        &self.registry
    }

    /// Locations confirmed as background.
    pub fn background(&self) -> &[StaticObjectRecord] {
        &self.background
    }

    /// Timestamp of the last filtering pass, if there was one.
    pub fn last_pass(&self) -> Option<f64> {
        self.last_pass
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.background.clear();
        self.last_pass = None;
    }

    fn matches(&self, record: &StaticObjectRecord, candidate: &Candidate) -> bool {
        candidate.is_near(
            &record.position,
            record.radius,
            self.config.position_tolerance,
            self.config.radius_tolerance,
        )
    }

    fn is_background(&self, candidate: &Candidate) -> bool {
        self.background.iter().any(|r| self.matches(r, candidate))
    }

    /// Check whether a candidate sits on a location known to be static.
    ///
    /// That is confirmed background, or a record that has been seen more than once. Does not
    /// modify any state, so it can be applied to frames that skipped filtering.
    pub fn is_suppressed(&self, candidate: &Candidate) -> bool {
        self.is_background(candidate)
            || self
                .registry
                .iter()
                .any(|r| !r.is_moving && self.matches(r, candidate))
    }

    /// Filter out candidates that are not moving.
    ///
    /// Timestamps must not decrease between calls. When the previous pass happened less than
    /// `min_interval` ago, the input is returned unchanged and no state is touched.
    ///
    /// # Arguments
    ///
    /// * `candidates` - candidates detected in the current frame.
    /// * `timestamp` - capture time of the current frame.
    pub fn classify(&mut self, candidates: &[Candidate], timestamp: f64) -> Vec<Candidate> {
        if let Some(last) = self.last_pass {
            if timestamp - last < self.config.min_interval {
                return candidates.to_vec();
            }
        }

        // Match sightings against known locations.
        for candidate in candidates {
            if self.is_background(candidate) {
                continue;
            }

            let config = self.config;

            match self.registry.iter_mut().find(|r| {
                candidate.is_near(
                    &r.position,
                    r.radius,
                    config.position_tolerance,
                    config.radius_tolerance,
                )
            }) {
                Some(record) => {
                    record.consecutive_matches += 1;
                    record.is_moving = false;
                }
                None => self
                    .registry
                    .push(StaticObjectRecord::new(candidate, timestamp)),
            }
        }

        self.prune(timestamp);

        let moving = candidates
            .iter()
            .filter(|c| !self.is_suppressed(c))
            .copied()
            .collect::<Vec<_>>();

        trace!(
            "{} of {} candidates moving ({} tracked, {} background)",
            moving.len(),
            candidates.len(),
            self.registry.len(),
            self.background.len()
        );

        self.last_pass = Some(timestamp);

        moving
    }

    /// Promote persistent locations to background and evict stale entries.
    fn prune(&mut self, timestamp: f64) {
        let ClassifierConfig {
            static_threshold,
            max_age,
            ..
        } = self.config;

        let (promoted, kept): (Vec<_>, Vec<_>) = self
            .registry
            .drain(..)
            .partition(|r| r.consecutive_matches > static_threshold && !r.is_moving);

        for r in &promoted {
            debug!(
                "Location {} (r={}) confirmed as background after {} matches",
                r.position, r.radius, r.consecutive_matches
            );
        }

        self.registry = kept;
        self.background.extend(promoted);

        let stale = |r: &StaticObjectRecord| r.age(timestamp) > max_age;

        let before = self.registry.len() + self.background.len();
        self.registry.retain(|r| !stale(r));
        self.background.retain(|r| !stale(r));
        let evicted = before - self.registry.len() - self.background.len();

        if evicted > 0 {
            debug!("Evicted {evicted} stale locations");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    const STEP: f64 = 0.15;

    fn lamp() -> Candidate {
        Candidate::new(100.0, 50.0, 15.0)
    }

    #[test]
    fn first_sighting_is_moving() {
        let mut classifier = MotionClassifier::default();
        assert_eq!(classifier.classify(&[lamp()], 0.0), vec![lamp()]);
        assert_eq!(classifier.records().len(), 1);
        assert!(classifier.records()[0].is_moving);
        assert_eq!(classifier.last_pass(), Some(0.0));
    }

    #[test]
    fn repeated_position_is_suppressed_past_threshold() {
        let mut classifier = MotionClassifier::default();
        let threshold = classifier.config().static_threshold;

        for i in 0..threshold + 10 {
            let t = i as f64 * STEP;
            // Small jitter within the tolerances.
            let jitter = if i % 2 == 0 { 0.0 } else { 1.5 };
            let c = Candidate::new(100.0 + jitter, 50.0, 15.0 + jitter * 0.5);
            let out = classifier.classify(&[c], t);

            if i == 0 {
                assert_eq!(out.len(), 1);
            } else {
                assert!(out.is_empty(), "pass {i} reported {out:?}");
            }

            if i + 1 > threshold {
                assert!(classifier.records().is_empty(), "pass {i}");
                assert_eq!(classifier.background().len(), 1, "pass {i}");
            }
        }
    }

    #[test]
    fn match_counts_accumulate() {
        let mut classifier = MotionClassifier::default();

        for i in 0..5 {
            classifier.classify(&[lamp()], i as f64 * STEP);
        }

        let record = classifier.records()[0];
        assert_eq!(record.consecutive_matches, 5);
        assert!(!record.is_moving);
        assert_eq!(record.first_seen, 0.0);
    }

    #[test]
    fn background_reenters_after_max_age() {
        let mut classifier = MotionClassifier::default();
        let threshold = classifier.config().static_threshold;

        for i in 0..threshold + 5 {
            classifier.classify(&[lamp()], i as f64 * STEP);
        }

        assert_eq!(classifier.background().len(), 1);

        // Still inside the ageing window.
        assert!(classifier.classify(&[lamp()], 9.0).is_empty());

        // Past the window, the location is a brand new sighting.
        assert_eq!(classifier.classify(&[lamp()], 10.5), vec![lamp()]);
        assert!(classifier.background().is_empty());
    }

    #[test]
    fn stale_records_are_evicted() {
        let mut classifier = MotionClassifier::default();

        classifier.classify(&[lamp()], 0.0);
        assert_eq!(classifier.records().len(), 1);

        classifier.classify(&[], 5.0);
        assert_eq!(classifier.records().len(), 1);

        classifier.classify(&[], 10.01);
        assert!(classifier.records().is_empty());
    }

    #[test]
    fn rate_limited_passes_return_input_untouched() {
        let mut classifier = MotionClassifier::default();

        classifier.classify(&[lamp()], 1.0);
        classifier.classify(&[lamp()], 1.2);

        // Suppressed on a regular pass.
        assert!(classifier.classify(&[lamp()], 1.4).is_empty());

        let before = classifier.records().to_vec();
        let ball = Candidate::new(10.0, 10.0, 12.0);

        let out = classifier.classify(&[lamp(), ball], 1.45);
        assert_eq!(out, vec![lamp(), ball]);
        assert_eq!(classifier.records(), &before[..]);
        assert_eq!(classifier.last_pass(), Some(1.4));
    }

    #[test]
    fn suppression_is_queryable_between_passes() {
        let mut classifier = MotionClassifier::default();
        let ball = Candidate::new(10.0, 10.0, 12.0);

        classifier.classify(&[lamp()], 0.0);
        assert!(!classifier.is_suppressed(&lamp()));

        classifier.classify(&[lamp()], STEP);
        assert!(classifier.is_suppressed(&lamp()));
        assert!(classifier.is_suppressed(&Candidate::new(102.0, 51.0, 16.0)));
        assert!(!classifier.is_suppressed(&ball));

        // Rate limited passes hand back known clutter unchanged.
        let before = classifier.records().to_vec();
        let out = classifier.classify(&[lamp(), ball], STEP + 0.05);
        assert_eq!(out, vec![lamp(), ball]);
        assert!(classifier.is_suppressed(&out[0]));
        assert_eq!(classifier.records(), &before[..]);
    }

    #[test]
    fn ball_in_flight_is_never_suppressed() {
        let mut classifier = MotionClassifier::default();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        let mut pos = na::Point2::new(20.0f32, 300.0);

        for i in 0..40 {
            let t = i as f64 * STEP;
            pos.x += rng.gen_range(8.0f32..20.0);
            pos.y = 300.0 + rng.gen_range(-3.0f32..3.0);

            let ball = Candidate {
                position: pos,
                radius: rng.gen_range(14.0..16.0),
            };

            let out = classifier.classify(&[lamp(), ball], t);

            assert!(out.contains(&ball), "pass {i}: {out:?}");
            if i > 0 {
                assert!(!out.contains(&lamp()), "pass {i}");
            }
        }
    }

    #[test]
    fn size_change_is_a_different_object() {
        let mut classifier = MotionClassifier::default();

        classifier.classify(&[lamp()], 0.0);
        let bigger = Candidate::new(100.0, 50.0, 19.0);
        assert_eq!(classifier.classify(&[bigger], STEP), vec![bigger]);
        assert_eq!(classifier.records().len(), 2);
    }

    #[test]
    fn reset_forgets_state() {
        let mut classifier = MotionClassifier::from(ClassifierConfig::default().static_threshold(2));

        for i in 0..4 {
            classifier.classify(&[lamp()], i as f64 * STEP);
        }
        assert_eq!(classifier.background().len(), 1);

        classifier.reset();

        assert!(classifier.records().is_empty());
        assert!(classifier.background().is_empty());
        assert_eq!(classifier.last_pass(), None);
        assert_eq!(classifier.classify(&[lamp()], 0.0), vec![lamp()]);
    }
}
