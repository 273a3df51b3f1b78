//! # Per-frame tracking pipeline

use crate::candidate::{largest, Candidate};
use crate::classifier::MotionClassifier;
use crate::config::TrackerConfig;
use crate::detector::{ContourDetector, Detector};
use crate::segment::Frame;
use crate::speed::SpeedEstimator;
use crate::stats::SessionStats;
use log::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of processing one frame.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameReport {
    pub timestamp: f64,
    /// Everything the detector found.
    pub candidates: Vec<Candidate>,
    /// Candidates judged to be moving.
    pub moving: Vec<Candidate>,
    /// The ball being followed, the largest moving candidate.
    pub primary: Option<Candidate>,
    /// Speed of the primary ball, in pixels per timestamp unit.
    pub speed: Option<f64>,
}

/// Complete ball tracker.
///
/// Owns all cross-frame state, so independent sessions simply use independent trackers. Frames
/// must be fed in capture order, from a single thread at a time.
pub struct BallTracker<D = ContourDetector> {
    detector: D,
    classifier: MotionClassifier,
    speed: SpeedEstimator,
    stats: SessionStats,
    /// Ball the speed track was last fed with.
    last_primary: Option<Candidate>,
}

impl Default for BallTracker {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for BallTracker {
    fn from(config: &TrackerConfig) -> Self {
        Self::with_detector(ContourDetector::from(config), config)
    }
}

impl<D: Detector> BallTracker<D> {
    /// Create a tracker around a custom detector.
    ///
    /// # Arguments
    ///
    /// * `detector` - per-frame detector.
    /// * `config` - configuration of the temporal stages. Detection settings are ignored.
    pub fn with_detector(detector: D, config: &TrackerConfig) -> Self {
        Self {
            detector,
            classifier: config.classifier.into(),
            speed: Default::default(),
            stats: Default::default(),
            last_primary: None,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Temporal classifier state, for rendering.
    pub fn classifier(&self) -> &MotionClassifier {
        &self.classifier
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Forget all cross-frame state, keeping configuration.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.speed.reset();
        self.stats = Default::default();
        self.last_primary = None;
    }

    /// Process a single frame.
    ///
    /// # Arguments
    ///
    /// * `frame` - frame to process. It is not retained.
    /// * `timestamp` - capture time, non-decreasing across calls.
    pub fn process(&mut self, frame: &Frame, timestamp: f64) -> FrameReport {
        let candidates = self.detector.detect(frame);
        self.process_candidates(candidates, timestamp)
    }

    /// Run the temporal stages over externally detected candidates.
    pub fn process_candidates(
        &mut self,
        candidates: Vec<Candidate>,
        timestamp: f64,
    ) -> FrameReport {
        // Passes skipped by the rate limit return everything, known clutter included.
        let moving = self
            .classifier
            .classify(&candidates, timestamp)
            .into_iter()
            .filter(|c| !self.classifier.is_suppressed(c))
            .collect::<Vec<_>>();

        let primary = largest(moving.iter().copied());

        if let Some(last) = self.last_primary {
            if self.classifier.is_suppressed(&last) {
                debug!(
                    "Followed location {} turned out static, restarting speed track",
                    last.position
                );
                self.speed.reset();
                self.last_primary = None;
            }
        }

        let speed = primary.map(|ball| self.speed.estimate(ball.position, timestamp));

        if primary.is_some() {
            self.last_primary = primary;
        }

        if let (Some(ball), Some(speed)) = (primary, speed) {
            trace!(
                "t={timestamp}: ball at {} (r={}), {speed} px/t",
                ball.position,
                ball.radius
            );
        }

        let report = FrameReport {
            timestamp,
            candidates,
            moving,
            primary,
            speed,
        };

        self.stats.update(&report);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use assert_approx_eq::assert_approx_eq;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    const ORANGE: Rgb<u8> = Rgb([255, 128, 0]);
    const WHITE: Rgb<u8> = Rgb([250, 250, 250]);

    fn frame(balls: &[((i32, i32), i32, Rgb<u8>)]) -> Frame {
        let mut frame = Frame::from_pixel(640, 360, Rgb([30, 60, 40]));
        for &(center, radius, colour) in balls {
            draw_filled_circle_mut(&mut frame, center, radius, colour);
        }
        frame
    }

    #[test]
    fn follows_ball_and_ignores_static_marker() {
        let mut tracker = BallTracker::default();
        let marker = ((560, 60), 14, ORANGE);

        let mut last_speed = None;

        for i in 0..20 {
            let t = i as f64 * 0.2;
            let ball = ((40 + i * 25, 200), 18, WHITE);
            let report = tracker.process(&frame(&[marker, ball]), t);

            assert_eq!(report.candidates.len(), 2, "frame {i}");

            let primary = report.primary.expect("ball lost");
            assert!((primary.position.x - (40 + i * 25) as f32).abs() < 1.5);

            if i > 0 {
                assert_eq!(report.moving.len(), 1, "frame {i}");
                last_speed = report.speed;
            } else {
                assert_eq!(report.speed, Some(0.0));
            }
        }

        // 25 px every 0.2 time units.
        assert_approx_eq!(last_speed.unwrap(), 125.0, 2.0);

        let stats = tracker.stats();
        assert_eq!(stats.frames, 20);
        assert_eq!(stats.frames_with_ball, 20);
        assert_eq!(stats.max_ball_count, 2);
        assert!(stats.max_speed >= 120.0);
    }

    #[test]
    fn empty_frames_report_nothing() {
        let mut tracker = BallTracker::default();
        let report = tracker.process(&frame(&[]), 0.0);

        assert!(report.candidates.is_empty());
        assert!(report.primary.is_none());
        assert!(report.speed.is_none());
        assert_eq!(tracker.stats().frames, 1);
        assert_eq!(tracker.stats().frames_with_ball, 0);
    }

    #[test]
    fn speed_skips_frames_without_ball() {
        let mut tracker = BallTracker::default();

        tracker.process_candidates(vec![Candidate::new(0.0, 0.0, 15.0)], 0.0);
        tracker.process_candidates(vec![], 1.0);
        let report = tracker.process_candidates(vec![Candidate::new(30.0, 40.0, 15.0)], 2.0);

        assert_approx_eq!(report.speed.unwrap(), 25.0);
    }

    #[test]
    fn primary_is_largest_moving_ball() {
        let mut tracker = BallTracker::default();
        let report = tracker.process_candidates(
            vec![
                Candidate::new(10.0, 10.0, 12.0),
                Candidate::new(200.0, 10.0, 25.0),
                Candidate::new(400.0, 10.0, 16.0),
            ],
            0.0,
        );

        assert_eq!(report.primary, Some(Candidate::new(200.0, 10.0, 25.0)));
        assert_eq!(tracker.stats().max_ball_count, 3);
    }

    #[test]
    fn static_clutter_alone_has_no_primary() {
        let config = TrackerConfig {
            classifier: ClassifierConfig::default().static_threshold(3),
            ..Default::default()
        };
        let mut tracker = BallTracker::from(&config);
        let lamp = Candidate::new(320.0, 20.0, 20.0);

        for i in 0..10 {
            let report = tracker.process_candidates(vec![lamp], i as f64 * 0.5);
            assert_eq!(report.primary.is_some(), i == 0, "frame {i}");
        }

        assert_eq!(tracker.classifier().background().len(), 1);

        tracker.reset();
        assert!(tracker.classifier().background().is_empty());
        assert_eq!(tracker.stats().frames, 0);
    }

    #[test]
    fn larger_static_lamp_is_not_followed_at_camera_rate() {
        let mut tracker = BallTracker::default();
        let lamp = Candidate::new(500.0, 60.0, 25.0);

        // 30 fps, so most frames fall inside the filtering interval.
        for i in 0..90 {
            let t = i as f64 / 30.0;
            let ball = Candidate::new(20.0 + 4.0 * i as f32, 300.0, 15.0);
            let report = tracker.process_candidates(vec![lamp, ball], t);

            if let Some(speed) = report.speed {
                assert!(speed < 120.5, "frame {i}: {speed}");
            }

            if i >= 6 {
                assert_eq!(report.primary, Some(ball), "frame {i}");
                assert_eq!(report.moving, vec![ball], "frame {i}");
                assert_approx_eq!(report.speed.unwrap(), 120.0, 0.5);
            }
        }

        assert_approx_eq!(tracker.stats().max_speed, 120.0, 0.5);
        assert_eq!(tracker.stats().frames_with_ball, 90);
    }

    #[test]
    fn metric_summary() {
        let stats = SessionStats {
            max_speed: 250.0,
            ..Default::default()
        };
        assert_approx_eq!(stats.max_speed_metric(0.01), 2.5);
    }
}
