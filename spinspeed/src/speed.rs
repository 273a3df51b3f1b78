//! # Single track speed estimation

use log::*;
use nalgebra as na;

/// Instantaneous speed from consecutive positions of one tracked ball.
///
/// Speed is reported in position units (pixels) per timestamp unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedEstimator {
    last: Option<(na::Point2<f32>, f64)>,
}

impl SpeedEstimator {
    /// The sample the next estimate will be measured against.
    pub fn last_sample(&self) -> Option<(na::Point2<f32>, f64)> {
        self.last
    }

    /// Forget the previous sample.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Estimate speed at a new sample.
    ///
    /// The first sample only seeds the estimator and yields 0. When the elapsed time is not
    /// positive, 0 is returned and the previous sample is kept, so that the next well ordered
    /// sample is measured against it.
    ///
    /// # Arguments
    ///
    /// * `position` - ball position at `timestamp`.
    /// * `timestamp` - capture time of the sample.
    pub fn estimate(&mut self, position: na::Point2<f32>, timestamp: f64) -> f64 {
        let (last_position, last_timestamp) = match self.last {
            Some(last) => last,
            None => {
                self.last = Some((position, timestamp));
                return 0.0;
            }
        };

        let elapsed = timestamp - last_timestamp;

        if elapsed <= 0.0 {
            warn!("Non-increasing timestamp {timestamp} after {last_timestamp}, speed unknown");
            return 0.0;
        }

        let distance = na::distance(&last_position, &position) as f64;

        self.last = Some((position, timestamp));

        distance / elapsed
    }
}
