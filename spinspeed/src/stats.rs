//! # Session summary

use crate::pipeline::FrameReport;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running summary over a tracking session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionStats {
    /// Number of frames processed.
    pub frames: usize,
    /// Number of frames with a moving ball.
    pub frames_with_ball: usize,
    /// Largest number of moving balls seen in a single frame.
    pub max_ball_count: usize,
    /// Highest speed reported, in pixels per timestamp unit.
    pub max_speed: f64,
}

impl SessionStats {
    /// Account for a processed frame.
    pub fn update(&mut self, report: &FrameReport) {
        self.frames += 1;

        if report.primary.is_some() {
            self.frames_with_ball += 1;
        }

        self.max_ball_count = self.max_ball_count.max(report.moving.len());

        if let Some(speed) = report.speed {
            self.max_speed = self.max_speed.max(speed);
        }
    }

    /// Highest speed, converted to metres per timestamp unit.
    ///
    /// # Arguments
    ///
    /// * `metres_per_pixel` - length of a pixel at the ball's distance from the camera.
    pub fn max_speed_metric(&self, metres_per_pixel: f64) -> f64 {
        self.max_speed * metres_per_pixel
    }
}
