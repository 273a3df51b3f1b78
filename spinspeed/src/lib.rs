//! # Table Tennis Ball Tracking Library
//!
//! This library finds table tennis balls in a stream of colour frames, separates balls in flight
//! from stationary look-alikes (lamps, glare, orange markers), and estimates the speed of the
//! ball being followed.
//!
//! The per-frame flow is segmentation, candidate extraction, motion classification and speed
//! estimation. [`pipeline::BallTracker`] wires all of them together.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use spinspeed::prelude::v1::*;
//! ```
//!
//! You may need [`nalgebra`](https://crates.io/crates/nalgebra) and
//! [`image`](https://crates.io/crates/image) to make use of the functionality.

pub mod candidate;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod geometry;
pub mod pipeline;
pub mod properties;
pub mod segment;
pub mod source;
pub mod speed;
pub mod stats;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            candidate::{Candidate, CandidateExtractor},
            classifier::{MotionClassifier, StaticObjectRecord},
            config::*,
            detector::{ContourDetector, Detector},
            pipeline::{BallTracker, FrameReport},
            properties::*,
            segment::{Frame, FrameSegmenter, Hsv, HsvRange, Mask},
            source::{FrameSource, ImageSequence, TimedFrame},
            speed::SpeedEstimator,
            stats::SessionStats,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
