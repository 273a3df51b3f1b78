//! # Per-frame ball detection

use crate::candidate::{largest, Candidate, CandidateExtractor};
use crate::config::TrackerConfig;
use crate::segment::{Frame, FrameSegmenter};

/// Single frame ball detector.
///
/// Detectors are stateless with respect to the frame stream. Temporal reasoning happens in
/// [`MotionClassifier`](crate::classifier::MotionClassifier).
pub trait Detector {
    /// Detect every ball candidate in a frame.
    ///
    /// A frame without any ball is an ordinary outcome and yields an empty list.
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate>;

    /// Detect the single most prominent ball.
    ///
    /// By default, this is the candidate with the largest radius.
    fn detect_best(&mut self, frame: &Frame) -> Option<Candidate> {
        largest(self.detect(frame))
    }
}

/// Colour segmentation followed by contour analysis.
#[derive(Clone, Debug, Default)]
pub struct ContourDetector {
    pub segmenter: FrameSegmenter,
    pub extractor: CandidateExtractor,
}

impl From<&TrackerConfig> for ContourDetector {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            segmenter: config.segmenter.into(),
            extractor: config.extractor.into(),
        }
    }
}

impl Detector for ContourDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        let mask = self.segmenter.segment(frame);
        self.extractor.extract(&mask)
    }

    fn detect_best(&mut self, frame: &Frame) -> Option<Candidate> {
        let mask = self.segmenter.segment(frame);
        self.extractor.extract_best(&mask)
    }
}

impl<T: Detector + ?Sized> Detector for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        (**self).detect(frame)
    }

    fn detect_best(&mut self, frame: &Frame) -> Option<Candidate> {
        (**self).detect_best(frame)
    }
}
