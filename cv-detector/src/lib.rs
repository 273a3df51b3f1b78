//! # Ball detector built on OpenCV.
//!
//! Same colour and shape rules as the built-in contour detector, with segmentation, morphology
//! and contour tracing done by OpenCV.

use log::*;
use nalgebra as na;
use opencv::core::*;
use opencv::imgproc::*;
use opencv::types::VectorOfVectorOfPoint;
use spinspeed::geometry::circularity;
use spinspeed::prelude::v1::{Result, *};

/// OpenCV based ball detector.
#[derive(Clone, Debug, Default)]
pub struct CvDetector {
    segmenter: SegmenterConfig,
    extractor: ExtractorConfig,
}

impl From<&TrackerConfig> for CvDetector {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            segmenter: config.segmenter,
            extractor: config.extractor,
        }
    }
}

impl Properties for CvDetector {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut<'_>)> {
        vec![
            (
                "Min area",
                PropertyMut::float(&mut self.extractor.min_area, 0.0, 10000.0),
            ),
            (
                "Min radius",
                PropertyMut::float(&mut self.extractor.min_radius, 0.0, 500.0),
            ),
            (
                "Max radius",
                PropertyMut::float(&mut self.extractor.max_radius, 0.0, 500.0),
            ),
            (
                "Min circularity",
                PropertyMut::float(&mut self.extractor.min_circularity, 0.0, 1.0),
            ),
        ]
    }
}

impl CvDetector {
    pub fn segmenter(self, segmenter: SegmenterConfig) -> Self {
        Self { segmenter, ..self }
    }

    pub fn extractor(self, extractor: ExtractorConfig) -> Self {
        Self { extractor, ..self }
    }
}

fn bound(hsv: Hsv) -> Scalar {
    Scalar::new(hsv.h as _, hsv.s as _, hsv.v as _, 0.0)
}

fn morph(src: &Mat, op: i32, kernel: &Mat) -> Result<Mat> {
    let mut dst = Mat::default();
    morphology_ex(
        src,
        &mut dst,
        op,
        kernel,
        Point::new(-1, -1),
        1,
        BORDER_CONSTANT,
        morphology_default_border_value()?,
    )?;
    Ok(dst)
}

impl CvDetector {
    /// Binary mask of ball coloured pixels, cleaned up with an opening and a closing.
    fn mask(&self, frame: &Frame) -> Result<Mat> {
        let (width, height) = frame.dimensions();

        let rgb = Mat::from_slice(frame.as_raw().as_slice())?;
        let rgb = rgb.reshape(3, height as _)?;

        let mut hsv = Mat::default();
        cvt_color(&rgb, &mut hsv, COLOR_RGB2HSV, 0)?;

        let SegmenterConfig {
            orange,
            white,
            kernel_radius,
        } = self.segmenter;

        let mut orange_mask = Mat::default();
        let mut white_mask = Mat::default();
        in_range(&hsv, &bound(orange.lower), &bound(orange.upper), &mut orange_mask)?;
        in_range(&hsv, &bound(white.lower), &bound(white.upper), &mut white_mask)?;

        let mut mask = Mat::default();
        bitwise_or(&orange_mask, &white_mask, &mut mask, &no_array())?;

        trace!("Segmented {width}x{height} frame");

        if kernel_radius == 0 {
            return Ok(mask);
        }

        let k = 2 * kernel_radius as i32 + 1;
        let kernel = get_structuring_element(MORPH_ELLIPSE, Size::new(k, k), Point::new(-1, -1))?;

        let opened = morph(&mask, MORPH_OPEN, &kernel)?;
        let closed = morph(&opened, MORPH_CLOSE, &kernel)?;

        Ok(closed)
    }

    fn try_detect(&self, frame: &Frame) -> Result<Vec<Candidate>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(vec![]);
        }

        let mask = self.mask(frame)?;

        let mut contours = VectorOfVectorOfPoint::new();
        find_contours(
            &mask,
            &mut contours,
            RETR_EXTERNAL,
            CHAIN_APPROX_SIMPLE,
            Point::default(),
        )?;

        let gate = CandidateExtractor::from(self.extractor);
        let mut candidates = vec![];

        for contour in contours.iter() {
            let area = contour_area(&contour, false)? as f32;

            if area < self.extractor.min_area {
                continue;
            }

            let mut center = Point2f::default();
            let mut radius = 0.0f32;
            min_enclosing_circle(&contour, &mut center, &mut radius)?;

            let perimeter = arc_length(&contour, true)? as f32;
            let circ = circularity(area, perimeter);

            if gate.accepts(radius, circ) {
                candidates.push(Candidate {
                    position: na::Point2::new(center.x, center.y),
                    radius,
                });
            } else {
                trace!("Rejected contour r={radius} c={circ}");
            }
        }

        Ok(candidates)
    }
}

impl Detector for CvDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        match self.try_detect(frame) {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("OpenCV detection failed: {e}");
                vec![]
            }
        }
    }
}
