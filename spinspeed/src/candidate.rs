//! # Ball candidates
//!
//! Finds ball shaped regions in a segmentation mask.

use crate::config::ExtractorConfig;
use crate::geometry;
use crate::segment::Mask;
use imageproc::contours::{find_contours, BorderType};
use log::*;
use nalgebra as na;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A round region detected in a single frame.
///
/// Candidates have no identity. Sightings in different frames are associated purely by spatial
/// proximity.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    /// Centre of the minimum enclosing circle, in pixels.
    pub position: na::Point2<f32>,
    /// Radius of the minimum enclosing circle, in pixels.
    pub radius: f32,
}

impl Candidate {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            position: na::Point2::new(x, y),
            radius,
        }
    }

    /// Check whether another sighting lies within the given tolerances.
    ///
    /// Both comparisons are strict.
    pub fn is_near(
        &self,
        position: &na::Point2<f32>,
        radius: f32,
        position_tolerance: f32,
        radius_tolerance: f32,
    ) -> bool {
        na::distance(&self.position, position) < position_tolerance
            && (self.radius - radius).abs() < radius_tolerance
    }
}

/// Measurements of one connected region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionShape {
    pub area: f32,
    pub perimeter: f32,
    pub circularity: f32,
    pub center: na::Point2<f32>,
    pub radius: f32,
}

impl RegionShape {
    /// Measure a closed boundary.
    ///
    /// Returns `None` when there are no points.
    pub fn measure(boundary: &[na::Point2<f32>]) -> Option<Self> {
        let circle = geometry::min_enclosing_circle(boundary)?;
        let area = geometry::polygon_area(boundary);
        let perimeter = geometry::perimeter(boundary);

        Some(Self {
            area,
            perimeter,
            circularity: geometry::circularity(area, perimeter),
            center: na::Point2::new(circle.center.x as f32, circle.center.y as f32),
            radius: circle.radius as f32,
        })
    }
}

/// Extracts ball candidates from a binary mask.
#[derive(Clone, Debug, Default)]
pub struct CandidateExtractor {
    config: ExtractorConfig,
}

impl From<ExtractorConfig> for CandidateExtractor {
    fn from(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl CandidateExtractor {
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Size and shape gate.
    ///
    /// Radius bounds are inclusive, the circularity bound is exclusive.
    pub fn accepts(&self, radius: f32, circularity: f32) -> bool {
        radius >= self.config.min_radius
            && radius <= self.config.max_radius
            && circularity > self.config.min_circularity
    }

    /// Measure every external region in the mask, in discovery order.
    ///
    /// Holes and regions nested inside holes are not reported.
    pub fn regions(&self, mask: &Mask) -> Vec<RegionShape> {
        if mask.width() == 0 || mask.height() == 0 {
            return vec![];
        }

        find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .filter_map(|c| {
                let boundary = c
                    .points
                    .iter()
                    .map(|p| na::Point2::new(p.x as f32, p.y as f32))
                    .collect::<Vec<_>>();
                RegionShape::measure(&boundary)
            })
            .collect()
    }

    /// Extract every region that passes the noise, size and shape gates.
    pub fn extract(&self, mask: &Mask) -> Vec<Candidate> {
        let candidates = self
            .regions(mask)
            .into_iter()
            .filter(|r| r.area >= self.config.min_area)
            .filter(|r| {
                let accepted = self.accepts(r.radius, r.circularity);
                if !accepted {
                    trace!(
                        "Rejected region at {} (r={}, circularity={})",
                        r.center,
                        r.radius,
                        r.circularity
                    );
                }
                accepted
            })
            .map(|r| Candidate {
                position: r.center,
                radius: r.radius,
            })
            .collect::<Vec<_>>();

        trace!("Extracted {} candidates", candidates.len());

        candidates
    }

    /// Extract only the largest accepted candidate.
    pub fn extract_best(&self, mask: &Mask) -> Option<Candidate> {
        largest(self.extract(mask))
    }
}

/// Pick the candidate with the largest radius.
///
/// The first one wins on ties.
pub fn largest(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates.into_iter().fold(None, |best, c| match best {
        Some(b) if b.radius >= c.radius => Some(b),
        _ => Some(c),
    })
}
