//! # Tracker configuration
//!
//! Every heuristic the tracker relies on lives here, with the defaults tuned for a 5 cm ball
//! filmed from a few metres away at phone camera resolutions.

use crate::properties::{Properties, PropertyMut};
use crate::segment::HsvRange;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Colour segmentation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmenterConfig {
    /// Orange ball colour range.
    pub orange: HsvRange,
    /// White ball colour range.
    pub white: HsvRange,
    /// Radius of the opening/closing structuring element.
    ///
    /// The element is a square of side `2 * kernel_radius + 1` (Chebyshev distance), so 2 gives
    /// a 5x5 element. OpenCV detectors use an ellipse inscribed in the same box.
    pub kernel_radius: u8,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            orange: HsvRange::new([5, 100, 100], [25, 255, 255]),
            white: HsvRange::new([0, 0, 200], [180, 30, 255]),
            kernel_radius: 2,
        }
    }
}

/// Region geometry gates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractorConfig {
    /// Regions with smaller area (in pixels) are treated as noise.
    pub min_area: f32,
    /// Smallest accepted enclosing circle radius, inclusive.
    pub min_radius: f32,
    /// Largest accepted enclosing circle radius, inclusive.
    pub max_radius: f32,
    /// Circularity has to be strictly above this value.
    pub min_circularity: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            min_radius: 10.0,
            max_radius: 40.0,
            min_circularity: 0.6,
        }
    }
}

/// Temporal filtering parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassifierConfig {
    /// Classification passes closer than this are skipped.
    pub min_interval: f64,
    /// Maximum centre distance for two sightings to be the same object.
    pub position_tolerance: f32,
    /// Maximum radius difference for two sightings to be the same object.
    pub radius_tolerance: f32,
    /// Match count above which a location becomes confirmed background.
    pub static_threshold: usize,
    /// Any record older than this is evicted.
    pub max_age: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_interval: 0.1,
            position_tolerance: 5.0,
            radius_tolerance: 3.0,
            static_threshold: 30,
            max_age: 10.0,
        }
    }
}

impl ClassifierConfig {
    pub fn min_interval(self, min_interval: f64) -> Self {
        Self {
            min_interval,
            ..self
        }
    }

    pub fn static_threshold(self, static_threshold: usize) -> Self {
        Self {
            static_threshold,
            ..self
        }
    }

    pub fn max_age(self, max_age: f64) -> Self {
        Self { max_age, ..self }
    }
}

/// Speed reporting parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeedConfig {
    /// Rough pixel to metre conversion used for metric summaries.
    pub metres_per_pixel: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            metres_per_pixel: 0.01,
        }
    }
}

/// Complete tracker configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    pub segmenter: SegmenterConfig,
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
    pub speed: SpeedConfig,
}

impl Properties for TrackerConfig {
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
            (
                "Min interval",
                PropertyMut::double(&mut self.classifier.min_interval, 0.0, 10.0),
            ),
            (
                "Position tolerance",
                PropertyMut::float(&mut self.classifier.position_tolerance, 0.0, 100.0),
            ),
            (
                "Radius tolerance",
                PropertyMut::float(&mut self.classifier.radius_tolerance, 0.0, 100.0),
            ),
            (
                "Static threshold",
                PropertyMut::usize(&mut self.classifier.static_threshold, 1, 10000),
            ),
            (
                "Max age",
                PropertyMut::double(&mut self.classifier.max_age, 0.0, 3600.0),
            ),
            (
                "Metres per pixel",
                PropertyMut::double(&mut self.speed.metres_per_pixel, 0.0, 1.0),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{BoundedProp, Property};

    #[test]
    fn defaults_match_reference_tuning() {
        let config = TrackerConfig::default();
        assert_eq!(config.extractor.min_radius, 10.0);
        assert_eq!(config.extractor.max_radius, 40.0);
        assert_eq!(config.classifier.static_threshold, 30);
        assert_eq!(config.classifier.max_age, 10.0);
        assert_eq!(config.segmenter.orange.lower.h, 5);
        assert_eq!(config.segmenter.white.upper.s, 30);
    }

    #[test]
    fn props_write_through() {
        let mut config = TrackerConfig::default();

        config.set_prop("Static threshold", "12").unwrap();
        config.set_prop("Max age", "4.5").unwrap();

        assert_eq!(config.classifier.static_threshold, 12);
        assert_eq!(config.classifier.max_age, 4.5);

        let props = config.props();
        assert_eq!(props.len(), 10);
        assert!(props.iter().any(|(name, prop)| *name == "Static threshold"
            && *prop
                == Property::Usize(BoundedProp {
                    val: 12,
                    min: 1,
                    max: 10000,
                })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_uses_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "classifier": { "static_threshold": 5 } }"#).unwrap();
        assert_eq!(config.classifier.static_threshold, 5);
        assert_eq!(config.classifier.max_age, 10.0);
        assert_eq!(config.extractor, ExtractorConfig::default());
    }
}
