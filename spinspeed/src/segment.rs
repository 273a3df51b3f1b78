//! # Colour segmentation
//!
//! Turns a colour frame into a binary mask of pixels that look like a table tennis ball.

use crate::config::SegmenterConfig;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Colour frame, 8 bits per channel, RGB order.
pub type Frame = RgbImage;

/// Binary mask. Foreground pixels are 255, background 0.
pub type Mask = GrayImage;

/// Foreground value of a [`Mask`].
pub const FOREGROUND: u8 = 255;

/// HSV colour in OpenCV's 8-bit convention.
///
/// Hue is halved to fit a byte (`0..180`), saturation and value span `0..=255`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert from 8-bit RGB.
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (r, g, b) = (r as f32, g as f32, b as f32);

        let v = r.max(g).max(b);
        let min = r.min(g).min(b);
        let diff = v - min;

        let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

        let h = if diff == 0.0 {
            0.0
        } else if v == r {
            60.0 * (g - b) / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };

        let h = if h < 0.0 { h + 360.0 } else { h };

        // 360 degrees would round up to 180, which wraps back to red.
        let h = ((h / 2.0).round() as u16 % 180) as u8;

        Self {
            h,
            s: s.round() as u8,
            v: v as u8,
        }
    }
}

/// Inclusive HSV box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    /// Create a range from `[h, s, v]` bounds.
    pub fn new([lh, ls, lv]: [u8; 3], [uh, us, uv]: [u8; 3]) -> Self {
        Self {
            lower: Hsv::new(lh, ls, lv),
            upper: Hsv::new(uh, us, uv),
        }
    }

    /// Check whether the colour lies within the range, bounds included.
    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }
}

/// Colour and morphology based ball segmenter.
#[derive(Clone, Debug, Default)]
pub struct FrameSegmenter {
    config: SegmenterConfig,
}

impl From<SegmenterConfig> for FrameSegmenter {
    fn from(config: SegmenterConfig) -> Self {
        Self { config }
    }
}

impl FrameSegmenter {
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Build the raw colour mask, before any noise cleanup.
    ///
    /// A pixel is foreground if it falls in either the orange or the white range.
    pub fn colour_mask(&self, frame: &Frame) -> Mask {
        let SegmenterConfig { orange, white, .. } = self.config;

        GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let hsv = Hsv::from_rgb(frame.get_pixel(x, y).0);
            if orange.contains(hsv) || white.contains(hsv) {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        })
    }

    /// Segment a frame.
    ///
    /// The colour mask is opened (removes speckles) and then closed (fills pinholes) with a square
    /// structuring element. Empty frames produce an empty mask.
    pub fn segment(&self, frame: &Frame) -> Mask {
        let mask = self.colour_mask(frame);

        if mask.width() == 0 || mask.height() == 0 || self.config.kernel_radius == 0 {
            return mask;
        }

        let k = self.config.kernel_radius;
        let opened = morphology::open(&mask, Norm::LInf, k);
        morphology::close(&opened, Norm::LInf, k)
    }
}
