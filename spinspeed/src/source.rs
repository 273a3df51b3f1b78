//! # Frame acquisition

use crate::prelude::v1::*;
use log::*;
use std::path::{Path, PathBuf};

/// A frame together with its capture time.
pub type TimedFrame = (Frame, f64);

/// Source of timestamped frames.
pub trait FrameSource {
    /// Grab the next frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted, and `Err` when a frame exists but could
    /// not be read. Timestamps are non-decreasing.
    fn next_frame(&mut self) -> Result<Option<TimedFrame>>;

    /// Get the framerate of the stream.
    ///
    /// This will return `Some(framerate)` if it is known. On realtime streams it may
    /// not always be known. In such cases, `None` is returned.
    fn get_framerate(&self) -> Option<f64>;

    /// Get `(width, height)` of the frames, if known.
    ///
    /// May only become known after the first frame is read.
    fn get_dimensions(&self) -> Option<(u32, u32)>;
}

/// File extensions recognised as frames.
const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Directory of still images played back at a fixed framerate.
///
/// Files are ordered by name, so zero padded frame numbers (`000012.png`) play back in order.
pub struct ImageSequence {
    files: Vec<PathBuf>,
    next: usize,
    framerate: f64,
    dimensions: Option<(u32, u32)>,
}

impl ImageSequence {
    /// Open an image sequence.
    ///
    /// # Arguments
    ///
    /// * `dir` - directory containing the frames.
    /// * `framerate` - frames per timestamp unit, used to derive timestamps.
    pub fn open(dir: impl AsRef<Path>, framerate: f64) -> Result<Self> {
        if !(framerate > 0.0) {
            return Err(anyhow!("Invalid framerate: {framerate}"));
        }

        let mut files = std::fs::read_dir(dir.as_ref())?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();

        files.sort();

        info!(
            "Found {} frames in {}",
            files.len(),
            dir.as_ref().display()
        );

        Ok(Self {
            files,
            next: 0,
            framerate,
            dimensions: None,
        })
    }

    /// Number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>> {
        let path = match self.files.get(self.next) {
            Some(path) => path,
            None => return Ok(None),
        };

        let frame = image::open(path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))?
            .to_rgb8();

        let timestamp = self.next as f64 / self.framerate;
        self.next += 1;
        self.dimensions = Some(frame.dimensions());

        Ok(Some((frame, timestamp)))
    }

    fn get_framerate(&self) -> Option<f64> {
        Some(self.framerate)
    }

    fn get_dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}
