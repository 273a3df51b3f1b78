//! Annotated frame rendering.

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
use spinspeed::prelude::v1::*;

/// Colours cycled through for moving balls.
pub const PALETTE: [Rgb<u8>; 6] = [
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 255, 0]),
];

/// Colour of locations judged static.
pub const STATIC: Rgb<u8> = Rgb([128, 128, 128]);

/// Records seen more often than this are drawn as static.
const SHOWN_MATCHES: usize = 10;

const DOT_RADIUS: i32 = 2;

fn draw_circle(frame: &mut Frame, position: (f32, f32), radius: f32, colour: Rgb<u8>) {
    let center = (position.0.round() as i32, position.1.round() as i32);
    draw_hollow_circle_mut(frame, center, radius.round() as i32, colour);
    draw_filled_circle_mut(frame, center, DOT_RADIUS, colour);
}

/// Draw classification results on top of a frame.
///
/// Static locations go first, so that a moving ball passing over one stays visible.
pub fn draw(frame: &mut Frame, report: &FrameReport, classifier: &MotionClassifier) {
    let statics = classifier
        .records()
        .iter()
        .filter(|r| !r.is_moving && r.consecutive_matches > SHOWN_MATCHES)
        .chain(classifier.background());

    for r in statics {
        draw_circle(frame, (r.position.x, r.position.y), r.radius, STATIC);
    }

    for (c, colour) in report.moving.iter().zip(PALETTE.iter().cycle()) {
        if c.radius <= 0.0 {
            continue;
        }
        draw_circle(frame, (c.position.x, c.position.y), c.radius, *colour);
    }
}
