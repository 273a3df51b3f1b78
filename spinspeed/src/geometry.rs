//! # Region geometry
//!
//! Measurements over closed pixel contours.

use nalgebra as na;

/// Area enclosed by a closed polygon (shoelace formula).
///
/// The polygon is implicitly closed between the last and first point. Fewer than 3 points give 0.
pub fn polygon_area(points: &[na::Point2<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum::<f64>();

    (twice_area.abs() * 0.5) as f32
}

/// Length of a closed polygon's boundary.
pub fn perimeter(points: &[na::Point2<f32>]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| na::distance(a, b))
        .sum()
}

/// Shape regularity score, `4π·area/perimeter²`.
///
/// 1 for a perfect circle, approaching 0 for elongated shapes. Degenerate (zero perimeter)
/// shapes score 0.
pub fn circularity(area: f32, perimeter: f32) -> f32 {
    if perimeter <= 0.0 {
        0.0
    } else {
        4.0 * std::f32::consts::PI * area / (perimeter * perimeter)
    }
}

/// A circle in the image plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: na::Point2<f64>,
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: &na::Point2<f64>) -> bool {
        na::distance(&self.center, p) <= self.radius * (1.0 + 1e-9) + 1e-7
    }

    fn from_diameter(a: &na::Point2<f64>, b: &na::Point2<f64>) -> Self {
        Self {
            center: na::center(a, b),
            radius: na::distance(a, b) * 0.5,
        }
    }

    /// Circle through three points.
    ///
    /// For (nearly) collinear points the circle spanning the two furthest apart is returned.
    fn from_triangle(a: &na::Point2<f64>, b: &na::Point2<f64>, c: &na::Point2<f64>) -> Self {
        let ab = *b - *a;
        let ac = *c - *a;
        let d = 2.0 * (ab.x * ac.y - ab.y * ac.x);

        if d.abs() < 1e-12 {
            return [(a, b), (a, c), (b, c)]
                .into_iter()
                .map(|(p, q)| Self::from_diameter(p, q))
                .fold(Self::from_diameter(a, a), |best, span| {
                    if span.radius > best.radius {
                        span
                    } else {
                        best
                    }
                });
        }

        let ab2 = ab.norm_squared();
        let ac2 = ac.norm_squared();

        let offset = na::Vector2::new(
            (ac.y * ab2 - ab.y * ac2) / d,
            (ab.x * ac2 - ac.x * ab2) / d,
        );

        Self {
            center: *a + offset,
            radius: offset.norm(),
        }
    }
}

/// Smallest circle enclosing every point (Welzl's algorithm, iterative form).
///
/// Returns `None` for an empty point set.
pub fn min_enclosing_circle(points: &[na::Point2<f32>]) -> Option<Circle> {
    let points = points
        .iter()
        .map(|p| na::Point2::new(p.x as f64, p.y as f64))
        .collect::<Vec<_>>();

    let first = points.first()?;
    let mut circle = Circle {
        center: *first,
        radius: 0.0,
    };

    for i in 1..points.len() {
        if circle.contains(&points[i]) {
            continue;
        }

        circle = Circle {
            center: points[i],
            radius: 0.0,
        };

        for j in 0..i {
            if circle.contains(&points[j]) {
                continue;
            }

            circle = Circle::from_diameter(&points[i], &points[j]);

            for k in 0..j {
                if !circle.contains(&points[k]) {
                    circle = Circle::from_triangle(&points[i], &points[j], &points[k]);
                }
            }
        }
    }

    Some(circle)
}
