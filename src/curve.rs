//! Polyline approximation of slider paths.
//!
//! Constants mirror osu!lazer's `PathApproximator`: Bezier paths are
//! subdivided until flat, perfect circles are stepped by a sagitta
//! tolerance, and Catmull segments get a fixed sample count.

use crate::parse::{PathType, Pos2, SliderPath};

const BEZIER_TOLERANCE_SQ: f64 = 0.25 * 0.25;
/// Maximum sagitta of a circular arc step.
const ARC_TOLERANCE: f64 = 0.10;
/// Samples per Catmull segment.
const CATMULL_DETAIL: usize = 50;

/// Approximates a slider path as a polyline in playfield coordinates.
///
/// The first vertex is the slider head. Consecutive duplicates and nearly
/// collinear interior vertices are removed.
pub(crate) fn approximate_path(path: &SliderPath) -> Vec<Pos2> {
    let mut poly: Vec<Pos2> = Vec::new();

    match path.path_type {
        PathType::Linear => {
            for &point in &path.segments[0] {
                push_dedup(&mut poly, point.into());
            }
        }
        PathType::Catmull => {
            let points = to_positions(&path.segments[0]);

            for point in approximate_catmull(&points) {
                push_dedup(&mut poly, point);
            }
        }
        PathType::PerfectCurve => {
            let points = to_positions(&path.segments[0]);

            // Only a three point path describes an arc; anything else is
            // treated as a Bezier, as stable does.
            let approximated = match points.as_slice() {
                [p1, p2, p3] => approximate_circular_arc(*p1, *p2, *p3),
                _ => approximate_bezier(&points),
            };

            for point in approximated {
                push_dedup(&mut poly, point);
            }
        }
        PathType::Bezier => {
            for (i, segment) in path.segments.iter().enumerate() {
                let points = to_positions(segment);

                if points.len() < 2 {
                    continue;
                }

                let approximated = approximate_bezier(&points);
                let mut approximated = approximated.as_slice();

                // Consecutive segments share their boundary point.
                if i > 0 {
                    if let (Some(first), Some(last)) = (approximated.first(), poly.last()) {
                        if last.almost_eq(*first) {
                            approximated = &approximated[1..];
                        }
                    }
                }

                for &point in approximated {
                    push_dedup(&mut poly, point);
                }
            }
        }
    }

    dedupe_collinear(poly)
}

/// Samples the polyline at the given arc length.
///
/// Progress beyond the total length extrapolates along the last edge.
pub(crate) fn position_at(poly: &[Pos2], progress: f64) -> Pos2 {
    let mut remaining = progress;

    match poly {
        [] => return Pos2::zero(),
        [only] => return *only,
        _ => {}
    }

    for pair in poly.windows(2) {
        let dir = pair[1] - pair[0];
        let len = dir.length();

        if remaining <= len {
            return pair[0] + dir * (remaining / len);
        }

        remaining -= len;
    }

    let from = poly[poly.len() - 1];
    let dir = from - poly[poly.len() - 2];

    from + dir * (remaining / dir.length())
}

fn to_positions(points: &[crate::parse::Vec2]) -> Vec<Pos2> {
    points.iter().map(|&point| point.into()).collect()
}

fn push_dedup(poly: &mut Vec<Pos2>, point: Pos2) {
    match poly.last() {
        Some(last) if last.x == point.x && last.y == point.y => {}
        _ => poly.push(point),
    }
}

/// Adaptive de Casteljau subdivision; emits one vertex per flat
/// sub-segment start plus the final control point.
fn approximate_bezier(control_points: &[Pos2]) -> Vec<Pos2> {
    if control_points.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut stack: Vec<Vec<Pos2>> = Vec::with_capacity(32);
    stack.push(control_points.to_vec());

    while let Some(current) = stack.pop() {
        if bezier_flat_enough(&current) {
            out.push(current[0]);

            continue;
        }

        // Process the left half first so points come out in order.
        let (left, right) = bezier_subdivide(&current);
        stack.push(right);
        stack.push(left);
    }

    out.push(control_points[control_points.len() - 1]);

    out
}

fn bezier_flat_enough(control_points: &[Pos2]) -> bool {
    for window in control_points.windows(3) {
        let dx = window[0].x - 2.0 * window[1].x + window[2].x;
        let dy = window[0].y - 2.0 * window[1].y + window[2].y;

        if dx * dx + dy * dy > BEZIER_TOLERANCE_SQ {
            return false;
        }
    }

    true
}

/// One de Casteljau step: midpoint triangle of the control polygon.
fn bezier_subdivide(control_points: &[Pos2]) -> (Vec<Pos2>, Vec<Pos2>) {
    let n = control_points.len();
    let mut triangle = vec![Pos2::zero(); n * (n + 1) / 2];

    triangle[..n].copy_from_slice(control_points);

    let mut row_start = 0;
    let mut next_row_start = n;

    for row in 1..n {
        for i in 0..n - row {
            let a = triangle[row_start + i];
            let b = triangle[row_start + i + 1];
            triangle[next_row_start + i] = (a + b) * 0.5;
        }

        row_start = next_row_start;
        next_row_start += n - row;
    }

    let mut left = vec![Pos2::zero(); n];
    let mut right = vec![Pos2::zero(); n];

    let mut row_start = 0;
    let mut row_end = n - 1;

    for row in 0..n {
        left[row] = triangle[row_start];
        // midpoint -> end, reversed
        right[n - 1 - row] = triangle[row_start + row_end];
        row_start += n - row;
        row_end = row_end.saturating_sub(1);
    }

    (left, right)
}

/// Uniform Catmull-Rom with [`CATMULL_DETAIL`] samples per segment.
fn approximate_catmull(points: &[Pos2]) -> Vec<Pos2> {
    match points {
        [] => return Vec::new(),
        [only] => return vec![*only],
        _ => {}
    }

    let n = points.len();
    let mut out = Vec::with_capacity((n - 1) * CATMULL_DETAIL + 1);

    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];

        if i == 0 {
            out.push(p1);
        }

        // Sample (0, 1] to avoid duplicating segment starts.
        for step in 1..=CATMULL_DETAIL {
            let t = step as f64 / CATMULL_DETAIL as f64;
            out.push(catmull_point(p0, p1, p2, p3, t));
        }
    }

    out
}

fn catmull_point(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, t: f64) -> Pos2 {
    let t2 = t * t;
    let t3 = t2 * t;

    Pos2 {
        x: 0.5
            * (2.0 * p1.x
                + (-p0.x + p2.x) * t
                + (2.0 * p0.x - 5.0 * p1.x + 4.0 * p2.x - p3.x) * t2
                + (-p0.x + 3.0 * p1.x - 3.0 * p2.x + p3.x) * t3),
        y: 0.5
            * (2.0 * p1.y
                + (-p0.y + p2.y) * t
                + (2.0 * p0.y - 5.0 * p1.y + 4.0 * p2.y - p3.y) * t2
                + (-p0.y + 3.0 * p1.y - 3.0 * p2.y + p3.y) * t3),
    }
}

/// Circular arc through three points, stepped by the sagitta tolerance.
fn approximate_circular_arc(p1: Pos2, p2: Pos2, p3: Pos2) -> Vec<Pos2> {
    if collinear(p1, p2, p3) {
        return vec![p1, p3];
    }

    let Some(center) = circumcenter(p1, p2, p3) else {
        return vec![p1, p3];
    };

    let radius = center.distance(p1);

    let a1 = (p1.y - center.y).atan2(p1.x - center.x);
    let a3 = (p3.y - center.y).atan2(p3.x - center.x);

    let dir = if (p2 - p1).cross(p3 - p2) < 0.0 {
        -1.0
    } else {
        1.0
    };

    let delta = angle_difference(a1, a3, dir);

    let mut step = 2.0 * (1.0 - ARC_TOLERANCE / radius).clamp(-1.0, 1.0).acos();

    if step <= 0.0 || step.is_nan() || step > std::f64::consts::PI {
        step = std::f64::consts::PI;
    }

    let steps = ((delta.abs() / step).ceil() as usize).max(2);
    let step = step.copysign(dir);

    let mut out = Vec::with_capacity(steps + 1);
    out.push(p1);

    for i in 1..steps {
        let angle = a1 + i as f64 * step;

        out.push(Pos2 {
            x: center.x + angle.cos() * radius,
            y: center.y + angle.sin() * radius,
        });
    }

    out.push(p3);

    out
}

fn collinear(a: Pos2, b: Pos2, c: Pos2) -> bool {
    (b - a).cross(c - b).abs() < 1e-6
}

fn circumcenter(a: Pos2, b: Pos2, c: Pos2) -> Option<Pos2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));

    if d.abs() < 1e-8 {
        return None;
    }

    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();

    Some(Pos2 {
        x: (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        y: (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    })
}

/// Signed sweep from `start` to `end` in the given direction.
fn angle_difference(start: f64, end: f64, dir: f64) -> f64 {
    use std::f64::consts::PI;

    let mut diff = end - start;

    while diff <= -PI {
        diff += 2.0 * PI;
    }

    while diff > PI {
        diff -= 2.0 * PI;
    }

    if dir < 0.0 && diff > 0.0 {
        diff -= 2.0 * PI;
    } else if dir > 0.0 && diff < 0.0 {
        diff += 2.0 * PI;
    }

    diff
}

fn dedupe_collinear(points: Vec<Pos2>) -> Vec<Pos2> {
    if points.len() <= 2 {
        return points;
    }

    let mut out = vec![points[0]];

    for i in 1..points.len() - 1 {
        let a = out[out.len() - 1];
        let b = points[i];
        let c = points[i + 1];

        if a.almost_eq(b) {
            continue;
        }

        if (b - a).cross(c - b).abs() < 1e-7 && (b - a).normalize().dot((c - b).normalize()) > 0.999_999
        {
            continue;
        }

        out.push(b);
    }

    if !out[out.len() - 1].almost_eq(points[points.len() - 1]) {
        out.push(points[points.len() - 1]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{SliderPath, Vec2};

    fn polyline_length(poly: &[Pos2]) -> f64 {
        poly.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
    }

    #[test]
    fn linear_path_keeps_endpoints_and_length() {
        let path = SliderPath::parse(Vec2::new(0, 0), "L|200:0");
        let poly = approximate_path(&path);

        assert!(poly[0].almost_eq(Pos2 { x: 0.0, y: 0.0 }));
        assert!(poly[poly.len() - 1].almost_eq(Pos2 { x: 200.0, y: 0.0 }));
        assert!(polyline_length(&poly) >= 200.0 - 1e-6);
    }

    #[test]
    fn position_walks_and_extrapolates() {
        let poly = [
            Pos2 { x: 0.0, y: 0.0 },
            Pos2 { x: 100.0, y: 0.0 },
            Pos2 { x: 100.0, y: 100.0 },
        ];

        assert!(position_at(&poly, 50.0).almost_eq(Pos2 { x: 50.0, y: 0.0 }));
        assert!(position_at(&poly, 150.0).almost_eq(Pos2 { x: 100.0, y: 50.0 }));
        // past the end: keep going along the last edge
        assert!(position_at(&poly, 250.0).almost_eq(Pos2 { x: 100.0, y: 150.0 }));
    }

    #[test]
    fn perfect_arc_stays_on_the_circle() {
        let path = SliderPath::parse(Vec2::new(0, 0), "P|100:100|200:0");
        let poly = approximate_path(&path);

        assert!(poly[0].almost_eq(Pos2 { x: 0.0, y: 0.0 }));
        assert!(poly[poly.len() - 1].almost_eq(Pos2 { x: 200.0, y: 0.0 }));
        assert!(poly.len() > 3);

        // circle through the three points: center (100, 0), radius 100
        let center = Pos2 { x: 100.0, y: 0.0 };

        for point in &poly {
            assert!(
                (point.distance(center) - 100.0).abs() < 1e-6,
                "point {point} off the arc"
            );
        }
    }

    #[test]
    fn collinear_perfect_path_degrades_to_line() {
        let path = SliderPath::parse(Vec2::new(0, 0), "P|100:0|200:0");
        let poly = approximate_path(&path);

        assert_eq!(poly.len(), 2);
        assert!(poly[1].almost_eq(Pos2 { x: 200.0, y: 0.0 }));
    }

    #[test]
    fn bezier_red_anchor_passes_through_anchor() {
        let path = SliderPath::parse(Vec2::new(0, 0), "B|100:0|100:0|200:0");
        let poly = approximate_path(&path);

        assert!(poly[0].almost_eq(Pos2 { x: 0.0, y: 0.0 }));
        assert!(poly[poly.len() - 1].almost_eq(Pos2 { x: 200.0, y: 0.0 }));
        assert!((polyline_length(&poly) - 200.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_path_collapses_to_head() {
        let path = SliderPath::parse(Vec2::new(64, 96), "");
        let poly = approximate_path(&path);

        assert_eq!(poly.len(), 1);
        assert!(position_at(&poly, 35.0).almost_eq(Pos2 { x: 64.0, y: 96.0 }));
    }

    #[test]
    fn curved_bezier_approximation_is_close() {
        // quadratic with control point (100, 100): endpoints exact,
        // midpoint at (100, 50)
        let path = SliderPath::parse(Vec2::new(0, 0), "B|100:100|200:0");
        let poly = approximate_path(&path);

        assert!(poly[0].almost_eq(Pos2 { x: 0.0, y: 0.0 }));
        assert!(poly[poly.len() - 1].almost_eq(Pos2 { x: 200.0, y: 0.0 }));

        let length = polyline_length(&poly);
        let mid = position_at(&poly, length / 2.0);

        assert!((mid.x - 100.0).abs() < 1.0, "mid {mid}");
        assert!((mid.y - 50.0).abs() < 1.0, "mid {mid}");
    }
}
