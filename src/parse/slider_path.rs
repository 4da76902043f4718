use std::str::FromStr;

use serde::Serialize;

use super::pos2::Vec2;

/// The type of curve of a slider.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PathType {
    Bezier = 0,
    Linear = 1,
    Catmull = 2,
    PerfectCurve = 3,
}

impl FromStr for PathType {
    type Err = ();

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(Self::Linear),
            "C" => Ok(Self::Catmull),
            "P" => Ok(Self::PerfectCurve),
            "B" => Ok(Self::Bezier),
            _ => Err(()),
        }
    }
}

/// Fully parsed control point path of a slider.
///
/// The slider head is always the first point of the first segment.
/// Bezier paths are split into segments wherever a control point repeats
/// (a "red anchor"); the repeated point ends one segment and starts the
/// next. Other path types always hold a single segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SliderPath {
    pub path_type: PathType,
    pub segments: Vec<Vec<Vec2>>,
}

impl SliderPath {
    /// Parses a `T|x:y|x:y|…` path spec, prepending the slider head.
    ///
    /// A perfect curve requires exactly head + 2 control points and falls
    /// back to Bezier otherwise, matching stable. Degenerate paths (no
    /// usable control points) collapse to a single `[head, head]` segment.
    pub(crate) fn parse(head: Vec2, spec: &str) -> Self {
        let spec = spec.trim();

        if spec.is_empty() {
            return Self::degenerate(head);
        }

        let (type_str, rest) = match spec.find('|') {
            Some(idx) => (&spec[..idx], &spec[idx + 1..]),
            None => (spec, ""),
        };

        let path_type = type_str
            .trim()
            .to_ascii_uppercase()
            .parse::<PathType>()
            .unwrap_or(PathType::Bezier);

        let mut control_points = Vec::new();

        if !rest.trim().is_empty() {
            for token in rest.split('|') {
                let mut xy = token.trim().split(':');

                let (Some(x), Some(y), None) = (xy.next(), xy.next(), xy.next()) else {
                    continue;
                };

                control_points.push(Vec2 {
                    x: x.trim().parse().unwrap_or(head.x),
                    y: y.trim().parse().unwrap_or(head.y),
                });
            }
        }

        match path_type {
            PathType::PerfectCurve => {
                if control_points.len() != 2 {
                    return Self::bezier_with_segments(head, &control_points);
                }

                let mut points = Vec::with_capacity(3);
                points.push(head);
                points.extend(control_points);

                Self {
                    path_type: PathType::PerfectCurve,
                    segments: vec![points],
                }
            }
            PathType::Linear | PathType::Catmull => {
                if control_points.is_empty() {
                    return Self::degenerate(head);
                }

                let mut points = Vec::with_capacity(control_points.len() + 1);
                points.push(head);
                points.extend(control_points);

                Self {
                    path_type,
                    segments: vec![points],
                }
            }
            PathType::Bezier => Self::bezier_with_segments(head, &control_points),
        }
    }

    /// Splits `head + control_points` into Bezier segments at red anchors.
    fn bezier_with_segments(head: Vec2, control_points: &[Vec2]) -> Self {
        let mut segments: Vec<Vec<Vec2>> = Vec::new();
        let mut current = vec![head];

        for &point in control_points {
            let prev = current[current.len() - 1];

            if point == prev {
                if current.len() >= 2 {
                    segments.push(current);
                }

                current = vec![point];

                continue;
            }

            current.push(point);
        }

        if current.len() >= 2 {
            segments.push(current);
        }

        if segments.is_empty() {
            return Self::degenerate(head);
        }

        Self {
            path_type: PathType::Bezier,
            segments,
        }
    }

    fn degenerate(head: Vec2) -> Self {
        Self {
            path_type: PathType::Bezier,
            segments: vec![vec![head, head]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_anchor_splits_segments() {
        let path = SliderPath::parse(Vec2::new(0, 0), "B|100:0|100:0|200:0");

        assert_eq!(path.path_type, PathType::Bezier);
        assert_eq!(
            path.segments,
            vec![
                vec![Vec2::new(0, 0), Vec2::new(100, 0)],
                vec![Vec2::new(100, 0), Vec2::new(200, 0)],
            ],
        );
    }

    #[test]
    fn perfect_curve_needs_three_points() {
        let three = SliderPath::parse(Vec2::new(0, 0), "P|50:50|100:0");
        assert_eq!(three.path_type, PathType::PerfectCurve);
        assert_eq!(three.segments.len(), 1);
        assert_eq!(three.segments[0].len(), 3);

        let four = SliderPath::parse(Vec2::new(0, 0), "P|50:50|100:0|150:50");
        assert_eq!(four.path_type, PathType::Bezier);
    }

    #[test]
    fn empty_spec_collapses_to_head_pair() {
        let path = SliderPath::parse(Vec2::new(64, 96), "");

        assert_eq!(path.segments, vec![vec![Vec2::new(64, 96), Vec2::new(64, 96)]]);
    }

    #[test]
    fn unknown_type_letter_becomes_bezier() {
        let path = SliderPath::parse(Vec2::new(0, 0), "X|100:0");

        assert_eq!(path.path_type, PathType::Bezier);
    }
}
