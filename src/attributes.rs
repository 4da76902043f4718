use serde::Serialize;

use crate::mods::Modifiers;
use crate::parse::Beatmap;

/// Half-widths of the timing windows in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct HitWindows {
    pub w300: f64,
    pub w100: f64,
    pub w50: f64,
}

/// Modifier-adjusted constants of a beatmap.
///
/// Hardrock multiplies CS by 1.3 and OD/AR by 1.4 (capped at 10), Easy
/// halves all three. The preempt is scaled by the playback rate and the
/// approach rate recomputed from it, so `approach_rate` reflects what the
/// player actually sees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct MapAttributes {
    pub mods: Modifiers,
    /// Circle radius in osu! pixels: `54.4 - 4.48 * CS`.
    pub circle_radius: f64,
    pub approach_rate: f64,
    /// Time in ms an object is visible before its hit moment.
    pub preempt: f64,
    pub windows: HitWindows,
}

impl MapAttributes {
    pub fn new(map: &Beatmap, mods: &Modifiers) -> Self {
        let difficulty = &map.difficulty;

        let mut cs = difficulty.circle_size;

        if mods.hardrock {
            cs = (cs * 1.3).min(10.0);
        }

        if mods.easy {
            cs /= 2.0;
        }

        let circle_radius = 54.4 - 4.48 * cs;

        let mut od = difficulty.overall_difficulty;
        let mut ar = difficulty.approach_rate;

        if mods.hardrock {
            od = (od * 1.4).min(10.0);
            ar = (ar * 1.4).min(10.0);
        }

        if mods.easy {
            od /= 2.0;
            ar /= 2.0;
        }

        let preempt = approach_rate_to_preempt(ar) / mods.rate;
        let approach_rate = preempt_to_approach_rate(preempt);

        let windows = HitWindows {
            w300: (80.0 - 6.0 * od) / mods.rate,
            w100: (140.0 - 8.0 * od) / mods.rate,
            w50: (200.0 - 10.0 * od) / mods.rate,
        };

        Self {
            mods: *mods,
            circle_radius,
            approach_rate,
            preempt,
            windows,
        }
    }

    /// The overall difficulty whose 300 window equals the effective one.
    pub fn od(&self) -> f64 {
        (80.0 - self.windows.w300) / 6.0
    }

    /// Like [`od`](Self::od) but derived from the 100 window.
    pub fn od_100(&self) -> f64 {
        (140.0 - self.windows.w100) / 8.0
    }

    /// Like [`od`](Self::od) but derived from the 50 window.
    pub fn od_50(&self) -> f64 {
        (200.0 - self.windows.w50) / 10.0
    }
}

pub(crate) fn approach_rate_to_preempt(ar: f64) -> f64 {
    if ar < 5.0 {
        1200.0 + 120.0 * (5.0 - ar)
    } else if ar == 5.0 {
        1200.0
    } else {
        1200.0 - 150.0 * (ar - 5.0)
    }
}

pub(crate) fn preempt_to_approach_rate(preempt: f64) -> f64 {
    if preempt > 1200.0 {
        5.0 - (preempt - 1200.0) / 120.0
    } else if preempt == 1200.0 {
        5.0
    } else {
        5.0 + (1200.0 - preempt) / 150.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Difficulty;

    fn map_with(cs: f64, od: f64, ar: f64) -> Beatmap {
        Beatmap {
            difficulty: Difficulty {
                circle_size: cs,
                overall_difficulty: od,
                approach_rate: ar,
                ..Difficulty::default()
            },
            ..Beatmap::default()
        }
    }

    #[test]
    fn preempt_round_trips_approach_rate() {
        for ar in [0.0, 3.5, 5.0, 7.0, 9.3, 10.0] {
            let preempt = approach_rate_to_preempt(ar);
            assert!((preempt_to_approach_rate(preempt) - ar).abs() < 1e-9);
        }

        assert_eq!(approach_rate_to_preempt(5.0), 1200.0);
    }

    #[test]
    fn rate_scales_windows_exactly() {
        let map = map_with(4.0, 8.0, 9.0);

        let nomod = MapAttributes::new(&map, &Modifiers::default());
        let dt = MapAttributes::new(
            &map,
            &Modifiers {
                rate: 1.5,
                ..Default::default()
            },
        );

        assert_eq!(dt.windows.w300, nomod.windows.w300 / 1.5);
        assert_eq!(dt.windows.w100, nomod.windows.w100 / 1.5);
        assert_eq!(dt.windows.w50, nomod.windows.w50 / 1.5);

        assert!((dt.windows.w300 - nomod.windows.w300 * 2.0 / 3.0).abs() < 1e-9);

        // faster preempt reads as a higher effective AR
        assert!(dt.approach_rate > nomod.approach_rate);
    }

    #[test]
    fn hardrock_and_easy_adjust_attributes() {
        let map = map_with(4.0, 8.0, 9.0);

        let hr = MapAttributes::new(
            &map,
            &Modifiers {
                hardrock: true,
                ..Default::default()
            },
        );

        // od capped at 10
        assert_eq!(hr.windows.w300, 80.0 - 6.0 * 10.0);
        assert!(hr.circle_radius < 54.4 - 4.48 * 4.0);

        let ez = MapAttributes::new(
            &map,
            &Modifiers {
                easy: true,
                ..Default::default()
            },
        );

        assert_eq!(ez.windows.w300, 80.0 - 6.0 * 4.0);
        assert!(ez.circle_radius > hr.circle_radius);
        assert!(ez.approach_rate < hr.approach_rate);
    }

    #[test]
    fn inverse_od_matches_windows() {
        let map = map_with(4.0, 8.0, 9.0);
        let attrs = MapAttributes::new(&map, &Modifiers::default());

        assert!((attrs.od() - 8.0).abs() < 1e-9);
        assert!((attrs.od_100() - 8.0).abs() < 1e-9);
        assert!((attrs.od_50() - 8.0).abs() < 1e-9);
    }
}
