//! Conversion of a decoded beatmap into the flat, time-ordered stream of
//! player actions the judgement model consumes.

use crate::attributes::MapAttributes;
use crate::curve;
use crate::error::Error;
use crate::parse::{Beatmap, HitObjectKind, Pos2, TimingPoint};

/// Length of the click/aim history window attached to each action.
pub const HISTORY_LEN: usize = 10;

/// Centre of the 512x384 playfield.
pub const PLAYFIELD_CENTER: Pos2 = Pos2 { x: 256.0, y: 192.0 };

/// Sliders judge their final end this many ms before the real end
/// (capped at half the slider), matching stable's legacy last tick.
const LEGACY_LAST_TICK_OFFSET: f64 = 36.0;

/// Inherited points cannot slow sliders below this velocity multiplier.
const MIN_SLIDER_VELOCITY: f64 = 0.1;

/// Slider ticks and ends are this much more forgiving than the head.
const SLIDER_FOLLOW_RADIUS_SCALE: f64 = 2.4;

const SPINNER_RADIUS: f64 = 200.0;

/// A position/radius pair at a point in time, as kept in the history
/// windows.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TimePos {
    pub pos: Pos2,
    pub radius: f64,
    pub time: f64,
}

/// One thing the player has to do: click a circle or slider head, follow
/// a tick, repeat or end, or spin a spinner.
///
/// Times are rate-scaled and strictly increasing across the stream. The
/// history arrays are value snapshots of the [`HISTORY_LEN`] most recent
/// clicks and aim targets before this action, pre-seeded with far-past
/// entries so they are never empty.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Action {
    pub pos: Pos2,
    pub time: f64,
    /// Effective target radius: circle radius for clicks, scaled up for
    /// slider parts, fixed for spinners.
    pub radius: f64,

    pub clickable: bool,
    pub circle: bool,
    pub slider_end: bool,
    pub slider_tick: bool,
    pub spinner: bool,

    pub last_clicks: [TimePos; HISTORY_LEN],
    pub last_aims: [TimePos; HISTORY_LEN],
}

impl Action {
    fn at(pos: Pos2, time: f64, radius: f64) -> Self {
        Self {
            pos,
            time,
            radius,
            clickable: false,
            circle: false,
            slider_end: false,
            slider_tick: false,
            spinner: false,
            last_clicks: [TimePos::default(); HISTORY_LEN],
            last_aims: [TimePos::default(); HISTORY_LEN],
        }
    }
}

/// Builds the action stream for a beatmap under the given modifiers.
///
/// # Errors
///
/// [`Error::UnsupportedObject`] on hold notes and
/// [`Error::InvalidBeatmap`] when the resulting actions are not strictly
/// increasing in time or a slider appears before any uninherited timing
/// point.
pub fn convert_beatmap_to_actions(
    map: &Beatmap,
    attrs: &MapAttributes,
) -> Result<Vec<Action>, Error> {
    let mods = &attrs.mods;
    let circle_radius = attrs.circle_radius;

    let timing_points = &map.timing_points;
    let mut timing_index = 0;
    let mut last_red_line: Option<&TimingPoint> = None;
    let mut last_green_line: Option<&TimingPoint> = None;

    let mut actions: Vec<Action> = Vec::with_capacity(map.hit_objects.len());

    for object in &map.hit_objects {
        while timing_index < timing_points.len()
            && (last_red_line.is_none() || timing_points[timing_index].time <= object.start_time)
        {
            let point = &timing_points[timing_index];
            timing_index += 1;

            if point.timing_change {
                last_red_line = Some(point);
                last_green_line = None;
            } else {
                last_green_line = Some(point);
            }
        }

        let head_pos = Pos2::from(object.pos);
        let head_time = f64::from(object.start_time);

        match &object.kind {
            HitObjectKind::Circle => {
                actions.push(Action {
                    clickable: true,
                    circle: true,
                    ..Action::at(head_pos, head_time, circle_radius)
                });
            }
            HitObjectKind::Slider(slider) => {
                let Some(red_line) = last_red_line else {
                    return Err(Error::InvalidBeatmap(format!(
                        "slider at {}ms before any uninherited timing point",
                        object.start_time,
                    )));
                };

                let beat_length = red_line.beat_length;
                let velocity = last_green_line
                    .map(|green| green.slider_velocity_multiplier.max(MIN_SLIDER_VELOCITY))
                    .unwrap_or(1.0);

                let samples = curve::approximate_path(&slider.path);

                actions.push(Action {
                    clickable: true,
                    ..Action::at(head_pos, head_time, circle_radius)
                });

                let visual_length = slider.pixel_len;
                let time_length = visual_length
                    / (map.difficulty.slider_multiplier * 100.0 * velocity)
                    * beat_length;

                let tick_time = beat_length / map.difficulty.slider_tick_rate;
                let ticks_float = time_length / tick_time;

                let end_offset = LEGACY_LAST_TICK_OFFSET.min(time_length / 2.0);
                let ticks = (((time_length - end_offset) / tick_time).floor() as i64).max(0);
                let tick_length = visual_length / ticks_float;

                let follow_radius = circle_radius * SLIDER_FOLLOW_RADIUS_SCALE;

                for slide in 0..slider.slides.max(1) as i64 {
                    let slide_start = head_time + slide as f64 * time_length;
                    let forward = slide % 2 == 0;

                    for tick in 0..ticks {
                        let (time, progress) = if forward {
                            (
                                slide_start + (tick + 1) as f64 * tick_time,
                                (tick + 1) as f64 * tick_length,
                            )
                        } else {
                            (
                                slide_start + time_length + (tick - ticks) as f64 * tick_time,
                                (ticks - tick) as f64 * tick_length,
                            )
                        };

                        actions.push(Action {
                            slider_tick: true,
                            ..Action::at(
                                curve::position_at(&samples, progress),
                                time,
                                follow_radius,
                            )
                        });
                    }

                    let last_slide = slide == i64::from(slider.slides.max(1)) - 1;
                    let mut slide_end_time = slide_start + time_length;

                    let end_pos = if last_slide {
                        let effective_length = time_length - end_offset;
                        slide_end_time -= end_offset;

                        let progress = if forward {
                            effective_length / time_length * visual_length
                        } else {
                            (1.0 - effective_length / time_length) * visual_length
                        };

                        curve::position_at(&samples, progress)
                    } else if forward {
                        curve::position_at(&samples, visual_length)
                    } else {
                        head_pos
                    };

                    actions.push(Action {
                        slider_end: last_slide,
                        slider_tick: !last_slide,
                        ..Action::at(end_pos, slide_end_time, follow_radius)
                    });
                }
            }
            HitObjectKind::Spinner { end_time } => {
                if mods.spun_out {
                    continue;
                }

                let time = f64::from(object.start_time + end_time) / 2.0;

                actions.push(Action {
                    spinner: true,
                    ..Action::at(PLAYFIELD_CENTER, time, SPINNER_RADIUS)
                });
            }
            HitObjectKind::Hold { .. } => {
                return Err(Error::UnsupportedObject {
                    time: object.start_time,
                });
            }
        }
    }

    for pair in actions.windows(2) {
        if pair[0].time >= pair[1].time {
            return Err(Error::InvalidBeatmap(format!(
                "actions too close at {}ms and {}ms",
                pair[0].time, pair[1].time,
            )));
        }
    }

    for action in &mut actions {
        action.time /= mods.rate;
    }

    attach_history(&mut actions);

    tracing::debug!(
        actions = actions.len(),
        objects = map.hit_objects.len(),
        "built action stream"
    );

    Ok(actions)
}

/// Fills each action's history windows with the preceding clicks and aim
/// targets, seeding with far-past placeholder entries.
fn attach_history(actions: &mut [Action]) {
    let mut seed = [TimePos::default(); HISTORY_LEN];

    for (i, entry) in seed.iter_mut().enumerate() {
        *entry = TimePos {
            pos: PLAYFIELD_CENTER,
            radius: 1000.0,
            time: -1e18 + 1e12 * i as f64,
        };
    }

    let mut clicks = seed;
    let mut aims = seed;

    for action in actions {
        action.last_clicks = clicks;
        action.last_aims = aims;

        let entry = TimePos {
            pos: action.pos,
            radius: action.radius,
            time: action.time,
        };

        if action.clickable {
            push_history(&mut clicks, entry);
        }

        push_history(&mut aims, entry);
    }
}

fn push_history(window: &mut [TimePos; HISTORY_LEN], entry: TimePos) {
    window.rotate_left(1);
    window[HISTORY_LEN - 1] = entry;
}
