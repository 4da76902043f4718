//! Per-action judgement model.
//!
//! For every action a [`PPIter`] estimates the probability of hitting it
//! within each timing window and folds those into distributions over
//! miss counts. One pass over the action stream yields the probability
//! of the observed score outcome for the current skill vector.

use serde::{Deserialize, Serialize};

use crate::action::{Action, HISTORY_LEN};
use crate::attributes::MapAttributes;
use crate::miss_dist::MissDistribution;
use crate::skills::Skills;

/// Shape parameter of the hit error distribution, must be > 2.
const B_PARAM: f64 = 3.0;

/// Observed judgement counts of the score being explained.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCounts {
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
    pub slider_end_misses: u32,
    pub slider_tick_misses: u32,
    pub spinner_misses: u32,
}

/// Rolling all-or-nothing state of the slider currently being traversed
/// under stable rules.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct StableSliderProbs {
    /// Probability the slider is still fully intact.
    pub p300: f64,
    /// Probability it degraded to a 100.
    pub p100: f64,
}

/// Evaluation state for one pass of a skill vector over the actions.
///
/// Created per solver probe, discarded afterwards; the final winning
/// instance is returned inside [`BeatmapPPInfo`](crate::BeatmapPPInfo).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PPIter {
    pub pp: f64,

    pub skills: Skills,
    pub attrs: MapAttributes,

    pub prob_result: f64,
    pub prob_ss: f64,

    /// Clicks judged worse than a 300.
    pub n100_or_worse: MissDistribution,
    /// Clicks judged worse than a 100.
    pub n50_or_worse: MissDistribution,
    /// Clicks missed outright.
    pub misses: MissDistribution,
    pub slider_tick_misses: MissDistribution,
    pub slider_end_misses: MissDistribution,
    pub spinner_misses: MissDistribution,

    slider_probs: StableSliderProbs,

    pub expected_300s: f64,
    pub expected_100s: f64,
    pub expected_50s: f64,
    pub expected_misses: f64,
    pub expected_slider_tick_misses: f64,
    pub expected_slider_end_misses: f64,
    pub expected_spinner_misses: f64,
}

impl PPIter {
    pub fn new(skills: Skills, attrs: MapAttributes) -> Self {
        Self {
            pp: 0.0,
            skills,
            attrs,
            prob_result: 0.0,
            prob_ss: 1.0,
            n100_or_worse: MissDistribution::new(),
            n50_or_worse: MissDistribution::new(),
            misses: MissDistribution::new(),
            slider_tick_misses: MissDistribution::new(),
            slider_end_misses: MissDistribution::new(),
            spinner_misses: MissDistribution::new(),
            slider_probs: StableSliderProbs::default(),
            expected_300s: 0.0,
            expected_100s: 0.0,
            expected_50s: 0.0,
            expected_misses: 0.0,
            expected_slider_tick_misses: 0.0,
            expected_slider_end_misses: 0.0,
            expected_spinner_misses: 0.0,
        }
    }

    /// Folds one action into the distributions.
    pub fn iterate_action(&mut self, action: &Action) {
        if action.clickable {
            self.iterate_click(action);
        } else {
            self.iterate_follow(action);
        }
    }

    fn iterate_click(&mut self, action: &Action) {
        let unstable_rate = self.unstable_rate(action);
        let prob_aim = self.probability_to_aim(action, unstable_rate);

        let windows = self.attrs.windows;
        let at_least_300 = prob_aim * prob_err_less_than(unstable_rate, windows.w300);
        let at_least_100 = prob_aim * prob_err_less_than(unstable_rate, windows.w100);
        let at_least_50 = prob_aim * prob_err_less_than(unstable_rate, windows.w50);

        if self.attrs.mods.lazer || action.circle {
            self.n100_or_worse.add(at_least_300);
            self.n50_or_worse.add(at_least_100);
            self.misses.add(at_least_50);
        } else {
            // Stable scores a slider as a whole: hitting the head within
            // the 50 window keeps it alive, everything else decides at
            // the slider end.
            self.slider_probs = StableSliderProbs {
                p300: at_least_50,
                p100: 0.0,
            };
        }

        self.prob_ss *= at_least_300;

        self.expected_300s += at_least_300;
        self.expected_100s += at_least_100 - at_least_300;
        self.expected_50s += at_least_50 - at_least_100;
        self.expected_misses += 1.0 - at_least_50;
    }

    fn iterate_follow(&mut self, action: &Action) {
        let mut prob_aim = self.probability_to_aim(action, 0.0);

        if action.spinner {
            prob_aim /= 1.0 + self.attrs.windows.w50 / self.skills.aim.spin;

            self.spinner_misses.add(prob_aim);
            self.expected_spinner_misses += 1.0 - prob_aim;

            return;
        }

        prob_aim /= 1.0 + 0.1 / self.skills.tap.hold_sliders;

        if self.attrs.mods.lazer {
            if action.slider_end {
                self.slider_end_misses.add(prob_aim);
                self.expected_slider_end_misses += 1.0 - prob_aim;
            } else {
                self.slider_tick_misses.add(prob_aim);
                self.expected_slider_tick_misses += 1.0 - prob_aim;
            }

            return;
        }

        let roll = self.slider_probs;

        self.slider_probs = StableSliderProbs {
            p300: roll.p300 * prob_aim,
            p100: roll.p300 * (1.0 - prob_aim)
                + roll.p100
                + (1.0 - roll.p300 - roll.p100) * prob_aim,
        };

        if action.slider_end {
            let roll = self.slider_probs;

            self.n100_or_worse.add(roll.p300);
            self.n50_or_worse.add(roll.p300 + roll.p100);
            self.misses.add(roll.p300 + roll.p100);
        }
    }

    /// sqrt(E[error^2]) of click timing, aka unstable rate.
    fn unstable_rate(&self, action: &Action) -> f64 {
        let last_click = action.last_clicks[HISTORY_LEN - 1];

        let last_click_delta = action.time - last_click.time;
        let last_click_bpm = 15_000.0 / last_click_delta; // 50ms = 300bpm 1/4

        let mut avg_bpm_to_300 = 0.0f64;

        for i in 1..=HISTORY_LEN {
            let delta = action.time - action.last_clicks[HISTORY_LEN - i].time;
            let bpm = i as f64 * 15_000.0 / (delta + 2.0 * self.attrs.windows.w300);
            avg_bpm_to_300 = avg_bpm_to_300.max(bpm);
        }

        // 900 skill in speed = 300 bpm
        let skill_burst_bpm = self.skills.tap.burst_speed.sqrt() * 10.0;
        let skill_stream_bpm = self.skills.tap.stream_speed.sqrt() * 10.0;

        let speed_error_factor = 1.0
            + 0.1 * (last_click_bpm / skill_burst_bpm).powi(2)
            + (avg_bpm_to_300 / skill_stream_bpm).powi(3);

        let low_ar_factor = 1.0 + 0.001 * self.attrs.preempt / self.skills.reading.low_ar;

        speed_error_factor * low_ar_factor * (10_000.0 / (1.0 + 2.0 * self.skills.tap.accuracy))
    }

    /// Probability of the cursor being on the target when it matters.
    ///
    /// `unstable_rate` only contributes for clickable actions, where the
    /// cursor has to pass over the target within the timing error.
    fn probability_to_aim(&self, action: &Action, unstable_rate: f64) -> f64 {
        let last_aim = action.last_aims[HISTORY_LEN - 1];

        let distance = last_aim.pos.distance(action.pos).max(1.0);
        let delta_time = (action.time - last_aim.time).max(1.0);
        let jump_bpm = 30_000.0 / delta_time; // 100ms = 300bpm 1/2

        let radius = action.radius;

        let mut expected_distance_error =
            0.001 * distance * jump_bpm / self.skills.aim.distance_precision.sqrt();
        let mut expected_angle_error = 30.0 / (1.0 + self.skills.aim.angle_precision);

        if action.clickable {
            // time over the object assuming constant cursor speed
            let time_over_object = delta_time * radius / distance;

            expected_distance_error *= 1.0 + 0.1 * unstable_rate / time_over_object;
            expected_angle_error *= 1.0 + 0.001 * unstable_rate / time_over_object;
        }

        prob_err_less_than(expected_distance_error, radius)
            * prob_err_less_than(expected_angle_error, radius / distance)
    }

    /// Combines the distributions into the probability of doing at least
    /// as well as the observed counts.
    pub fn calculate_probability(&mut self, counts: &ScoreCounts) {
        let n100 = counts.n100 as usize;
        let n50 = counts.n50 as usize;
        let n_misses = counts.misses as usize;

        let prob_100s = self.n100_or_worse.sum_up_to(n100 + n50 + n_misses);
        let prob_50s = self.n50_or_worse.sum_up_to(n50 + n_misses);
        let prob_misses = self.misses.sum_up_to(n_misses);

        let prob_slider_ends = self
            .slider_end_misses
            .sum_up_to(counts.slider_end_misses as usize);
        let prob_slider_ticks = self
            .slider_tick_misses
            .sum_up_to(counts.slider_tick_misses as usize);
        let prob_spinners = self.spinner_misses.sum_up_to(counts.spinner_misses as usize);

        self.prob_result = prob_slider_ends
            * prob_slider_ticks
            * prob_spinners
            * (prob_100s + prob_50s + prob_misses - 2.0).max(0.0);
    }
}

/// `P(|error| < x)` for the heavy-tailed error distribution with the
/// given mean absolute error.
pub(crate) fn prob_err_less_than(avg_err: f64, x: f64) -> f64 {
    let c_param = ((B_PARAM - 1.0) * (B_PARAM - 2.0) / 2.0).sqrt();

    1.0 - (1.0 + x / (avg_err * c_param)).powf(-B_PARAM)
}
