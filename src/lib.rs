//! Skill-vector based performance points solver for osu!standard.
//!
//! Instead of rating a map and deriving pp from the rating, this crate
//! asks the inverse question: given a beatmap and the mistakes a player
//! made, what vector of player skills best explains that score? The
//! returned pp value is the norm of that vector.
//!
//! The pipeline has three stages:
//!
//! 1. **Decode** — a resilient parser for the `.osu` text format
//!    ([`Beatmap`]).
//! 2. **Action stream** — the hit objects are flattened under the chosen
//!    [`Modifiers`] into time-ordered clicks, slider ticks/ends and
//!    spinners, with slider curves sampled along the way ([`Action`]).
//! 3. **Solve** — for candidate skill vectors, a [`PPIter`] folds
//!    per-action hit probabilities into miss-count distributions; the
//!    solver searches for the minimum-norm vector whose predicted
//!    probability of the observed outcome reaches the target.
//!
//! # Usage
//!
//! ```
//! use rosu_solve::{Beatmap, Modifiers, PPCalculator, ScoreCounts};
//!
//! let data = "osu file format v14
//!
//! [Difficulty]
//! HPDrainRate:5
//! CircleSize:4
//! OverallDifficulty:8
//! ApproachRate:9
//! SliderMultiplier:1.4
//! SliderTickRate:1
//!
//! [TimingPoints]
//! 0,500,4,2,0,100,1,0
//!
//! [HitObjects]
//! 100,100,1000,1,0,0:0:0:0:
//! ";
//!
//! let map = Beatmap::from_bytes(data.as_bytes()).unwrap();
//!
//! let info = PPCalculator::new(&map)
//!     .mods(Modifiers {
//!         rate: Modifiers::DOUBLE_TIME_RATE,
//!         ..Default::default()
//!     })
//!     .counts(ScoreCounts::default())
//!     .calculate()
//!     .unwrap();
//!
//! assert!(info.pp() > 0.0);
//! ```
//!
//! The core is synchronous and owns no global state; calculations for
//! different inputs may run on as many threads as desired. Callers that
//! want to warm start the solver from earlier results (e.g. a per-map
//! cache) can pass a vector through [`PPCalculator::skills_start`].

#![deny(rustdoc::broken_intra_doc_links)]

mod action;
mod attributes;
mod curve;
mod error;
mod miss_dist;
mod mods;
mod pp;
mod skills;
mod solve;

pub mod parse;

pub use action::{convert_beatmap_to_actions, Action, TimePos, HISTORY_LEN, PLAYFIELD_CENTER};
pub use attributes::{HitWindows, MapAttributes};
pub use error::Error;
pub use miss_dist::MissDistribution;
pub use mods::Modifiers;
pub use parse::{Beatmap, ParseError, ParseResult};
pub use pp::{PPIter, ScoreCounts, StableSliderProbs};
pub use skills::{AimSkills, ReadingSkills, SkillVector, Skills, TapSkills, SKILL_COUNT};
pub use solve::TARGET_PROBABILITY;

use serde::Serialize;

/// Result of a pp calculation: the winning evaluation state plus the
/// effective difficulty values implied by the hit windows.
#[derive(Clone, Debug, Serialize)]
pub struct BeatmapPPInfo {
    pub iter: PPIter,
    pub approach_rate: f64,
    pub overall_difficulty: f64,
    pub overall_difficulty_100s: f64,
    pub overall_difficulty_50s: f64,
}

impl BeatmapPPInfo {
    /// The solved pp value.
    #[inline]
    pub fn pp(&self) -> f64 {
        self.iter.pp
    }

    /// The solved skill vector.
    #[inline]
    pub fn skills(&self) -> Skills {
        self.iter.skills
    }

    /// Probability of the observed outcome under the solved skills.
    #[inline]
    pub fn probability(&self) -> f64 {
        self.iter.prob_result
    }
}

/// Builder for a single pp calculation.
#[derive(Clone, Debug)]
#[must_use]
pub struct PPCalculator<'m> {
    map: &'m Beatmap,
    mods: Modifiers,
    counts: ScoreCounts,
    target_probability: f64,
    skills_start: Option<SkillVector>,
}

impl<'m> PPCalculator<'m> {
    pub fn new(map: &'m Beatmap) -> Self {
        Self {
            map,
            mods: Modifiers::default(),
            counts: ScoreCounts::default(),
            target_probability: TARGET_PROBABILITY,
            skills_start: None,
        }
    }

    pub fn mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;

        self
    }

    /// Sets all judgement counts at once.
    pub fn counts(mut self, counts: ScoreCounts) -> Self {
        self.counts = counts;

        self
    }

    pub fn n100(mut self, n100: u32) -> Self {
        self.counts.n100 = n100;

        self
    }

    pub fn n50(mut self, n50: u32) -> Self {
        self.counts.n50 = n50;

        self
    }

    pub fn misses(mut self, misses: u32) -> Self {
        self.counts.misses = misses;

        self
    }

    pub fn slider_end_misses(mut self, misses: u32) -> Self {
        self.counts.slider_end_misses = misses;

        self
    }

    pub fn slider_tick_misses(mut self, misses: u32) -> Self {
        self.counts.slider_tick_misses = misses;

        self
    }

    pub fn spinner_misses(mut self, misses: u32) -> Self {
        self.counts.spinner_misses = misses;

        self
    }

    /// Overrides the probability the solver aims for (default
    /// [`TARGET_PROBABILITY`]).
    pub fn target_probability(mut self, target: f64) -> Self {
        self.target_probability = target;

        self
    }

    /// Seeds the solver with a previously solved vector, e.g. from a
    /// caller-owned cache of earlier probes on the same map and mods.
    pub fn skills_start(mut self, vector: SkillVector) -> Self {
        self.skills_start = Some(vector);

        self
    }

    /// Runs the solve.
    ///
    /// # Errors
    ///
    /// Anything from [`Error`]: action assembly may reject the map,
    /// and the solver may fail to converge.
    pub fn calculate(self) -> Result<BeatmapPPInfo, Error> {
        let attrs = MapAttributes::new(self.map, &self.mods);
        let actions = convert_beatmap_to_actions(self.map, &attrs)?;
        let counts = self.counts;

        let iter = solve::solve(
            |skills| {
                let mut iter = PPIter::new(skills, attrs);

                for action in &actions {
                    iter.iterate_action(action);
                }

                iter.calculate_probability(&counts);
                iter.pp = skills.pp();

                iter
            },
            self.target_probability,
            self.skills_start,
        )?;

        Ok(BeatmapPPInfo {
            approach_rate: attrs.approach_rate,
            overall_difficulty: attrs.od(),
            overall_difficulty_100s: attrs.od_100(),
            overall_difficulty_50s: attrs.od_50(),
            iter,
        })
    }
}
