//! Skill-space search: find the smallest-norm skill vector whose
//! predicted probability of the observed outcome reaches the target.
//!
//! Two stages, as in the reference: a bracketing scale solve along the
//! ray through the current vector, then coordinate descent where every
//! probe is scale-solved back onto the probability constraint before
//! comparing pp values.

use crate::error::Error;
use crate::pp::PPIter;
use crate::skills::{SkillVector, Skills, SKILL_COUNT};

/// Default probability of the observed outcome to solve for.
pub const TARGET_PROBABILITY: f64 = 0.1;

const MAX_SCALE_ITERATIONS: usize = 100;
const PROBABILITY_TOLERANCE: f64 = 1e-5;

const MIN_SKILL: f64 = 1.0;
const MAX_SKILL: f64 = 1e30;

/// Starting vector when no warm start is provided.
const SCALE_START: f64 = 300.0;

/// A descent iteration counts as improving only past this margin.
const IMPROVEMENT_EPSILON: f64 = 1e-3;
const MIN_DELTA: f64 = 0.01;

struct Sample {
    vector: SkillVector,
    iter: PPIter,
}

fn probe<F>(eval: &mut F, vector: SkillVector) -> Sample
where
    F: FnMut(Skills) -> PPIter,
{
    Sample {
        vector,
        iter: eval(Skills::from_vector(vector)),
    }
}

fn scale_vector(mut vector: SkillVector, factor: f64) -> SkillVector {
    for component in &mut vector {
        *component = (*component * factor).clamp(MIN_SKILL, MAX_SKILL);
    }

    vector
}

fn clamp_vector(mut vector: SkillVector) -> SkillVector {
    for component in &mut vector {
        *component = component.clamp(MIN_SKILL, MAX_SKILL);
    }

    vector
}

/// Scales `sample`'s vector up or down until the probability brackets the
/// target, then bisects onto it. Returns the feasible (over) side.
///
/// # Errors
///
/// [`Error::DidNotConverge`] when the iteration budget runs out without
/// ever reaching the target probability.
fn scale_sample<F>(sample: Sample, eval: &mut F, target: f64) -> Result<Sample, Error>
where
    F: FnMut(Skills) -> PPIter,
{
    let mut under: Option<Sample> = None;
    let mut over: Option<Sample> = None;

    if sample.iter.prob_result < target {
        under = Some(sample);
    } else {
        over = Some(sample);
    }

    for _ in 0..MAX_SCALE_ITERATIONS {
        if let Some(sample) = &over {
            if sample.iter.prob_result - target < PROBABILITY_TOLERANCE {
                break;
            }
        }

        let next_vector = match (&under, &over) {
            (Some(under), None) => scale_vector(under.vector, 100.0),
            (None, Some(over)) => scale_vector(over.vector, 0.01),
            (Some(under), Some(over)) => {
                let mut mid = [0.0; SKILL_COUNT];

                for i in 0..SKILL_COUNT {
                    mid[i] = (under.vector[i] + over.vector[i]) / 2.0;
                }

                mid
            }
            (None, None) => unreachable!("the initial sample is always classified"),
        };

        let next = probe(eval, next_vector);

        if next.iter.prob_result < target {
            under = Some(next);
        } else {
            over = Some(next);
        }
    }

    over.ok_or(Error::DidNotConverge)
}

/// Runs the full solve and returns the winning evaluation state.
pub(crate) fn solve<F>(
    mut eval: F,
    target: f64,
    warm_start: Option<SkillVector>,
) -> Result<PPIter, Error>
where
    F: FnMut(Skills) -> PPIter,
{
    let start_vector = match warm_start {
        Some(vector) => clamp_vector(vector),
        None => [SCALE_START; SKILL_COUNT],
    };

    let mut best = scale_sample(probe(&mut eval, start_vector), &mut eval, target)?;

    let mut max_delta = 1.0f64;

    for &component in &best.vector {
        max_delta = max_delta.max(component * 2.0);
    }

    let mut delta = max_delta;

    while delta >= MIN_DELTA {
        for sign in [-1.0, 1.0] {
            let mut improved = true;

            while improved {
                improved = false;
                let round_start_pp = best.iter.pp;

                for i in 0..SKILL_COUNT {
                    let mut vector = best.vector;
                    vector[i] = (vector[i] + delta * sign).max(MIN_SKILL);

                    let candidate = scale_sample(probe(&mut eval, vector), &mut eval, target)?;

                    if candidate.iter.pp < best.iter.pp {
                        if candidate.iter.pp < round_start_pp - IMPROVEMENT_EPSILON {
                            improved = true;
                        }

                        best = candidate;
                    }
                }
            }
        }

        tracing::trace!(delta, pp = best.iter.pp, "descent level finished");

        delta /= 2.0;
    }

    tracing::debug!(
        pp = best.iter.pp,
        prob = best.iter.prob_result,
        "skill solve finished"
    );

    Ok(best.iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::convert_beatmap_to_actions;
    use crate::attributes::MapAttributes;
    use crate::mods::Modifiers;
    use crate::parse::Beatmap;
    use crate::pp::ScoreCounts;

    const ONE_CIRCLE_MAP: &str = "osu file format v14

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,100,1,0

[HitObjects]
100,100,1000,1,0,0:0:0:0:
";

    fn eval_fn(
        map: &Beatmap,
        mods: Modifiers,
        counts: ScoreCounts,
    ) -> impl FnMut(Skills) -> PPIter + '_ {
        let attrs = MapAttributes::new(map, &mods);
        let actions = convert_beatmap_to_actions(map, &attrs).unwrap();

        move |skills| {
            let mut iter = PPIter::new(skills, attrs);

            for action in &actions {
                iter.iterate_action(action);
            }

            iter.calculate_probability(&counts);
            iter.pp = skills.pp();

            iter
        }
    }

    #[test]
    fn scale_solve_brackets_from_all_ones() {
        let map = Beatmap::from_bytes(ONE_CIRCLE_MAP.as_bytes()).unwrap();

        let mut evaluations = 0usize;
        let mut inner = eval_fn(&map, Modifiers::default(), ScoreCounts::default());
        let mut eval = |skills: Skills| {
            evaluations += 1;

            inner(skills)
        };

        let start = probe(&mut eval, [1.0; SKILL_COUNT]);
        let solved = scale_sample(start, &mut eval, TARGET_PROBABILITY).unwrap();

        assert!(evaluations < 100, "took {evaluations} evaluations");
        assert!(solved.iter.prob_result >= TARGET_PROBABILITY);
        assert!(solved.iter.prob_result - TARGET_PROBABILITY < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn solve_returns_feasible_minimum() {
        let map = Beatmap::from_bytes(ONE_CIRCLE_MAP.as_bytes()).unwrap();

        let iter = solve(
            eval_fn(&map, Modifiers::default(), ScoreCounts::default()),
            TARGET_PROBABILITY,
            None,
        )
        .unwrap();

        assert!(iter.prob_result >= TARGET_PROBABILITY - PROBABILITY_TOLERANCE);
        assert!(iter.pp.is_finite());
        assert!(iter.pp >= 1.0);
    }

    #[test]
    fn warm_start_matches_cold_start() {
        let map = Beatmap::from_bytes(ONE_CIRCLE_MAP.as_bytes()).unwrap();

        let cold = solve(
            eval_fn(&map, Modifiers::default(), ScoreCounts::default()),
            TARGET_PROBABILITY,
            None,
        )
        .unwrap();

        let warm = solve(
            eval_fn(&map, Modifiers::default(), ScoreCounts::default()),
            TARGET_PROBABILITY,
            Some(cold.skills.to_vector()),
        )
        .unwrap();

        // warm starting near the optimum must not make the result worse
        assert!(warm.pp <= cold.pp * 1.05);
    }

    #[test]
    fn lower_target_does_not_cost_more_pp() {
        let map = Beatmap::from_bytes(ONE_CIRCLE_MAP.as_bytes()).unwrap();

        let strict = solve(
            eval_fn(&map, Modifiers::default(), ScoreCounts::default()),
            0.1,
            None,
        )
        .unwrap();

        let lenient = solve(
            eval_fn(&map, Modifiers::default(), ScoreCounts::default()),
            0.05,
            None,
        )
        .unwrap();

        assert!(lenient.pp <= strict.pp + 1e-6);
    }
}
