use serde::{Deserialize, Serialize};

/// Number of components in a [`SkillVector`].
pub const SKILL_COUNT: usize = 8;

/// Raw skill vector as seen by the solver.
pub type SkillVector = [f64; SKILL_COUNT];

/// Named view over a [`SkillVector`].
///
/// The solver only ever manipulates the raw vector; this view exists so
/// the judgement model can read components by name. The two layouts are
/// tied together by the explicit index tables in [`from_vector`] and
/// [`to_vector`], which must stay bitwise inverse to each other.
///
/// [`from_vector`]: Skills::from_vector
/// [`to_vector`]: Skills::to_vector
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    pub aim: AimSkills,
    pub tap: TapSkills,
    pub reading: ReadingSkills,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AimSkills {
    /// Hitting small targets on fast jumps.
    pub distance_precision: f64,
    /// Keeping the cursor direction exact.
    pub angle_precision: f64,
    /// Spinner control.
    pub spin: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TapSkills {
    /// Timing consistency, the inverse of unstable rate.
    pub accuracy: f64,
    /// Short burst speed.
    pub burst_speed: f64,
    /// Sustained stream speed.
    pub stream_speed: f64,
    /// Keeping sliders held through ticks and ends.
    pub hold_sliders: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingSkills {
    /// Reading slow approach circles.
    pub low_ar: f64,
}

impl Skills {
    pub fn from_vector(vector: SkillVector) -> Self {
        Self {
            aim: AimSkills {
                distance_precision: vector[0],
                angle_precision: vector[1],
                spin: vector[2],
            },
            tap: TapSkills {
                accuracy: vector[3],
                burst_speed: vector[4],
                stream_speed: vector[5],
                hold_sliders: vector[6],
            },
            reading: ReadingSkills { low_ar: vector[7] },
        }
    }

    pub fn to_vector(self) -> SkillVector {
        [
            self.aim.distance_precision,
            self.aim.angle_precision,
            self.aim.spin,
            self.tap.accuracy,
            self.tap.burst_speed,
            self.tap.stream_speed,
            self.tap.hold_sliders,
            self.reading.low_ar,
        ]
    }

    /// The pp value of this vector: its power mean with p = 2.
    pub fn pp(self) -> f64 {
        pow_avg(&self.to_vector(), 2.0)
    }
}

pub(crate) fn pow_avg(nums: &[f64], pow: f64) -> f64 {
    let sum: f64 = nums.iter().map(|num| num.powf(pow)).sum();

    (sum / nums.len() as f64).powf(1.0 / pow)
}
