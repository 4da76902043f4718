use serde::Serialize;

use super::control_point::SampleSet;
use super::pos2::Vec2;
use super::slider_path::SliderPath;

/// A single hit object with its shared base fields and the
/// variant-specific payload in [`kind`].
///
/// [`kind`]: HitObject::kind
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HitObject {
    pub pos: Vec2,
    pub start_time: i32,
    /// Raw type bitfield as stored in the file.
    pub type_flags: i32,
    /// Hitsound bitfield (normal/whistle/finish/clap).
    pub sound: u8,
    pub sample: HitSample,
    pub kind: HitObjectKind,
}

impl HitObject {
    // const CIRCLE_FLAG: i32 = 1 << 0; (circle is the dispatch fallback)
    pub(crate) const SLIDER_FLAG: i32 = 1 << 1;
    pub(crate) const NEW_COMBO_FLAG: i32 = 1 << 2;
    pub(crate) const SPINNER_FLAG: i32 = 1 << 3;
    pub(crate) const HOLD_FLAG: i32 = 1 << 7;

    #[inline]
    pub fn new_combo(&self) -> bool {
        self.type_flags & Self::NEW_COMBO_FLAG > 0
    }

    /// The end time of spinners and holds; the start time otherwise.
    #[inline]
    pub fn end_time(&self) -> i32 {
        match self.kind {
            HitObjectKind::Spinner { end_time } | HitObjectKind::Hold { end_time } => end_time,
            HitObjectKind::Circle | HitObjectKind::Slider(_) => self.start_time,
        }
    }
}

/// Tagged variant payload of a [`HitObject`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum HitObjectKind {
    Circle,
    Slider(Slider),
    Spinner { end_time: i32 },
    /// Mania hold note; never consumed by the osu!standard core.
    Hold { end_time: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Slider {
    pub path: SliderPath,
    /// Number of traversals of the path, at least 1.
    pub slides: i32,
    /// Visual length in osu! pixels.
    pub pixel_len: f64,
    /// Hitsound bits per edge (head, repeats, tail).
    pub edge_sounds: Vec<u8>,
    pub edge_additions: Vec<EdgeAddition>,
}

/// `normalSet:additionSet` pair attached to a slider edge.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EdgeAddition {
    pub normal_set: SampleSet,
    pub addition_set: SampleSet,
}

/// Trailing `normalSet:additionSet:index:volume:filename` sample column.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HitSample {
    pub normal_set: SampleSet,
    pub addition_set: SampleSet,
    pub index: i32,
    pub volume: i32,
    pub filename: String,
}
