use serde::Serialize;

/// Sample bank referenced by timing points and hit samples.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub enum SampleSet {
    #[default]
    None = 0,
    Normal = 1,
    Soft = 2,
    Drum = 3,
}

impl SampleSet {
    pub(crate) fn from_id(id: i32) -> Self {
        match id {
            1 => Self::Normal,
            2 => Self::Soft,
            3 => Self::Drum,
            _ => Self::None,
        }
    }
}

/// A control point from the `[TimingPoints]` section.
///
/// Uninherited ("red") points carry [`timing_change`] and define the beat
/// length; inherited ("green") points only override the slider velocity
/// and sample settings of the red point they follow.
///
/// [`timing_change`]: TimingPoint::timing_change
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimingPoint {
    pub time: i32,
    /// Milliseconds per beat; negative values encode a velocity multiplier
    /// on inherited points. May be NaN in the wild.
    pub beat_length: f64,
    pub time_signature: i32,
    pub sample_set: SampleSet,
    pub custom_sample_bank: i32,
    pub sample_volume: i32,
    pub timing_change: bool,
    pub kiai: bool,
    pub omit_first_bar_signature: bool,
    /// `100 / -beat_length` for inherited points, otherwise 1.0.
    pub slider_velocity_multiplier: f64,
    pub scroll_speed: f64,
}
