use serde::Serialize;

use super::control_point::TimingPoint;
use super::hit_object::HitObject;

/// Highest key count a mania map may request through its circle size.
pub const MAX_MANIA_KEY_COUNT: f64 = 18.0;

/// The mode of a beatmap.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub enum GameMode {
    #[default]
    Osu = 0,
    Taiko = 1,
    Catch = 2,
    Mania = 3,
}

impl GameMode {
    pub(crate) fn from_id(id: i32) -> Self {
        match id {
            1 => Self::Taiko,
            2 => Self::Catch,
            3 => Self::Mania,
            _ => Self::Osu,
        }
    }
}

/// The main beatmap struct containing all data relevant
/// for action building and pp calculation.
///
/// Immutable after decoding; produced by [`Beatmap::parse`],
/// [`Beatmap::from_path`], or [`Beatmap::from_bytes`].
///
/// [`Beatmap::parse`]: Beatmap::parse
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Beatmap {
    pub format_version: i32,

    pub general: General,
    pub editor: Editor,
    pub metadata: Metadata,
    pub difficulty: Difficulty,

    pub breaks: Vec<BreakPeriod>,
    pub timing_points: Vec<TimingPoint>,
    pub hit_objects: Vec<HitObject>,
    pub unhandled_events: Vec<String>,

    pub bookmarks: Vec<i32>,
    pub beat_divisor: i32,
    pub grid_size: i32,
    pub timeline_zoom: f64,
}

impl Default for Beatmap {
    fn default() -> Self {
        Self {
            format_version: 0,
            general: General::default(),
            editor: Editor::default(),
            metadata: Metadata::default(),
            difficulty: Difficulty::default(),
            breaks: Vec::new(),
            timing_points: Vec::new(),
            hit_objects: Vec::new(),
            unhandled_events: Vec::new(),
            bookmarks: Vec::new(),
            beat_divisor: 4,
            grid_size: 4,
            timeline_zoom: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct General {
    /// Audio path with quotes stripped and backslashes standardised to `/`.
    pub audio_filename: String,
    pub audio_lead_in: i32,
    /// `-1` when the map does not define a preview point.
    pub preview_time: i32,
    pub sample_set: String,
    pub sample_volume: i32,
    pub stack_leniency: f64,
    pub mode: GameMode,
    pub letterbox_in_breaks: bool,
    pub special_style: bool,
    pub widescreen_storyboard: bool,
    pub epilepsy_warning: bool,
    pub samples_match_playback_rate: bool,
    pub countdown: i32,
    pub countdown_offset: i32,
}

impl Default for General {
    fn default() -> Self {
        Self {
            audio_filename: String::new(),
            audio_lead_in: 0,
            preview_time: 0,
            sample_set: String::from("normal"),
            sample_volume: 100,
            stack_leniency: 0.0,
            mode: GameMode::Osu,
            letterbox_in_breaks: false,
            special_style: false,
            widescreen_storyboard: false,
            epilepsy_warning: false,
            samples_match_playback_rate: false,
            countdown: 0,
            countdown_offset: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Editor {
    pub distance_spacing: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub title_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub beatmap_id: i32,
    pub beatmap_set_id: i32,
    pub background_file: String,
    pub video_file: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Difficulty {
    pub hp_drain_rate: f64,
    pub circle_size: f64,
    pub overall_difficulty: f64,
    pub approach_rate: f64,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Difficulty {
    /// Clamps every field to the range the game itself enforces.
    ///
    /// Mania re-purposes circle size as its key count, hence the
    /// different allowed range there.
    pub(crate) fn apply_restrictions(&mut self, mode: GameMode) {
        self.hp_drain_rate = self.hp_drain_rate.clamp(0.0, 10.0);
        self.overall_difficulty = self.overall_difficulty.clamp(0.0, 10.0);
        self.approach_rate = self.approach_rate.clamp(0.0, 10.0);

        self.circle_size = if mode == GameMode::Mania {
            self.circle_size.clamp(1.0, MAX_MANIA_KEY_COUNT)
        } else {
            self.circle_size.clamp(0.0, 10.0)
        };

        self.slider_multiplier = self.slider_multiplier.clamp(0.4, 3.6);
        self.slider_tick_rate = self.slider_tick_rate.clamp(0.5, 8.0);
    }
}

/// A gameplay pause defined in the `[Events]` section.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BreakPeriod {
    pub start: f64,
    pub end: f64,
}
