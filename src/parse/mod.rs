//! Decoder for the `.osu` beatmap format.
//!
//! The format is line oriented: a header line, then `[Section]` blocks of
//! either `key : value` pairs or CSV records. Decoding is tolerant the way
//! the game is tolerant: unknown sections and keys are skipped, malformed
//! numbers fall back to defaults, and only a broken header or stream
//! failure aborts.

mod beatmap;
mod control_point;
mod encode;
mod error;
mod hit_object;
mod pos2;
mod slider_path;

pub use beatmap::{
    Beatmap, BreakPeriod, Difficulty, Editor, GameMode, General, Metadata, MAX_MANIA_KEY_COUNT,
};
pub use control_point::{SampleSet, TimingPoint};
pub use error::{ParseError, ParseResult};
pub use hit_object::{EdgeAddition, HitObject, HitObjectKind, HitSample, Slider};
pub use pos2::{Pos2, Vec2};
pub use slider_path::{PathType, SliderPath};

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub(crate) const OSU_FILE_HEADER: &str = "osu file format v";

/// Time values of maps older than this version are shifted by
/// [`EARLY_VERSION_TIMING_OFFSET`].
const EARLY_VERSION_CUTOFF: i32 = 5;
const EARLY_VERSION_TIMING_OFFSET: i32 = 24;

/// The trailing hit sample column is kept whole even when it contains
/// colons, so hit object lines are split into at most this many fields.
const HIT_OBJECT_COLUMNS: usize = 11;

#[derive(Copy, Clone, Debug)]
enum Section {
    None,
    General,
    Editor,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    HitObjects,
}

impl Section {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "general" => Self::General,
            "editor" => Self::Editor,
            "metadata" => Self::Metadata,
            "difficulty" => Self::Difficulty,
            "events" => Self::Events,
            "timingpoints" => Self::TimingPoints,
            "hitobjects" => Self::HitObjects,
            _ => Self::None,
        }
    }
}

impl Beatmap {
    /// Decodes the `.osu` file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::parse(File::open(path)?)
    }

    /// Decodes a `.osu` file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> ParseResult<Self> {
        Self::parse(bytes)
    }

    /// Decodes a `.osu` file from any reader.
    pub fn parse<R: Read>(src: R) -> ParseResult<Self> {
        let mut reader = BufReader::new(src);
        let mut buf = String::new();

        let format_version = loop {
            buf.clear();

            if reader.read_line(&mut buf)? == 0 {
                return Err(ParseError::InvalidHeader);
            }

            // Some old maps start with U+FEFF
            let line = buf.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

            if line.is_empty() {
                continue;
            }

            if !line.to_ascii_lowercase().starts_with(OSU_FILE_HEADER) {
                return Err(ParseError::InvalidHeader);
            }

            match line[OSU_FILE_HEADER.len()..].trim().parse::<i32>() {
                Ok(version) => break version,
                Err(_) => return Err(ParseError::InvalidHeader),
            }
        };

        let offset = if format_version < EARLY_VERSION_CUTOFF {
            EARLY_VERSION_TIMING_OFFSET
        } else {
            0
        };

        let mut map = Beatmap {
            format_version,
            ..Beatmap::default()
        };

        let mut section = Section::None;
        let mut seen_approach_rate = false;

        loop {
            buf.clear();

            if reader.read_line(&mut buf)? == 0 {
                break;
            }

            let line = buf.trim();

            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = Section::from_name(&line[1..line.len() - 1]);

                continue;
            }

            match section {
                Section::General => map.parse_general_line(line, offset),
                Section::Editor => map.parse_editor_line(line),
                Section::Metadata => map.parse_metadata_line(line),
                Section::Difficulty => map.parse_difficulty_line(line, &mut seen_approach_rate),
                Section::Events => map.parse_event_line(line, offset),
                Section::TimingPoints => map.parse_timing_point_line(line, offset),
                Section::HitObjects => map.parse_hit_object_line(line, offset),
                Section::None => {}
            }
        }

        map.restore_order();
        map.difficulty.apply_restrictions(map.general.mode);

        Ok(map)
    }

    fn parse_general_line(&mut self, line: &str, offset: i32) {
        let (key, value) = split_key_value(line);
        let general = &mut self.general;

        match key.to_ascii_lowercase().as_str() {
            "audiofilename" => general.audio_filename = standardise_path(value),
            "audioleadin" => general.audio_lead_in = parse_int_or(value, 0),
            "previewtime" => {
                let mut time = parse_int_or(value, -1);

                if time != -1 {
                    time += offset;
                }

                general.preview_time = time;
            }
            "sampleset" => general.sample_set = value.to_ascii_lowercase(),
            "samplevolume" => general.sample_volume = parse_int_or(value, 100),
            "stackleniency" => general.stack_leniency = parse_float_or(value, 0.0),
            "mode" => general.mode = GameMode::from_id(parse_int_or(value, 0)),
            "letterboxinbreaks" => general.letterbox_in_breaks = parse_bool_flag(value),
            "specialstyle" => general.special_style = parse_bool_flag(value),
            "widescreenstoryboard" => general.widescreen_storyboard = parse_bool_flag(value),
            "epilepsywarning" => general.epilepsy_warning = parse_bool_flag(value),
            "samplesmatchplaybackrate" => {
                general.samples_match_playback_rate = parse_bool_flag(value);
            }
            "countdown" => general.countdown = parse_int_or(value, 0),
            "countdownoffset" => general.countdown_offset = parse_int_or(value, 0),
            _ => {}
        }
    }

    fn parse_editor_line(&mut self, line: &str) {
        let (key, value) = split_key_value(line);

        match key.to_ascii_lowercase().as_str() {
            "bookmarks" => {
                for token in value.split(',') {
                    let token = token.trim();

                    if !token.is_empty() {
                        self.bookmarks.push(parse_int_or(token, 0));
                    }
                }
            }
            "distancespacing" => self.editor.distance_spacing = parse_float_or(value, 0.0),
            "beatdivisor" => self.beat_divisor = parse_int_or(value, 4).clamp(1, 16),
            "gridsize" => self.grid_size = parse_int_or(value, 4),
            "timelinezoom" => self.timeline_zoom = parse_float_or(value, 0.0).max(0.0),
            _ => {}
        }
    }

    fn parse_metadata_line(&mut self, line: &str) {
        let (key, value) = split_key_value(line);
        let metadata = &mut self.metadata;

        match key.to_ascii_lowercase().as_str() {
            "title" => metadata.title = value.to_owned(),
            "titleunicode" => metadata.title_unicode = value.to_owned(),
            "artist" => metadata.artist = value.to_owned(),
            "artistunicode" => metadata.artist_unicode = value.to_owned(),
            "creator" => metadata.creator = value.to_owned(),
            "version" => metadata.version = value.to_owned(),
            "source" => metadata.source = value.to_owned(),
            "tags" => metadata.tags = value.to_owned(),
            "beatmapid" => metadata.beatmap_id = parse_int_or(value, 0),
            "beatmapsetid" => metadata.beatmap_set_id = parse_int_or(value, 0),
            _ => {}
        }
    }

    fn parse_difficulty_line(&mut self, line: &str, seen_approach_rate: &mut bool) {
        let (key, value) = split_key_value(line);
        let difficulty = &mut self.difficulty;

        match key.to_ascii_lowercase().as_str() {
            "hpdrainrate" => difficulty.hp_drain_rate = parse_float_or(value, 0.0),
            "circlesize" => difficulty.circle_size = parse_float_or(value, 0.0),
            "overalldifficulty" => {
                difficulty.overall_difficulty = parse_float_or(value, 0.0);

                if !*seen_approach_rate {
                    difficulty.approach_rate = difficulty.overall_difficulty;
                }
            }
            "approachrate" => {
                difficulty.approach_rate = parse_float_or(value, 0.0);
                *seen_approach_rate = true;
            }
            "slidermultiplier" => difficulty.slider_multiplier = parse_float_or(value, 1.0),
            "slidertickrate" => difficulty.slider_tick_rate = parse_float_or(value, 1.0),
            _ => {}
        }
    }

    fn parse_event_line(&mut self, line: &str, offset: i32) {
        let parts = split_csv(line);

        let Some(event_type) = parts.first() else {
            return;
        };

        match event_type.to_ascii_lowercase().as_str() {
            "0" | "background" => {
                if parts.len() >= 3 {
                    self.metadata.background_file = standardise_path(&parts[2]);
                } else {
                    self.unhandled_events.push(line.to_owned());
                }
            }
            "1" | "video" => {
                if parts.len() >= 3 {
                    let filename = standardise_path(&parts[2]);

                    if has_video_extension(&filename) {
                        self.metadata.video_file = filename;
                    } else {
                        self.metadata.background_file = filename;
                    }
                } else {
                    self.unhandled_events.push(line.to_owned());
                }
            }
            "2" | "break" => {
                if parts.len() >= 3 {
                    let start = parse_float_or(&parts[1], 0.0) + f64::from(offset);
                    let mut end = parse_float_or(&parts[2], start) + f64::from(offset);

                    if end < start {
                        end = start;
                    }

                    self.breaks.push(BreakPeriod { start, end });
                } else {
                    self.unhandled_events.push(line.to_owned());
                }
            }
            _ => self.unhandled_events.push(line.to_owned()),
        }
    }

    fn parse_timing_point_line(&mut self, line: &str, offset: i32) {
        let parts = split_csv(line);

        if parts.len() < 2 {
            tracing::warn!(line, "dropping timing point with too few fields");

            return;
        }

        let time = parse_int_or(&parts[0], 0) + offset;
        let beat_length = parse_float_allow_nan(&parts[1]);

        let mut time_signature = 4;

        if parts.len() >= 3 {
            time_signature = parse_int_or(&parts[2], 4);

            if time_signature == 0 {
                time_signature = 4;
            }
        }

        let mut sample_set = SampleSet::Normal;

        if parts.len() >= 4 {
            sample_set = SampleSet::from_id(parse_int_or(&parts[3], 0));

            if sample_set == SampleSet::None {
                sample_set = SampleSet::Normal;
            }
        }

        let custom_sample_bank = if parts.len() >= 5 {
            parse_int_or(&parts[4], 0)
        } else {
            0
        };

        let sample_volume = if parts.len() >= 6 {
            parse_int_or(&parts[5], 100)
        } else {
            100
        };

        let timing_change = if parts.len() >= 7 {
            parts[6].trim() == "1"
        } else {
            true
        };

        let mut kiai = false;
        let mut omit_first_bar_signature = false;

        if parts.len() >= 8 {
            let effects = parse_int_or(&parts[7], 0);
            kiai = effects & 1 != 0;
            omit_first_bar_signature = effects & 8 != 0;
        }

        let velocity = if !beat_length.is_nan() && beat_length < 0.0 {
            100.0 / -beat_length
        } else {
            1.0
        };

        self.timing_points.push(TimingPoint {
            time,
            beat_length,
            time_signature,
            sample_set,
            custom_sample_bank,
            sample_volume,
            timing_change,
            kiai,
            omit_first_bar_signature,
            slider_velocity_multiplier: velocity,
            scroll_speed: velocity,
        });
    }

    fn parse_hit_object_line(&mut self, line: &str, offset: i32) {
        let parts = split_csv_preserve_tail(line, HIT_OBJECT_COLUMNS);

        if parts.len() < 5 {
            tracing::warn!(line, "dropping hit object with too few fields");

            return;
        }

        let pos = Vec2 {
            x: parse_int_or(&parts[0], 0),
            y: parse_int_or(&parts[1], 0),
        };

        let start_time = parse_int_or(&parts[2], 0) + offset;
        let type_flags = parse_int_or(&parts[3], 0);
        let sound = parse_int_or(&parts[4], 0) as u8;

        let mut sample = HitSample::default();

        let kind = if type_flags & HitObject::HOLD_FLAG != 0 {
            let mut end_time = 0;

            if parts.len() >= 6 {
                let (end, parsed_sample) = parse_end_time_and_sample(&parts[5]);
                end_time = end + offset;
                sample = parsed_sample;
            }

            HitObjectKind::Hold { end_time }
        } else if type_flags & HitObject::SPINNER_FLAG != 0 {
            let mut end_time = 0;

            if parts.len() >= 6 && !parts[5].trim().is_empty() {
                end_time = parse_int_or(&parts[5], 0) + offset;
            }

            if parts.len() >= 7 {
                sample = parse_hit_sample(&parts[6]);
            }

            HitObjectKind::Spinner { end_time }
        } else if type_flags & HitObject::SLIDER_FLAG != 0 {
            let path_spec = parts.get(5).map(String::as_str).unwrap_or_default();

            let slides = match parts.get(6) {
                Some(field) if !field.trim().is_empty() => parse_int_or(field, 1),
                _ => 1,
            };

            let pixel_len = match parts.get(7) {
                Some(field) if !field.trim().is_empty() => parse_float_or(field, 0.0),
                _ => 0.0,
            };

            let mut edge_sounds = Vec::new();

            if let Some(field) = parts.get(8).filter(|field| !field.trim().is_empty()) {
                for token in field.split('|') {
                    edge_sounds.push(parse_int_or(token, 0) as u8);
                }
            }

            let mut edge_additions = Vec::new();

            if let Some(field) = parts.get(9).filter(|field| !field.trim().is_empty()) {
                for token in field.split('|') {
                    edge_additions.push(parse_edge_addition(token));
                }
            }

            if parts.len() >= 11 {
                sample = parse_hit_sample(&parts[10]);
            }

            HitObjectKind::Slider(Slider {
                path: SliderPath::parse(pos, path_spec),
                slides,
                pixel_len,
                edge_sounds,
                edge_additions,
            })
        } else {
            if parts.len() >= 6 {
                sample = parse_hit_sample(&parts[5]);
            }

            HitObjectKind::Circle
        };

        self.hit_objects.push(HitObject {
            pos,
            start_time,
            type_flags,
            sound,
            sample,
            kind,
        });
    }

    /// Stable-sorts timing points and hit objects by time when the file
    /// stored them out of order.
    fn restore_order(&mut self) {
        let unsorted = self
            .timing_points
            .windows(2)
            .any(|pair| pair[1].time < pair[0].time);

        if unsorted {
            self.timing_points.sort_by_key(|point| point.time);
        }

        let unsorted = self
            .hit_objects
            .windows(2)
            .any(|pair| pair[1].start_time < pair[0].start_time);

        if unsorted {
            self.hit_objects.sort_by_key(|object| object.start_time);
        }
    }
}

fn split_key_value(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    }
}

fn parse_int_or(s: &str, default: i32) -> i32 {
    let s = s.trim();

    if s.is_empty() {
        return default;
    }

    s.parse().unwrap_or(default)
}

fn parse_float_or(s: &str, default: f64) -> f64 {
    let s = s.trim();

    if s.is_empty() {
        return default;
    }

    s.parse().unwrap_or(default)
}

fn parse_float_allow_nan(s: &str) -> f64 {
    let s = s.trim();

    if s.eq_ignore_ascii_case("nan") {
        return f64::NAN;
    }

    s.parse().unwrap_or(f64::NAN)
}

fn parse_bool_flag(s: &str) -> bool {
    s.trim() == "1"
}

fn standardise_path(path: &str) -> String {
    path.trim_matches('"').replace('\\', "/")
}

fn has_video_extension(filename: &str) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };

    matches!(
        ext.to_ascii_lowercase().as_str(),
        "avi" | "flv" | "mp4" | "mkv" | "mov" | "wmv" | "mpg" | "mpeg" | "ogv" | "webm"
    )
}

/// Quote-aware CSV split; quote characters toggle comma handling and are
/// not part of the output tokens.
fn split_csv(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                out.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    out.push(current.trim().to_owned());

    out
}

/// Like [`split_csv`] but any fields beyond `n` are merged back into the
/// `n`-th one, keeping trailing free-form columns intact.
fn split_csv_preserve_tail(line: &str, n: usize) -> Vec<String> {
    let mut parts = split_csv(line);

    if parts.len() <= n {
        return parts;
    }

    let tail = parts.split_off(n - 1).join(",");
    parts.push(tail);

    parts
}

fn parse_hit_sample(s: &str) -> HitSample {
    let mut parts = s.split(':');
    let mut next = || parts.next().unwrap_or_default();

    HitSample {
        normal_set: SampleSet::from_id(parse_int_or(next(), 0)),
        addition_set: SampleSet::from_id(parse_int_or(next(), 0)),
        index: parse_int_or(next(), 0),
        volume: parse_int_or(next(), 0),
        filename: next().trim().trim_matches('"').to_owned(),
    }
}

fn parse_edge_addition(s: &str) -> EdgeAddition {
    let mut parts = s.split(':');

    EdgeAddition {
        normal_set: SampleSet::from_id(parse_int_or(parts.next().unwrap_or_default(), 0)),
        addition_set: SampleSet::from_id(parse_int_or(parts.next().unwrap_or_default(), 0)),
    }
}

fn parse_end_time_and_sample(s: &str) -> (i32, HitSample) {
    match s.split_once(':') {
        Some((end_time, sample)) => (parse_int_or(end_time, 0), parse_hit_sample(sample)),
        None => (parse_int_or(s, 0), HitSample::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_respects_quotes() {
        assert_eq!(
            split_csv(r#"0,0,"bg,with,commas.png",extra"#),
            vec!["0", "0", "bg,with,commas.png", "extra"],
        );
    }

    #[test]
    fn csv_tail_grouping() {
        let parts = split_csv_preserve_tail("a,b,c,d,e", 3);

        assert_eq!(parts, vec!["a", "b", "c,d,e"]);
    }

    #[test]
    fn key_value_splits_on_first_colon() {
        assert_eq!(split_key_value("Title: a:b"), ("Title", "a:b"));
        assert_eq!(split_key_value("NoValue"), ("NoValue", ""));
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(parse_int_or("12", 0), 12);
        assert_eq!(parse_int_or("junk", 7), 7);
        assert_eq!(parse_float_or("", 1.0), 1.0);
        assert!(parse_float_allow_nan("NaN").is_nan());
        assert!(parse_float_allow_nan("junk").is_nan());
    }
}
