use std::io::{self, Write};

use super::hit_object::{HitObject, HitObjectKind, HitSample, Slider};
use super::slider_path::PathType;
use super::{Beatmap, EARLY_VERSION_CUTOFF, EARLY_VERSION_TIMING_OFFSET, OSU_FILE_HEADER};

impl Beatmap {
    /// Writes the beatmap back out as `.osu` text.
    ///
    /// The output re-decodes to an identical [`Beatmap`]: times are
    /// un-shifted for format versions older than 5 so the decoder's offset
    /// lands on the stored values again.
    pub fn encode<W: Write>(&self, mut dst: W) -> io::Result<()> {
        let offset = if self.format_version < EARLY_VERSION_CUTOFF {
            EARLY_VERSION_TIMING_OFFSET
        } else {
            0
        };

        writeln!(dst, "{OSU_FILE_HEADER}{}", self.format_version)?;

        let general = &self.general;
        writeln!(dst, "\n[General]")?;
        writeln!(dst, "AudioFilename: {}", general.audio_filename)?;
        writeln!(dst, "AudioLeadIn: {}", general.audio_lead_in)?;

        let preview_time = if general.preview_time != -1 {
            general.preview_time - offset
        } else {
            -1
        };

        writeln!(dst, "PreviewTime: {preview_time}")?;
        writeln!(dst, "SampleSet: {}", general.sample_set)?;
        writeln!(dst, "SampleVolume: {}", general.sample_volume)?;
        writeln!(dst, "StackLeniency: {}", general.stack_leniency)?;
        writeln!(dst, "Mode: {}", general.mode as i32)?;
        writeln!(dst, "LetterboxInBreaks: {}", u8::from(general.letterbox_in_breaks))?;
        writeln!(dst, "SpecialStyle: {}", u8::from(general.special_style))?;
        writeln!(
            dst,
            "WidescreenStoryboard: {}",
            u8::from(general.widescreen_storyboard)
        )?;
        writeln!(dst, "EpilepsyWarning: {}", u8::from(general.epilepsy_warning))?;
        writeln!(
            dst,
            "SamplesMatchPlaybackRate: {}",
            u8::from(general.samples_match_playback_rate)
        )?;
        writeln!(dst, "Countdown: {}", general.countdown)?;
        writeln!(dst, "CountdownOffset: {}", general.countdown_offset)?;

        writeln!(dst, "\n[Editor]")?;

        if !self.bookmarks.is_empty() {
            let bookmarks = self
                .bookmarks
                .iter()
                .map(|bookmark| bookmark.to_string())
                .collect::<Vec<_>>()
                .join(",");

            writeln!(dst, "Bookmarks: {bookmarks}")?;
        }

        writeln!(dst, "DistanceSpacing: {}", self.editor.distance_spacing)?;
        writeln!(dst, "BeatDivisor: {}", self.beat_divisor)?;
        writeln!(dst, "GridSize: {}", self.grid_size)?;
        writeln!(dst, "TimelineZoom: {}", self.timeline_zoom)?;

        let metadata = &self.metadata;
        writeln!(dst, "\n[Metadata]")?;
        writeln!(dst, "Title: {}", metadata.title)?;
        writeln!(dst, "TitleUnicode: {}", metadata.title_unicode)?;
        writeln!(dst, "Artist: {}", metadata.artist)?;
        writeln!(dst, "ArtistUnicode: {}", metadata.artist_unicode)?;
        writeln!(dst, "Creator: {}", metadata.creator)?;
        writeln!(dst, "Version: {}", metadata.version)?;
        writeln!(dst, "Source: {}", metadata.source)?;
        writeln!(dst, "Tags: {}", metadata.tags)?;
        writeln!(dst, "BeatmapID: {}", metadata.beatmap_id)?;
        writeln!(dst, "BeatmapSetID: {}", metadata.beatmap_set_id)?;

        let difficulty = &self.difficulty;
        writeln!(dst, "\n[Difficulty]")?;
        writeln!(dst, "HPDrainRate: {}", difficulty.hp_drain_rate)?;
        writeln!(dst, "CircleSize: {}", difficulty.circle_size)?;
        writeln!(dst, "OverallDifficulty: {}", difficulty.overall_difficulty)?;
        writeln!(dst, "ApproachRate: {}", difficulty.approach_rate)?;
        writeln!(dst, "SliderMultiplier: {}", difficulty.slider_multiplier)?;
        writeln!(dst, "SliderTickRate: {}", difficulty.slider_tick_rate)?;

        writeln!(dst, "\n[Events]")?;

        if !metadata.background_file.is_empty() {
            writeln!(dst, "0,0,\"{}\"", metadata.background_file)?;
        }

        if !metadata.video_file.is_empty() {
            writeln!(dst, "1,0,\"{}\"", metadata.video_file)?;
        }

        for period in &self.breaks {
            writeln!(
                dst,
                "2,{},{}",
                period.start - f64::from(offset),
                period.end - f64::from(offset)
            )?;
        }

        for event in &self.unhandled_events {
            writeln!(dst, "{event}")?;
        }

        writeln!(dst, "\n[TimingPoints]")?;

        for point in &self.timing_points {
            let effects = i32::from(point.kiai) | (i32::from(point.omit_first_bar_signature) << 3);

            writeln!(
                dst,
                "{},{},{},{},{},{},{},{}",
                point.time - offset,
                point.beat_length,
                point.time_signature,
                point.sample_set as i32,
                point.custom_sample_bank,
                point.sample_volume,
                u8::from(point.timing_change),
                effects,
            )?;
        }

        writeln!(dst, "\n[HitObjects]")?;

        for object in &self.hit_objects {
            encode_hit_object(&mut dst, object, offset)?;
        }

        Ok(())
    }
}

fn encode_hit_object<W: Write>(dst: &mut W, object: &HitObject, offset: i32) -> io::Result<()> {
    write!(
        dst,
        "{},{},{},{},{}",
        object.pos.x,
        object.pos.y,
        object.start_time - offset,
        object.type_flags,
        object.sound,
    )?;

    match &object.kind {
        HitObjectKind::Circle => {
            write!(dst, ",")?;
            encode_hit_sample(dst, &object.sample)?;
        }
        HitObjectKind::Spinner { end_time } => {
            write!(dst, ",{},", end_time - offset)?;
            encode_hit_sample(dst, &object.sample)?;
        }
        HitObjectKind::Hold { end_time } => {
            write!(dst, ",{}:", end_time - offset)?;
            encode_hit_sample(dst, &object.sample)?;
        }
        HitObjectKind::Slider(slider) => {
            write!(dst, ",")?;
            encode_slider_params(dst, slider)?;
            write!(dst, ",")?;
            encode_hit_sample(dst, &object.sample)?;
        }
    }

    writeln!(dst)
}

fn encode_slider_params<W: Write>(dst: &mut W, slider: &Slider) -> io::Result<()> {
    let letter = match slider.path.path_type {
        PathType::Bezier => 'B',
        PathType::Linear => 'L',
        PathType::Catmull => 'C',
        PathType::PerfectCurve => 'P',
    };

    write!(dst, "{letter}")?;

    // Flattening the segments regenerates the doubled red-anchor points;
    // the head itself is implied by the object position.
    let mut first = true;

    for segment in &slider.path.segments {
        for point in segment {
            if first {
                first = false;

                continue;
            }

            write!(dst, "|{}:{}", point.x, point.y)?;
        }
    }

    write!(dst, ",{},{}", slider.slides, slider.pixel_len)?;

    write!(dst, ",")?;

    for (i, sound) in slider.edge_sounds.iter().enumerate() {
        if i > 0 {
            write!(dst, "|")?;
        }

        write!(dst, "{sound}")?;
    }

    write!(dst, ",")?;

    for (i, addition) in slider.edge_additions.iter().enumerate() {
        if i > 0 {
            write!(dst, "|")?;
        }

        write!(
            dst,
            "{}:{}",
            addition.normal_set as i32, addition.addition_set as i32
        )?;
    }

    Ok(())
}

fn encode_hit_sample<W: Write>(dst: &mut W, sample: &HitSample) -> io::Result<()> {
    write!(
        dst,
        "{}:{}:{}:{}:{}",
        sample.normal_set as i32,
        sample.addition_set as i32,
        sample.index,
        sample.volume,
        sample.filename,
    )
}
