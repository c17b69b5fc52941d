use serde::Serialize;
use std::sync::Arc;

/// One validated tempo change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoSegment {
    pub start_beat: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BeatTimePoint {
    beat: f64,
    time_sec: f64,
    bpm: f64,
}

/// Beat <-> seconds mapping for the whole chart.
///
/// The chart offset is folded into the precomputed point times; the user
/// calibration offset is applied on every query, so it can change without
/// rebuilding the map.
#[derive(Debug, Clone, Default)]
pub struct TimingData {
    /// A pre-calculated mapping from a tempo change to its precise time in seconds.
    beat_to_time: Arc<Vec<BeatTimePoint>>,
    global_offset_sec: f64,
    max_bpm: f64,
}

impl TimingData {
    /// `segments` must already be validated: non-empty, first at beat 0,
    /// strictly increasing beats, finite positive bpm.
    pub fn from_segments(chart_offset_sec: f64, global_offset_sec: f64, segments: &[TempoSegment]) -> Self {
        let mut beat_to_time = Vec::with_capacity(segments.len());
        let mut current_time = 0.0;
        let mut last_beat = 0.0;
        let mut last_bpm = segments.first().map_or(120.0, |s| s.bpm);
        let mut max_bpm: f64 = 0.0;

        for seg in segments {
            if seg.start_beat > last_beat {
                current_time += (seg.start_beat - last_beat) * (60.0 / last_bpm);
            }
            beat_to_time.push(BeatTimePoint {
                beat: seg.start_beat,
                time_sec: chart_offset_sec + current_time,
                bpm: seg.bpm,
            });
            max_bpm = max_bpm.max(seg.bpm);
            last_beat = seg.start_beat;
            last_bpm = seg.bpm;
        }

        Self {
            beat_to_time: Arc::new(beat_to_time),
            global_offset_sec,
            max_bpm,
        }
    }

    pub fn with_global_offset(&self, global_offset_sec: f64) -> Self {
        Self {
            beat_to_time: Arc::clone(&self.beat_to_time),
            global_offset_sec,
            max_bpm: self.max_bpm,
        }
    }

    pub fn global_offset_seconds(&self) -> f64 {
        self.global_offset_sec
    }

    /// Beat reached at audio time `target_time_sec`.
    ///
    /// Times before the first tempo point extrapolate with its bpm, so
    /// negative (pre-roll) times give negative beats.
    pub fn beat_at(&self, target_time_sec: f64) -> f64 {
        let points = &self.beat_to_time;
        if points.is_empty() {
            return 0.0;
        }
        let time = target_time_sec + self.global_offset_sec;
        let idx = points.partition_point(|p| p.time_sec <= time).saturating_sub(1);
        let point = &points[idx];
        point.beat + (time - point.time_sec) * (point.bpm / 60.0)
    }

    /// Audio time at which `target_beat` is reached. Inverse of [`beat_at`](Self::beat_at).
    pub fn time_at(&self, target_beat: f64) -> f64 {
        let points = &self.beat_to_time;
        if points.is_empty() {
            return 0.0;
        }
        let point = &points[self.point_index_for_beat(target_beat)];
        point.time_sec + (target_beat - point.beat) * (60.0 / point.bpm) - self.global_offset_sec
    }

    pub fn bpm_at(&self, target_beat: f64) -> f64 {
        let points = &self.beat_to_time;
        if points.is_empty() {
            return 120.0;
        } // Fallback BPM
        points[self.point_index_for_beat(target_beat)].bpm
    }

    pub fn max_bpm(&self) -> f64 {
        if self.max_bpm > 0.0 { self.max_bpm } else { 120.0 }
    }

    #[inline(always)]
    fn point_index_for_beat(&self, target_beat: f64) -> usize {
        // Last point whose beat <= target wins; earlier beats clamp to the first point.
        self.beat_to_time
            .partition_point(|p| p.beat <= target_beat)
            .saturating_sub(1)
    }
}

/// One validated scroll-speed interval on a line. `end_beat` is `None` for
/// the open-ended final event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedEvent {
    pub start_beat: f64,
    pub end_beat: Option<f64>,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpeedPrefix {
    beat: f64,
    cum_position: f64,
    speed: f64,
}

/// Beat -> chart position for a single judgment line (speed integrated over beats).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedMap {
    prefix: Vec<SpeedPrefix>,
}

impl SpeedMap {
    /// `events` must already be validated: contiguous from beat 0, open-ended last.
    pub fn from_events(events: &[SpeedEvent]) -> Self {
        let mut prefix = Vec::with_capacity(events.len());
        let mut cum = 0.0;
        let mut prev: Option<&SpeedEvent> = None;
        for ev in events {
            if let Some(p) = prev {
                cum += (ev.start_beat - p.start_beat) * p.speed;
            }
            prefix.push(SpeedPrefix {
                beat: ev.start_beat,
                cum_position: cum,
                speed: ev.speed,
            });
            prev = Some(ev);
        }
        Self { prefix }
    }

    /// Chart position at `beat`: Σ speed × Δbeat over every interval before it.
    /// Beats before the first event extrapolate with the first event's speed.
    pub fn position_at(&self, beat: f64) -> f64 {
        if self.prefix.is_empty() {
            return beat;
        }
        let idx = self.prefix.partition_point(|p| p.beat <= beat).saturating_sub(1);
        let p = self.prefix[idx];
        p.cum_position + (beat - p.beat) * p.speed
    }

    pub fn speed_at(&self, beat: f64) -> f64 {
        if self.prefix.is_empty() {
            return 1.0;
        }
        let idx = self.prefix.partition_point(|p| p.beat <= beat).saturating_sub(1);
        self.prefix[idx].speed
    }
}
