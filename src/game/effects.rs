//! Hit effects, computed from scratch every frame.
//!
//! An effect exists for `duration` seconds after each spawn beat. Nothing is
//! retained between frames, so seeks and rate changes need no bookkeeping.

use crate::config::Config;
use crate::core::space::Stage;
use crate::game::chart::Chart;
use crate::game::note::Note;
use crate::game::timing::TimingData;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitEffect {
    pub line_index: usize,
    pub note_index: usize,
    pub spawn_beat: f64,
    /// Seconds since the spawn beat.
    pub age: f32,
    /// `age / duration`, in `[0, 1)`.
    pub progress: f32,
    pub world: [f32; 2],
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub duration_sec: f64,
    pub hold_interval_beats: f64,
}

impl EffectParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            duration_sec: cfg.hit_effect_duration_seconds,
            hold_interval_beats: cfg.hold_effect_interval_beats,
        }
    }
}

/// Collects every effect alive at `now` (seconds) into `out`, cleared first.
/// `beat` must be `timing.beat_at(now)`.
pub fn active_effects(
    chart: &Chart,
    timing: &TimingData,
    stage: &Stage,
    params: EffectParams,
    now: f64,
    beat: f64,
    out: &mut Vec<HitEffect>,
) {
    out.clear();
    if params.duration_sec <= 0.0 {
        return;
    }
    let oldest_live_beat = timing.beat_at(now - params.duration_sec);

    for (line_index, line) in chart.lines().iter().enumerate() {
        for (note_index, note) in line.notes().iter().enumerate() {
            // Notes are sorted by trigger beat; everything after this is in the future.
            if note.trigger_beat > beat {
                break;
            }
            if note.end_beat() < oldest_live_beat {
                continue;
            }
            for spawn_beat in spawn_beats(note, params.hold_interval_beats, oldest_live_beat) {
                let age = now - timing.time_at(spawn_beat);
                if age < 0.0 {
                    break;
                }
                if age >= params.duration_sec {
                    continue;
                }
                let t = line.transform_at(spawn_beat);
                out.push(HitEffect {
                    line_index,
                    note_index,
                    spawn_beat,
                    age: age as f32,
                    progress: (age / params.duration_sec) as f32,
                    world: stage.line_point(&t, note.lane_offset, 0.0),
                    rotation: t.rotation as f32,
                });
            }
        }
    }
}

/// Spawn beats of `note` from roughly `from_beat` on: the trigger, plus
/// repeats every `interval` beats strictly before a hold's end.
fn spawn_beats(note: &Note, interval: f64, from_beat: f64) -> impl Iterator<Item = f64> {
    let trigger = note.trigger_beat;
    let (end, step, first_k, last_k) = match note.hold_end_beat {
        Some(end) if interval > 0.0 => {
            let first_k = ((from_beat - trigger) / interval).floor().max(0.0) as u64;
            (end, interval, first_k, u64::MAX)
        }
        _ => (f64::INFINITY, 0.0, 0, 0),
    };
    (first_k..=last_k)
        .map(move |k| trigger + k as f64 * step)
        .take_while(move |b| *b < end)
}
