//! Note layout: per-frame offsets, world positions and lifecycle states.
//!
//! Chart-derived values (approach positions, highlight flags) are computed
//! once per chart. Lifecycle latches live for one seek generation and are
//! thrown away when the generation changes.

use crate::config::{self, Config};
use crate::core::space::Stage;
use crate::game::chart::Chart;
use crate::game::line::LineTransform;
use crate::game::note::{Note, NoteKind, NoteRenderState, NoteState};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// One line's evaluated state for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineFrame {
    pub line_id: u32,
    pub transform: LineTransform,
    /// Chart position of the line at the frame beat.
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub stage: Stage,
    /// Stage heights per chart-position unit.
    pub note_speed_scale: f32,
    pub visibility_window_beats: f64,
    pub hide_notes_behind_line: bool,
}

impl LayoutParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            stage: Stage::for_display(cfg.display_width, cfg.display_height),
            note_speed_scale: cfg.note_speed_scale,
            visibility_window_beats: cfg.visibility_window_beats,
            hide_notes_behind_line: cfg.hide_notes_behind_line,
        }
    }
}

/// State a note is in at `beat`, ignoring anything it reached earlier.
pub fn classify(note: &Note, beat: f64, visibility_window_beats: f64) -> NoteState {
    if beat >= note.end_beat() {
        NoteState::Judged
    } else if note.kind == NoteKind::Hold && beat >= note.trigger_beat {
        NoteState::Holding
    } else if beat >= note.trigger_beat - visibility_window_beats {
        NoteState::Approaching
    } else {
        NoteState::Upcoming
    }
}

#[derive(Debug, Clone, Copy)]
struct NoteCache {
    approach: f64,
    end_position: f64,
    highlight: bool,
}

#[derive(Debug, Clone, Copy)]
struct NoteLatch {
    state: NoteState,
    hold_progress: f64,
}

impl Default for NoteLatch {
    fn default() -> Self {
        Self { state: NoteState::Upcoming, hold_progress: 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct NoteLayout {
    chart: Arc<Chart>,
    params: LayoutParams,
    /// Indexed `[line_index][note_index]`, same shape as the chart.
    cache: Vec<Vec<NoteCache>>,
    latches: Vec<Vec<NoteLatch>>,
    generation: Option<u64>,
}

impl NoteLayout {
    pub fn new(chart: Arc<Chart>, params: LayoutParams) -> Self {
        let mut cache: Vec<Vec<NoteCache>> = chart
            .lines()
            .iter()
            .map(|line| {
                line.notes()
                    .iter()
                    .map(|n| NoteCache {
                        approach: line.position_at(n.trigger_beat),
                        end_position: line.position_at(n.end_beat()),
                        highlight: false,
                    })
                    .collect()
            })
            .collect();
        mark_simultaneous(&chart, &mut cache);
        let latches = cache.iter().map(|l| vec![NoteLatch::default(); l.len()]).collect();
        Self { chart, params, cache, latches, generation: None }
    }

    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Lays out every note at `beat` into `out` (cleared first).
    ///
    /// `lines` must hold this frame's [`LineFrame`] for every chart line, in
    /// chart order.
    pub fn layout_at(
        &mut self,
        lines: &[LineFrame],
        beat: f64,
        generation: u64,
        out: &mut Vec<NoteRenderState>,
    ) {
        if self.generation != Some(generation) {
            if let Some(prev) = self.generation {
                debug!("Seek generation {} -> {}; resetting note latches.", prev, generation);
            }
            for line in &mut self.latches {
                line.fill(NoteLatch::default());
            }
            self.generation = Some(generation);
        }

        out.clear();
        let p = self.params;
        let height = p.stage.height() as f64;

        for (line_index, (line, frame)) in self.chart.lines().iter().zip(lines).enumerate() {
            let current = frame.position;
            let caches = &self.cache[line_index];
            let latches = &mut self.latches[line_index];

            for (note_index, note) in line.notes().iter().enumerate() {
                let cache = caches[note_index];
                let latch = &mut latches[note_index];

                latch.state = latch.state.max(classify(note, beat, p.visibility_window_beats));

                let scale = p.note_speed_scale as f64 * height * note.speed_multiplier();
                let (offset, hold_length, hold_progress) = match note.hold_end_beat {
                    Some(end) => {
                        let span = end - note.trigger_beat;
                        let raw = ((beat - note.trigger_beat) / span).clamp(0.0, 1.0);
                        latch.hold_progress = latch.hold_progress.max(raw);
                        let offset = if latch.state >= NoteState::Holding {
                            0.0
                        } else {
                            (cache.approach - current) * scale
                        };
                        let body = ((cache.end_position - current.max(cache.approach)) * scale).max(0.0);
                        (offset, body, latch.hold_progress)
                    }
                    None => ((cache.approach - current) * scale, 0.0, 0.0),
                };

                let state = latch.state;
                let visible = match state {
                    NoteState::Holding => true,
                    NoteState::Approaching => !(p.hide_notes_behind_line && offset < 0.0),
                    NoteState::Upcoming | NoteState::Judged => false,
                };
                let normal = if note.above { offset } else { -offset };

                out.push(NoteRenderState {
                    line_index,
                    note_index,
                    kind: note.kind,
                    state,
                    offset: offset as f32,
                    world: p.stage.line_point(&frame.transform, note.lane_offset, normal),
                    rotation: frame.transform.rotation as f32,
                    hold_length: hold_length as f32,
                    hold_progress: hold_progress as f32,
                    above: note.above,
                    highlight: cache.highlight,
                    visible,
                    lane_offset: note.lane_offset as f32,
                });
            }
        }
    }

    /// Allocating form of [`layout_at`](Self::layout_at).
    pub fn layout(&mut self, lines: &[LineFrame], beat: f64, generation: u64) -> Vec<NoteRenderState> {
        let mut out = Vec::with_capacity(self.chart.note_count());
        self.layout_at(lines, beat, generation, &mut out);
        out
    }
}

/// Flags every note that shares its trigger beat with a note anywhere in the chart.
fn mark_simultaneous(chart: &Chart, cache: &mut [Vec<NoteCache>]) {
    let mut triggers: Vec<(f64, usize, usize)> = chart
        .lines()
        .iter()
        .enumerate()
        .flat_map(|(li, line)| line.notes().iter().enumerate().map(move |(ni, n)| (n.trigger_beat, li, ni)))
        .collect();
    triggers.sort_by(|a, b| a.0.total_cmp(&b.0));

    for pair in triggers.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.0 - a.0 <= config::SIMULTANEOUS_BEAT_EPSILON {
            cache[a.1][a.2].highlight = true;
            cache[b.1][b.2].highlight = true;
        }
    }
}

/// Evaluates every line of `chart` at `beat`, in chart order.
pub fn line_frames_at(chart: &Chart, beat: f64, out: &mut Vec<LineFrame>) {
    out.clear();
    out.extend(chart.lines().iter().map(|line| LineFrame {
        line_id: line.id(),
        transform: line.transform_at(beat),
        position: line.position_at(beat),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::parsing::raw::*;

    fn raw_note(kind: NoteKind, trigger_beat: f64, hold_end_beat: Option<f64>, above: bool) -> RawNote {
        RawNote { kind, trigger_beat, hold_end_beat, lane: 0.0, speed: None, above }
    }

    fn chart_with(lines: Vec<Vec<RawNote>>) -> Arc<Chart> {
        let chart = Chart::load(RawChart {
            offset: 0.0,
            tempo: vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(i, notes)| RawLine {
                    id: i as u32,
                    speed_events: vec![RawSpeedEvent { start_beat: 0.0, end_beat: None, speed: 1.0 }],
                    motion_events: vec![],
                    notes,
                })
                .collect(),
        })
        .unwrap();
        Arc::new(chart)
    }

    fn params(hide: bool) -> LayoutParams {
        LayoutParams {
            stage: Stage::for_display(854, 480),
            note_speed_scale: 0.5,
            visibility_window_beats: 4.0,
            hide_notes_behind_line: hide,
        }
    }

    fn run(layout: &mut NoteLayout, beat: f64, generation: u64) -> Vec<NoteRenderState> {
        let mut frames = Vec::new();
        line_frames_at(layout.chart(), beat, &mut frames);
        layout.layout(&frames, beat, generation)
    }

    #[test]
    fn classification_boundaries() {
        let tap = Note {
            parent_line_id: 0,
            kind: NoteKind::Tap,
            trigger_beat: 8.0,
            hold_end_beat: None,
            lane_offset: 0.0,
            speed: None,
            above: true,
        };
        assert_eq!(classify(&tap, 3.9, 4.0), NoteState::Upcoming);
        assert_eq!(classify(&tap, 4.0, 4.0), NoteState::Approaching);
        assert_eq!(classify(&tap, 8.0, 4.0), NoteState::Judged);

        let hold = Note { kind: NoteKind::Hold, hold_end_beat: Some(10.0), ..tap };
        assert_eq!(classify(&hold, 8.0, 4.0), NoteState::Holding);
        assert_eq!(classify(&hold, 9.99, 4.0), NoteState::Holding);
        assert_eq!(classify(&hold, 10.0, 4.0), NoteState::Judged);
    }

    #[test]
    fn offset_scales_with_remaining_position() {
        let chart = chart_with(vec![vec![
            raw_note(NoteKind::Tap, 4.0, None, true),
            raw_note(NoteKind::Drag, 4.0, None, false),
        ]]);
        let mut layout = NoteLayout::new(Arc::clone(&chart), params(false));
        let out = run(&mut layout, 3.0, 0);
        // One position unit left, 0.5 stage heights of 480 per unit.
        assert_eq!(out[0].offset, 240.0);
        assert_eq!(out[0].world, [0.0, 240.0]);
        assert_eq!(out[1].world, [0.0, -240.0]);
        assert!(out[0].visible && out[0].highlight && out[1].highlight);
    }

    #[test]
    fn states_latch_until_seek() {
        let chart = chart_with(vec![vec![raw_note(NoteKind::Tap, 4.0, None, true)]]);
        let mut layout = NoteLayout::new(Arc::clone(&chart), params(false));
        assert_eq!(run(&mut layout, 4.5, 0)[0].state, NoteState::Judged);
        // Time runs backwards without a seek: stays judged.
        assert_eq!(run(&mut layout, 3.0, 0)[0].state, NoteState::Judged);
        // A seek resets the latch.
        let after_seek = run(&mut layout, 3.0, 1);
        assert_eq!(after_seek[0].state, NoteState::Approaching);
        assert!(after_seek[0].visible);
    }

    #[test]
    fn hold_head_pins_and_body_shrinks() {
        let chart = chart_with(vec![vec![raw_note(NoteKind::Hold, 2.0, Some(6.0), true)]]);
        let mut layout = NoteLayout::new(Arc::clone(&chart), params(false));

        let before = run(&mut layout, 1.0, 0);
        assert_eq!(before[0].offset, 240.0);
        assert_eq!(before[0].hold_length, 4.0 * 240.0);

        let during = run(&mut layout, 3.0, 0);
        assert_eq!(during[0].state, NoteState::Holding);
        assert_eq!(during[0].offset, 0.0);
        assert_eq!(during[0].hold_length, 3.0 * 240.0);
        assert_eq!(during[0].hold_progress, 0.25);

        // Progress never drops within a generation.
        let back = run(&mut layout, 2.5, 0);
        assert_eq!(back[0].hold_progress, 0.25);
        let reset = run(&mut layout, 2.5, 7);
        assert_eq!(reset[0].hold_progress, 0.125);
    }

    #[test]
    fn notes_behind_the_line_can_be_hidden() {
        let mut line = vec![raw_note(NoteKind::Tap, 4.0, None, true)];
        line.push(raw_note(NoteKind::Tap, 6.0, None, true));
        let chart = Chart::load(RawChart {
            offset: 0.0,
            tempo: vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            lines: vec![RawLine {
                id: 0,
                speed_events: vec![
                    RawSpeedEvent { start_beat: 0.0, end_beat: Some(4.0), speed: 1.0 },
                    RawSpeedEvent { start_beat: 4.0, end_beat: Some(6.0), speed: -2.0 },
                    RawSpeedEvent { start_beat: 6.0, end_beat: None, speed: 1.0 },
                ],
                motion_events: vec![],
                notes: line,
            }],
        })
        .map(Arc::new)
        .unwrap();
        // The line scrolls backwards over beats 4..6, so at beat 3 it is
        // already past the position where the beat-6 note meets it.
        let mut shown = NoteLayout::new(Arc::clone(&chart), params(false));
        let mut hidden = NoteLayout::new(Arc::clone(&chart), params(true));
        let a = run(&mut shown, 3.0, 0);
        let b = run(&mut hidden, 3.0, 0);
        assert!(a[1].offset < 0.0);
        assert!(a[1].visible);
        assert!(!b[1].visible);
        assert!(b[0].visible);
    }

    #[test]
    fn repeated_layout_is_identical() {
        let chart = chart_with(vec![
            vec![raw_note(NoteKind::Hold, 1.0, Some(3.0), true)],
            vec![raw_note(NoteKind::Flick, 2.0, None, false)],
        ]);
        let mut layout = NoteLayout::new(Arc::clone(&chart), params(true));
        let first = run(&mut layout, 1.7, 3);
        let second = run(&mut layout, 1.7, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn layout_keeps_its_own_chart_alive() {
        let chart = chart_with(vec![vec![raw_note(NoteKind::Tap, 4.0, None, true)], vec![]]);
        let mut layout = NoteLayout::new(Arc::clone(&chart), params(false));
        drop(chart);
        let out = run(&mut layout, 2.0, 0);
        assert_eq!(layout.chart().lines().len(), 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].line_index, 0);
    }
}
