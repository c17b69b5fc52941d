//! Per-frame driver: one clock snapshot in, one snapshot and draw list out.

use crate::config::{self, Config};
use crate::core::clock::PlaybackClock;
use crate::core::gfx::{quad_transform, BlendMode, DrawKind, RenderList, RenderObject, RenderSink};
use crate::core::space::Stage;
use crate::game::chart::Chart;
use crate::game::effects::{self, EffectParams, HitEffect};
use crate::game::layout::{line_frames_at, LayoutParams, LineFrame, NoteLayout};
use crate::game::note::{NoteKind, NoteRenderState};
use crate::game::timing::TimingData;
use cgmath::Matrix4;
use log::{info, trace, warn};
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything computed for one frame. Buffers are reused across frames.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameSnapshot {
    pub time: f64,
    pub generation: u64,
    pub paused: bool,
    pub beat: f64,
    pub lines: Vec<LineFrame>,
    pub notes: Vec<NoteRenderState>,
    pub effects: Vec<HitEffect>,
}

impl FrameSnapshot {
    pub fn line(&self, line_id: u32) -> Option<&LineFrame> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn visible_notes(&self) -> impl Iterator<Item = &NoteRenderState> {
        self.notes.iter().filter(|n| n.visible)
    }
}

pub struct FrameScheduler {
    chart: Arc<Chart>,
    timing: TimingData,
    layout: NoteLayout,
    effect_params: EffectParams,
    frame_budget: Duration,

    snapshot: FrameSnapshot,
    render_list: RenderList,
    draw_order: Vec<usize>,

    log_timer: f64,
    last_time: Option<f64>,
}

impl FrameScheduler {
    pub fn new(chart: Arc<Chart>, cfg: &Config) -> Self {
        let layout = NoteLayout::new(Arc::clone(&chart), LayoutParams::from_config(cfg));
        let timing = chart.timing().with_global_offset(cfg.global_offset_seconds);
        let notes = chart.note_count();
        let lines = chart.lines().len();
        Self {
            chart,
            timing,
            layout,
            effect_params: EffectParams::from_config(cfg),
            frame_budget: Duration::try_from_secs_f32(cfg.frame_budget_ms / 1000.0).unwrap_or(Duration::MAX),
            snapshot: FrameSnapshot {
                lines: Vec::with_capacity(lines),
                notes: Vec::with_capacity(notes),
                ..FrameSnapshot::default()
            },
            render_list: RenderList { objects: Vec::with_capacity(lines + notes) },
            draw_order: Vec::with_capacity(notes),
            log_timer: 0.0,
            last_time: None,
        }
    }

    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    /// Tempo map with the calibration offset applied.
    pub fn timing(&self) -> &TimingData {
        &self.timing
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    pub fn render_list(&self) -> &RenderList {
        &self.render_list
    }

    pub fn tick(&mut self, clock: &PlaybackClock, sink: &mut dyn RenderSink) -> Result<&FrameSnapshot, Box<dyn Error>> {
        let started = Instant::now();
        let state = clock.snapshot();
        let beat = self.timing.beat_at(state.time);
        if state.time < 0.0 {
            trace!("Pre-roll frame at {:.3}s (beat {:.3}).", state.time, beat);
        }

        let snap = &mut self.snapshot;
        snap.time = state.time;
        snap.generation = state.generation;
        snap.paused = state.paused;
        snap.beat = beat;

        line_frames_at(&self.chart, beat, &mut snap.lines);
        self.layout.layout_at(&snap.lines, beat, state.generation, &mut snap.notes);
        let stage = self.layout.params().stage;
        effects::active_effects(
            &self.chart,
            &self.timing,
            &stage,
            self.effect_params,
            state.time,
            beat,
            &mut snap.effects,
        );

        build_draw_list(snap, &stage, &mut self.draw_order, &mut self.render_list);
        sink.submit(&self.render_list)?;

        self.log_status(state.time);
        let elapsed = started.elapsed();
        if elapsed > self.frame_budget {
            warn!(
                "Frame over budget: {:.2}ms (budget {:.2}ms) at beat {:.2}.",
                elapsed.as_secs_f64() * 1000.0,
                self.frame_budget.as_secs_f64() * 1000.0,
                beat
            );
        }
        Ok(&self.snapshot)
    }

    fn log_status(&mut self, time: f64) {
        let delta = self.last_time.map_or(0.0, |last| (time - last).max(0.0));
        self.last_time = Some(time);
        self.log_timer += delta;
        if self.log_timer >= 1.0 {
            let snap = &self.snapshot;
            info!(
                "Beat: {:.2}, Time: {:.2}, Visible Notes: {}, Active Effects: {}, Draw Objects: {}",
                snap.beat,
                snap.time,
                snap.visible_notes().count(),
                snap.effects.len(),
                self.render_list.len()
            );
            self.log_timer -= 1.0;
        }
    }
}

fn note_texture(kind: NoteKind, highlight: bool) -> &'static str {
    match (kind, highlight) {
        (NoteKind::Tap, false) => config::TEX_TAP,
        (NoteKind::Tap, true) => config::TEX_TAP_HL,
        (NoteKind::Drag, false) => config::TEX_DRAG,
        (NoteKind::Drag, true) => config::TEX_DRAG_HL,
        (NoteKind::Flick, false) => config::TEX_FLICK,
        (NoteKind::Flick, true) => config::TEX_FLICK_HL,
        (NoteKind::Hold, false) => config::TEX_HOLD_HEAD,
        (NoteKind::Hold, true) => config::TEX_HOLD_HEAD_HL,
    }
}

/// Lines, then visible notes back to front, then hit effects.
fn build_draw_list(snap: &FrameSnapshot, stage: &Stage, draw_order: &mut Vec<usize>, list: &mut RenderList) {
    list.clear();
    let mut order: u32 = 0;
    let mut push = |list: &mut RenderList,
                    kind: DrawKind,
                    texture_id: &'static str,
                    transform: Matrix4<f32>,
                    opacity: f32,
                    z: i16,
                    blend: BlendMode| {
        list.objects.push(RenderObject { kind, texture_id, transform, opacity, z, order, blend });
        order += 1;
    };

    let line_size = [
        stage.width() * config::LINE_WIDTH_FRAC,
        stage.height() * config::LINE_THICKNESS_FRAC,
    ];
    for (line_index, frame) in snap.lines.iter().enumerate() {
        let t = &frame.transform;
        push(
            list,
            DrawKind::JudgeLine { line_index },
            config::TEX_JUDGE_LINE,
            quad_transform(stage.to_world(t.x, t.y), line_size, t.rotation as f32),
            t.opacity.clamp(0.0, 1.0) as f32,
            config::Z_LINE,
            BlendMode::Alpha,
        );
    }

    draw_order.clear();
    draw_order.extend(snap.notes.iter().enumerate().filter(|(_, n)| n.visible).map(|(i, _)| i));
    draw_order.sort_by(|&a, &b| {
        let (na, nb) = (&snap.notes[a], &snap.notes[b]);
        na.kind
            .z()
            .cmp(&nb.kind.z())
            .then(na.lane_offset.total_cmp(&nb.lane_offset))
            .then(na.line_index.cmp(&nb.line_index))
            .then(na.note_index.cmp(&nb.note_index))
    });

    let head_size = [
        stage.width() * config::NOTE_WIDTH_FRAC,
        stage.height() * config::NOTE_HEIGHT_FRAC,
    ];
    for &i in draw_order.iter() {
        let n = &snap.notes[i];
        let (line_index, note_index) = (n.line_index, n.note_index);
        if n.kind == NoteKind::Hold && n.hold_length > 0.0 {
            let line = &snap.lines[line_index].transform;
            let mid = (n.offset + 0.5 * n.hold_length) as f64;
            let normal = if n.above { mid } else { -mid };
            push(
                list,
                DrawKind::HoldBody { line_index, note_index },
                config::TEX_HOLD_BODY,
                quad_transform(
                    stage.line_point(line, n.lane_offset as f64, normal),
                    [head_size[0], n.hold_length],
                    n.rotation,
                ),
                1.0,
                n.kind.z(),
                BlendMode::Alpha,
            );
        }
        push(
            list,
            DrawKind::NoteHead { line_index, note_index },
            note_texture(n.kind, n.highlight),
            quad_transform(n.world, head_size, n.rotation),
            1.0,
            n.kind.z(),
            BlendMode::Alpha,
        );
    }

    let fx = stage.height() * config::HIT_EFFECT_SIZE_FRAC;
    for e in &snap.effects {
        push(
            list,
            DrawKind::HitEffect { line_index: e.line_index, note_index: e.note_index, progress: e.progress },
            config::TEX_HIT_EFFECT,
            quad_transform(e.world, [fx, fx], e.rotation),
            1.0 - e.progress,
            config::Z_HIT_EFFECT,
            BlendMode::Add,
        );
    }
}
