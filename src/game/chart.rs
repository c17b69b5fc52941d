//! The validated, immutable chart.
//!
//! Everything playback needs is checked once here; after `Chart::load`
//! returns `Ok`, all lookups are total.

use crate::error::{ChartError, EntityRef};
use crate::game::ease::EasingRegistry;
use crate::game::line::{LineMotion, LineTransform, MotionEvent, MotionTrack};
use crate::game::note::{Note, NoteKind};
use crate::game::parsing::{self, raw::*};
use crate::game::timing::{SpeedEvent, SpeedMap, TempoSegment, TimingData};
use log::{debug, info};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct JudgmentLine {
    id: u32,
    speed_events: Vec<SpeedEvent>,
    speed_map: SpeedMap,
    motion: LineMotion,
    /// Sorted by trigger beat; ties keep file order.
    notes: Vec<Note>,
}

impl JudgmentLine {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn speed_events(&self) -> &[SpeedEvent] {
        &self.speed_events
    }

    pub fn motion(&self) -> &LineMotion {
        &self.motion
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[inline(always)]
    pub fn position_at(&self, beat: f64) -> f64 {
        self.speed_map.position_at(beat)
    }

    #[inline(always)]
    pub fn transform_at(&self, beat: f64) -> LineTransform {
        self.motion.transform_at(beat)
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    offset: f64,
    tempo: Vec<TempoSegment>,
    timing: TimingData,
    lines: Vec<JudgmentLine>,
    index_by_id: HashMap<u32, usize>,
}

impl Chart {
    pub fn load(raw: RawChart) -> Result<Chart, ChartError> {
        Self::load_with_easings(raw, &EasingRegistry::default())
    }

    /// Like [`load`](Self::load), resolving easing names through `easings`.
    pub fn load_with_easings(raw: RawChart, easings: &EasingRegistry) -> Result<Chart, ChartError> {
        if !raw.offset.is_finite() {
            return Err(ChartError::violation(EntityRef::Chart, "offset must be finite"));
        }
        let tempo = validate_tempo(&raw.tempo)?;
        let timing = TimingData::from_segments(raw.offset, 0.0, &tempo);

        let mut lines = Vec::with_capacity(raw.lines.len());
        let mut index_by_id = HashMap::with_capacity(raw.lines.len());
        for (idx, raw_line) in raw.lines.iter().enumerate() {
            if index_by_id.insert(raw_line.id, idx).is_some() {
                return Err(ChartError::violation(
                    EntityRef::Line { line_id: raw_line.id },
                    "duplicate line id",
                ));
            }
            lines.push(build_line(idx, raw_line, easings)?);
        }

        let chart = Chart { offset: raw.offset, tempo, timing, lines, index_by_id };
        info!(
            "Loaded chart: {} lines, {} notes, {} tempo segments, max bpm {:.1}.",
            chart.lines.len(),
            chart.note_count(),
            chart.tempo.len(),
            chart.timing.max_bpm()
        );
        Ok(chart)
    }

    /// Parses native or official chart JSON and loads it.
    pub fn from_json_str(json: &str) -> Result<Chart, ChartError> {
        Self::load(parsing::parse_chart_json(json)?)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn tempo(&self) -> &[TempoSegment] {
        &self.tempo
    }

    /// Tempo map with no calibration offset applied.
    pub fn timing(&self) -> &TimingData {
        &self.timing
    }

    pub fn lines(&self) -> &[JudgmentLine] {
        &self.lines
    }

    pub fn line_index(&self, line_id: u32) -> Option<usize> {
        self.index_by_id.get(&line_id).copied()
    }

    pub fn line_by_id(&self, line_id: u32) -> Option<&JudgmentLine> {
        self.line_index(line_id).map(|i| &self.lines[i])
    }

    pub fn note_count(&self) -> usize {
        self.lines.iter().map(|l| l.notes.len()).sum()
    }

    /// Latest beat any note is still on screen at.
    pub fn last_note_beat(&self) -> Option<f64> {
        self.lines
            .iter()
            .flat_map(|l| l.notes.iter())
            .map(Note::end_beat)
            .reduce(f64::max)
    }

    pub fn beat_at(&self, time_sec: f64) -> f64 {
        self.timing.beat_at(time_sec)
    }

    pub fn time_at(&self, beat: f64) -> f64 {
        self.timing.time_at(beat)
    }

    /// Integrated scroll position of a line, or `None` for an unknown id.
    pub fn chart_position(&self, line_id: u32, beat: f64) -> Option<f64> {
        self.line_by_id(line_id).map(|l| l.position_at(beat))
    }

    pub fn transform_at(&self, line_id: u32, beat: f64) -> Option<LineTransform> {
        self.line_by_id(line_id).map(|l| l.transform_at(beat))
    }
}

fn validate_tempo(raw: &[RawTempoSegment]) -> Result<Vec<TempoSegment>, ChartError> {
    if raw.is_empty() {
        return Err(ChartError::violation(EntityRef::Chart, "tempo map is empty"));
    }
    let mut out: Vec<TempoSegment> = Vec::with_capacity(raw.len());
    for (index, seg) in raw.iter().enumerate() {
        let entity = EntityRef::TempoSegment { index };
        if !seg.bpm.is_finite() || seg.bpm <= 0.0 {
            return Err(ChartError::violation(entity, format!("bpm must be finite and positive, got {}", seg.bpm)));
        }
        if !seg.start_beat.is_finite() {
            return Err(ChartError::violation(entity, "startBeat must be finite"));
        }
        match out.last() {
            None if seg.start_beat != 0.0 => {
                return Err(ChartError::violation(
                    entity,
                    format!("first tempo segment must start at beat 0, got {}", seg.start_beat),
                ));
            }
            Some(prev) if seg.start_beat <= prev.start_beat => {
                return Err(ChartError::violation(
                    entity,
                    format!("startBeat {} does not follow {}", seg.start_beat, prev.start_beat),
                ));
            }
            _ => {}
        }
        out.push(TempoSegment { start_beat: seg.start_beat, bpm: seg.bpm });
    }
    Ok(out)
}

fn validate_speed_events(line_id: u32, raw: &[RawSpeedEvent]) -> Result<Vec<SpeedEvent>, ChartError> {
    if raw.is_empty() {
        return Err(ChartError::violation(
            EntityRef::Line { line_id },
            "line has no speed events",
        ));
    }
    let mut out: Vec<SpeedEvent> = Vec::with_capacity(raw.len());
    for (index, ev) in raw.iter().enumerate() {
        let entity = EntityRef::SpeedEvent { line_id, index };
        if !ev.start_beat.is_finite() || !ev.speed.is_finite() {
            return Err(ChartError::violation(entity, "startBeat and speed must be finite"));
        }
        match out.last() {
            None if ev.start_beat != 0.0 => {
                return Err(ChartError::violation(
                    entity,
                    format!("first speed event must start at beat 0, got {}", ev.start_beat),
                ));
            }
            Some(prev) => match prev.end_beat {
                None => {
                    return Err(ChartError::violation(
                        EntityRef::SpeedEvent { line_id, index: index - 1 },
                        "only the last speed event may be open-ended",
                    ));
                }
                Some(prev_end) if ev.start_beat != prev_end => {
                    return Err(ChartError::violation(
                        entity,
                        format!("starts at beat {} but the previous event ends at {}", ev.start_beat, prev_end),
                    ));
                }
                Some(_) => {}
            },
            None => {}
        }
        if let Some(end) = ev.end_beat {
            if !end.is_finite() || end <= ev.start_beat {
                return Err(ChartError::violation(
                    entity,
                    format!("endBeat {} must be after startBeat {}", end, ev.start_beat),
                ));
            }
        }
        out.push(SpeedEvent { start_beat: ev.start_beat, end_beat: ev.end_beat, speed: ev.speed });
    }
    if out.last().is_some_and(|last| last.end_beat.is_some()) {
        return Err(ChartError::violation(
            EntityRef::SpeedEvent { line_id, index: out.len() - 1 },
            "last speed event must be open-ended (endBeat null)",
        ));
    }
    Ok(out)
}

fn build_motion(
    line_idx: usize,
    line_id: u32,
    raw: &[RawMotionEvent],
    easings: &EasingRegistry,
) -> Result<LineMotion, ChartError> {
    let mut tracks: [Vec<MotionEvent>; 4] = Default::default();
    for (j, ev) in raw.iter().enumerate() {
        let track = &mut tracks[ev.channel.index()];
        let entity = EntityRef::MotionEvent { line_id, channel: ev.channel, index: track.len() };

        let easing = easings.get(&ev.easing).ok_or_else(|| {
            ChartError::parse(
                format!("lines[{}].motionEvents[{}].easing", line_idx, j),
                format!("unknown easing '{}'", ev.easing),
            )
        })?;
        if ![ev.start_beat, ev.end_beat, ev.start, ev.end].iter().all(|v| v.is_finite()) {
            return Err(ChartError::violation(entity, "beats and values must be finite"));
        }
        if ev.end_beat < ev.start_beat {
            return Err(ChartError::violation(
                entity,
                format!("endBeat {} precedes startBeat {}", ev.end_beat, ev.start_beat),
            ));
        }
        if let Some(prev) = track.last() {
            if ev.start_beat < prev.start_beat {
                return Err(ChartError::violation(
                    entity,
                    format!("startBeat {} is before the previous event's {}", ev.start_beat, prev.start_beat),
                ));
            }
            if ev.start_beat < prev.end_beat {
                return Err(ChartError::violation(
                    entity,
                    format!(
                        "overlaps the previous {} event ({}..{}) starting at beat {}",
                        ev.channel, prev.start_beat, prev.end_beat, ev.start_beat
                    ),
                ));
            }
        }
        track.push(MotionEvent {
            start_beat: ev.start_beat,
            end_beat: ev.end_beat,
            start_value: ev.start,
            end_value: ev.end,
            easing,
        });
    }
    let [x, y, rotation, opacity] = tracks;
    Ok(LineMotion::new([
        MotionTrack::new(x),
        MotionTrack::new(y),
        MotionTrack::new(rotation),
        MotionTrack::new(opacity),
    ]))
}

fn validate_notes(line_id: u32, raw: &[RawNote]) -> Result<Vec<Note>, ChartError> {
    let mut notes = Vec::with_capacity(raw.len());
    for (index, n) in raw.iter().enumerate() {
        let entity = EntityRef::Note { line_id, index };
        if !n.trigger_beat.is_finite() || !n.lane.is_finite() {
            return Err(ChartError::violation(entity, "triggerBeat and lane must be finite"));
        }
        if n.trigger_beat < 0.0 {
            return Err(ChartError::violation(
                entity,
                format!("triggerBeat {} is before beat 0", n.trigger_beat),
            ));
        }
        if n.speed.is_some_and(|s| !s.is_finite()) {
            return Err(ChartError::violation(entity, "speed must be finite"));
        }
        let hold_end_beat = match (n.kind, n.hold_end_beat) {
            (NoteKind::Hold, None) => {
                return Err(ChartError::parse(
                    format!("line {} note #{}", line_id, index),
                    "hold note is missing holdEndBeat",
                ));
            }
            (NoteKind::Hold, Some(end)) => {
                if !end.is_finite() || end <= n.trigger_beat {
                    return Err(ChartError::violation(
                        entity,
                        format!("holdEndBeat {} must be after triggerBeat {}", end, n.trigger_beat),
                    ));
                }
                Some(end)
            }
            (_, Some(_)) => {
                return Err(ChartError::violation(entity, "holdEndBeat on a non-hold note"));
            }
            (_, None) => None,
        };
        notes.push(Note {
            parent_line_id: line_id,
            kind: n.kind,
            trigger_beat: n.trigger_beat,
            hold_end_beat,
            lane_offset: n.lane,
            speed: n.speed,
            above: n.above,
        });
    }
    notes.sort_by(|a, b| a.trigger_beat.total_cmp(&b.trigger_beat));
    Ok(notes)
}

fn build_line(idx: usize, raw: &RawLine, easings: &EasingRegistry) -> Result<JudgmentLine, ChartError> {
    let speed_events = validate_speed_events(raw.id, &raw.speed_events)?;
    let speed_map = SpeedMap::from_events(&speed_events);
    let motion = build_motion(idx, raw.id, &raw.motion_events, easings)?;
    let notes = validate_notes(raw.id, &raw.notes)?;
    debug!(
        "Line {}: {} speed events, {} motion events, {} notes.",
        raw.id,
        speed_events.len(),
        raw.motion_events.len(),
        notes.len()
    );
    Ok(JudgmentLine { id: raw.id, speed_events, speed_map, motion, notes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::line::Channel;

    fn open_speed(speed: f64) -> Vec<RawSpeedEvent> {
        vec![RawSpeedEvent { start_beat: 0.0, end_beat: None, speed }]
    }

    fn line(id: u32) -> RawLine {
        RawLine { id, speed_events: open_speed(1.0), motion_events: vec![], notes: vec![] }
    }

    fn chart(lines: Vec<RawLine>) -> RawChart {
        RawChart {
            offset: 0.0,
            tempo: vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            lines,
        }
    }

    fn motion(channel: Channel, start_beat: f64, end_beat: f64) -> RawMotionEvent {
        RawMotionEvent { channel, start_beat, end_beat, start: 0.0, end: 1.0, easing: "linear".into() }
    }

    fn note(kind: NoteKind, trigger_beat: f64, hold_end_beat: Option<f64>) -> RawNote {
        RawNote { kind, trigger_beat, hold_end_beat, lane: 0.0, speed: None, above: true }
    }

    fn violation_entity(err: ChartError) -> EntityRef {
        match err {
            ChartError::InvariantViolation { entity, .. } => entity,
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn loads_and_looks_up_by_id() {
        let mut l = line(5);
        l.notes = vec![note(NoteKind::Tap, 8.0, None), note(NoteKind::Hold, 2.0, Some(4.0))];
        let c = Chart::load(chart(vec![line(9), l])).unwrap();
        assert_eq!(c.line_index(5), Some(1));
        assert_eq!(c.chart_position(5, 3.0), Some(3.0));
        assert_eq!(c.chart_position(42, 3.0), None);
        assert_eq!(c.transform_at(9, 0.0), Some(LineTransform::default()));
        assert_eq!(c.note_count(), 2);
        // Notes come back ordered by trigger beat.
        assert_eq!(c.line_by_id(5).unwrap().notes()[0].kind, NoteKind::Hold);
        assert_eq!(c.last_note_beat(), Some(8.0));
        assert_eq!(c.beat_at(2.0), 4.0);
    }

    #[test]
    fn duplicate_line_ids_are_rejected() {
        let err = Chart::load(chart(vec![line(1), line(1)])).unwrap_err();
        assert_eq!(violation_entity(err), EntityRef::Line { line_id: 1 });
    }

    #[test]
    fn tempo_rules() {
        let mut raw = chart(vec![]);
        raw.tempo.clear();
        assert_eq!(violation_entity(Chart::load(raw).unwrap_err()), EntityRef::Chart);

        let mut raw = chart(vec![]);
        raw.tempo[0].start_beat = 1.0;
        assert_eq!(violation_entity(Chart::load(raw).unwrap_err()), EntityRef::TempoSegment { index: 0 });

        let mut raw = chart(vec![]);
        raw.tempo.push(RawTempoSegment { start_beat: 0.0, bpm: 90.0 });
        assert_eq!(violation_entity(Chart::load(raw).unwrap_err()), EntityRef::TempoSegment { index: 1 });

        let mut raw = chart(vec![]);
        raw.tempo[0].bpm = 0.0;
        assert!(Chart::load(raw).is_err());
    }

    #[test]
    fn speed_coverage_rules() {
        let cases: Vec<(Vec<RawSpeedEvent>, EntityRef)> = vec![
            (vec![], EntityRef::Line { line_id: 0 }),
            (
                vec![RawSpeedEvent { start_beat: 1.0, end_beat: None, speed: 1.0 }],
                EntityRef::SpeedEvent { line_id: 0, index: 0 },
            ),
            (
                vec![RawSpeedEvent { start_beat: 0.0, end_beat: Some(4.0), speed: 1.0 }],
                EntityRef::SpeedEvent { line_id: 0, index: 0 },
            ),
            (
                vec![
                    RawSpeedEvent { start_beat: 0.0, end_beat: Some(4.0), speed: 1.0 },
                    RawSpeedEvent { start_beat: 5.0, end_beat: None, speed: 1.0 },
                ],
                EntityRef::SpeedEvent { line_id: 0, index: 1 },
            ),
            (
                vec![
                    RawSpeedEvent { start_beat: 0.0, end_beat: None, speed: 1.0 },
                    RawSpeedEvent { start_beat: 4.0, end_beat: None, speed: 1.0 },
                ],
                EntityRef::SpeedEvent { line_id: 0, index: 0 },
            ),
        ];
        for (events, expected) in cases {
            let mut l = line(0);
            l.speed_events = events;
            assert_eq!(violation_entity(Chart::load(chart(vec![l])).unwrap_err()), expected);
        }
    }

    #[test]
    fn overlapping_motion_names_line_and_channel() {
        let mut l = line(3);
        l.motion_events = vec![
            motion(Channel::X, 0.0, 4.0),
            motion(Channel::Rotation, 0.0, 2.0),
            motion(Channel::Rotation, 1.0, 3.0),
        ];
        let err = Chart::load(chart(vec![l])).unwrap_err();
        assert_eq!(
            violation_entity(err),
            EntityRef::MotionEvent { line_id: 3, channel: Channel::Rotation, index: 1 }
        );
    }

    #[test]
    fn touching_and_zero_length_motion_events_are_fine() {
        let mut l = line(0);
        l.motion_events = vec![
            motion(Channel::Y, 0.0, 2.0),
            motion(Channel::Y, 2.0, 2.0),
            motion(Channel::Y, 2.0, 3.0),
        ];
        let c = Chart::load(chart(vec![l])).unwrap();
        assert_eq!(c.line_by_id(0).unwrap().motion().track(Channel::Y).events().len(), 3);
    }

    #[test]
    fn unknown_easing_is_a_parse_error() {
        let mut l = line(0);
        let mut ev = motion(Channel::Opacity, 0.0, 1.0);
        ev.easing = "easeSideways".into();
        l.motion_events = vec![ev];
        match Chart::load(chart(vec![l])).unwrap_err() {
            ChartError::Parse { location, .. } => assert_eq!(location, "lines[0].motionEvents[0].easing"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_easings_resolve() {
        let mut registry = EasingRegistry::default();
        registry.register("snap", |t| if t < 1.0 { 0.0 } else { 1.0 });
        let mut l = line(0);
        let mut ev = motion(Channel::X, 0.0, 2.0);
        ev.easing = "snap".into();
        l.motion_events = vec![ev];
        let c = Chart::load_with_easings(chart(vec![l]), &registry).unwrap();
        assert_eq!(c.transform_at(0, 1.0).unwrap().x, 0.0);
    }

    #[test]
    fn note_rules() {
        let cases = vec![
            (note(NoteKind::Tap, -1.0, None), true),
            (note(NoteKind::Hold, 2.0, Some(2.0)), true),
            (note(NoteKind::Drag, 2.0, Some(3.0)), true),
            (note(NoteKind::Hold, 2.0, None), false),
        ];
        for (n, is_violation) in cases {
            let mut l = line(4);
            l.notes = vec![n];
            let err = Chart::load(chart(vec![l])).unwrap_err();
            assert_eq!(matches!(err, ChartError::InvariantViolation { .. }), is_violation, "{err}");
        }
    }
}
