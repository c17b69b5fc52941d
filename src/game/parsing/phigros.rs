//! Conversion from the official Phigros chart JSON (`formatVersion: 3`).
//!
//! Official charts time everything per line in `T` units (1/32 beat at the
//! line's own bpm) and express speeds in floor units per second. Both are
//! rebased onto a single global tempo taken from the first line.

use crate::error::ChartError;
use crate::game::line::Channel;
use crate::game::note::NoteKind;
use crate::game::parsing::raw::{
    RawChart, RawLine, RawMotionEvent, RawNote, RawSpeedEvent, RawTempoSegment,
};
use log::{debug, warn};
use serde::Deserialize;

pub const SUPPORTED_FORMAT_VERSION: u32 = 3;

/// Stage-width fraction per unit of `positionX`.
const POSITION_X_UNIT: f64 = 0.05625;
const T_PER_BEAT: f64 = 32.0;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OfficialChart {
    format_version: u32,
    #[serde(default)]
    offset: f64,
    judge_line_list: Vec<OfficialLine>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OfficialLine {
    bpm: f64,
    #[serde(default)]
    notes_above: Vec<OfficialNote>,
    #[serde(default)]
    notes_below: Vec<OfficialNote>,
    #[serde(default)]
    speed_events: Vec<OfficialSpeedEvent>,
    #[serde(default)]
    judge_line_move_events: Vec<OfficialValueEvent>,
    #[serde(default)]
    judge_line_rotate_events: Vec<OfficialValueEvent>,
    #[serde(default)]
    judge_line_disappear_events: Vec<OfficialValueEvent>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OfficialNote {
    #[serde(rename = "type")]
    kind: u8,
    time: f64,
    #[serde(default)]
    position_x: f64,
    #[serde(default)]
    hold_time: f64,
    #[serde(default = "one")]
    speed: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OfficialSpeedEvent {
    start_time: f64,
    end_time: f64,
    value: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct OfficialValueEvent {
    start_time: f64,
    end_time: f64,
    start: f64,
    end: f64,
    #[serde(default)]
    start2: f64,
    #[serde(default)]
    end2: f64,
}

fn one() -> f64 {
    1.0
}

/// Converts an official chart document into the native raw form.
pub fn convert(value: serde_json::Value) -> Result<RawChart, ChartError> {
    let chart: OfficialChart = serde_json::from_value(value)?;
    if chart.format_version != SUPPORTED_FORMAT_VERSION {
        return Err(ChartError::parse(
            "formatVersion",
            format!(
                "unsupported formatVersion {} (only {} is supported)",
                chart.format_version, SUPPORTED_FORMAT_VERSION
            ),
        ));
    }
    let Some(first) = chart.judge_line_list.first() else {
        return Err(ChartError::parse("judgeLineList", "chart has no judge lines"));
    };
    let global_bpm = first.bpm;

    let mut lines = Vec::with_capacity(chart.judge_line_list.len());
    for (i, line) in chart.judge_line_list.iter().enumerate() {
        if !line.bpm.is_finite() || line.bpm <= 0.0 {
            return Err(ChartError::parse(
                format!("judgeLineList[{}].bpm", i),
                format!("bpm must be positive, got {}", line.bpm),
            ));
        }
        lines.push(convert_line(i as u32, line, global_bpm)?);
    }
    debug!(
        "Converted official chart: {} lines at {} bpm.",
        lines.len(),
        global_bpm
    );

    Ok(RawChart {
        offset: chart.offset,
        tempo: vec![RawTempoSegment { start_beat: 0.0, bpm: global_bpm }],
        lines,
    })
}

fn convert_line(id: u32, line: &OfficialLine, global_bpm: f64) -> Result<RawLine, ChartError> {
    let to_beat = |t: f64| t / T_PER_BEAT * (global_bpm / line.bpm);

    let mut official_speeds: Vec<&OfficialSpeedEvent> = line.speed_events.iter().collect();
    official_speeds.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    // Each event starts where the previous one ended, the first at beat 0.
    let mut speed_events: Vec<RawSpeedEvent> = Vec::with_capacity(official_speeds.len());
    for e in official_speeds {
        let start_beat = speed_events.last().and_then(|prev| prev.end_beat).unwrap_or(0.0);
        let end_beat = to_beat(e.end_time.max(0.0));
        if end_beat <= start_beat {
            continue;
        }
        speed_events.push(RawSpeedEvent {
            start_beat,
            end_beat: Some(end_beat),
            speed: e.value * 60.0 / global_bpm,
        });
    }
    if let Some(last) = speed_events.last_mut() {
        last.end_beat = None;
    }

    let mut motion_events = Vec::new();
    let mut push_events = |events: &[OfficialValueEvent], channel: Channel, pick: fn(&OfficialValueEvent) -> (f64, f64)| {
        for e in events {
            let start_beat = to_beat(e.start_time.max(0.0));
            let end_beat = to_beat(e.end_time.max(0.0)).max(start_beat);
            let (start, end) = pick(e);
            motion_events.push(RawMotionEvent {
                channel,
                start_beat,
                end_beat,
                start,
                end,
                easing: "linear".to_string(),
            });
        }
    };
    push_events(&line.judge_line_move_events, Channel::X, |e| (e.start, e.end));
    push_events(&line.judge_line_move_events, Channel::Y, |e| (e.start2, e.end2));
    // Official rotation is clockwise on a y-down screen; ours is counter-clockwise, y-up.
    push_events(&line.judge_line_rotate_events, Channel::Rotation, |e| (-e.start, -e.end));
    push_events(&line.judge_line_disappear_events, Channel::Opacity, |e| (e.start, e.end));

    let mut notes = Vec::with_capacity(line.notes_above.len() + line.notes_below.len());
    for (above, list, key) in [
        (true, &line.notes_above, "notesAbove"),
        (false, &line.notes_below, "notesBelow"),
    ] {
        for (j, n) in list.iter().enumerate() {
            let mut kind = match n.kind {
                1 => NoteKind::Tap,
                2 => NoteKind::Drag,
                3 => NoteKind::Hold,
                4 => NoteKind::Flick,
                other => {
                    return Err(ChartError::parse(
                        format!("judgeLineList[{}].{}[{}].type", id, key, j),
                        format!("unknown note type {}", other),
                    ));
                }
            };
            if kind == NoteKind::Hold && n.hold_time <= 0.0 {
                warn!(
                    "judgeLineList[{}].{}[{}]: hold with holdTime {}; importing as a tap.",
                    id, key, j, n.hold_time
                );
                kind = NoteKind::Tap;
            }
            let is_hold = kind == NoteKind::Hold;
            notes.push(RawNote {
                kind,
                trigger_beat: to_beat(n.time),
                hold_end_beat: is_hold.then(|| to_beat(n.time + n.hold_time)),
                lane: n.position_x * POSITION_X_UNIT,
                // Hold bodies already follow the line's speed integration.
                speed: (!is_hold && n.speed != 1.0).then_some(n.speed),
                above,
            });
        }
    }

    Ok(RawLine {
        id,
        speed_events,
        motion_events,
        notes,
    })
}
