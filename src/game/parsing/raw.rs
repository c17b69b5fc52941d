//! Serde mirror of the native chart JSON. Field names are camelCase on the wire.
//!
//! ```json
//! {
//!   "offset": 0.0,
//!   "tempo": [{ "startBeat": 0, "bpm": 120 }],
//!   "lines": [{
//!     "id": 0,
//!     "speedEvents": [{ "startBeat": 0, "endBeat": null, "speed": 1 }],
//!     "motionEvents": [
//!       { "channel": "x", "startBeat": 0, "endBeat": 4, "start": 0.2, "end": 0.8, "easing": "easeOutSine" }
//!     ],
//!     "notes": [{ "type": "tap", "triggerBeat": 4, "lane": 0.1 }]
//!   }]
//! }
//! ```

use crate::game::line::Channel;
use crate::game::note::NoteKind;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawChart {
    /// Seconds of audio before chart beat 0.
    #[serde(default)]
    pub offset: f64,
    pub tempo: Vec<RawTempoSegment>,
    pub lines: Vec<RawLine>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTempoSegment {
    pub start_beat: f64,
    pub bpm: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    pub id: u32,
    #[serde(default)]
    pub speed_events: Vec<RawSpeedEvent>,
    #[serde(default)]
    pub motion_events: Vec<RawMotionEvent>,
    #[serde(default)]
    pub notes: Vec<RawNote>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSpeedEvent {
    pub start_beat: f64,
    /// `None` (JSON `null` or absent) means the event never ends.
    #[serde(default)]
    pub end_beat: Option<f64>,
    pub speed: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMotionEvent {
    pub channel: Channel,
    pub start_beat: f64,
    pub end_beat: f64,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_easing")]
    pub easing: String,
}

fn default_easing() -> String {
    "linear".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawNote {
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub trigger_beat: f64,
    #[serde(default)]
    pub hold_end_beat: Option<f64>,
    #[serde(default)]
    pub lane: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default = "default_above")]
    pub above: bool,
}

fn default_above() -> bool {
    true
}
