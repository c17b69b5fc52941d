use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteKind {
    Tap,
    Hold,
    Drag,
    Flick,
}

impl NoteKind {
    /// Draw layer; higher draws on top.
    pub const fn z(self) -> i16 {
        match self {
            NoteKind::Hold => crate::config::Z_HOLD,
            NoteKind::Drag => crate::config::Z_DRAG,
            NoteKind::Tap => crate::config::Z_TAP,
            NoteKind::Flick => crate::config::Z_FLICK,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub parent_line_id: u32,
    pub kind: NoteKind,
    pub trigger_beat: f64,
    /// Set for holds only, always greater than `trigger_beat`.
    pub hold_end_beat: Option<f64>,
    /// Position along the line, as a fraction of stage width.
    pub lane_offset: f64,
    pub speed: Option<f64>,
    pub above: bool,
}

impl Note {
    /// Beat at which the note stops being drawn.
    #[inline(always)]
    pub fn end_beat(&self) -> f64 {
        self.hold_end_beat.unwrap_or(self.trigger_beat)
    }

    #[inline(always)]
    pub fn speed_multiplier(&self) -> f64 {
        self.speed.unwrap_or(1.0)
    }
}

/// Ordered so that a note only ever moves forward through the states while
/// time runs forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NoteState {
    Upcoming,
    Approaching,
    Holding,
    Judged,
}

/// Where (and whether) to draw one note this frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteRenderState {
    pub line_index: usize,
    pub note_index: usize,
    pub kind: NoteKind,
    pub state: NoteState,
    /// Signed distance from the line along its normal, in world units.
    pub offset: f32,
    /// World position of the note head.
    pub world: [f32; 2],
    /// Line rotation in degrees, copied for the draw list.
    pub rotation: f32,
    /// Holds only: remaining body length in world units.
    pub hold_length: f32,
    /// Holds only: 0 at the trigger beat, 1 at the end.
    pub hold_progress: f32,
    pub above: bool,
    pub highlight: bool,
    pub visible: bool,
    pub lane_offset: f32,
}
