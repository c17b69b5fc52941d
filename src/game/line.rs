use crate::config;
use crate::game::ease::Easing;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transform channel of a judgment line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    X,
    Y,
    Rotation,
    Opacity,
}

pub const ALL_CHANNELS: [Channel; 4] = [Channel::X, Channel::Y, Channel::Rotation, Channel::Opacity];

impl Channel {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Channel::X => 0,
            Channel::Y => 1,
            Channel::Rotation => 2,
            Channel::Opacity => 3,
        }
    }

    pub const fn default_value(self) -> f64 {
        match self {
            Channel::X => config::DEFAULT_LINE_X,
            Channel::Y => config::DEFAULT_LINE_Y,
            Channel::Rotation => config::DEFAULT_LINE_ROTATION,
            Channel::Opacity => config::DEFAULT_LINE_OPACITY,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Rotation => "rotation",
            Channel::Opacity => "opacity",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionEvent {
    pub start_beat: f64,
    pub end_beat: f64,
    pub start_value: f64,
    pub end_value: f64,
    pub easing: Easing,
}

impl MotionEvent {
    #[inline(always)]
    fn value_at(&self, beat: f64) -> f64 {
        if beat >= self.end_beat {
            return self.end_value;
        }
        let span = self.end_beat - self.start_beat;
        let t = if span > 0.0 { (beat - self.start_beat) / span } else { 1.0 };
        if t <= 0.0 {
            return self.start_value;
        }
        self.start_value + (self.end_value - self.start_value) * self.easing.apply(t)
    }
}

/// The ordered, non-overlapping events of one channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionTrack {
    events: Vec<MotionEvent>,
}

impl MotionTrack {
    pub(crate) fn new(events: Vec<MotionEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[MotionEvent] {
        &self.events
    }

    /// Value at `beat`, or `None` if the track is empty.
    ///
    /// Before the first event: its start value. Past an event's end (gaps and
    /// after the last event): that event's end value.
    pub fn value_at(&self, beat: f64) -> Option<f64> {
        let first = self.events.first()?;
        let idx = self.events.partition_point(|e| e.start_beat <= beat);
        if idx == 0 {
            return Some(first.start_value);
        }
        Some(self.events[idx - 1].value_at(beat))
    }
}

/// A line's position (stage fractions), rotation (degrees, counter-clockwise)
/// and opacity at one beat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineTransform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for LineTransform {
    fn default() -> Self {
        Self {
            x: Channel::X.default_value(),
            y: Channel::Y.default_value(),
            rotation: Channel::Rotation.default_value(),
            opacity: Channel::Opacity.default_value(),
        }
    }
}

impl LineTransform {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::X => self.x,
            Channel::Y => self.y,
            Channel::Rotation => self.rotation,
            Channel::Opacity => self.opacity,
        }
    }
}

/// The four independent motion tracks of a line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineMotion {
    tracks: [MotionTrack; 4],
}

impl LineMotion {
    pub(crate) fn new(tracks: [MotionTrack; 4]) -> Self {
        Self { tracks }
    }

    pub fn track(&self, channel: Channel) -> &MotionTrack {
        &self.tracks[channel.index()]
    }

    pub fn transform_at(&self, beat: f64) -> LineTransform {
        let eval = |c: Channel| self.track(c).value_at(beat).unwrap_or(c.default_value());
        LineTransform {
            x: eval(Channel::X),
            y: eval(Channel::Y),
            rotation: eval(Channel::Rotation),
            opacity: eval(Channel::Opacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ease::EasingRegistry;

    fn ev(start_beat: f64, end_beat: f64, start_value: f64, end_value: f64) -> MotionEvent {
        MotionEvent { start_beat, end_beat, start_value, end_value, easing: Easing::LINEAR }
    }

    #[test]
    fn empty_track_falls_back_to_channel_default() {
        let motion = LineMotion::default();
        assert_eq!(motion.transform_at(12.0), LineTransform::default());
    }

    #[test]
    fn flat_extrapolation_on_both_sides() {
        let track = MotionTrack::new(vec![ev(2.0, 4.0, 10.0, 20.0)]);
        assert_eq!(track.value_at(-5.0), Some(10.0));
        assert_eq!(track.value_at(1.99), Some(10.0));
        assert_eq!(track.value_at(3.0), Some(15.0));
        assert_eq!(track.value_at(4.0), Some(20.0));
        assert_eq!(track.value_at(400.0), Some(20.0));
    }

    #[test]
    fn gaps_hold_the_previous_end_value() {
        let track = MotionTrack::new(vec![ev(0.0, 1.0, 0.0, 1.0), ev(3.0, 4.0, 5.0, 6.0)]);
        assert_eq!(track.value_at(2.0), Some(1.0));
        assert_eq!(track.value_at(3.0), Some(5.0));
    }

    #[test]
    fn zero_length_event_is_an_instant_set() {
        let track = MotionTrack::new(vec![ev(0.0, 2.0, 0.0, 1.0), ev(2.0, 2.0, 9.0, -9.0)]);
        assert_eq!(track.value_at(2.0), Some(-9.0));
        assert_eq!(track.value_at(1.0), Some(0.5));
    }

    #[test]
    fn easing_shapes_the_interpolation() {
        let quad = EasingRegistry::with_builtins().get("easeInQuad").unwrap();
        let track = MotionTrack::new(vec![MotionEvent { easing: quad, ..ev(0.0, 2.0, 0.0, 100.0) }]);
        assert_eq!(track.value_at(1.0), Some(25.0));
    }

    #[test]
    fn channels_are_independent() {
        let motion = LineMotion::new([
            MotionTrack::new(vec![ev(0.0, 4.0, 0.0, 1.0)]),
            MotionTrack::default(),
            MotionTrack::new(vec![ev(2.0, 6.0, 0.0, 90.0)]),
            MotionTrack::new(vec![ev(0.0, 1.0, 1.0, 0.0)]),
        ]);
        let t = motion.transform_at(4.0);
        assert_eq!(t.x, 1.0);
        assert_eq!(t.y, config::DEFAULT_LINE_Y);
        assert_eq!(t.rotation, 45.0);
        assert_eq!(t.opacity, 0.0);
        assert_eq!(t.get(Channel::Rotation), 45.0);
    }
}
