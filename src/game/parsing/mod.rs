pub mod phigros;
pub mod raw;

use crate::error::ChartError;
use log::debug;
use raw::RawChart;

/// Parses chart JSON in either the native layout or the official Phigros
/// layout. Documents with a top-level `formatVersion` key are official.
pub fn parse_chart_json(json: &str) -> Result<RawChart, ChartError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("formatVersion").is_some() {
        debug!("Detected official chart format.");
        return phigros::convert(value);
    }
    debug!("Detected native chart format.");
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::note::NoteKind;

    #[test]
    fn native_defaults_are_filled_in() {
        let raw = parse_chart_json(
            r#"{
                "tempo": [{ "startBeat": 0, "bpm": 150 }],
                "lines": [{
                    "id": 7,
                    "speedEvents": [{ "startBeat": 0, "speed": 1.5 }],
                    "motionEvents": [{ "channel": "opacity", "startBeat": 0, "endBeat": 1, "start": 0, "end": 1 }],
                    "notes": [{ "type": "flick", "triggerBeat": 2 }]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.offset, 0.0);
        let line = &raw.lines[0];
        assert_eq!(line.id, 7);
        assert_eq!(line.speed_events[0].end_beat, None);
        assert_eq!(line.motion_events[0].easing, "linear");
        assert_eq!(line.notes[0].kind, NoteKind::Flick);
        assert!(line.notes[0].above);
        assert_eq!(line.notes[0].lane, 0.0);
    }

    #[test]
    fn unknown_note_type_is_a_parse_error() {
        let err = parse_chart_json(
            r#"{ "tempo": [{ "startBeat": 0, "bpm": 150 }],
                 "lines": [{ "id": 0, "notes": [{ "type": "slide", "triggerBeat": 2 }] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Parse { .. }));
    }

    #[test]
    fn missing_tempo_is_a_parse_error() {
        let err = parse_chart_json(r#"{ "lines": [] }"#).unwrap_err();
        assert!(err.to_string().contains("tempo"));
    }
}
