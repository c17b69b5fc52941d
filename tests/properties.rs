use phichart::game::parsing::raw::{RawChart, RawLine, RawMotionEvent, RawSpeedEvent, RawTempoSegment};
use phichart::game::line::ALL_CHANNELS;
use phichart::Chart;
use proptest::prelude::*;

const EASINGS: &[&str] = &[
    "linear",
    "smoothstep",
    "easeInSine",
    "easeOutCubic",
    "easeInOutQuint",
    "easeOutExpo",
    "easeInCirc",
    "easeInOutBack",
    "easeOutElastic",
    "easeInOutBounce",
];

fn tempo_map() -> impl Strategy<Value = Vec<RawTempoSegment>> {
    prop::collection::vec((0.25f64..32.0, 30.0f64..400.0), 1..8).prop_map(|steps| {
        let mut start_beat = 0.0;
        steps
            .into_iter()
            .map(|(gap, bpm)| {
                let seg = RawTempoSegment { start_beat, bpm };
                start_beat += gap;
                seg
            })
            .collect()
    })
}

fn line(id: u32, speed_events: Vec<RawSpeedEvent>, motion_events: Vec<RawMotionEvent>) -> RawLine {
    RawLine { id, speed_events, motion_events, notes: vec![] }
}

fn chart(tempo: Vec<RawTempoSegment>, lines: Vec<RawLine>) -> Chart {
    Chart::load(RawChart { offset: 0.0, tempo, lines }).unwrap()
}

proptest! {
    #[test]
    fn beat_at_never_decreases(
        tempo in tempo_map(),
        offset in -2.0f64..2.0,
        a in -30.0f64..600.0,
        b in -30.0f64..600.0,
    ) {
        let chart = Chart::load(RawChart {
            offset,
            tempo,
            lines: vec![],
        }).unwrap();
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(chart.beat_at(early) <= chart.beat_at(late) + 1e-9);
    }

    #[test]
    fn time_at_inverts_beat_at(tempo in tempo_map(), t in 0.0f64..600.0) {
        let chart = chart(tempo, vec![]);
        let back = chart.time_at(chart.beat_at(t));
        prop_assert!((back - t).abs() < 1e-6, "{} -> {}", t, back);
    }

    #[test]
    fn constant_speed_position_is_exact(speed in -20.0f64..20.0, beat in -100.0f64..1000.0) {
        let chart = chart(
            vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            vec![line(0, vec![RawSpeedEvent { start_beat: 0.0, end_beat: None, speed }], vec![])],
        );
        prop_assert_eq!(chart.chart_position(0, beat), Some(speed * beat));
    }

    #[test]
    fn motion_endpoints_are_exact(
        start_beat in 0.0f64..100.0,
        length in 0.001f64..50.0,
        start in -1000.0f64..1000.0,
        end in -1000.0f64..1000.0,
        easing in prop::sample::select(EASINGS),
        channel in prop::sample::select(ALL_CHANNELS.to_vec()),
    ) {
        let end_beat = start_beat + length;
        let chart = chart(
            vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            vec![line(
                0,
                vec![RawSpeedEvent { start_beat: 0.0, end_beat: None, speed: 1.0 }],
                vec![RawMotionEvent { channel, start_beat, end_beat, start, end, easing: easing.to_string() }],
            )],
        );
        let at_start = chart.transform_at(0, start_beat).unwrap();
        let at_end = chart.transform_at(0, end_beat).unwrap();
        prop_assert_eq!(at_start.get(channel), start);
        prop_assert_eq!(at_end.get(channel), end);
    }

    #[test]
    fn piecewise_position_is_continuous(
        speeds in prop::collection::vec(-5.0f64..5.0, 1..6),
        probe in 0.0f64..40.0,
    ) {
        let n = speeds.len();
        let events: Vec<RawSpeedEvent> = speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| RawSpeedEvent {
                start_beat: i as f64 * 4.0,
                end_beat: if i + 1 == n { None } else { Some((i + 1) as f64 * 4.0) },
                speed,
            })
            .collect();
        let chart = chart(
            vec![RawTempoSegment { start_beat: 0.0, bpm: 120.0 }],
            vec![line(0, events, vec![])],
        );
        let eps = 1e-7;
        let left = chart.chart_position(0, probe - eps).unwrap();
        let right = chart.chart_position(0, probe + eps).unwrap();
        prop_assert!((right - left).abs() < 1e-5);
    }
}
