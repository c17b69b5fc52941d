use crate::config::Config;
use crate::core::clock::PlaybackClock;
use crate::core::gfx::RenderSink;
use crate::game::chart::Chart;
use crate::game::scheduler::{FrameScheduler, FrameSnapshot};
use log::info;
use std::error::Error;
use std::sync::Arc;

/// One playback of one chart: the chart, its clock and its frame scheduler.
pub struct Session {
    chart: Arc<Chart>,
    clock: PlaybackClock,
    scheduler: FrameScheduler,
    hit_effect_duration_sec: f64,
}

impl Session {
    pub fn new(chart: impl Into<Arc<Chart>>, cfg: &Config) -> Self {
        let chart = chart.into();
        let clock = PlaybackClock::new(
            -cfg.lead_in_seconds,
            cfg.resync_threshold_seconds,
            cfg.drift_correction,
        );
        let scheduler = FrameScheduler::new(Arc::clone(&chart), cfg);
        let session = Self {
            chart,
            clock,
            scheduler,
            hit_effect_duration_sec: cfg.hit_effect_duration_seconds,
        };
        info!(
            "Session ready: {} lines, {} notes, {:.2}s long, lead-in {:.2}s.",
            session.chart.lines().len(),
            session.chart.note_count(),
            session.duration_seconds(),
            cfg.lead_in_seconds
        );
        session
    }

    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Runs one frame at the clock's current time.
    pub fn frame(&mut self, sink: &mut dyn RenderSink) -> Result<&FrameSnapshot, Box<dyn Error>> {
        self.scheduler.tick(&self.clock, sink)
    }

    /// Audio time at which the last note has ended and its effect has faded.
    pub fn duration_seconds(&self) -> f64 {
        let last_beat = self.chart.last_note_beat().unwrap_or(0.0);
        self.scheduler.timing().time_at(last_beat) + self.hit_effect_duration_sec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gfx::RenderList;

    struct Discard;
    impl RenderSink for Discard {
        fn submit(&mut self, _list: &RenderList) -> Result<(), Box<dyn Error>> {
            Ok(())
        }
    }

    fn chart() -> Chart {
        Chart::from_json_str(
            r#"{ "tempo": [{ "startBeat": 0, "bpm": 120 }],
                 "lines": [{ "id": 0,
                             "speedEvents": [{ "startBeat": 0, "speed": 1 }],
                             "notes": [{ "type": "hold", "triggerBeat": 2, "holdEndBeat": 6 }] }] }"#,
        )
        .unwrap()
    }

    #[test]
    fn starts_in_lead_in_and_reports_duration() {
        let cfg = Config { lead_in_seconds: 2.0, hit_effect_duration_seconds: 0.5, ..Config::default() };
        let session = Session::new(chart(), &cfg);
        assert_eq!(session.clock().time(), -2.0);
        assert_eq!(session.duration_seconds(), 3.5);
    }

    #[test]
    fn frame_follows_the_clock() {
        let mut session = Session::new(chart(), &Config::default());
        session.clock_mut().seek(1.5);
        let snap = session.frame(&mut Discard).unwrap();
        assert_eq!(snap.beat, 3.0);
        assert_eq!(snap.notes[0].hold_progress, 0.25);
    }

    #[test]
    fn errors_from_the_sink_propagate() {
        struct Broken;
        impl RenderSink for Broken {
            fn submit(&mut self, _list: &RenderList) -> Result<(), Box<dyn Error>> {
                Err("device lost".into())
            }
        }
        let mut session = Session::new(chart(), &Config::default());
        let err = session.frame(&mut Broken).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("device lost"));
    }
}
