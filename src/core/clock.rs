//! Playback clock: the single mutable piece of shared playback state.

use log::{debug, warn};
use serde::Serialize;

/// Copy of the clock taken once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub time: f64,
    pub paused: bool,
    pub rate: f64,
    /// Bumped by every seek; per-note latches are only valid within one generation.
    pub generation: u64,
}

/// Reports where the audio device actually is.
pub trait AudioTimeSource {
    fn current_audio_time_seconds(&self) -> f64;
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    resync_threshold_sec: f64,
    drift_correction: f64,
}

impl PlaybackClock {
    pub fn new(start_time: f64, resync_threshold_sec: f64, drift_correction: f64) -> Self {
        Self {
            state: PlaybackState { time: start_time, paused: false, rate: 1.0, generation: 0 },
            resync_threshold_sec: resync_threshold_sec.max(0.0),
            drift_correction: drift_correction.clamp(0.0, 1.0),
        }
    }

    #[inline(always)]
    pub fn snapshot(&self) -> PlaybackState {
        self.state
    }

    #[inline(always)]
    pub fn time(&self) -> f64 {
        self.state.time
    }

    pub fn advance(&mut self, delta_sec: f64) {
        if self.state.paused {
            return;
        }
        self.state.time += delta_sec * self.state.rate;
    }

    pub fn seek(&mut self, time: f64) {
        self.state.time = time;
        self.state.generation = self.state.generation.wrapping_add(1);
        debug!("Seek to {:.3}s (generation {}).", time, self.state.generation);
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.state.paused != paused {
            debug!("Playback {} at {:.3}s.", if paused { "paused" } else { "resumed" }, self.state.time);
        }
        self.state.paused = paused;
    }

    pub fn set_rate(&mut self, rate: f64) {
        if !rate.is_finite() || rate < 0.0 {
            warn!("Rejected playback rate {}; keeping {}.", rate, self.state.rate);
            return;
        }
        self.state.rate = rate;
    }

    /// Pulls the clock toward the audio device's time. Drift beyond the
    /// threshold seeks (new generation); anything else is slewed by
    /// `drift_correction`, so an in-sync clock never seeks.
    pub fn sync_to(&mut self, source: &impl AudioTimeSource) {
        if self.state.paused {
            return;
        }
        let audio = source.current_audio_time_seconds();
        if !audio.is_finite() {
            warn!("Audio source reported a non-finite time; ignoring.");
            return;
        }
        let drift = audio - self.state.time;
        if drift.abs() > self.resync_threshold_sec {
            debug!("Audio drift {:.4}s over threshold; resyncing.", drift);
            self.seek(audio);
        } else {
            self.state.time += drift * self.drift_correction;
        }
    }
}
