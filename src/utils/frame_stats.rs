use std::time::{Duration, Instant};

/// Ticks-per-second counter plus worst-frame tracking for a host loop.
pub struct FrameStats {
    last_update_time: Instant,
    frames_since_last_update: u32,
    total_frames: u64,
    worst_frame: Duration,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        FrameStats {
            last_update_time: now,
            frames_since_last_update: 0,
            total_frames: 0,
            worst_frame: Duration::ZERO,
        }
    }

    /// Records one frame that took `frame_time`. Returns `Some(ticks)` about once per second.
    pub fn record(&mut self, frame_time: Duration) -> Option<u32> {
        self.record_at(Instant::now(), frame_time)
    }

    pub fn record_at(&mut self, now: Instant, frame_time: Duration) -> Option<u32> {
        self.frames_since_last_update += 1;
        self.total_frames += 1;
        self.worst_frame = self.worst_frame.max(frame_time);

        if now.duration_since(self.last_update_time) < Duration::from_secs(1) {
            return None;
        }
        let ticks = self.frames_since_last_update;
        self.frames_since_last_update = 0;
        // Keep a steady one-second cadence unless we fell far behind.
        self.last_update_time += Duration::from_secs(1);
        if now.duration_since(self.last_update_time) > Duration::from_secs(1) {
            self.last_update_time = now;
        }
        Some(ticks)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn worst_frame(&self) -> Duration {
        self.worst_frame
    }
}
