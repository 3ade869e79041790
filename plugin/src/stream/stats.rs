use std::fmt;
use std::time::{Duration, Instant};

/// Length of one counting window.
pub const STATS_WINDOW: Duration = Duration::from_secs(1);

/// Per-second counters for received and presented frames.
#[derive(Clone, Debug)]
pub struct FrameStats {
    window_start: Instant,
    frames_received: u32,
    frames_drawn: u32,
    kilobytes_received: f64,
    render_time: Duration,
}

/// Counters for one completed window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received_fps: u32,
    pub drawn_fps: u32,
    pub bandwidth_kbits: u64,
    pub average_frame_kb: u64,
    /// `None` when nothing was presented during the window.
    pub average_render_ms: Option<u64>,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames_received: 0,
            frames_drawn: 0,
            kilobytes_received: 0.0,
            render_time: Duration::ZERO,
        }
    }

    pub fn record_received(&mut self, encoded_len: usize) {
        self.frames_received += 1;
        self.kilobytes_received += encoded_len as f64 / 1024.0;
    }

    /// Count a presented frame and how long it took from socket to screen.
    pub fn record_drawn(&mut self, render_time: Duration) {
        self.frames_drawn += 1;
        self.render_time += render_time;
    }

    /// Close the window if it has run for at least [`STATS_WINDOW`].
    pub fn roll(&mut self, now: Instant) -> Option<StatsSnapshot> {
        if now.saturating_duration_since(self.window_start) < STATS_WINDOW {
            return None;
        }

        let average_frame_kb = if self.frames_received > 0 {
            (self.kilobytes_received / self.frames_received as f64) as u64
        } else {
            0
        };
        let average_render_ms = (self.frames_drawn > 0)
            .then(|| self.render_time.as_millis() as u64 / self.frames_drawn as u64);

        let snapshot = StatsSnapshot {
            received_fps: self.frames_received,
            drawn_fps: self.frames_drawn,
            bandwidth_kbits: (self.kilobytes_received * 8.0) as u64,
            average_frame_kb,
            average_render_ms,
        };

        *self = Self::new(now);
        Some(snapshot)
    }
}

impl StatsSnapshot {
    pub fn fps_label(&self) -> String {
        format!("FPS: {}", self.received_fps)
    }

    pub fn drawn_label(&self) -> String {
        format!("Drawn FPS : {}", self.drawn_fps)
    }

    pub fn bandwidth_label(&self) -> String {
        format!("Bandwith: {} kbit/s", self.bandwidth_kbits)
    }

    pub fn frame_size_label(&self) -> String {
        format!("Average image size: {}", self.average_frame_kb)
    }

    pub fn render_time_label(&self) -> String {
        match self.average_render_ms {
            Some(ms) => format!("Average time to render to dom : {}", ms),
            None => "Average time to render to dom : -".to_string(),
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fps received, {} drawn, {} kbit/s, {} KB/frame",
            self.received_fps, self.drawn_fps, self.bandwidth_kbits, self.average_frame_kb
        )?;
        if let Some(ms) = self.average_render_ms {
            write!(f, ", {} ms to screen", ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_not_elapsed() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        stats.record_received(2048);
        assert_eq!(stats.roll(start + Duration::from_millis(999)), None);
    }

    #[test]
    fn test_roll_computes_rates() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for _ in 0..3 {
            stats.record_received(10 * 1024);
        }
        stats.record_drawn(Duration::from_millis(4));
        stats.record_drawn(Duration::from_millis(9));

        let snapshot = stats.roll(start + STATS_WINDOW).unwrap();
        assert_eq!(
            snapshot,
            StatsSnapshot {
                received_fps: 3,
                drawn_fps: 2,
                bandwidth_kbits: 240,
                average_frame_kb: 10,
                average_render_ms: Some(6),
            }
        );
        assert_eq!(snapshot.bandwidth_label(), "Bandwith: 240 kbit/s");
        assert_eq!(snapshot.drawn_label(), "Drawn FPS : 2");
    }

    #[test]
    fn test_roll_resets_counters() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        stats.record_received(512);
        let later = start + Duration::from_millis(1500);
        assert!(stats.roll(later).is_some());

        let snapshot = stats.roll(later + STATS_WINDOW).unwrap();
        assert_eq!(snapshot, StatsSnapshot::default());
        assert_eq!(snapshot.render_time_label(), "Average time to render to dom : -");
    }

    #[test]
    fn test_bandwidth_truncates() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        // 1.5 KB -> 12 kbit, 700 B -> ~5.47 kbit
        stats.record_received(1536);
        stats.record_received(700);
        let snapshot = stats.roll(start + STATS_WINDOW).unwrap();
        assert_eq!(snapshot.bandwidth_kbits, 17);
        assert_eq!(snapshot.average_frame_kb, 1);
    }
}
