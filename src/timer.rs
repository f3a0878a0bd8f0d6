use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameTimingStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Monotonic clock used to timestamp frames and keypresses
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: Vec<Duration>,
    pub max_samples: usize,
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Nanoseconds since the timer was created
    pub fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    pub fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    pub fn frame_stats(&self) -> FrameTimingStats {
        frame_stats(&self.frame_times)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean, standard deviation and range over a window of frame durations
pub fn frame_stats(frame_times: &[Duration]) -> FrameTimingStats {
    if frame_times.is_empty() {
        return FrameTimingStats {
            samples: 0,
            average_frame_time_ns: 0.0,
            jitter_ns: 0.0,
            min_frame_time_ns: 0.0,
            max_frame_time_ns: 0.0,
            effective_fps: 0.0,
        };
    }
    let times: Vec<f64> = frame_times.iter().map(|d| d.as_nanos() as f64).collect();
    let avg = times.iter().sum::<f64>() / times.len() as f64;
    let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
    let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    FrameTimingStats {
        samples: times.len(),
        average_frame_time_ns: avg,
        jitter_ns: var.sqrt(),
        min_frame_time_ns: min,
        max_frame_time_ns: max,
        effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_constant_frames_have_no_jitter() {
        let frames = vec![Duration::from_micros(16_667); 10];
        let stats = frame_stats(&frames);
        assert_eq!(stats.samples, 10);
        assert_eq!(stats.jitter_ns, 0.0);
        assert_eq!(stats.min_frame_time_ns, stats.max_frame_time_ns);
        assert!((stats.effective_fps - 60.0).abs() < 0.01);
    }

    #[test]
    fn empty_window_reports_zeroes() {
        let stats = frame_stats(&[]);
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.effective_fps, 0.0);
    }

    #[test]
    fn frame_window_is_bounded() {
        let mut timer = HighPrecisionTimer::new();
        timer.max_samples = 3;
        for ms in 1..=5 {
            timer.record_frame(Duration::from_millis(ms));
        }
        assert_eq!(timer.frame_count(), 3);
        assert_eq!(timer.frame_times[0], Duration::from_millis(3));
    }

    #[test]
    fn clock_is_monotonic() {
        let timer = HighPrecisionTimer::new();
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
    }

    #[test]
    fn elapsed_of_a_future_timestamp_saturates() {
        let timer = HighPrecisionTimer::new();
        assert_eq!(timer.elapsed(u64::MAX), Duration::ZERO);
    }
}
