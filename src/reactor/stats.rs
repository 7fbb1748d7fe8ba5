//! Rolling timing statistics for the reactor.

use std::collections::VecDeque;

/// How many samples each rolling window keeps.
pub const WINDOW: usize = 20;

/// Per-tick timing windows and lifetime counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactorStats {
    run_times: VecDeque<u32>,
    render_intervals: VecDeque<u32>,
    /// Ticks run.
    pub ticks: u64,
    /// Frames handed to the display pipeline.
    pub frames_drawn: u64,
    /// Draws skipped because the previous frame was still in flight.
    pub frames_skipped: u64,
    /// Ticks whose processing exceeded the tick interval.
    pub overruns: u64,
    /// Ticks cut short by a panicking responder or processor.
    pub failures: u64,
}

fn push_window(window: &mut VecDeque<u32>, value: u32) {
    if window.len() == WINDOW {
        window.pop_front();
    }
    window.push_back(value);
}

fn mean(window: &VecDeque<u32>) -> Option<f32> {
    if window.is_empty() {
        return None;
    }
    let total: u64 = window.iter().map(|&v| u64::from(v)).sum();
    Some(total as f32 / window.len() as f32)
}

impl ReactorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how long one tick's processing took.
    pub fn record_run_time(&mut self, ms: u32) {
        push_window(&mut self.run_times, ms);
    }

    /// Record the time between two consecutive drawn frames.
    pub fn record_render_interval(&mut self, ms: u32) {
        push_window(&mut self.render_intervals, ms);
    }

    /// The last [`WINDOW`] run times, oldest first.
    pub fn run_times(&self) -> impl Iterator<Item = u32> + '_ {
        self.run_times.iter().copied()
    }

    /// The last [`WINDOW`] render intervals, oldest first.
    pub fn render_intervals(&self) -> impl Iterator<Item = u32> + '_ {
        self.render_intervals.iter().copied()
    }

    /// Mean processing time per tick, `None` before the first tick.
    pub fn average_tick_ms(&self) -> Option<f32> {
        mean(&self.run_times)
    }

    /// Frames per second over the render window.
    pub fn fps(&self) -> Option<f32> {
        mean(&self.render_intervals)
            .filter(|&ms| ms > 0.0)
            .map(|ms| 1000.0 / ms)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_keep_last_twenty() {
        let mut stats = ReactorStats::new();
        for ms in 0..25 {
            stats.record_run_time(ms);
        }
        let kept: Vec<u32> = stats.run_times().collect();
        assert_eq!(kept.len(), WINDOW);
        assert_eq!(kept[0], 5);
        assert_eq!(kept[WINDOW - 1], 24);
    }

    #[test]
    fn averages() {
        let mut stats = ReactorStats::new();
        assert_eq!(stats.average_tick_ms(), None);
        assert_eq!(stats.fps(), None);
        stats.record_run_time(4);
        stats.record_run_time(6);
        stats.record_render_interval(20);
        stats.record_render_interval(20);
        assert_eq!(stats.average_tick_ms(), Some(5.0));
        assert_eq!(stats.fps(), Some(50.0));
    }

    #[test]
    fn zero_intervals_have_no_fps() {
        let mut stats = ReactorStats::new();
        stats.record_render_interval(0);
        assert_eq!(stats.fps(), None);
        assert_eq!(stats.render_intervals().count(), 1);
    }
}
