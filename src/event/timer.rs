//! Tempo-driven timers.
//!
//! A [`Sequencer`] fires every `period_ms = 60000 / bpm / beat_div * beats`
//! milliseconds. It is advanced by the registry once per tick, fires at most
//! once per advance and keeps the leftover phase, so long-run timing does not
//! drift with tick jitter.

use super::registry::{GroupId, TimerId};

/// Errors from building a sequencer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimerError {
    #[error("{parameter} must be a positive finite number, got {value}")]
    InvalidTempo { parameter: &'static str, value: f32 },
}

fn positive(parameter: &'static str, value: f32) -> Result<f64, TimerError> {
    if value.is_finite() && value > 0.0 {
        Ok(f64::from(value))
    } else {
        Err(TimerError::InvalidTempo { parameter, value })
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// A periodic timer registered with the [`EventRegistry`](super::EventRegistry).
#[derive(Debug, Clone)]
pub struct Sequencer {
    name: String,
    period_ms: f64,
    /// Milliseconds since the last firing (or since creation).
    phase_ms: f64,
    /// `0` repeats forever, `n` removes the timer after `n` firings.
    repeat_count: u32,
    fired: u32,
    steps: Option<u32>,
    pub(crate) sync: Option<TimerId>,
    pub(crate) group: Option<GroupId>,
}

impl Sequencer {
    /// A timer firing once per `beats` beats at `bpm`, with `beat_div`
    /// subdivisions per beat.
    pub fn new(
        name: impl Into<String>,
        bpm: f32,
        beat_div: f32,
        beats: f32,
    ) -> Result<Self, TimerError> {
        let bpm = positive("bpm", bpm)?;
        let beat_div = positive("beat_div", beat_div)?;
        let beats = positive("beats", beats)?;
        Ok(Self::with_period(name.into(), 60_000.0 / bpm / beat_div * beats))
    }

    /// A timer firing every `period_ms` milliseconds.
    pub fn interval(name: impl Into<String>, period_ms: f32) -> Result<Self, TimerError> {
        let period = positive("period_ms", period_ms)?;
        Ok(Self::with_period(name.into(), period))
    }

    fn with_period(name: String, period_ms: f64) -> Self {
        Self {
            name,
            period_ms,
            phase_ms: 0.0,
            repeat_count: 0,
            fired: 0,
            steps: None,
            sync: None,
            group: None,
        }
    }

    /// Stop after `count` firings. `0` repeats forever.
    pub fn repeat(mut self, count: u32) -> Self {
        self.repeat_count = count;
        self
    }

    /// Fire once, then unregister.
    pub fn one_shot(self) -> Self {
        self.repeat(1)
    }

    /// Wrap the reported step number to `0..steps`.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = (steps > 0).then_some(steps);
        self
    }

    /// Phase-lock this timer to `reference`: whenever the reference fires,
    /// this timer's phase is realigned to the reference's.
    pub fn hard_sync(mut self, reference: TimerId) -> Self {
        self.sync = Some(reference);
        self
    }

    /// Put the timer in a group so `remove_group` removes it.
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Milliseconds since the last firing.
    pub fn phase_ms(&self) -> f64 {
        self.phase_ms
    }

    /// Number of times the timer has fired.
    pub fn fired(&self) -> u32 {
        self.fired
    }

    /// Step number of the most recent firing.
    pub fn step(&self) -> u32 {
        let step = self.fired.saturating_sub(1);
        match self.steps {
            Some(steps) => step % steps,
            None => step,
        }
    }

    /// Whether the timer has used up its repeat count.
    pub fn finished(&self) -> bool {
        self.repeat_count > 0 && self.fired >= self.repeat_count
    }

    /// Advance by `delta_ms`. Returns how late the firing is, in
    /// milliseconds, if the timer fired.
    pub(crate) fn advance(&mut self, delta_ms: f64) -> Option<f64> {
        if self.finished() {
            return None;
        }
        self.phase_ms += delta_ms;
        if self.phase_ms < self.period_ms {
            return None;
        }
        self.phase_ms = (self.phase_ms - self.period_ms) % self.period_ms;
        self.fired = self.fired.saturating_add(1);
        Some(self.phase_ms)
    }

    /// Realign to a reference timer's phase.
    pub(crate) fn align(&mut self, phase_ms: f64) {
        self.phase_ms = phase_ms % self.period_ms;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
