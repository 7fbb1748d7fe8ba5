//! Animated transitions between two views.

use crate::geometry::DISPLAY_WIDTH;
use crate::graphics::Graphics;
use crate::responder::Responder;

/// How two views are composited while one replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionKind {
    /// The new view slides in from the right.
    #[default]
    SwipeLeft,
    /// The new view slides in from the left.
    SwipeRight,
    /// The views cross-fade in place.
    Blend,
}

/// Which half of a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    /// No transition in flight.
    Idle,
    /// First half: the outgoing view still dominates.
    Leaving,
    /// Second half: the incoming view dominates.
    Entering,
}

/// Progress of one transition.
///
/// Progress is derived from elapsed time, so it is monotone and reaches
/// exactly `1.0` once `duration_ms` have passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    kind: TransitionKind,
    duration_ms: u32,
    elapsed_ms: u64,
    progress: f32,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration_ms: u32) -> Self {
        Self {
            kind,
            duration_ms,
            elapsed_ms: 0,
            progress: 0.0,
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// `Leaving` below half progress, `Entering` from there on.
    pub fn phase(&self) -> NavPhase {
        if self.progress < 0.5 {
            NavPhase::Leaving
        } else {
            NavPhase::Entering
        }
    }

    /// Advance by `delta_ms` and return the new progress.
    ///
    /// A zero duration completes on the first call, whatever the delta.
    pub fn advance(&mut self, delta_ms: u32) -> f32 {
        if self.duration_ms == 0 {
            self.progress = 1.0;
            return self.progress;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(u64::from(delta_ms));
        let duration = u64::from(self.duration_ms);
        self.progress = if self.elapsed_ms >= duration {
            1.0
        } else {
            (self.elapsed_ms as f64 / duration as f64) as f32
        };
        self.progress
    }

    /// Whether the outgoing view should still think this tick.
    ///
    /// Cross-fades keep both views live throughout. Swipes stop the
    /// outgoing view once the incoming one covers half the display.
    pub fn leaving_thinks(&self) -> bool {
        match self.kind {
            TransitionKind::Blend => true,
            TransitionKind::SwipeLeft | TransitionKind::SwipeRight => {
                self.phase() == NavPhase::Leaving
            }
        }
    }

    /// Draw `leaving` and `entering` at the current progress.
    pub fn draw<L, E>(&self, g: &mut Graphics, leaving: &L, entering: &E)
    where
        L: Responder + ?Sized,
        E: Responder + ?Sized,
    {
        let p = self.progress;
        match self.kind {
            TransitionKind::SwipeLeft | TransitionKind::SwipeRight => {
                let sign = if self.kind == TransitionKind::SwipeLeft {
                    -1.0
                } else {
                    1.0
                };
                g.scoped(|g| {
                    g.translate(sign * DISPLAY_WIDTH * p, 0.0);
                    leaving.draw(g);
                });
                g.scoped(|g| {
                    g.translate(-sign * DISPLAY_WIDTH * (1.0 - p), 0.0);
                    entering.draw(g);
                });
            }
            TransitionKind::Blend => {
                g.scoped(|g| {
                    g.multiply_alpha(1.0 - p);
                    leaving.draw(g);
                });
                g.scoped(|g| {
                    g.multiply_alpha(p);
                    entering.draw(g);
                });
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
