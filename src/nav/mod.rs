//! Navigation: the view stack, transitions and deferred requests.

pub mod manager;
pub mod navigator;
pub mod transition;

pub use manager::{NavError, ViewManager, DEFAULT_TRANSITION_MS};
pub use navigator::{NavRequest, Navigator};
pub use transition::{NavPhase, Transition, TransitionKind};
