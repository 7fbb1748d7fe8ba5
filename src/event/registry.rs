//! The event registry: a condition → action dispatch table.
//!
//! Events are independent of views. A view typically allocates a group when
//! it enters the foreground, registers its events and timers under that
//! group, and removes the whole group when it leaves.
//!
//! Dispatch iterates a snapshot of event ids and re-checks each id before
//! calling it, and actions never see the registry, so the table cannot be
//! mutated underneath an iteration.

use std::fmt;

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use super::condition::Condition;
use super::payload::Payload;
use super::timer::Sequencer;
use crate::input::{Direction, InputSnapshot, Switch};

new_key_type! {
    /// Handle to a registered event.
    pub struct EventId;
    /// Handle to a registered timer.
    pub struct TimerId;
}

/// Identifies a set of events and timers removed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u32);

/// Callback run when an event's condition holds.
pub type Action = Box<dyn FnMut(&Payload)>;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A registered condition → action pair.
pub struct Event {
    name: String,
    group: Option<GroupId>,
    condition: Condition,
    action: Action,
    enabled: bool,
}

impl Event {
    /// Create an enabled event.
    pub fn new(
        name: impl Into<String>,
        condition: Condition,
        action: impl FnMut(&Payload) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            group: None,
            condition,
            action: Box::new(action),
            enabled: true,
        }
    }

    /// Put the event in a group.
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Register the event disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("condition", &self.condition)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Token returned by [`EventRegistry::capture`].
///
/// Hand it back to [`EventRegistry::release`] to end the capture.
#[must_use = "a capture is only ended by passing the token to `release`"]
#[derive(Debug)]
pub struct Capture {
    owner: GroupId,
    disabled: Vec<EventId>,
}

impl Capture {
    /// The group that owns the capture.
    pub fn owner(&self) -> GroupId {
        self.owner
    }
}

// ---------------------------------------------------------------------------
// EventRegistry
// ---------------------------------------------------------------------------

/// The dispatch table.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: SlotMap<EventId, Event>,
    timers: SlotMap<TimerId, Sequencer>,
    next_group: u32,
}

impl EventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh group id.
    pub fn new_group(&mut self) -> GroupId {
        self.next_group += 1;
        GroupId(self.next_group)
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Add an event to the table.
    pub fn register(&mut self, event: Event) -> EventId {
        debug!(name = %event.name, group = ?event.group, "event registered");
        self.events.insert(event)
    }

    /// Enable or disable an event. Returns `false` for unknown ids.
    pub fn set_enabled(&mut self, id: EventId, enabled: bool) -> bool {
        match self.events.get_mut(id) {
            Some(event) => {
                event.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Look up an event.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.contains_key(id)
    }

    /// Remove one event. Returns `false` for unknown ids.
    pub fn remove(&mut self, id: EventId) -> bool {
        self.events.remove(id).is_some()
    }

    /// Remove every event and timer in `group`. Returns how many were
    /// removed.
    pub fn remove_group(&mut self, group: GroupId) -> usize {
        let before = self.events.len() + self.timers.len();
        self.events.retain(|_, event| event.group != Some(group));
        self.timers.retain(|_, timer| timer.group != Some(group));
        let removed = before - self.events.len() - self.timers.len();
        debug!(?group, removed, "group removed");
        removed
    }

    /// Number of registered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timers.is_empty()
    }

    /// Offer `payload` to every enabled event. Returns how many fired.
    pub fn dispatch(&mut self, payload: &Payload) -> usize {
        let ids: Vec<EventId> = self
            .events
            .iter()
            .filter(|(_, event)| event.enabled)
            .map(|(id, _)| id)
            .collect();
        let mut fired = 0;
        for id in ids {
            let Some(event) = self.events.get_mut(id) else {
                continue;
            };
            if event.enabled && event.condition.matches(payload) {
                trace!(name = %event.name, kind = payload.kind(), "event fired");
                (event.action)(payload);
                fired += 1;
            }
        }
        fired
    }

    /// Turn a tick's input into `button` and `touch` payloads and dispatch
    /// them: one per switch button, then one per petal.
    pub fn pump_input(&mut self, input: &InputSnapshot) -> usize {
        if self.events.is_empty() {
            return 0;
        }
        let mut fired = 0;
        for switch in Switch::ALL {
            for button in Direction::ALL {
                let state = input.buttons.button(switch, button);
                fired += self.dispatch(&Payload::Button {
                    switch,
                    button,
                    pressed: state.down,
                    change: state.pressed || state.released,
                });
            }
        }
        for petal in &input.petals {
            fired += self.dispatch(&Payload::Touch {
                zone: petal.index,
                pressed: petal.down,
                change: petal.pressed || petal.released,
                pressure: petal.pressure,
                radius: petal.position.rad,
                angle: petal.position.phi,
            });
        }
        fired
    }

    // ── Modal capture ────────────────────────────────────────────────

    /// Disable every enabled event that could receive `kind` payloads and
    /// is not in `owner`.
    ///
    /// Events whose condition does not pin a payload kind count as
    /// receiving every kind.
    pub fn capture(&mut self, kind: &str, owner: GroupId) -> Capture {
        let mut disabled = Vec::new();
        for (id, event) in self.events.iter_mut() {
            if !event.enabled || event.group == Some(owner) {
                continue;
            }
            if event.condition.kind_hint().is_none_or(|hint| hint == kind) {
                event.enabled = false;
                disabled.push(id);
            }
        }
        debug!(kind, ?owner, disabled = disabled.len(), "input captured");
        Capture { owner, disabled }
    }

    /// End a capture: remove the owner's group and re-enable exactly the
    /// events the capture disabled.
    pub fn release(&mut self, capture: Capture) {
        self.remove_group(capture.owner);
        for id in capture.disabled {
            if let Some(event) = self.events.get_mut(id) {
                event.enabled = true;
            }
        }
    }

    // ── Timers ───────────────────────────────────────────────────────

    /// Start a timer.
    pub fn add_timer(&mut self, timer: Sequencer) -> TimerId {
        debug!(name = timer.name(), period_ms = timer.period_ms(), "timer added");
        self.timers.insert(timer)
    }

    /// Look up a timer.
    pub fn timer(&self, id: TimerId) -> Option<&Sequencer> {
        self.timers.get(id)
    }

    /// Stop a timer. Returns `false` for unknown ids.
    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Number of running timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Advance every timer by `delta_ms` and dispatch a `timer` payload for
    /// each one that fired. Returns how many timers fired.
    ///
    /// Every timer advances first. Hard-synced timers are then realigned to
    /// their reference if it fired this tick, references before dependents,
    /// so chains settle together. Timers that used up their repeat count are
    /// removed.
    pub fn advance_timers(&mut self, delta_ms: u32) -> usize {
        if self.timers.is_empty() {
            return 0;
        }
        let delta = f64::from(delta_ms);
        let mut payloads = Vec::new();
        let mut reference_phase = Vec::new();
        let mut fired_synced = Vec::new();

        let (free, mut pending): (Vec<TimerId>, Vec<TimerId>) = self
            .timers
            .keys()
            .partition(|&id| self.timers[id].sync.is_none());

        for id in free.iter().chain(pending.iter()).copied() {
            if let Some(timer) = self.timers.get_mut(id) {
                if let Some(late) = timer.advance(delta) {
                    if timer.sync.is_none() {
                        reference_phase.push((id, timer.phase_ms()));
                    } else {
                        fired_synced.push(id);
                    }
                    payloads.push(timer_payload(timer, late));
                }
            }
        }

        // Realign synced timers once their reference has settled, so a chain
        // of hard-synced timers locks in a single tick.
        let mut settled = free;
        while !pending.is_empty() {
            let ready = pending.iter().position(|&id| {
                self.timers
                    .get(id)
                    .and_then(|timer| timer.sync)
                    .map_or(true, |r| settled.contains(&r) || !self.timers.contains_key(r))
            });
            if ready.is_none() {
                debug!(remaining = pending.len(), "hard-sync cycle, realigning in key order");
            }
            let id = pending.remove(ready.unwrap_or(0));
            settled.push(id);
            let Some(timer) = self.timers.get_mut(id) else {
                continue;
            };
            let reference = timer.sync;
            if let Some(&(_, phase)) = reference_phase.iter().find(|(r, _)| Some(*r) == reference)
            {
                timer.align(phase);
            }
            if fired_synced.contains(&id) {
                reference_phase.push((id, timer.phase_ms()));
            }
        }

        self.timers.retain(|_, timer| {
            let keep = !timer.finished();
            if !keep {
                debug!(name = timer.name(), "timer finished");
            }
            keep
        });

        let fired = payloads.len();
        for payload in payloads {
            self.dispatch(&payload);
        }
        fired
    }
}

fn timer_payload(timer: &Sequencer, late_ms: f64) -> Payload {
    Payload::Timer {
        name: timer.name().to_owned(),
        step: timer.step(),
        late_ms: late_ms as f32,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Value;
    use crate::input::{InputGatherer, RawInput, RawPetal, SwitchPosition};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&Payload) + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = count.clone();
        (count, move |_: &Payload| handle.set(handle.get() + 1))
    }

    fn touch(zone: u8, pressed: bool) -> Payload {
        Payload::Touch {
            zone,
            pressed,
            change: true,
            pressure: 0,
            radius: 0.0,
            angle: 0.0,
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    #[test]
    fn touch_condition_fires_once_per_dispatch() {
        let mut reg = EventRegistry::new();
        let (count, action) = counter();
        reg.register(Event::new(
            "touched",
            Condition::parse(r#"type == "touch" and pressed"#).unwrap(),
            action,
        ));
        assert_eq!(reg.dispatch(&touch(3, true)), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(reg.dispatch(&touch(3, false)), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn disabled_events_do_not_fire() {
        let mut reg = EventRegistry::new();
        let (count, action) = counter();
        let id = reg.register(Event::new("any", Condition::Always, action));
        assert!(reg.set_enabled(id, false));
        reg.dispatch(&touch(0, true));
        assert_eq!(count.get(), 0);
        reg.set_enabled(id, true);
        reg.dispatch(&touch(0, true));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn removed_group_never_fires_again() {
        let mut reg = EventRegistry::new();
        let group = reg.new_group();
        let (count, action) = counter();
        reg.register(Event::new("a", Condition::Always, action).group(group));
        reg.add_timer(Sequencer::interval("t", 10.0).unwrap().group(group));
        assert_eq!(reg.remove_group(group), 2);
        reg.dispatch(&touch(0, true));
        assert_eq!(reg.advance_timers(100), 0);
        assert_eq!(count.get(), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_unknown_id_is_false() {
        let mut reg = EventRegistry::new();
        let id = reg.register(Event::new("a", Condition::Always, |_: &Payload| {}));
        assert!(reg.remove(id));
        assert!(!reg.remove(id));
        assert!(!reg.set_enabled(id, true));
    }

    // ── Input pump ───────────────────────────────────────────────────

    #[test]
    fn pump_emits_button_and_touch_payloads() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut reg = EventRegistry::new();
        reg.register(Event::new("all", Condition::truthy("change"), move |p: &Payload| {
            log.borrow_mut().push(p.clone());
        }));

        let mut gatherer = InputGatherer::new();
        let mut raw = RawInput {
            app: SwitchPosition::Left,
            ..RawInput::default()
        };
        raw.petals[5] = RawPetal {
            pressed: true,
            pressure: 900,
            rad: 0.25,
            phi: 0.5,
        };
        let snapshot = gatherer.gather(raw, 20);
        assert_eq!(reg.pump_input(&snapshot), 2);
        assert_eq!(
            seen.borrow()[0],
            Payload::Button {
                switch: Switch::App,
                button: Direction::Left,
                pressed: true,
                change: true,
            }
        );
        assert_eq!(
            seen.borrow()[1],
            Payload::Touch {
                zone: 5,
                pressed: true,
                change: true,
                pressure: 900,
                radius: 0.25,
                angle: 0.5,
            }
        );

        // Held without change: nothing with `change` fires.
        let snapshot = gatherer.gather(raw, 20);
        assert_eq!(reg.pump_input(&snapshot), 0);
    }

    // ── Capture ──────────────────────────────────────────────────────

    #[test]
    fn capture_disables_others_and_release_restores() {
        let mut reg = EventRegistry::new();
        let (touch_count, touch_action) = counter();
        let (timer_count, timer_action) = counter();
        let (modal_count, modal_action) = counter();
        let touch_id = reg.register(Event::new("t", Condition::kind("touch"), touch_action));
        let already_off =
            reg.register(Event::new("off", Condition::kind("touch"), |_: &Payload| {}).disabled());
        reg.register(Event::new("tm", Condition::kind("timer"), timer_action));

        let owner = reg.new_group();
        reg.register(Event::new("modal", Condition::kind("touch"), modal_action).group(owner));
        let capture = reg.capture("touch", owner);
        reg.dispatch(&touch(1, true));
        reg.dispatch(&Payload::Timer {
            name: "x".into(),
            step: 0,
            late_ms: 0.0,
        });
        assert_eq!(touch_count.get(), 0);
        assert_eq!(modal_count.get(), 1);
        assert_eq!(timer_count.get(), 1);

        reg.release(capture);
        assert_eq!(reg.get(touch_id).map(Event::is_enabled), Some(true));
        // Was disabled before the capture and stays that way.
        assert_eq!(reg.get(already_off).map(Event::is_enabled), Some(false));
        reg.dispatch(&touch(1, true));
        assert_eq!(touch_count.get(), 1);
        assert_eq!(modal_count.get(), 1);
    }

    // ── Timers ───────────────────────────────────────────────────────

    #[test]
    fn timer_payloads_are_dispatched() {
        let steps = Rc::new(RefCell::new(Vec::new()));
        let log = steps.clone();
        let mut reg = EventRegistry::new();
        reg.register(Event::new(
            "beat",
            Condition::parse(r#"type == "timer" and name == beat"#).unwrap(),
            move |p: &Payload| {
                if let Some(step) = p.field("step") {
                    log.borrow_mut().push(step);
                }
            },
        ));
        reg.add_timer(Sequencer::interval("beat", 40.0).unwrap().steps(2));
        for _ in 0..8 {
            reg.advance_timers(20);
        }
        assert_eq!(
            *steps.borrow(),
            vec![Value::Int(0), Value::Int(1), Value::Int(0), Value::Int(1)]
        );
    }

    #[test]
    fn one_shot_unregisters() {
        let mut reg = EventRegistry::new();
        let id = reg.add_timer(Sequencer::interval("once", 20.0).unwrap().one_shot());
        assert_eq!(reg.advance_timers(20), 1);
        assert!(reg.timer(id).is_none());
        assert_eq!(reg.advance_timers(20), 0);
    }

    #[test]
    fn repeat_n_unregisters_after_n() {
        let mut reg = EventRegistry::new();
        reg.add_timer(Sequencer::interval("thrice", 10.0).unwrap().repeat(3));
        let fired: usize = (0..10).map(|_| reg.advance_timers(10)).sum();
        assert_eq!(fired, 3);
        assert_eq!(reg.timer_count(), 0);
    }

    #[test]
    fn hard_sync_realigns_dependent() {
        let mut reg = EventRegistry::new();
        let reference = reg.add_timer(Sequencer::interval("bar", 100.0).unwrap());
        // Let the reference run for a while before the dependent starts.
        reg.advance_timers(30);
        let dependent = reg.add_timer(
            Sequencer::interval("beat", 50.0)
                .unwrap()
                .hard_sync(reference),
        );
        // t=100: the reference fires, the dependent fires 20 ms late and
        // is realigned to the reference.
        reg.advance_timers(70);
        assert_eq!(reg.timer(dependent).map(Sequencer::phase_ms), Some(0.0));
        // From here on the dependent fires with the reference.
        reg.advance_timers(50);
        assert_eq!(reg.timer(dependent).map(Sequencer::fired), Some(2));
        reg.advance_timers(50);
        assert_eq!(reg.timer(reference).map(Sequencer::fired), Some(2));
        assert_eq!(reg.timer(dependent).map(Sequencer::fired), Some(3));
        assert_eq!(reg.timer(dependent).map(Sequencer::phase_ms), Some(0.0));
    }

    #[test]
    fn chained_hard_sync_phase_locks() {
        let mut reg = EventRegistry::new();
        let a = reg.add_timer(Sequencer::interval("bar", 100.0).unwrap());
        let b = reg.add_timer(Sequencer::interval("beat", 40.0).unwrap().hard_sync(a));
        let c = reg.add_timer(Sequencer::interval("phrase", 1000.0).unwrap().hard_sync(b));
        // b fires on its own and c, synced to b, snaps to b's phase.
        assert_eq!(reg.advance_timers(40), 1);
        assert_eq!(reg.timer(b).map(Sequencer::fired), Some(1));
        assert_eq!(reg.timer(c).map(Sequencer::phase_ms), Some(0.0));
        // a fires at t=100: b realigns to a, c to b.
        reg.advance_timers(60);
        assert_eq!(reg.timer(a).map(Sequencer::fired), Some(1));
        assert_eq!(reg.timer(b).map(Sequencer::phase_ms), Some(0.0));
        assert_eq!(reg.timer(c).map(Sequencer::phase_ms), Some(0.0));
    }

    #[test]
    fn zero_delta_timer_advance() {
        let mut reg = EventRegistry::new();
        reg.add_timer(Sequencer::interval("t", 10.0).unwrap());
        assert_eq!(reg.advance_timers(0), 0);
    }
}
