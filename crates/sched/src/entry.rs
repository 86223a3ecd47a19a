//! A single dispatch group: every subscriber sharing one ordering key.
//!
//! An entry keeps four disjoint live membership sets, one per phase, plus
//! two staging sets that are only touched while the loop is mid-tick.
//! Registering or unregistering outside a tick mutates the live sets
//! directly; mid-tick the change is staged and applied after the late
//! phase, so a callback can never mutate the set it is being iterated
//! from. A live counter tracks net membership so emptiness is testable
//! without walking the four sets.

use crate::phase::Phase;
use crate::subscriber::{subscriber_key, SubscriberRef};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// A named group of subscribers at one position in the update order.
pub struct LoopEntry {
    name: String,
    order: i32,
    permanent: bool,
    live: Cell<i64>,
    members: [RefCell<HashMap<usize, SubscriberRef>>; 4],
    pending_add: RefCell<HashMap<usize, SubscriberRef>>,
    pending_remove: RefCell<HashSet<usize>>,
}

impl LoopEntry {
    fn new(name: impl Into<String>, order: i32, permanent: bool) -> Self {
        Self {
            name: name.into(),
            order,
            permanent,
            live: Cell::new(0),
            members: Default::default(),
            pending_add: RefCell::new(HashMap::new()),
            pending_remove: RefCell::new(HashSet::new()),
        }
    }

    /// An entry exempt from pruning; use for deliberately installed
    /// orders that must survive being momentarily empty.
    pub fn permanent(name: impl Into<String>, order: i32) -> Self {
        Self::new(name, order, true)
    }

    /// An entry removed automatically once empty (when pruning is on).
    pub fn transient(name: impl Into<String>, order: i32) -> Self {
        Self::new(name, order, false)
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordering key, unique within an [`UpdateLoop`](crate::UpdateLoop).
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether the entry is exempt from pruning.
    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    /// True iff the net registered subscriber count is zero.
    pub fn is_empty(&self) -> bool {
        self.live.get() == 0
    }

    /// Net registered subscriber count (registrations minus removals),
    /// including memberships still staged for this tick.
    pub fn subscriber_count(&self) -> i64 {
        self.live.get()
    }

    /// Invoke the phase callback on every valid member of `phase`.
    ///
    /// Iterates a snapshot of the live set; mid-tick mutations only touch
    /// the staging sets, so the snapshot stays consistent for the whole
    /// pass. A failing subscriber is reported and its siblings still run.
    pub(crate) fn execute(&self, phase: Phase) {
        let snapshot: Vec<SubscriberRef> = self.members[phase.index()]
            .borrow()
            .values()
            .cloned()
            .collect();
        for sub in snapshot {
            if !sub.validity().is_valid() {
                continue;
            }
            let result = match phase {
                Phase::Fixed => sub.fixed_update(),
                Phase::Early => sub.early_update(),
                Phase::Main => sub.main_update(),
                Phase::Late => sub.late_update(),
            };
            if let Err(err) = result {
                tracing::error!(
                    entry = %self.name,
                    order = self.order,
                    ?phase,
                    error = %err,
                    "subscriber callback failed"
                );
            }
        }
    }

    /// Count the subscriber in and mark it valid immediately; live-set
    /// insertion is deferred to end of tick when the loop is mid-tick.
    /// A removal of the same subscriber staged earlier this tick is
    /// retracted, so register-after-unregister nets to "still live".
    pub(crate) fn register(&self, sub: SubscriberRef, mid_tick: bool) {
        self.live.set(self.live.get() + 1);
        sub.validity().set(true);
        if mid_tick {
            let key = subscriber_key(&sub);
            self.pending_remove.borrow_mut().remove(&key);
            self.pending_add.borrow_mut().insert(key, sub);
        } else {
            self.insert_live(&sub);
        }
    }

    /// Count the subscriber out and mark it invalid immediately; live-set
    /// removal is deferred to end of tick when the loop is mid-tick. An
    /// add staged earlier this tick is retracted, so the subscriber never
    /// becomes live at all.
    pub(crate) fn unregister(&self, sub: SubscriberRef, mid_tick: bool) {
        // Clamp at zero: a stray unregister for a subscriber that was
        // never counted in must not desynchronize emptiness.
        self.live.set((self.live.get() - 1).max(0));
        sub.validity().set(false);
        let key = subscriber_key(&sub);
        if mid_tick {
            self.pending_add.borrow_mut().remove(&key);
            self.pending_remove.borrow_mut().insert(key);
        } else {
            self.remove_live(key);
        }
    }

    /// Apply staged removals then staged additions and clear both sets.
    /// Called once per tick, after the late phase, outside any iteration.
    pub(crate) fn apply_pending(&self) {
        for key in self.pending_remove.borrow_mut().drain() {
            self.remove_live(key);
        }
        let additions: Vec<SubscriberRef> = self
            .pending_add
            .borrow_mut()
            .drain()
            .map(|(_, sub)| sub)
            .collect();
        for sub in &additions {
            self.insert_live(sub);
        }
    }

    fn insert_live(&self, sub: &SubscriberRef) {
        let key = subscriber_key(sub);
        let phases = sub.phases();
        for phase in Phase::ALL {
            if phases.has(phase) {
                self.members[phase.index()]
                    .borrow_mut()
                    .insert(key, sub.clone());
            }
        }
    }

    fn remove_live(&self, key: usize) {
        for set in &self.members {
            set.borrow_mut().remove(&key);
        }
    }

    #[cfg(test)]
    fn live_len(&self, phase: Phase) -> usize {
        self.members[phase.index()].borrow().len()
    }
}
