//! The loop itself: an ordered collection of entries plus the three
//! driver entry points the host calls once per tick.
//!
//! The host contract is strict: `drive_fixed`, `drive_update`,
//! `drive_late`, each exactly once per tick, in that order, never
//! concurrently or recursively. Everything else (registration, entry
//! creation, shutdown) may happen at any time, including from inside a
//! subscriber callback.

use crate::config::LoopConfig;
use crate::entry::LoopEntry;
use crate::error::LoopError;
use crate::phase::Phase;
use crate::subscriber::SubscriberRef;
use std::cell::{Cell, RefCell};
use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A priority-ordered per-tick scheduler.
///
/// Construct one explicitly and hand an `Rc<UpdateLoop>` to every
/// subscriber-owning component; there is no global accessor. All methods
/// take `&self` (control is single-threaded, state lives behind `Cell`
/// and `RefCell`), so callbacks can re-enter the loop freely.
pub struct UpdateLoop {
    entries: RefCell<BTreeMap<i32, Rc<LoopEntry>>>,
    running: Cell<bool>,
    shutdown: Cell<bool>,
    config: LoopConfig,
}

impl UpdateLoop {
    /// A loop with the given configuration and no entries.
    pub fn new(config: LoopConfig) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            running: Cell::new(false),
            shutdown: Cell::new(false),
            config,
        }
    }

    /// Whether a tick is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.get()
    }

    /// Begin teardown: every registration call from here on is a logged
    /// no-op. Drivers stay callable so an in-flight tick can finish.
    pub fn begin_shutdown(&self) {
        self.shutdown.set(true);
    }

    // ---- Drivers ----

    /// Run the fixed phase across all entries in ascending order.
    pub fn drive_fixed(&self) {
        self.running.set(true);
        for entry in self.snapshot() {
            entry.execute(Phase::Fixed);
        }
    }

    /// Run the early phase across all entries, then the main phase
    /// across all entries, in ascending order each time.
    pub fn drive_update(&self) {
        self.running.set(true);
        let entries = self.snapshot();
        for entry in &entries {
            entry.execute(Phase::Early);
        }
        for entry in &entries {
            entry.execute(Phase::Main);
        }
    }

    /// Run the late phase across all entries, apply every entry's staged
    /// registration changes, prune empty non-permanent entries (when
    /// enabled), and mark the tick finished.
    pub fn drive_late(&self) {
        for entry in self.snapshot() {
            entry.execute(Phase::Late);
        }
        // Fresh snapshot: entries created earlier this tick get their
        // staged registrations applied too.
        for entry in self.snapshot() {
            entry.apply_pending();
        }
        if self.config.prune_empty {
            self.prune();
        }
        self.running.set(false);
    }

    // ---- Registration surface ----

    /// Insert an explicitly constructed entry, keeping ascending order.
    /// Rejects (and logs) a duplicate order, leaving the existing entry
    /// untouched.
    pub fn add_entry(&self, entry: LoopEntry) {
        if !self.accepting() {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        match entries.entry(entry.order()) {
            MapEntry::Occupied(existing) => {
                let err = LoopError::DuplicateOrder {
                    name: entry.name().to_string(),
                    order: entry.order(),
                };
                tracing::error!(existing = %existing.get().name(), "{err}");
            }
            MapEntry::Vacant(slot) => {
                if self.config.verbose {
                    tracing::debug!(
                        name = %entry.name(),
                        order = entry.order(),
                        "registered update loop entry"
                    );
                }
                slot.insert(Rc::new(entry));
            }
        }
    }

    /// Insert several entries at once.
    pub fn add_entries(&self, entries: impl IntoIterator<Item = LoopEntry>) {
        for entry in entries {
            self.add_entry(entry);
        }
    }

    /// Register a subscriber with the entry at its order, lazily creating
    /// a non-permanent entry when none exists yet.
    pub fn register(&self, sub: SubscriberRef) {
        if !self.accepting() {
            return;
        }
        let entry = self.entry_or_create(sub.order());
        entry.register(sub, self.running.get());
    }

    /// Unregister a subscriber from the entry at its order. With no entry
    /// at that order this is a logged no-op.
    pub fn unregister(&self, sub: SubscriberRef) {
        if !self.accepting() {
            return;
        }
        let existing = self.entries.borrow().get(&sub.order()).cloned();
        match existing {
            Some(entry) => entry.unregister(sub, self.running.get()),
            None => {
                tracing::error!("{}", LoopError::UnknownOrder { order: sub.order() });
            }
        }
    }

    // ---- Introspection ----

    /// Number of entries currently installed.
    pub fn entry_count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// The entry at `order`, if any.
    pub fn entry(&self, order: i32) -> Option<Rc<LoopEntry>> {
        self.entries.borrow().get(&order).cloned()
    }

    /// Whether an entry exists at `order`.
    pub fn has_entry(&self, order: i32) -> bool {
        self.entries.borrow().contains_key(&order)
    }

    // ---- Internals ----

    /// Entries in ascending order, decoupled from the live map so a
    /// callback can insert new entries while a phase is running.
    fn snapshot(&self) -> Vec<Rc<LoopEntry>> {
        self.entries.borrow().values().cloned().collect()
    }

    fn accepting(&self) -> bool {
        if self.shutdown.get() {
            tracing::warn!("{}", LoopError::ShuttingDown);
            return false;
        }
        true
    }

    fn entry_or_create(&self, order: i32) -> Rc<LoopEntry> {
        if let Some(entry) = self.entries.borrow().get(&order) {
            return entry.clone();
        }
        let entry = Rc::new(LoopEntry::transient(format!("unnamed ({order})"), order));
        if self.config.verbose {
            tracing::debug!(order, "created update loop entry on demand");
        }
        self.entries.borrow_mut().insert(order, entry.clone());
        entry
    }

    fn prune(&self) {
        self.entries.borrow_mut().retain(|_, entry| {
            let keep = entry.is_permanent() || !entry.is_empty();
            if !keep && self.config.verbose {
                tracing::debug!(
                    name = %entry.name(),
                    order = entry.order(),
                    "pruning unused update loop entry"
                );
            }
            keep
        });
    }
}

impl Default for UpdateLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}
