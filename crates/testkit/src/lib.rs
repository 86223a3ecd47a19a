#![warn(missing_docs)]
//! Deterministic testing surfaces for the update loop (probe subscribers
//! plus a shared invocation trace).

use anyhow::Result;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use tickloop_sched::{Phase, PhaseSet, Updatable, UpdateLoop, Validity};

/// One recorded callback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Tick counter at the time of the invocation (maintained by the
    /// test via [`TickTrace::next_tick`]).
    pub tick: u64,
    /// Phase the callback ran in.
    pub phase: Phase,
    /// Ordering key of the probe's entry.
    pub order: i32,
    /// Probe label.
    pub label: String,
}

/// Shared, clonable invocation log appended to by [`Probe`] subscribers.
#[derive(Clone, Default)]
pub struct TickTrace {
    events: Rc<RefCell<Vec<TraceEvent>>>,
    tick: Rc<Cell<u64>>,
}

impl TickTrace {
    /// An empty trace at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the trace's tick counter; call once per driven tick.
    pub fn next_tick(&self) {
        self.tick.set(self.tick.get() + 1);
    }

    /// Append an event at the current tick.
    pub fn record(&self, phase: Phase, order: i32, label: &str) {
        self.events.borrow_mut().push(TraceEvent {
            tick: self.tick.get(),
            phase,
            order,
            label: label.to_string(),
        });
    }

    /// Every recorded event, in invocation order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    /// Orders visited in `phase`, in invocation order, across all ticks.
    pub fn orders_for(&self, phase: Phase) -> Vec<i32> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.order)
            .collect()
    }

    /// Number of invocations recorded for `label`.
    pub fn count_for(&self, label: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.label == label)
            .count()
    }

    /// Number of invocations recorded for `label` during `tick`.
    pub fn count_for_at(&self, label: &str, tick: u64) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.label == label && e.tick == tick)
            .count()
    }

    /// Write the trace as newline-delimited JSON (CI artifact format).
    pub fn write_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        for event in self.events.borrow().iter() {
            let line = serde_json::to_string(event)?;
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// A subscriber that records every invocation into a [`TickTrace`].
pub struct Probe {
    label: String,
    order: i32,
    phases: PhaseSet,
    trace: TickTrace,
    validity: Validity,
}

impl Probe {
    /// A probe participating in `phases` at `order`, logging to `trace`.
    pub fn new(
        label: impl Into<String>,
        order: i32,
        phases: PhaseSet,
        trace: &TickTrace,
    ) -> Rc<Self> {
        Rc::new(Self {
            label: label.into(),
            order,
            phases,
            trace: trace.clone(),
            validity: Validity::new(),
        })
    }

    fn observe(&self, phase: Phase) -> Result<()> {
        self.trace.record(phase, self.order, &self.label);
        Ok(())
    }
}

impl Updatable for Probe {
    fn order(&self) -> i32 {
        self.order
    }

    fn phases(&self) -> PhaseSet {
        self.phases
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn fixed_update(&self) -> Result<()> {
        self.observe(Phase::Fixed)
    }

    fn early_update(&self) -> Result<()> {
        self.observe(Phase::Early)
    }

    fn main_update(&self) -> Result<()> {
        self.observe(Phase::Main)
    }

    fn late_update(&self) -> Result<()> {
        self.observe(Phase::Late)
    }
}

/// Drive one full tick (fixed, early+main, late+cleanup) and advance the
/// trace's tick counter.
pub fn drive_tick(lp: &UpdateLoop, trace: &TickTrace) {
    trace.next_tick();
    lp.drive_fixed();
    lp.drive_update();
    lp.drive_late();
}
