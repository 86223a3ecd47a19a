//! Ad-hoc subscriber: a bare closure at an order and a single phase.
//!
//! Lets a caller put a one-off callback on the loop without defining a
//! new subscriber type.

use crate::phase::{Phase, PhaseSet};
use crate::subscriber::{Updatable, Validity};
use crate::update_loop::UpdateLoop;
use anyhow::Result;
use std::rc::Rc;

type TaskFn = Box<dyn Fn() -> Result<()>>;

/// A single closure registered at one order for exactly one phase.
///
/// ```
/// use tickloop_sched::{CallbackTask, UpdateLoop};
///
/// let lp = UpdateLoop::default();
/// let greeter = CallbackTask::main(0, || {
///     tracing::info!("tick");
///     Ok(())
/// })
/// .registered(&lp);
///
/// lp.drive_fixed();
/// lp.drive_update();
/// lp.drive_late();
/// lp.unregister(greeter);
/// ```
pub struct CallbackTask {
    callback: TaskFn,
    order: i32,
    phase: Phase,
    validity: Validity,
}

impl CallbackTask {
    fn new(phase: Phase, order: i32, callback: impl Fn() -> Result<()> + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            order,
            phase,
            validity: Validity::new(),
        }
    }

    /// A task invoked during the fixed phase.
    pub fn fixed(order: i32, callback: impl Fn() -> Result<()> + 'static) -> Self {
        Self::new(Phase::Fixed, order, callback)
    }

    /// A task invoked during the early phase.
    pub fn early(order: i32, callback: impl Fn() -> Result<()> + 'static) -> Self {
        Self::new(Phase::Early, order, callback)
    }

    /// A task invoked during the main phase.
    pub fn main(order: i32, callback: impl Fn() -> Result<()> + 'static) -> Self {
        Self::new(Phase::Main, order, callback)
    }

    /// A task invoked during the late phase.
    pub fn late(order: i32, callback: impl Fn() -> Result<()> + 'static) -> Self {
        Self::new(Phase::Late, order, callback)
    }

    /// Wrap the task in an `Rc` and register it in one step. Keep the
    /// returned handle: it is the identity needed to unregister later.
    pub fn registered(self, lp: &UpdateLoop) -> Rc<Self> {
        let task = Rc::new(self);
        lp.register(task.clone());
        task
    }

    fn run(&self, phase: Phase) -> Result<()> {
        if self.phase == phase {
            (self.callback)()
        } else {
            Ok(())
        }
    }
}

impl Updatable for CallbackTask {
    fn order(&self) -> i32 {
        self.order
    }

    fn phases(&self) -> PhaseSet {
        self.phase.as_set()
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn fixed_update(&self) -> Result<()> {
        self.run(Phase::Fixed)
    }

    fn early_update(&self) -> Result<()> {
        self.run(Phase::Early)
    }

    fn main_update(&self) -> Result<()> {
        self.run(Phase::Main)
    }

    fn late_update(&self) -> Result<()> {
        self.run(Phase::Late)
    }
}
