//! The subscriber contract.
//!
//! Subscribers are shared, stable-identity objects (`Rc<dyn Updatable>`).
//! Membership bookkeeping is keyed on the `Rc` allocation address, never
//! on content, so two distinct subscribers with identical state are still
//! two memberships.

use crate::phase::PhaseSet;
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;

/// Shared handle to a registered subscriber.
pub type SubscriberRef = Rc<dyn Updatable>;

/// Per-instance validity flag owned by each subscriber.
///
/// The registration machinery flips this to `true` the moment `register`
/// is called and to `false` the moment `unregister` is called, even while
/// the underlying membership change is still staged. Execution skips
/// subscribers whose flag is unset, and consumers may read it to
/// self-disable without unregistering.
#[derive(Debug, Default)]
pub struct Validity(Cell<bool>);

impl Validity {
    /// A fresh flag, initially unset.
    pub const fn new() -> Self {
        Self(Cell::new(false))
    }

    /// Whether the subscriber is currently valid for updating.
    pub fn is_valid(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn set(&self, valid: bool) {
        self.0.set(valid);
    }
}

/// A participant in the update loop.
///
/// Implementors declare their ordering key and capability set once; both
/// must stay fixed for the lifetime of the subscriber, since the order is
/// the membership lookup key and the phase set decides which live sets
/// the subscriber occupies.
///
/// Phase callbacks return `Result` so a failing subscriber can be
/// reported and skipped without stopping its siblings; the default bodies
/// are no-ops so a type only overrides the phases it declares.
pub trait Updatable {
    /// Ordering key of the loop entry this subscriber belongs to.
    fn order(&self) -> i32;

    /// Declared capability set; must be non-empty and constant.
    fn phases(&self) -> PhaseSet;

    /// The subscriber's validity flag.
    fn validity(&self) -> &Validity;

    /// Fixed-phase callback.
    fn fixed_update(&self) -> Result<()> {
        Ok(())
    }

    /// Early-phase callback.
    fn early_update(&self) -> Result<()> {
        Ok(())
    }

    /// Main-phase callback.
    fn main_update(&self) -> Result<()> {
        Ok(())
    }

    /// Late-phase callback.
    fn late_update(&self) -> Result<()> {
        Ok(())
    }
}

/// Identity key for membership sets: the `Rc` allocation address.
pub(crate) fn subscriber_key(sub: &SubscriberRef) -> usize {
    Rc::as_ptr(sub) as *const () as usize
}
