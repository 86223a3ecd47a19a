#![warn(missing_docs)]
//! Priority-ordered update loop for fixed-step simulations.
//!
//! Many simulated entities need periodic callbacks (fixed step, early,
//! main, late). Dispatching each one through its own host callback gives
//! no control over cross-entity ordering and scales poorly, so this crate
//! groups subscribers into named, integer-ordered [`LoopEntry`] groups and
//! executes every group in ascending order once per phase per tick.
//!
//! Subscribers may register or unregister at any time, including from
//! inside their own callbacks while the loop is mid-tick. Mid-tick
//! mutations are staged and applied after the late phase, so membership
//! sets are never mutated while they are being iterated.
//!
//! The host drives the loop once per tick, in order:
//! [`UpdateLoop::drive_fixed`], [`UpdateLoop::drive_update`],
//! [`UpdateLoop::drive_late`].

pub mod config;
pub mod entry;
pub mod error;
pub mod orders;
pub mod phase;
pub mod subscriber;
pub mod task;
pub mod update_loop;

// Re-export commonly used types
pub use config::LoopConfig;
pub use entry::LoopEntry;
pub use error::LoopError;
pub use phase::{Phase, PhaseSet};
pub use subscriber::{SubscriberRef, Updatable, Validity};
pub use task::CallbackTask;
pub use update_loop::UpdateLoop;
