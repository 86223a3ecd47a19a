//! Recoverable registration diagnostics.
//!
//! The registration surface is fire-and-forget: none of these conditions
//! is returned to callers, they are logged and the operation becomes a
//! no-op. The worst failure mode anywhere in the loop is one skipped
//! callback for one subscriber in one tick.

use thiserror::Error;

/// Conditions reported by the registration machinery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoopError {
    /// A second entry was added at an order that is already occupied.
    /// The existing entry is left untouched.
    #[error("an update loop entry at order {order} already exists; rejected '{name}'")]
    DuplicateOrder {
        /// Name of the rejected entry.
        name: String,
        /// The contested ordering key.
        order: i32,
    },

    /// An unregister named an order with no existing entry.
    #[error("cannot unregister: no update loop entry at order {order}")]
    UnknownOrder {
        /// The missing ordering key.
        order: i32,
    },

    /// A registration call arrived after shutdown began.
    #[error("update loop is shutting down; registration ignored")]
    ShuttingDown,
}
