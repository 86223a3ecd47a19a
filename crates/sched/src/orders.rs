//! Canonical ordering keys expected to exist at startup.
//!
//! Consumers may add further entries at any unused order; these four are
//! installed permanent so they survive being momentarily empty.

use crate::entry::LoopEntry;
use crate::update_loop::UpdateLoop;

/// AI preprocessing, runs before all other canonical work.
pub const AI_PREPROCESSING: i32 = -110;
/// AI processing.
pub const AI_PROCESSING: i32 = -100;
/// Default order for subscribers with no explicit placement.
pub const DEFAULT: i32 = 0;
/// AI post-processing, runs after the default order.
pub const AI_POSTPROCESSING: i32 = 100;

/// Install the canonical permanent entries on a freshly built loop.
pub fn install_canonical(lp: &UpdateLoop) {
    lp.add_entries([
        LoopEntry::permanent("default", DEFAULT),
        LoopEntry::permanent("ai preprocessing", AI_PREPROCESSING),
        LoopEntry::permanent("ai processing", AI_PROCESSING),
        LoopEntry::permanent("ai post processing", AI_POSTPROCESSING),
    ]);
}
