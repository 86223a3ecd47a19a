//! tickloop - a priority-ordered update loop for fixed-step simulations
//!
//! Small driver that builds a loop, installs the canonical orders and
//! runs a few ticks with tracing output.

use anyhow::Result;
use std::rc::Rc;
use tickloop_sched::{orders, CallbackTask, LoopConfig, PhaseSet, Updatable, UpdateLoop, Validity};
use tracing::info;

/// Sample typed subscriber: advances on the fixed phase, reports late.
struct Heartbeat {
    beats: std::cell::Cell<u64>,
    validity: Validity,
}

impl Heartbeat {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            beats: std::cell::Cell::new(0),
            validity: Validity::new(),
        })
    }
}

impl Updatable for Heartbeat {
    fn order(&self) -> i32 {
        orders::DEFAULT
    }

    fn phases(&self) -> PhaseSet {
        PhaseSet::FIXED | PhaseSet::LATE
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn fixed_update(&self) -> Result<()> {
        self.beats.set(self.beats.get() + 1);
        Ok(())
    }

    fn late_update(&self) -> Result<()> {
        info!(beats = self.beats.get(), "heartbeat");
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting tickloop v{}", env!("CARGO_PKG_VERSION"));

    let lp = Rc::new(UpdateLoop::new(LoopConfig {
        prune_empty: true,
        verbose: true,
    }));
    orders::install_canonical(&lp);

    let heartbeat = Heartbeat::new();
    lp.register(heartbeat.clone());

    let planner = CallbackTask::main(orders::AI_PROCESSING, || {
        info!("planning ai moves");
        Ok(())
    })
    .registered(&lp);

    for tick in 0..3u32 {
        info!(tick, "driving tick");
        lp.drive_fixed();
        lp.drive_update();
        lp.drive_late();
    }

    lp.unregister(planner);
    lp.unregister(heartbeat);
    lp.begin_shutdown();
    info!("tickloop shut down");
    Ok(())
}
