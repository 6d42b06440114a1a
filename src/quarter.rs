//! Deterministic quarter allocation.
//!
//! A fixed bucketing rule, not an optimiser: each tier owns a band of the
//! horizon and items alternate (or cycle) through it by their position within
//! the tier.

use std::collections::HashMap;

use crate::fields::{Priority, Quarter, Stage};

/// Pick a quarter for an item from its tier, stage and 0-based position
/// among items of the same tier.
pub fn allocate_quarter(priority: Priority, stage: Stage, ordinal: usize) -> Quarter {
    let even = ordinal % 2 == 0;
    match priority {
        Priority::P0 if stage.is_early() => Quarter::Q1Y2025,
        Priority::P0 => {
            if even { Quarter::Q1Y2025 } else { Quarter::Q2Y2025 }
        }
        Priority::P1 if stage.is_early() => Quarter::Q2Y2025,
        Priority::P1 => {
            if even { Quarter::Q2Y2025 } else { Quarter::Q3Y2025 }
        }
        Priority::P2 => {
            if even { Quarter::Q3Y2025 } else { Quarter::Q4Y2025 }
        }
        Priority::P3 => Quarter::ALL[4 + ordinal % 4],
    }
}

/// Keep a recognised explicit quarter, otherwise allocate one.
pub fn resolve_quarter(
    explicit: Option<&str>,
    priority: Priority,
    stage: Stage,
    ordinal: usize,
) -> Quarter {
    explicit
        .and_then(Quarter::parse)
        .unwrap_or_else(|| allocate_quarter(priority, stage, ordinal))
}

/// Running per-tier positions, in input order.
#[derive(Debug, Default)]
pub struct TierOrdinals {
    seen: HashMap<Priority, usize>,
}

impl TierOrdinals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ordinal for the next item of this tier and advance it.
    pub fn next(&mut self, priority: Priority) -> usize {
        let slot = self.seen.entry(priority).or_insert(0);
        let ordinal = *slot;
        *slot += 1;
        ordinal
    }
}
