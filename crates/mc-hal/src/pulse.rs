//! Encoder pulse counter shared between interrupt and poll loop.
//!
//! The interrupt handler is the only producer and the control loop the only
//! consumer. The consumer drains the count with a single atomic swap, so an
//! edge is counted either in this window or the next one, never twice and
//! never lost.

use std::sync::atomic::{AtomicI32, Ordering};

/// Rotation direction decoded from the quadrature B phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Level of phase B sampled on the rising edge of phase A.
    pub fn from_phase_b(level_high: bool) -> Self {
        if level_high {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

/// Signed pulse accumulator.
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicI32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
        }
    }

    /// Record one A-phase edge. Called from interrupt context.
    #[inline]
    pub fn record_edge(&self, direction: Direction) {
        match direction {
            Direction::Forward => self.count.fetch_add(1, Ordering::AcqRel),
            Direction::Reverse => self.count.fetch_sub(1, Ordering::AcqRel),
        };
    }

    /// Read the accumulated count and reset it to zero in one step.
    #[inline]
    pub fn take(&self) -> i32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Current count without clearing it.
    pub fn peek(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }
}
