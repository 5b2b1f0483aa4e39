//! # Emulated pickup mechanism
//!
//! Recorded drive logs know nothing of the pickup requests made during a replay, so
//! [`PickupSim`] stands in for the arm: it consumes each request and then reports itself busy for
//! a fixed number of ticks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PickupSim {
    duration_ticks: u64,

    busy_ticks: u64,

    ack_pending: bool,

    num_pickups: u64,
}

/// State of the mechanism as seen by the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickupStatus {
    pub picking_up: bool,

    /// The last request has been consumed
    pub acknowledged: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PickupSim {
    pub fn new(duration_ticks: u64) -> Self {
        Self {
            duration_ticks,
            ..Default::default()
        }
    }

    /// Status for the coming tick. Advances the mechanism by one tick.
    pub fn next_status(&mut self) -> PickupStatus {
        let status = PickupStatus {
            picking_up: self.busy_ticks > 0,
            acknowledged: self.ack_pending,
        };

        self.ack_pending = false;
        self.busy_ticks = self.busy_ticks.saturating_sub(1);

        status
    }

    /// Pass the request flag of the last tick. Requests made while busy are ignored.
    pub fn request(&mut self, send_pickup: bool) {
        if send_pickup && self.busy_ticks == 0 && !self.ack_pending {
            self.busy_ticks = self.duration_ticks;
            self.ack_pending = true;
            self.num_pickups += 1;

            info!("Pickup {} started", self.num_pickups);
        }
    }

    pub fn num_pickups(&self) -> u64 {
        self.num_pickups
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
