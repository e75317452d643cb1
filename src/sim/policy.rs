use crate::flight::{Flight, FlightId, FlightKind, Priority};
use crate::runway::Runway;
use crate::time::Minute;
use std::cmp::Reverse;

/// Ranks takeoffs behind any realistic landing fuel load at equal priority.
pub const TAKEOFF_FUEL_RANK: u64 = 999;

/// Whether `runway` may serve `flight` at all, regardless of occupancy.
pub fn compatible(runway: &Runway, flight: &Flight) -> bool {
    if !runway.enabled {
        return false;
    }
    match flight.kind {
        FlightKind::Takeoff => runway.category.takes_heavy_traffic(),
        FlightKind::Landing => {
            flight.priority < Priority::Emergency || runway.category.takes_heavy_traffic()
        }
    }
}

pub type SelectionKey = (Reverse<Priority>, u64, Reverse<u64>, FlightId);

/// Total order over queued flights: priority desc, fuel asc (landings),
/// overdue desc, id asc. Ascending sort; first element wins.
pub fn selection_key(flight: &Flight, clock: Minute) -> SelectionKey {
    let fuel_rank = match flight.kind {
        FlightKind::Landing => flight.fuel_minutes,
        FlightKind::Takeoff => TAKEOFF_FUEL_RANK,
    };
    (
        Reverse(flight.priority),
        fuel_rank,
        Reverse(clock.since(flight.scheduled_time)),
        flight.id.clone(),
    )
}
