use crate::flight::{Flight, FlightKind, FlightStatus, Priority};
use crate::runway::{Runway, RunwayCategory};
use crate::sim::sim::Simulation;
use crate::time::Minute;
use proptest::prelude::*;
use std::sync::Arc;

pub fn id(s: &str) -> Arc<str> {
    Arc::from(s)
}

pub fn add_landing(sim: &mut Simulation, flight_id: &str, eta: u64, priority: Priority, fuel: u64) {
    sim.add_flight(id(flight_id), FlightKind::Landing, Minute(eta), priority, fuel)
        .unwrap();
}

pub fn add_takeoff(sim: &mut Simulation, flight_id: &str, etd: u64, priority: Priority) {
    sim.add_flight(id(flight_id), FlightKind::Takeoff, Minute(etd), priority, 0)
        .unwrap();
}

pub fn add_runway(sim: &mut Simulation, runway_id: &str, category: RunwayCategory, duration: u64) {
    sim.add_runway(id(runway_id), category, duration, true)
        .unwrap();
}

pub fn flight<'a>(sim: &'a Simulation, flight_id: &str) -> &'a Flight {
    sim.flights()
        .iter()
        .find(|f| &*f.id == flight_id)
        .unwrap_or_else(|| panic!("no flight {flight_id}"))
}

pub fn runway<'a>(sim: &'a Simulation, runway_id: &str) -> &'a Runway {
    sim.runways()
        .iter()
        .find(|r| &*r.id == runway_id)
        .unwrap_or_else(|| panic!("no runway {runway_id}"))
}

pub fn status(sim: &Simulation, flight_id: &str) -> FlightStatus {
    flight(sim, flight_id).status
}

pub fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Normal),
        Just(Priority::High),
        Just(Priority::Emergency),
    ]
}

pub fn arb_category() -> impl Strategy<Value = RunwayCategory> {
    prop_oneof![
        Just(RunwayCategory::Short),
        Just(RunwayCategory::Standard),
        Just(RunwayCategory::Long),
    ]
}

/// (is_landing, scheduled, priority, fuel)
pub fn arb_flight_seed() -> impl Strategy<Value = (bool, u64, Priority, u64)> {
    (any::<bool>(), 0..50u64, arb_priority(), 0..60u64)
}

/// (category, duration, enabled)
pub fn arb_runway_seed() -> impl Strategy<Value = (RunwayCategory, u64, bool)> {
    (arb_category(), 1..10u64, any::<bool>())
}

pub fn populate(
    flight_seeds: &[(bool, u64, Priority, u64)],
    runway_seeds: &[(RunwayCategory, u64, bool)],
) -> Simulation {
    let mut sim = Simulation::new();
    for (i, &(is_landing, scheduled, priority, fuel)) in flight_seeds.iter().enumerate() {
        let kind = if is_landing {
            FlightKind::Landing
        } else {
            FlightKind::Takeoff
        };
        sim.add_flight(
            id(&format!("FL{i:03}")),
            kind,
            Minute(scheduled),
            priority,
            fuel,
        )
        .unwrap();
    }
    for (i, &(category, duration, enabled)) in runway_seeds.iter().enumerate() {
        sim.add_runway(id(&format!("R{i:02}")), category, duration, enabled)
            .unwrap();
    }
    sim
}
