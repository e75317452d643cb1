use crate::flight::{FlightStatus, Priority};
use crate::runway::RunwayCategory;
use crate::sim::sim::Simulation;
use crate::sim::tests::utils::{add_landing, add_runway, add_takeoff, flight, runway, status};
use crate::time::Minute;

#[test]
fn test_unknown_status_and_priority_are_normalized() {
    let (sim, warnings) = Simulation::from_json(
        r#"{
            "flights": [
                {"id": "IB101", "kind": "Landing", "scheduled_time": 5, "priority": 7, "fuel_minutes": 20, "status": "Boarding"}
            ],
            "runways": []
        }"#,
    )
    .unwrap();

    assert_eq!(flight(&sim, "IB101").priority, Priority::Normal);
    assert_eq!(status(&sim, "IB101"), FlightStatus::Queued);
    assert_eq!(warnings.len(), 2);
}

#[test]
fn test_missing_fields_default() {
    let (sim, warnings) = Simulation::from_json(
        r#"{"flights": [{"id": "UX303", "kind": "takeoff"}], "runways": [{"id": "R1", "category": "long", "service_duration": 3}]}"#,
    )
    .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(status(&sim, "UX303"), FlightStatus::Queued);
    assert_eq!(flight(&sim, "UX303").scheduled_time, Minute(0));
    assert!(runway(&sim, "R1").enabled);
    assert_eq!(sim.clock(), Minute(0));
}

#[test]
fn test_malformed_records_are_skipped() {
    let (sim, warnings) = Simulation::from_json(
        r#"{
            "flights": [
                {"id": "IB101", "kind": "Landing", "fuel_minutes": 20},
                {"id": "IB101", "kind": "Landing", "fuel_minutes": 10},
                {"id": "ZEPPELIN", "kind": "Airship"},
                {"id": "AF505", "kind": "Landing", "fuel_minutes": -3},
                {"id": "", "kind": "Landing"}
            ],
            "runways": [
                {"id": "R1", "category": "gravel", "service_duration": 3},
                {"id": "R2", "category": "Short", "service_duration": 0},
                {"id": "R3", "category": "Short", "service_duration": 2}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(sim.flights().len(), 1);
    assert_eq!(flight(&sim, "IB101").fuel_minutes, 20);
    assert_eq!(sim.runways().len(), 1);
    assert_eq!(runway(&sim, "R3").category, RunwayCategory::Short);
    assert_eq!(warnings.len(), 6);
}

#[test]
fn test_takeoff_fuel_is_zeroed_on_load() {
    let (sim, _) = Simulation::from_json(
        r#"{"flights": [{"id": "UX303", "kind": "Takeoff", "fuel_minutes": 25}], "runways": []}"#,
    )
    .unwrap();

    assert_eq!(flight(&sim, "UX303").fuel_minutes, 0);
}

#[test]
fn test_consistent_occupancy_survives_the_load() {
    let (sim, warnings) = Simulation::from_json(
        r#"{
            "clock": 9,
            "flights": [
                {"id": "IB101", "kind": "Landing", "fuel_minutes": 20, "status": "OnRunway"}
            ],
            "runways": [
                {"id": "R1", "category": "Long", "service_duration": 3, "current_flight": "IB101", "release_time": 11}
            ]
        }"#,
    )
    .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(sim.clock(), Minute(9));
    assert_eq!(status(&sim, "IB101"), FlightStatus::OnRunway);
    assert_eq!(
        runway(&sim, "R1").current_flight.as_deref(),
        Some("IB101")
    );
    assert_eq!(runway(&sim, "R1").release_time, Some(Minute(11)));
}

#[test]
fn test_dangling_occupancy_is_reset() {
    let (sim, warnings) = Simulation::from_json(
        r#"{
            "flights": [
                {"id": "IB101", "kind": "Landing", "fuel_minutes": 20, "status": "OnRunway"},
                {"id": "IB202", "kind": "Landing", "fuel_minutes": 20, "status": "Queued"}
            ],
            "runways": [
                {"id": "R1", "category": "Long", "service_duration": 3, "current_flight": "GHOST", "release_time": 4},
                {"id": "R2", "category": "Long", "service_duration": 3, "current_flight": "IB202", "release_time": 4}
            ]
        }"#,
    )
    .unwrap();

    // a reference to a missing flight, a reference to a merely queued
    // flight, and a committed flight nobody claims: all three normalize
    assert_eq!(runway(&sim, "R1").current_flight, None);
    assert_eq!(runway(&sim, "R2").current_flight, None);
    assert_eq!(status(&sim, "IB101"), FlightStatus::Queued);
    assert_eq!(status(&sim, "IB202"), FlightStatus::Queued);
    assert_eq!(warnings.len(), 3);
}

#[test]
fn test_occupied_runway_without_release_time_is_reset() {
    let (sim, warnings) = Simulation::from_json(
        r#"{
            "flights": [
                {"id": "IB101", "kind": "Landing", "fuel_minutes": 20, "status": "OnRunway"}
            ],
            "runways": [
                {"id": "R1", "category": "Long", "service_duration": 3, "current_flight": "IB101"}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(runway(&sim, "R1").current_flight, None);
    assert_eq!(status(&sim, "IB101"), FlightStatus::Queued);
    assert_eq!(warnings.len(), 2);
}

#[test]
fn test_save_and_load_round_trip() {
    let mut sim = Simulation::new();
    add_runway(&mut sim, "R1", RunwayCategory::Long, 3);
    add_runway(&mut sim, "R2", RunwayCategory::Short, 2);
    add_landing(&mut sim, "IB101", 5, Priority::Normal, 20);
    add_takeoff(&mut sim, "UX303", 1, Priority::High);
    sim.advance();
    sim.advance();

    let (reloaded, warnings) = Simulation::from_json(&sim.to_json().unwrap()).unwrap();

    assert!(warnings.is_empty());
    assert_eq!(reloaded.clock(), sim.clock());
    assert_eq!(reloaded.flights(), sim.flights());
    assert_eq!(reloaded.runways(), sim.runways());
}
