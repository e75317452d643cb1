use crate::sim::sim::Simulation;
use crate::sim::ticker::{SharedSim, Ticker};
use crate::time::Minute;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_background_ticker_advances_and_stops() {
    let shared: SharedSim = Arc::new(Mutex::new(Simulation::new()));
    let ticker = Ticker::spawn(Arc::clone(&shared), Duration::from_millis(1));

    std::thread::sleep(Duration::from_millis(300));
    ticker.stop();

    let stopped_at = shared.lock().unwrap().clock();
    assert!(stopped_at >= Minute(1));

    // no stray ticks after stop() has joined the thread
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(shared.lock().unwrap().clock(), stopped_at);
}

#[test]
fn test_commands_interleave_with_the_ticker() {
    let shared: SharedSim = Arc::new(Mutex::new(Simulation::new()));
    let ticker = Ticker::spawn(Arc::clone(&shared), Duration::from_millis(1));

    for i in 0..20 {
        let mut sim = shared.lock().unwrap();
        let now = sim.clock();
        sim.add_flight(
            Arc::from(format!("FL{i:02}").as_str()),
            crate::flight::FlightKind::Takeoff,
            now,
            crate::flight::Priority::Normal,
            0,
        )
        .unwrap();
        drop(sim);
        std::thread::sleep(Duration::from_millis(2));
    }

    ticker.stop();
    let sim = shared.lock().unwrap();
    assert_eq!(sim.flights().len(), 20);
}
