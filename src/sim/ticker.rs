use crate::sim::sim::Simulation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Every writer (REPL command or background tick) locks this for the whole
/// operation; a tick is atomic under the lock.
pub type SharedSim = Arc<Mutex<Simulation>>;

/// Background timer that advances the simulation one minute per interval.
/// The interval is a presentation concern; the engine only sees `advance`.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(sim: SharedSim, interval: Duration) -> Ticker {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("sim-ticker".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    if flag.load(Ordering::Relaxed) {
                        break;
                    }
                    let Ok(mut sim) = sim.lock() else {
                        break;
                    };
                    sim.advance();
                }
            })
            .expect("failed to spawn ticker thread");
        Ticker { stop, thread }
    }

    /// Signals the timer thread and waits for it to finish its last tick.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.thread.join();
    }
}
