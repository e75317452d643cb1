use crate::flight::{Flight, FlightId, FlightKind, FlightStatus, Priority};
use crate::runway::{Runway, RunwayCategory, RunwayId, RunwayStatus};
use crate::sim::event::Event;
use crate::sim::sim::{CommandError, Simulation};
use crate::sim::ticker::{SharedSim, Ticker};
use crate::time::Minute;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabled::settings::Style;
use tabled::Tabled;

mod flight;
mod runway;
mod sim;
mod time;

const AIRLINES: [&str; 10] = ["IB", "UX", "VY", "AF", "BA", "LH", "AA", "DL", "TK", "EK"];

#[derive(Parser)]
struct Args {
    /// Path to the JSON scenario file
    #[arg(short, long, value_name = "FILE", default_value = "data/default.json")]
    scenario: PathBuf,

    /// Path to the event log file
    #[arg(short, long, value_name = "FILE", default_value = "events.log")]
    log: PathBuf,
}

#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct CompleteHelper {
    pub commands: Vec<String>,
}

impl Completer for CompleteHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let mut candidates = Vec::new();

        for cmd in &self.commands {
            if cmd.starts_with(line) {
                candidates.push(Pair {
                    display: cmd.clone(),
                    replacement: format!("{} ", cmd),
                });
            }
        }

        Ok((0, candidates))
    }
}

fn paginate(content: String) {
    let mut pager = Command::new("less")
        .arg("-R")
        .stdin(Stdio::piped())
        .spawn()
        // Fallback to 'more' if 'less' isn't available
        .or_else(|_| Command::new("more").stdin(Stdio::piped()).spawn())
        .expect("Failed to spawn pager");

    let mut stdin = pager.stdin.take().expect("Failed to open stdin for pager");

    if let Err(e) = stdin.write_all(content.as_bytes()) {
        // Broken pipe is common if the user quits the pager early
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            eprintln!("Error writing to pager: {}", e);
        }
    }

    // Wait for the user to close the pager before returning to the ">> " prompt
    let _ = pager.wait();
}

fn print_table<T: Tabled>(rows: &[T]) {
    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.with(tabled::settings::Alignment::left());
    if rows.len() > 20 {
        paginate(table.to_string());
    } else {
        println!("{}", table);
    }
}

#[derive(Tabled)]
struct RunwayRow {
    id: RunwayId,
    category: RunwayCategory,
    duration: u64,
    status: RunwayStatus,
    flight: String,
    release: String,
}

impl From<&Runway> for RunwayRow {
    fn from(runway: &Runway) -> RunwayRow {
        RunwayRow {
            id: runway.id.clone(),
            category: runway.category,
            duration: runway.service_duration,
            status: runway.status(),
            flight: runway
                .current_flight
                .as_deref()
                .unwrap_or("---")
                .to_string(),
            release: runway
                .release_time
                .map(|t| format!("min {t}"))
                .unwrap_or_else(|| "---".to_string()),
        }
    }
}

/// Appends engine events to the log file, picking up where the last flush
/// stopped. Presentation-side lines (loads, manual adds) go through `note`.
struct EventLog {
    file: std::fs::File,
    cursor: usize,
}

impl EventLog {
    fn open(path: &Path) -> std::io::Result<EventLog> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(EventLog { file, cursor: 0 })
    }

    fn note(&mut self, clock: Minute, message: &str) {
        let _ = writeln!(self.file, "[t={clock}] {message}");
    }

    fn flush_from(&mut self, sim: &Simulation) {
        for event in &sim.events()[self.cursor..] {
            let _ = writeln!(self.file, "{event}");
        }
        self.cursor = sim.events().len();
    }
}

fn random_flight_id() -> String {
    let airline = AIRLINES[rand::random_range(0..AIRLINES.len())];
    format!("{}{}", airline, rand::random_range(100..1000))
}

fn parse_flight_args(parts: &[&str]) -> Result<(FlightId, FlightKind, Minute, Priority, u64), String> {
    let (Some(id), Some(kind), Some(minute), Some(priority)) =
        (parts.get(1), parts.get(2), parts.get(3), parts.get(4))
    else {
        return Err("Usage: add <id> <landing|takeoff> <minute> <priority 0-2> [fuel]".to_string());
    };
    let kind = FlightKind::parse(kind).ok_or(format!("unknown flight kind: {kind}"))?;
    let minute = minute
        .parse::<u64>()
        .map_err(|_| format!("not a minute: {minute}"))?;
    let priority = priority
        .parse::<i64>()
        .ok()
        .and_then(Priority::from_level)
        .ok_or(format!("priority must be 0, 1 or 2, got {priority}"))?;
    let fuel = match kind {
        FlightKind::Takeoff => 0,
        FlightKind::Landing => parts
            .get(5)
            .ok_or("landings need a fuel figure: add <id> landing <minute> <priority> <fuel>")?
            .parse::<u64>()
            .map_err(|_| "fuel must be a non-negative number of minutes".to_string())?,
    };
    Ok((Arc::from(*id), kind, Minute(minute), priority, fuel))
}

fn show_status(sim: &Simulation) {
    let stats = sim.stats();
    println!(
        "Minute {} | queued {} | on runway {} | completed {} | runways free {}/{}",
        stats.clock,
        stats.queued + stats.assigning,
        stats.on_runway,
        stats.completed,
        stats.runways_free,
        stats.runways_enabled,
    );
    for flight in sim.critical_landings() {
        println!(
            "{}",
            format!("  ! {} has {} min of fuel left", flight.id, flight.fuel_minutes)
                .red()
                .bold()
        );
    }
}

fn show_stats(sim: &Simulation) {
    let stats = sim.stats();
    println!("\nSimulated clock: {} min", stats.clock);
    println!("\nFlights ({} total)", stats.flights);
    println!("  queued:    {}", stats.queued);
    println!("  assigning: {}", stats.assigning);
    println!("  on runway: {}", stats.on_runway);
    println!("  completed: {}", stats.completed);
    println!("  cancelled: {}", stats.cancelled);
    println!("  landings {} / takeoffs {}", stats.landings, stats.takeoffs);
    println!(
        "  priority: normal {} / high {} / emergency {}",
        stats.normal, stats.high, stats.emergency
    );
    println!("\nRunways ({} total)", stats.runways);
    println!("  enabled:  {}", stats.runways_enabled);
    println!("  free:     {}", stats.runways_free);
    println!("  occupied: {}", stats.runways_occupied);
    if stats.fuel_critical > 0 {
        println!(
            "{}",
            format!("\n{} landing(s) on critical fuel", stats.fuel_critical)
                .red()
                .bold()
        );
    }
}

fn write_report(sim: &Simulation, path: &Path) -> std::io::Result<()> {
    let mut assigned_at: HashMap<&str, Minute> = HashMap::new();
    let mut completed_at: HashMap<&str, Minute> = HashMap::new();
    let mut operations: BTreeMap<&str, usize> = BTreeMap::new();
    let mut escalations = 0usize;
    for event in sim.events() {
        match event {
            Event::Assigned { flight, runway, at } => {
                assigned_at.entry(&**flight).or_insert(*at);
                *operations.entry(&**runway).or_default() += 1;
            }
            Event::Completed { flight, at, .. } => {
                completed_at.insert(&**flight, *at);
            }
            Event::Escalated { .. } => escalations += 1,
            Event::Cancelled { .. } => {}
        }
    }

    let completed: Vec<&Flight> = sim
        .flights()
        .iter()
        .filter(|f| f.status == FlightStatus::Completed)
        .collect();
    let waits: Vec<u64> = completed
        .iter()
        .filter_map(|f| assigned_at.get(&*f.id).map(|at| at.since(f.scheduled_time)))
        .collect();

    let mut out = String::new();
    out.push_str("SUMMARY\n");
    out.push_str(&format!("- simulated time (min): {}\n", sim.clock()));
    out.push_str(&format!("- flights attended: {}\n", completed.len()));
    if !waits.is_empty() {
        let mean = waits.iter().sum::<u64>() as f64 / waits.len() as f64;
        out.push_str(&format!("- mean queue wait (min): {:.1}\n", mean));
    }
    let usage = operations
        .iter()
        .map(|(id, n)| format!("{id}={n} operations"))
        .collect::<Vec<_>>()
        .join(", ");
    if !usage.is_empty() {
        out.push_str(&format!("- runway usage: {usage}\n"));
    }
    out.push_str(&format!("- emergencies escalated: {escalations}\n"));
    out.push_str("- completed flights:\n");
    for flight in &completed {
        let start = assigned_at
            .get(&*flight.id)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        let end = completed_at
            .get(&*flight.id)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!(
            "   * {} ({}, {}) t_start={} t_end={}\n",
            flight.id, flight.kind, flight.priority, start, end
        ));
    }
    std::fs::write(path, out)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let scenario_path = args
        .scenario
        .to_str()
        .ok_or("scenario path is not valid UTF-8")?;

    let (loaded, warnings) = Simulation::load_from_file(scenario_path)?;
    for warning in &warnings {
        eprintln!("{}", format!("warning: {warning}").yellow());
    }
    println!(
        "Tower online. Loaded {} flights and {} runways from {}",
        loaded.flights().len(),
        loaded.runways().len(),
        args.scenario.display()
    );

    let mut log = EventLog::open(&args.log)?;
    log.note(
        loaded.clock(),
        &format!(
            "LOADED flights={} runways={} warnings={}",
            loaded.flights().len(),
            loaded.runways().len(),
            warnings.len()
        ),
    );

    let shared: SharedSim = Arc::new(Mutex::new(loaded));
    let mut ticker: Option<Ticker> = None;

    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();

    let helper = CompleteHelper {
        commands: vec![
            "ls".to_string(),
            "runways".to_string(),
            "tick".to_string(),
            "status".to_string(),
            "add".to_string(),
            "addrunway".to_string(),
            "gen".to_string(),
            "cancel".to_string(),
            "enable".to_string(),
            "disable".to_string(),
            "recat".to_string(),
            "release".to_string(),
            "run".to_string(),
            "pause".to_string(),
            "stats".to_string(),
            "report".to_string(),
            "save".to_string(),
            "help".to_string(),
            "exit".to_string(),
        ],
    };

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    let sim = shared.lock().expect("simulation lock poisoned");
                    log.flush_from(&sim);
                    continue;
                }

                rl.add_history_entry(trimmed)?;

                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match parts[0] {
                    "ls" => {
                        let sub = parts.get(1).map(|s| *s).unwrap_or("all");
                        let rows: Vec<Flight> = {
                            let sim = shared.lock().expect("simulation lock poisoned");
                            sim.flights()
                                .iter()
                                .filter(|f| match sub {
                                    "q" | "queued" => f.status == FlightStatus::Queued,
                                    "a" | "active" => f.status.holds_runway(),
                                    "c" | "completed" => f.status == FlightStatus::Completed,
                                    "x" | "cancelled" => f.status == FlightStatus::Cancelled,
                                    _ => true, // 'ls' or 'ls all'
                                })
                                .cloned()
                                .collect()
                        };
                        if rows.is_empty() {
                            println!("No matching flights found.");
                        } else {
                            print_table(&rows);
                        }
                    },
                    "runways" => {
                        let rows: Vec<RunwayRow> = {
                            let sim = shared.lock().expect("simulation lock poisoned");
                            sim.runways().iter().map(RunwayRow::from).collect()
                        };
                        if rows.is_empty() {
                            println!("No runways registered.");
                        } else {
                            print_table(&rows);
                        }
                    },
                    "tick" => {
                        let minutes = parts
                            .get(1)
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(1);
                        let mut sim = shared.lock().expect("simulation lock poisoned");
                        let before = sim.events().len();
                        for _ in 0..minutes {
                            sim.advance();
                        }
                        for event in &sim.events()[before..] {
                            println!("{event}");
                        }
                        show_status(&sim);
                    },
                    "status" => {
                        let sim = shared.lock().expect("simulation lock poisoned");
                        show_status(&sim);
                    },
                    "add" => match parse_flight_args(&parts) {
                        Ok((id, kind, minute, priority, fuel)) => {
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.add_flight(id.clone(), kind, minute, priority, fuel) {
                                Ok(()) => {
                                    log.note(sim.clock(), &format!("ADDED flight={id} kind={kind}"));
                                    println!("Flight {id} queued.");
                                }
                                Err(err) => println!("{err}"),
                            }
                        }
                        Err(usage) => println!("{usage}"),
                    },
                    "addrunway" => {
                        // addrunway <id> <short|standard|long> <duration>
                        let parsed = (parts.get(1), parts.get(2), parts.get(3));
                        if let (Some(id), Some(category), Some(duration)) = parsed {
                            let Some(category) = RunwayCategory::parse(category) else {
                                println!("unknown runway category: {category}");
                                continue;
                            };
                            let Ok(duration) = duration.parse::<u64>() else {
                                println!("not a duration: {duration}");
                                continue;
                            };
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.add_runway(Arc::from(*id), category, duration, true) {
                                Ok(()) => {
                                    log.note(sim.clock(), &format!("RUNWAY_ADDED id={id} category={category}"));
                                    println!("Runway {id} added.");
                                }
                                Err(err) => println!("{err}"),
                            }
                        } else {
                            println!("Usage: addrunway <id> <short|standard|long> <minutes>");
                        }
                    },
                    "gen" => {
                        let count = parts
                            .get(1)
                            .and_then(|s| s.parse::<usize>().ok())
                            .unwrap_or(5);
                        let mut sim = shared.lock().expect("simulation lock poisoned");
                        for _ in 0..count {
                            let kind = if rand::random::<bool>() {
                                FlightKind::Landing
                            } else {
                                FlightKind::Takeoff
                            };
                            let scheduled = sim.clock() + rand::random_range(0..=10u64);
                            let roll = rand::random_range(0..100u32);
                            let priority = if roll < 80 {
                                Priority::Normal
                            } else if roll < 95 {
                                Priority::High
                            } else {
                                Priority::Emergency
                            };
                            let fuel = match kind {
                                FlightKind::Landing => rand::random_range(5..=45u64),
                                FlightKind::Takeoff => 0,
                            };
                            // re-roll ids that happen to collide
                            let mut added = None;
                            for _ in 0..32 {
                                let id: FlightId = Arc::from(random_flight_id().as_str());
                                match sim.add_flight(id.clone(), kind, scheduled, priority, fuel) {
                                    Ok(()) => {
                                        added = Some(id);
                                        break;
                                    }
                                    Err(CommandError::DuplicateId(_)) => continue,
                                    Err(err) => {
                                        println!("{err}");
                                        break;
                                    }
                                }
                            }
                            match added {
                                Some(id) => {
                                    log.note(sim.clock(), &format!("ADDED flight={id} kind={kind}"));
                                    println!("+ {id}: {kind} at minute {scheduled}, priority {priority}");
                                }
                                None => println!("could not find a free flight id"),
                            }
                        }
                    },
                    "cancel" => {
                        if let Some(id) = parts.get(1) {
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.cancel_flight(id) {
                                Ok(()) => println!("Flight {id} cancelled."),
                                Err(err) => println!("{err}"),
                            }
                        } else {
                            println!("Usage: cancel <flight_id>");
                        }
                    },
                    "enable" | "disable" => {
                        let enabled = parts[0] == "enable";
                        if let Some(id) = parts.get(1) {
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.set_runway_enabled(id, enabled) {
                                Ok(()) => {
                                    log.note(sim.clock(), &format!("RUNWAY_{} id={id}", if enabled { "ENABLED" } else { "DISABLED" }));
                                    println!("Runway {id} {}.", if enabled { "enabled" } else { "disabled" });
                                }
                                Err(err) => println!("{err}"),
                            }
                        } else {
                            println!("Usage: {} <runway_id>", parts[0]);
                        }
                    },
                    "recat" => {
                        if let (Some(id), Some(category)) = (parts.get(1), parts.get(2)) {
                            let Some(category) = RunwayCategory::parse(category) else {
                                println!("unknown runway category: {category}");
                                continue;
                            };
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.set_runway_category(id, category) {
                                Ok(()) => {
                                    log.note(sim.clock(), &format!("RUNWAY_RECAT id={id} category={category}"));
                                    println!("Runway {id} is now {category}.");
                                }
                                Err(err) => println!("{err}"),
                            }
                        } else {
                            println!("Usage: recat <runway_id> <short|standard|long>");
                        }
                    },
                    "release" => {
                        if let Some(id) = parts.get(1) {
                            let mut sim = shared.lock().expect("simulation lock poisoned");
                            match sim.release_runway(id) {
                                Ok(flight) => println!("Runway {id} released. Flight {flight} cancelled."),
                                Err(err) => println!("{err}"),
                            }
                        } else {
                            println!("Usage: release <runway_id>");
                        }
                    },
                    "run" => {
                        if ticker.is_some() {
                            println!("The timer is already running. 'pause' stops it.");
                        } else {
                            let seconds = parts
                                .get(1)
                                .and_then(|s| s.parse::<f64>().ok())
                                .unwrap_or(1.0);
                            if seconds <= 0.0 {
                                println!("The interval must be positive.");
                            } else {
                                ticker = Some(Ticker::spawn(
                                    Arc::clone(&shared),
                                    Duration::from_secs_f64(seconds),
                                ));
                                println!("Timer started: 1 simulated minute every {seconds}s.");
                            }
                        }
                    },
                    "pause" => match ticker.take() {
                        Some(running) => {
                            running.stop();
                            let sim = shared.lock().expect("simulation lock poisoned");
                            show_status(&sim);
                        }
                        None => println!("The timer is not running."),
                    },
                    "stats" => {
                        let sim = shared.lock().expect("simulation lock poisoned");
                        show_stats(&sim);
                    },
                    "report" => {
                        let path = Path::new(parts.get(1).map(|s| *s).unwrap_or("report.log"));
                        let sim = shared.lock().expect("simulation lock poisoned");
                        match write_report(&sim, path) {
                            Ok(()) => println!("Report written to {}", path.display()),
                            Err(err) => println!("Could not write report: {err}"),
                        }
                    },
                    "save" => {
                        let path = parts.get(1).map(|s| *s).unwrap_or("scenario_out.json");
                        let sim = shared.lock().expect("simulation lock poisoned");
                        match sim.save_to_file(path) {
                            Ok(()) => {
                                log.note(sim.clock(), &format!("SAVED path={path}"));
                                println!("Scenario saved to {path}");
                            }
                            Err(err) => println!("Could not save scenario: {err}"),
                        }
                    },
                    "help" | "?" => {
                        println!("\nAvailable Commands:");
                        println!("  ls [q|a|c|x]          - List flights, optionally filtered: queued, active, completed, cancelled");
                        println!("  runways               - Show the runway pool");
                        println!("  tick [n]              - Advance the simulation <n> minutes (default 1)");
                        println!("  status                - One-line state plus fuel alerts");
                        println!("  add <id> <kind> <min> <prio> [fuel] - Queue a flight manually");
                        println!("  addrunway <id> <cat> <min>          - Add a runway (enabled)");
                        println!("  gen [n]               - Generate <n> random flights (default 5)");
                        println!("  cancel <id>           - Cancel a flight, freeing its runway");
                        println!("  enable/disable <id>   - Toggle a runway (busy runways refuse)");
                        println!("  recat <id> <cat>      - Reconfigure a runway category");
                        println!("  release <id>          - Force-release a runway, cancelling its flight");
                        println!("  run [secs]            - Tick automatically every <secs> seconds");
                        println!("  pause                 - Stop the automatic timer");
                        println!("  stats                 - Aggregate counters");
                        println!("  report [file]         - Write a summary report (default report.log)");
                        println!("  save [file]           - Save the scenario as JSON");
                        println!("  help / ?              - Show this help menu");
                        println!("  exit / quit           - Exit the simulator\n");
                    },
                    "exit" | "quit" => break,
                    _ => println!("Unknown command: {}", parts[0]),
                }

                let sim = shared.lock().expect("simulation lock poisoned");
                log.flush_from(&sim);
            },
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            },
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            },
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(running) = ticker.take() {
        running.stop();
    }
    let sim = shared.lock().expect("simulation lock poisoned");
    log.flush_from(&sim);
    Ok(())
}
