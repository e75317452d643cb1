use crate::flight::{Flight, FlightId, FlightKind, FlightStatus, Priority};
use crate::runway::{Runway, RunwayCategory, RunwayId};
use crate::sim::event::Event;
use crate::sim::policy::{compatible, selection_key};
use crate::time::Minute;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    #[error("id {0} is already taken")]
    DuplicateId(Arc<str>),
    #[error("no flight or runway with id {0}")]
    NotFound(Arc<str>),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("flight {0} is already completed or cancelled")]
    AlreadyTerminal(FlightId),
    #[error("runway {0} is occupied")]
    RunwayBusy(RunwayId),
    #[error("runway {0} is not occupied")]
    RunwayIdle(RunwayId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadWarning {
    pub record: String,
    pub reason: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.record, self.reason)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub clock: Minute,
    pub flights: usize,
    pub queued: usize,
    pub assigning: usize,
    pub on_runway: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub landings: usize,
    pub takeoffs: usize,
    pub normal: usize,
    pub high: usize,
    pub emergency: usize,
    pub fuel_critical: usize,
    pub runways: usize,
    pub runways_enabled: usize,
    pub runways_free: usize,
    pub runways_occupied: usize,
}

pub struct Simulation {
    clock: Minute,
    flights: Vec<Flight>,
    flights_index: HashMap<FlightId, usize>,
    runways: Vec<Runway>,
    runways_index: HashMap<RunwayId, usize>,
    events: Vec<Event>,
}

impl Simulation {
    /// A waiting landing at or below this fuel level is an emergency.
    pub const CRITICAL_FUEL: u64 = 5;

    pub fn new() -> Simulation {
        Simulation {
            clock: Minute(0),
            flights: Vec::new(),
            flights_index: HashMap::new(),
            runways: Vec::new(),
            runways_index: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn clock(&self) -> Minute {
        self.clock
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn critical_landings(&self) -> impl Iterator<Item = &Flight> {
        self.flights.iter().filter(|f| {
            f.kind == FlightKind::Landing
                && f.status.is_waiting()
                && f.fuel_minutes <= Self::CRITICAL_FUEL
        })
    }

    pub fn add_flight(
        &mut self,
        id: FlightId,
        kind: FlightKind,
        scheduled_time: Minute,
        priority: Priority,
        fuel_minutes: u64,
    ) -> Result<(), CommandError> {
        if self.flights_index.contains_key(&id) {
            return Err(CommandError::DuplicateId(id));
        }
        self.flights_index.insert(id.clone(), self.flights.len());
        self.flights
            .push(Flight::new(id, kind, scheduled_time, priority, fuel_minutes));
        Ok(())
    }

    pub fn add_runway(
        &mut self,
        id: RunwayId,
        category: RunwayCategory,
        service_duration: u64,
        enabled: bool,
    ) -> Result<(), CommandError> {
        if self.runways_index.contains_key(&id) {
            return Err(CommandError::DuplicateId(id));
        }
        if service_duration == 0 {
            return Err(CommandError::InvalidArgument(
                "service duration must be at least 1 minute".to_string(),
            ));
        }
        self.runways_index.insert(id.clone(), self.runways.len());
        self.runways
            .push(Runway::new(id, category, service_duration, enabled));
        Ok(())
    }

    pub fn set_runway_enabled(&mut self, id: &str, enabled: bool) -> Result<(), CommandError> {
        let idx = *self
            .runways_index
            .get(id)
            .ok_or_else(|| CommandError::NotFound(Arc::from(id)))?;
        let runway = &mut self.runways[idx];
        if !enabled && runway.current_flight.is_some() {
            return Err(CommandError::RunwayBusy(runway.id.clone()));
        }
        runway.enabled = enabled;
        Ok(())
    }

    /// Explicit reconfiguration; the scheduler never changes a category.
    pub fn set_runway_category(
        &mut self,
        id: &str,
        category: RunwayCategory,
    ) -> Result<(), CommandError> {
        let idx = *self
            .runways_index
            .get(id)
            .ok_or_else(|| CommandError::NotFound(Arc::from(id)))?;
        self.runways[idx].category = category;
        Ok(())
    }

    /// Cancels the flight and frees any runway it holds in the same operation.
    pub fn cancel_flight(&mut self, id: &str) -> Result<(), CommandError> {
        let idx = *self
            .flights_index
            .get(id)
            .ok_or_else(|| CommandError::NotFound(Arc::from(id)))?;
        if self.flights[idx].status.is_terminal() {
            return Err(CommandError::AlreadyTerminal(self.flights[idx].id.clone()));
        }
        let flight_id = self.flights[idx].id.clone();
        let freed = self
            .runways
            .iter_mut()
            .find(|r| r.current_flight.as_deref() == Some(&*flight_id))
            .map(|runway| {
                runway.clear();
                runway.id.clone()
            });
        self.flights[idx].status = FlightStatus::Cancelled;
        self.events.push(Event::Cancelled {
            flight: flight_id,
            runway: freed,
            at: self.clock,
        });
        Ok(())
    }

    /// Emergency release: cancels whatever flight holds the runway.
    pub fn release_runway(&mut self, id: &str) -> Result<FlightId, CommandError> {
        let idx = *self
            .runways_index
            .get(id)
            .ok_or_else(|| CommandError::NotFound(Arc::from(id)))?;
        let Some(flight_id) = self.runways[idx].current_flight.clone() else {
            return Err(CommandError::RunwayIdle(self.runways[idx].id.clone()));
        };
        self.cancel_flight(&flight_id)?;
        Ok(flight_id)
    }

    /// One simulated minute: age fuel, escalate, release, assign. The four
    /// phases run in this order, always.
    pub fn advance(&mut self) {
        self.clock += 1;
        self.burn_fuel();
        self.escalate_critical();
        self.release_expired();
        self.assign_free_runways();
        self.assert_invariants();
    }

    fn burn_fuel(&mut self) {
        for flight in self.flights.iter_mut() {
            if flight.kind == FlightKind::Landing && flight.status.is_waiting() {
                flight.fuel_minutes = flight.fuel_minutes.saturating_sub(1);
            }
        }
    }

    fn escalate_critical(&mut self) {
        for flight in self.flights.iter_mut() {
            if flight.kind == FlightKind::Landing
                && flight.status.is_waiting()
                && flight.fuel_minutes <= Self::CRITICAL_FUEL
                && flight.priority < Priority::Emergency
            {
                flight.priority = Priority::Emergency;
                self.events.push(Event::Escalated {
                    flight: flight.id.clone(),
                    at: self.clock,
                });
            }
        }
    }

    fn release_expired(&mut self) {
        for runway in self.runways.iter_mut() {
            if !runway.release_time.is_some_and(|t| t <= self.clock) {
                continue;
            }
            let Some(flight_id) = runway.current_flight.clone() else {
                continue;
            };
            if let Some(&idx) = self.flights_index.get(&flight_id) {
                self.flights[idx].status = FlightStatus::Completed;
            }
            runway.clear();
            self.events.push(Event::Completed {
                flight: flight_id,
                runway: runway.id.clone(),
                at: self.clock,
            });
        }
    }

    fn assign_free_runways(&mut self) {
        // stable runway order, by id
        let mut order: Vec<usize> = (0..self.runways.len()).collect();
        order.sort_by(|&a, &b| self.runways[a].id.cmp(&self.runways[b].id));

        for runway_idx in order {
            if !self.runways[runway_idx].is_free() {
                continue;
            }
            let mut candidates: Vec<usize> = self
                .flights
                .iter()
                .enumerate()
                .filter(|(_, f)| f.status == FlightStatus::Queued)
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by_key(|&i| selection_key(&self.flights[i], self.clock));

            // best-ranked candidate this runway can actually serve; the
            // runway sits idle this tick if none is compatible
            let Some(&chosen) = candidates
                .iter()
                .find(|&&i| compatible(&self.runways[runway_idx], &self.flights[i]))
            else {
                continue;
            };

            let release_at = self.clock + self.runways[runway_idx].service_duration;
            let flight_id = self.flights[chosen].id.clone();
            self.flights[chosen].status = FlightStatus::OnRunway;
            self.runways[runway_idx].occupy(flight_id.clone(), release_at);
            self.events.push(Event::Assigned {
                flight: flight_id,
                runway: self.runways[runway_idx].id.clone(),
                at: self.clock,
            });
        }
    }

    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            clock: self.clock,
            flights: self.flights.len(),
            runways: self.runways.len(),
            ..Stats::default()
        };
        for flight in &self.flights {
            match flight.status {
                FlightStatus::Queued => stats.queued += 1,
                FlightStatus::Assigning => stats.assigning += 1,
                FlightStatus::OnRunway => stats.on_runway += 1,
                FlightStatus::Completed => stats.completed += 1,
                FlightStatus::Cancelled => stats.cancelled += 1,
            }
            match flight.kind {
                FlightKind::Landing => stats.landings += 1,
                FlightKind::Takeoff => stats.takeoffs += 1,
            }
            match flight.priority {
                Priority::Normal => stats.normal += 1,
                Priority::High => stats.high += 1,
                Priority::Emergency => stats.emergency += 1,
            }
        }
        stats.fuel_critical = self.critical_landings().count();
        for runway in &self.runways {
            if runway.enabled {
                stats.runways_enabled += 1;
            }
            if runway.current_flight.is_some() {
                stats.runways_occupied += 1;
            } else if runway.enabled {
                stats.runways_free += 1;
            }
        }
        stats
    }

    pub fn load_from_file(path: &str) -> io::Result<(Simulation, Vec<LoadWarning>)> {
        let data = std::fs::read_to_string(path)?;
        Ok(Simulation::from_json(&data)?)
    }

    /// Builds a simulation from a raw scenario. Unknown status/priority
    /// values are normalized to defaults; malformed records are skipped.
    /// Either way the caller gets a warning; the engine itself never sees
    /// an invalid record.
    pub fn from_json(data: &str) -> serde_json::Result<(Simulation, Vec<LoadWarning>)> {
        let raw: RawScenario = serde_json::from_str(data)?;
        let mut warnings = Vec::new();
        let mut sim = Simulation::new();
        sim.clock = Minute(raw.clock);

        for record in raw.flights {
            let id = record.id.trim();
            if id.is_empty() {
                warnings.push(LoadWarning {
                    record: "<flight>".to_string(),
                    reason: "record has no id, skipped".to_string(),
                });
                continue;
            }
            if sim.flights_index.contains_key(id) {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: "duplicate flight id, skipped".to_string(),
                });
                continue;
            }
            let Some(kind) = FlightKind::parse(&record.kind) else {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: format!("unknown kind {:?}, skipped", record.kind),
                });
                continue;
            };
            if record.fuel_minutes < 0 {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: "negative fuel, skipped".to_string(),
                });
                continue;
            }
            let priority = Priority::from_level(record.priority).unwrap_or_else(|| {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: format!("priority {} out of range, using Normal", record.priority),
                });
                Priority::Normal
            });
            let status = if record.status.is_empty() {
                FlightStatus::Queued
            } else {
                FlightStatus::parse(&record.status).unwrap_or_else(|| {
                    warnings.push(LoadWarning {
                        record: id.to_string(),
                        reason: format!("unknown status {:?}, using Queued", record.status),
                    });
                    FlightStatus::Queued
                })
            };
            let mut flight = Flight::new(
                Arc::from(id),
                kind,
                Minute(record.scheduled_time),
                priority,
                record.fuel_minutes as u64,
            );
            flight.status = status;
            sim.flights_index.insert(flight.id.clone(), sim.flights.len());
            sim.flights.push(flight);
        }

        for record in raw.runways {
            let id = record.id.trim();
            if id.is_empty() {
                warnings.push(LoadWarning {
                    record: "<runway>".to_string(),
                    reason: "record has no id, skipped".to_string(),
                });
                continue;
            }
            if sim.runways_index.contains_key(id) {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: "duplicate runway id, skipped".to_string(),
                });
                continue;
            }
            let Some(category) = RunwayCategory::parse(&record.category) else {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: format!("unknown category {:?}, skipped", record.category),
                });
                continue;
            };
            if record.service_duration < 1 {
                warnings.push(LoadWarning {
                    record: id.to_string(),
                    reason: "service duration must be at least 1 minute, skipped".to_string(),
                });
                continue;
            }
            let mut runway = Runway::new(
                Arc::from(id),
                category,
                record.service_duration as u64,
                record.enabled,
            );
            if let Some(flight_id) = record.current_flight {
                runway.occupy(Arc::from(flight_id.as_str()), Minute(0));
                runway.release_time = record.release_time.map(Minute);
            }
            sim.runways_index.insert(runway.id.clone(), sim.runways.len());
            sim.runways.push(runway);
        }

        sim.reconcile_occupancy(&mut warnings);
        Ok((sim, warnings))
    }

    /// Drops occupancy claims the flight registry cannot back, and re-queues
    /// committed flights no runway claims. The result satisfies the same
    /// invariants `advance` maintains.
    fn reconcile_occupancy(&mut self, warnings: &mut Vec<LoadWarning>) {
        let mut claimed: HashMap<FlightId, RunwayId> = HashMap::new();
        for runway in self.runways.iter_mut() {
            let Some(flight_id) = runway.current_flight.clone() else {
                continue;
            };
            let resolved = self
                .flights_index
                .get(&flight_id)
                .map(|&idx| &self.flights[idx]);
            let reason = if !runway.enabled {
                Some("disabled runway cannot be occupied")
            } else if runway.release_time.is_none() {
                Some("occupied runway has no release time")
            } else if resolved.is_none() {
                Some("occupying flight does not exist")
            } else if resolved.is_some_and(|f| !f.status.holds_runway()) {
                Some("occupying flight is not committed to a runway")
            } else if claimed.contains_key(&flight_id) {
                Some("flight already occupies another runway")
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    warnings.push(LoadWarning {
                        record: runway.id.to_string(),
                        reason: format!("{reason}, runway reset to free"),
                    });
                    runway.clear();
                }
                None => {
                    claimed.insert(flight_id, runway.id.clone());
                }
            }
        }
        for flight in self.flights.iter_mut() {
            if flight.status.holds_runway() && !claimed.contains_key(&flight.id) {
                warnings.push(LoadWarning {
                    record: flight.id.to_string(),
                    reason: "no runway backs this flight, re-queued".to_string(),
                });
                flight.status = FlightStatus::Queued;
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Scenario<'a> {
            clock: Minute,
            flights: &'a [Flight],
            runways: &'a [Runway],
        }
        serde_json::to_string_pretty(&Scenario {
            clock: self.clock,
            flights: &self.flights,
            runways: &self.runways,
        })
    }

    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        std::fs::write(path, self.to_json()?)
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.runways
                .iter()
                .filter(|r| r.current_flight.is_some())
                .count()
                <= self.runways.iter().filter(|r| r.enabled).count(),
            "more occupied runways than enabled ones"
        );

        let mut seen: Vec<&str> = Vec::new();
        for runway in &self.runways {
            let Some(flight_id) = runway.current_flight.as_deref() else {
                continue;
            };
            debug_assert!(runway.enabled, "occupied runway {} is disabled", runway.id);
            debug_assert!(
                runway.release_time.is_some(),
                "occupied runway {} has no release time",
                runway.id
            );
            debug_assert!(
                !seen.contains(&flight_id),
                "flight {flight_id} occupies two runways"
            );
            debug_assert!(
                self.flights_index
                    .get(flight_id)
                    .is_some_and(|&idx| self.flights[idx].status.holds_runway()),
                "runway {} holds a flight that is not committed",
                runway.id
            );
            seen.push(flight_id);
        }

        debug_assert!(
            self.flights
                .iter()
                .filter(|f| f.status.holds_runway())
                .all(|f| seen.contains(&&*f.id)),
            "committed flight without a backing runway"
        );
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new()
    }
}

#[derive(Deserialize)]
struct RawScenario {
    #[serde(default)]
    clock: u64,
    #[serde(default)]
    flights: Vec<RawFlight>,
    #[serde(default)]
    runways: Vec<RawRunway>,
}

#[derive(Deserialize)]
struct RawFlight {
    #[serde(default)]
    id: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    scheduled_time: u64,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    fuel_minutes: i64,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct RawRunway {
    #[serde(default)]
    id: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    service_duration: i64,
    #[serde(default = "enabled_default")]
    enabled: bool,
    #[serde(default)]
    current_flight: Option<String>,
    #[serde(default)]
    release_time: Option<u64>,
}

fn enabled_default() -> bool {
    true
}
