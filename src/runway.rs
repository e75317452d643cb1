use crate::flight::FlightId;
use crate::time::Minute;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type RunwayId = Arc<str>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RunwayCategory {
    Short,
    Standard,
    Long,
}

impl RunwayCategory {
    pub fn parse(value: &str) -> Option<RunwayCategory> {
        match value.to_ascii_lowercase().as_str() {
            "short" => Some(RunwayCategory::Short),
            "standard" => Some(RunwayCategory::Standard),
            "long" => Some(RunwayCategory::Long),
            _ => None,
        }
    }

    /// Short runways cannot take takeoffs or emergency landings.
    pub fn takes_heavy_traffic(self) -> bool {
        matches!(self, RunwayCategory::Standard | RunwayCategory::Long)
    }
}

impl fmt::Display for RunwayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunwayCategory::Short => write!(f, "Short"),
            RunwayCategory::Standard => write!(f, "Standard"),
            RunwayCategory::Long => write!(f, "Long"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunwayStatus {
    Free,
    Occupied,
    Disabled,
}

impl fmt::Display for RunwayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunwayStatus::Free => write!(f, "Free"),
            RunwayStatus::Occupied => write!(f, "Occupied"),
            RunwayStatus::Disabled => write!(f, "Disabled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Runway {
    pub id: RunwayId,
    pub category: RunwayCategory,
    pub service_duration: u64,
    pub enabled: bool,
    pub current_flight: Option<FlightId>,
    pub release_time: Option<Minute>,
}

impl Runway {
    pub fn new(
        id: RunwayId,
        category: RunwayCategory,
        service_duration: u64,
        enabled: bool,
    ) -> Runway {
        Runway {
            id,
            category,
            service_duration,
            enabled,
            current_flight: None,
            release_time: None,
        }
    }

    pub fn status(&self) -> RunwayStatus {
        if !self.enabled {
            RunwayStatus::Disabled
        } else if self.current_flight.is_some() {
            RunwayStatus::Occupied
        } else {
            RunwayStatus::Free
        }
    }

    pub fn is_free(&self) -> bool {
        self.enabled && self.current_flight.is_none()
    }

    pub(crate) fn occupy(&mut self, flight: FlightId, until: Minute) {
        self.current_flight = Some(flight);
        self.release_time = Some(until);
    }

    pub(crate) fn clear(&mut self) {
        self.current_flight = None;
        self.release_time = None;
    }
}
