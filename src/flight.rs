use crate::time::Minute;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabled::Tabled;
use thiserror::Error;

pub type FlightId = Arc<str>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FlightKind {
    Landing,
    Takeoff,
}

impl FlightKind {
    pub fn parse(value: &str) -> Option<FlightKind> {
        match value.to_ascii_lowercase().as_str() {
            "landing" => Some(FlightKind::Landing),
            "takeoff" => Some(FlightKind::Takeoff),
            _ => None,
        }
    }
}

impl fmt::Display for FlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightKind::Landing => write!(f, "Landing"),
            FlightKind::Takeoff => write!(f, "Takeoff"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("priority must be 0, 1 or 2, got {0}")]
pub struct InvalidPriority(pub i64);

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Normal,
    High,
    Emergency,
}

impl Priority {
    pub fn from_level(level: i64) -> Option<Priority> {
        match level {
            0 => Some(Priority::Normal),
            1 => Some(Priority::High),
            2 => Some(Priority::Emergency),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority.level()
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(level: u8) -> Result<Priority, InvalidPriority> {
        Priority::from_level(level as i64).ok_or(InvalidPriority(level as i64))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "Normal"),
            Priority::High => write!(f, "High"),
            Priority::Emergency => write!(f, "Emergency"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FlightStatus {
    Queued,
    Assigning,
    OnRunway,
    Completed,
    Cancelled,
}

impl FlightStatus {
    pub fn parse(value: &str) -> Option<FlightStatus> {
        match value.to_ascii_lowercase().as_str() {
            "queued" => Some(FlightStatus::Queued),
            "assigning" => Some(FlightStatus::Assigning),
            "onrunway" => Some(FlightStatus::OnRunway),
            "completed" => Some(FlightStatus::Completed),
            "cancelled" => Some(FlightStatus::Cancelled),
            _ => None,
        }
    }

    /// Still waiting for a runway; fuel burns and priority may escalate.
    pub fn is_waiting(self) -> bool {
        matches!(self, FlightStatus::Queued | FlightStatus::Assigning)
    }

    /// Committed to a runway until its operation finishes.
    pub fn holds_runway(self) -> bool {
        matches!(self, FlightStatus::Assigning | FlightStatus::OnRunway)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlightStatus::Completed | FlightStatus::Cancelled)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightStatus::Queued => write!(f, "Queued"),
            FlightStatus::Assigning => write!(f, "Assigning"),
            FlightStatus::OnRunway => write!(f, "OnRunway"),
            FlightStatus::Completed => write!(f, "Completed"),
            FlightStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Flight {
    pub id: FlightId,
    pub kind: FlightKind,
    pub scheduled_time: Minute,
    pub priority: Priority,
    pub fuel_minutes: u64,
    pub status: FlightStatus,
}

impl Flight {
    /// Fuel is meaningful only for landings; takeoffs are pinned at zero.
    pub fn new(
        id: FlightId,
        kind: FlightKind,
        scheduled_time: Minute,
        priority: Priority,
        fuel_minutes: u64,
    ) -> Flight {
        let fuel_minutes = match kind {
            FlightKind::Landing => fuel_minutes,
            FlightKind::Takeoff => 0,
        };
        Flight {
            id,
            kind,
            scheduled_time,
            priority,
            fuel_minutes,
            status: FlightStatus::Queued,
        }
    }
}
