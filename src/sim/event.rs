use crate::flight::FlightId;
use crate::runway::RunwayId;
use crate::time::Minute;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Assigned {
        flight: FlightId,
        runway: RunwayId,
        at: Minute,
    },
    Completed {
        flight: FlightId,
        runway: RunwayId,
        at: Minute,
    },
    Escalated {
        flight: FlightId,
        at: Minute,
    },
    Cancelled {
        flight: FlightId,
        runway: Option<RunwayId>,
        at: Minute,
    },
}

impl Event {
    pub fn at(&self) -> Minute {
        match self {
            Event::Assigned { at, .. }
            | Event::Completed { at, .. }
            | Event::Escalated { at, .. }
            | Event::Cancelled { at, .. } => *at,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Assigned { flight, runway, at } => {
                write!(f, "[t={at}] ASSIGNED flight={flight} runway={runway}")
            }
            Event::Completed { flight, runway, at } => {
                write!(f, "[t={at}] COMPLETED flight={flight} runway={runway}")
            }
            Event::Escalated { flight, at } => {
                write!(f, "[t={at}] EMERGENCY flight={flight} reason=fuel_critical")
            }
            Event::Cancelled { flight, runway, at } => match runway {
                Some(runway) => {
                    write!(f, "[t={at}] CANCELLED flight={flight} runway={runway}")
                }
                None => write!(f, "[t={at}] CANCELLED flight={flight}"),
            },
        }
    }
}
