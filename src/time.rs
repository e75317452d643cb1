use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Copy, Default, Ord, Eq, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct Minute(pub u64);

impl Minute {
    /// Minutes elapsed since `earlier`; zero when `earlier` lies in the future.
    pub fn since(self, earlier: Minute) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for Minute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for Minute {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Minute(self.0 + rhs)
    }
}

impl AddAssign<u64> for Minute {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
