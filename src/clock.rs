//! Simulation clock: the single source of the current hour.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HOURS_PER_DAY: u8 = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("hour {0} is outside 0..=23")]
    InvalidHour(i64),
    #[error("tick period of {0} ms is not one of 500, 1000 or 2000")]
    InvalidTickPeriod(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u64", into = "u64")]
pub enum TickPeriod {
    Fast,
    #[default]
    Normal,
    Slow,
}

impl TickPeriod {
    pub fn from_millis(ms: u64) -> Result<Self, ClockError> {
        match ms {
            500 => Ok(TickPeriod::Fast),
            1000 => Ok(TickPeriod::Normal),
            2000 => Ok(TickPeriod::Slow),
            other => Err(ClockError::InvalidTickPeriod(other)),
        }
    }

    pub fn as_millis(self) -> u64 {
        match self {
            TickPeriod::Fast => 500,
            TickPeriod::Normal => 1000,
            TickPeriod::Slow => 2000,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.as_millis())
    }

    pub fn label(self) -> &'static str {
        match self {
            TickPeriod::Fast => "Fast (0.5s)",
            TickPeriod::Normal => "Normal (1s)",
            TickPeriod::Slow => "Slow (2s)",
        }
    }
}

impl TryFrom<u64> for TickPeriod {
    type Error = ClockError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_millis(value)
    }
}

impl From<TickPeriod> for u64 {
    fn from(value: TickPeriod) -> Self {
        value.as_millis()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    current_hour: u8,
    running: bool,
    tick_period: TickPeriod,
}

impl SimulationClock {
    pub fn new(start_hour: u8, tick_period: TickPeriod) -> Result<Self, ClockError> {
        let current_hour = validate_hour(i64::from(start_hour))?;
        Ok(Self {
            current_hour,
            running: false,
            tick_period,
        })
    }

    pub fn current_hour(&self) -> u8 {
        self.current_hour
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_period(&self) -> TickPeriod {
        self.tick_period
    }

    /// Moves one hour forward, wrapping 23 -> 0. Returns the new hour, or
    /// `None` when the clock is stopped.
    pub fn advance(&mut self) -> Option<u8> {
        if !self.running {
            return None;
        }
        self.current_hour = (self.current_hour + 1) % HOURS_PER_DAY;
        Some(self.current_hour)
    }

    /// Out-of-range hours are rejected and leave the clock untouched.
    pub fn set_hour(&mut self, hour: i64) -> Result<u8, ClockError> {
        self.current_hour = validate_hour(hour)?;
        Ok(self.current_hour)
    }

    pub fn set_tick_period(&mut self, period: TickPeriod) {
        self.tick_period = period;
    }

    /// Returns true when the clock was stopped before the call.
    pub fn start(&mut self) -> bool {
        let changed = !self.running;
        self.running = true;
        changed
    }

    /// Returns true when the clock was running before the call.
    pub fn stop(&mut self) -> bool {
        let changed = self.running;
        self.running = false;
        changed
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            current_hour: 6,
            running: false,
            tick_period: TickPeriod::Normal,
        }
    }
}

pub fn validate_hour(hour: i64) -> Result<u8, ClockError> {
    if (0..i64::from(HOURS_PER_DAY)).contains(&hour) {
        Ok(hour as u8)
    } else {
        Err(ClockError::InvalidHour(hour))
    }
}

/// Formats an hour of the day as `"06:00 AM"` / `"12:00 PM"`.
pub fn format_hour(hour: u8) -> String {
    let h = hour % HOURS_PER_DAY;
    let suffix = if h < 12 { "AM" } else { "PM" };
    let display = if h % 12 == 0 { 12 } else { h % 12 };
    format!("{display:02}:00 {suffix}")
}
