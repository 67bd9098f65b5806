//! Hour clock for the Humanity simulation.
//!
//! The hour counter is the single source of truth for calendar state. Day
//! and month boundaries, workdays, and the work and rest windows are all
//! derived from it through the [`CalendarConfig`]; none of them is stored.

use humanity_agents::Moment;

use crate::config::CalendarConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Hour counter would overflow.
    #[error("hour counter overflow: cannot advance beyond u64::MAX")]
    HourOverflow,

    /// Invalid calendar configuration (e.g. zero hours per day).
    #[error("invalid calendar configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Simulation clock counting hours from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourClock {
    hour: u64,
    calendar: CalendarConfig,
}

impl HourClock {
    /// A clock at hour 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any calendar length is zero.
    pub fn new(calendar: &CalendarConfig) -> Result<Self, ClockError> {
        Self::starting_at(0, calendar)
    }

    /// A clock at an arbitrary hour (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any calendar length is zero.
    pub fn starting_at(hour: u64, calendar: &CalendarConfig) -> Result<Self, ClockError> {
        if calendar.hours_per_day == 0 || calendar.days_per_month == 0 || calendar.days_per_week == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "hours_per_day, days_per_month and days_per_week must be at least 1".to_owned(),
            });
        }
        if calendar.hours_per_day.checked_mul(calendar.days_per_month).is_none() {
            return Err(ClockError::InvalidConfig {
                reason: "hours per month overflow".to_owned(),
            });
        }
        Ok(Self {
            hour,
            calendar: calendar.clone(),
        })
    }

    /// Advance by one hour. Returns the new hour.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::HourOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.hour = self.hour.checked_add(1).ok_or(ClockError::HourOverflow)?;
        Ok(self.hour)
    }

    /// Current hour.
    pub const fn hour(&self) -> u64 {
        self.hour
    }

    /// Hour within the current day.
    pub fn hour_of_day(&self) -> u64 {
        self.hour.checked_rem(self.calendar.hours_per_day).unwrap_or(0)
    }

    /// Days elapsed since hour 0.
    pub fn day(&self) -> u64 {
        self.hour.checked_div(self.calendar.hours_per_day).unwrap_or(0)
    }

    /// Whether this is the first hour of a day.
    pub fn is_day_start(&self) -> bool {
        self.hour_of_day() == 0
    }

    /// Whether this is the first hour of a month.
    pub fn is_month_start(&self) -> bool {
        let hours_per_month = self
            .calendar
            .hours_per_day
            .saturating_mul(self.calendar.days_per_month);
        self.hour.checked_rem(hours_per_month) == Some(0)
    }

    /// Whether today is a workday. The first days of each week are.
    pub fn is_workday(&self) -> bool {
        self.day()
            .checked_rem(self.calendar.days_per_week)
            .is_some_and(|weekday| weekday < self.calendar.workdays_per_week)
    }

    /// Whether the hour is inside the work window of a workday.
    pub fn is_work_time(&self) -> bool {
        let hour = self.hour_of_day();
        self.is_workday() && hour >= self.calendar.work_start_hour && hour < self.calendar.work_end_hour
    }

    /// Whether the hour is inside the rest window, which may wrap past
    /// midnight.
    pub fn is_rest(&self) -> bool {
        let hour = self.hour_of_day();
        let (start, end) = (self.calendar.rest_start_hour, self.calendar.rest_end_hour);
        if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Calendar facts for the current hour.
    pub fn moment(&self) -> Moment {
        Moment {
            hour: self.hour,
            day_start: self.is_day_start(),
            month_start: self.is_month_start(),
            at_work: self.is_work_time(),
            rest: self.is_rest(),
        }
    }
}
