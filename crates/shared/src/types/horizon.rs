//! The modeled horizon: the ordered years a projection covers.

use serde::{Deserialize, Serialize};

/// Inclusive range of modeled years, e.g. 2025..=2029.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// First modeled year.
    pub start_year: i32,
    /// Last modeled year (inclusive).
    pub end_year: i32,
}

impl Horizon {
    /// Creates a horizon, or `None` if `start_year` is after `end_year`.
    #[must_use]
    pub const fn new(start_year: i32, end_year: i32) -> Option<Self> {
        if start_year > end_year {
            return None;
        }
        Some(Self {
            start_year,
            end_year,
        })
    }

    /// Number of modeled years.
    ///
    /// Computed in `i64`, so the full `i32` year range does not overflow.
    #[must_use]
    pub fn len(&self) -> usize {
        let span = i64::from(self.end_year) - i64::from(self.start_year) + 1;
        usize::try_from(span).unwrap_or(usize::MAX)
    }

    /// A valid horizon always holds at least one year.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Calendar year for a zero-based year index, if inside the horizon.
    #[must_use]
    pub fn year_at(&self, index: usize) -> Option<i32> {
        let offset = i32::try_from(index).ok()?;
        let year = self.start_year.checked_add(offset)?;
        (year <= self.end_year).then_some(year)
    }

    /// Iterates over the calendar years of the horizon.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..=self.end_year
    }
}

#[cfg(test)]
#[path = "horizon_tests.rs"]
mod tests;
