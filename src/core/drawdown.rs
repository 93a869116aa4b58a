use std::iter::FusedIterator;

use super::error::ProjectionError;
use super::types::SavingsSnapshot;

/// Year-by-year retirement balance while a fixed stipend is withdrawn.
///
/// Each step reports the balance at the start of the year, then withdraws the
/// stipend and grows what is left at `retirement_rate`. Balances are never
/// clamped: a negative balance marks a depleted portfolio.
pub fn simulate_drawdown(
    starting_balance: f64,
    age_at_start: u32,
    end_age: u32,
    yearly_stipend: f64,
    retirement_rate: f64,
) -> Result<Drawdown, ProjectionError> {
    if starting_balance == 0.0 {
        return Err(ProjectionError::DivisionByZero);
    }
    if !starting_balance.is_finite() {
        return Err(ProjectionError::invalid(
            "starting_balance",
            format!("must be finite, got {starting_balance}"),
        ));
    }
    if end_age < age_at_start {
        return Err(ProjectionError::invalid(
            "end_age",
            format!("must be >= age_at_start ({age_at_start}), got {end_age}"),
        ));
    }

    Ok(Drawdown {
        age: age_at_start,
        end_age,
        balance: starting_balance,
        starting_balance,
        yearly_stipend,
        retirement_rate,
    })
}

/// Lazy, single-pass sequence of [`SavingsSnapshot`]s.
#[derive(Debug, Clone)]
pub struct Drawdown {
    age: u32,
    end_age: u32,
    balance: f64,
    starting_balance: f64,
    yearly_stipend: f64,
    retirement_rate: f64,
}

impl Drawdown {
    /// Age of the first year that starts with a non-positive balance.
    pub fn depletion_age(mut self) -> Option<u32> {
        let depleted = self.find(|snapshot| snapshot.savings <= 0.0)?;
        Some(depleted.age)
    }
}

impl Iterator for Drawdown {
    type Item = SavingsSnapshot;

    fn next(&mut self) -> Option<SavingsSnapshot> {
        if self.age >= self.end_age {
            return None;
        }

        let snapshot = SavingsSnapshot {
            age: self.age,
            savings: self.balance,
            pct_of_original: 100.0 * (self.balance / self.starting_balance),
        };
        self.balance = (self.balance - self.yearly_stipend) * (1.0 + self.retirement_rate);
        self.age += 1;
        Some(snapshot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_age.saturating_sub(self.age) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Drawdown {}

impl FusedIterator for Drawdown {}
