use serde::Serialize;

use super::contribution::ContributionStream;
use super::error::ProjectionError;

/// Share of the working salary needed once retired.
pub const RETIREMENT_REDUCED_COST_FACTOR: f64 = 0.7;

/// Upper bound on `life_span` and on the career length, in years.
pub const MAX_HORIZON_YEARS: u32 = 150;

/// Fully resolved assumptions for one projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    pub birth_year: i32,
    pub life_span: u32,
    pub retirement_age: u32,
    pub yearly_salary: f64,
    pub salary_growth_rate: f64,
    pub career_return_rate: f64,
    pub retirement_return_rate: f64,
    pub upfront_investment: f64,
    pub contribution_ratio: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            birth_year: 1999,
            life_span: 100,
            retirement_age: 65,
            yearly_salary: 50_000.0,
            salary_growth_rate: 0.01,
            career_return_rate: 0.07,
            retirement_return_rate: 0.045,
            upfront_investment: 0.0,
            contribution_ratio: 0.15,
        }
    }
}

impl ParameterSet {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.retirement_age == 0 {
            return Err(ProjectionError::invalid("retirement_age", "must be > 0"));
        }
        if self.life_span > MAX_HORIZON_YEARS {
            return Err(ProjectionError::invalid(
                "life_span",
                format!("must be <= {MAX_HORIZON_YEARS}, got {}", self.life_span),
            ));
        }
        if self.life_span <= self.retirement_age {
            return Err(ProjectionError::invalid(
                "life_span",
                format!("must be > retirement_age ({})", self.retirement_age),
            ));
        }
        check_non_negative("yearly_salary", self.yearly_salary)?;
        check_non_negative("upfront_investment", self.upfront_investment)?;
        check_fraction("contribution_ratio", self.contribution_ratio)?;
        check_fraction("career_return_rate", self.career_return_rate)?;
        check_growth("salary_growth_rate", self.salary_growth_rate)?;
        check_growth("retirement_return_rate", self.retirement_return_rate)?;
        Ok(())
    }

    pub fn retirement_year(&self) -> Result<i32, ProjectionError> {
        i32::try_from(self.retirement_age)
            .ok()
            .and_then(|age| self.birth_year.checked_add(age))
            .ok_or_else(|| {
                ProjectionError::invalid(
                    "birth_year",
                    format!(
                        "{} + retirement age {} is out of range",
                        self.birth_year, self.retirement_age
                    ),
                )
            })
    }

    /// Whole years between `current_year` and the retirement year, at most
    /// [`MAX_HORIZON_YEARS`].
    pub fn years_until_retirement(&self, current_year: i32) -> Result<u32, ProjectionError> {
        let retirement_year = self.retirement_year()?;
        let years = i64::from(retirement_year) - i64::from(current_year);
        if years < 0 {
            return Err(ProjectionError::invalid(
                "retirement_age",
                format!(
                    "retirement year {retirement_year} is before the current year {current_year}"
                ),
            ));
        }
        match u32::try_from(years) {
            Ok(years) if years <= MAX_HORIZON_YEARS => Ok(years),
            _ => Err(ProjectionError::invalid(
                "birth_year",
                format!(
                    "retirement year {retirement_year} is more than {MAX_HORIZON_YEARS} years after {current_year}"
                ),
            )),
        }
    }

    pub fn years_alive_post_retirement(&self) -> u32 {
        self.life_span.saturating_sub(self.retirement_age)
    }

    pub fn yearly_retirement_stipend(&self) -> f64 {
        self.yearly_salary * RETIREMENT_REDUCED_COST_FACTOR
    }

    pub fn contribution_stream(&self) -> ContributionStream {
        ContributionStream::new(
            self.contribution_ratio,
            self.yearly_salary,
            self.salary_growth_rate,
        )
    }
}

/// One year of retirement: balance at the start of the year at `age`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSnapshot {
    pub age: u32,
    pub savings: f64,
    pub pct_of_original: f64,
}

/// Yearly additions fed to the accumulation engine.
pub enum Contributions<'a> {
    /// The same amount every year.
    Scalar(f64),
    /// One amount per year, pulled lazily.
    Stream(Box<dyn Iterator<Item = f64> + 'a>),
}

impl<'a> Contributions<'a> {
    pub fn stream<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: 'a,
    {
        Contributions::Stream(Box::new(amounts.into_iter()))
    }
}

impl Default for Contributions<'_> {
    fn default() -> Self {
        Contributions::Scalar(0.0)
    }
}

impl From<f64> for Contributions<'_> {
    fn from(value: f64) -> Self {
        Contributions::Scalar(value)
    }
}

impl std::fmt::Debug for Contributions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Contributions::Scalar(amount) => f.debug_tuple("Scalar").field(amount).finish(),
            Contributions::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// When a period's contribution starts compounding.
///
/// Neither assignment has been checked against a reference accrual model.
/// `SourceOrder` grows the contribution at horizon period `k` for `k`
/// periods, the assignment earlier releases used: identical to an
/// end-of-period annuity for flat contributions, reversed for growing ones.
/// `PeriodStart` grows it for `n * years - k` periods.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContributionTiming {
    #[default]
    SourceOrder,
    PeriodStart,
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), ProjectionError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ProjectionError::invalid(
            name,
            format!("must be a finite value >= 0, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_fraction(name: &'static str, value: f64) -> Result<(), ProjectionError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ProjectionError::invalid(
            name,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

fn check_growth(name: &'static str, value: f64) -> Result<(), ProjectionError> {
    if !value.is_finite() || value <= -1.0 {
        return Err(ProjectionError::invalid(
            name,
            format!("must be a finite value > -1, got {value}"),
        ));
    }
    Ok(())
}
