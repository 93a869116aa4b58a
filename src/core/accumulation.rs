use super::error::ProjectionError;
use super::types::{Contributions, ContributionTiming, check_fraction, check_non_negative};

/// Quarterly compounding.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 4;

/// Value of a portfolio after `years` of periodic compounding.
///
/// The principal compounds as `p * (1 + r/n)^(n*years)`. Each yearly
/// contribution is split evenly over that year's `n` periods and every
/// per-period slice compounds on its own, with the exponent chosen by
/// [`ContributionTiming::SourceOrder`]: the slice at horizon period `k` grows
/// for `k` periods.
///
/// A [`Contributions::Stream`] is pulled once per year and must supply at
/// least `years` values.
pub fn accumulate(
    principal: f64,
    rate: f64,
    years: u32,
    periods_per_year: u32,
    contributions: Contributions<'_>,
) -> Result<f64, ProjectionError> {
    accumulate_with_timing(
        principal,
        rate,
        years,
        periods_per_year,
        contributions,
        ContributionTiming::default(),
    )
}

pub fn accumulate_with_timing(
    principal: f64,
    rate: f64,
    years: u32,
    periods_per_year: u32,
    contributions: Contributions<'_>,
    timing: ContributionTiming,
) -> Result<f64, ProjectionError> {
    check_non_negative("principal", principal)?;
    check_fraction("rate", rate)?;
    if periods_per_year == 0 {
        return Err(ProjectionError::invalid("periods_per_year", "must be >= 1"));
    }

    let period_rate = rate / periods_per_year as f64;
    let total_periods = u64::from(periods_per_year) * u64::from(years);
    let base = principal * compound(period_rate, total_periods);

    let mut yearly: Box<dyn Iterator<Item = f64> + '_> = match contributions {
        Contributions::Scalar(amount) => {
            check_non_negative("contributions", amount)?;
            if amount == 0.0 {
                return Ok(base);
            }
            Box::new(std::iter::repeat(amount))
        }
        Contributions::Stream(stream) => stream,
    };

    let mut contributed = 0.0;
    for year in 0..years {
        let amount = yearly.next().ok_or(ProjectionError::InsufficientData {
            needed: years,
            supplied: year,
        })?;
        check_non_negative("contributions", amount)?;

        let per_period = amount / periods_per_year as f64;
        for period in 0..periods_per_year {
            let index = u64::from(year) * u64::from(periods_per_year) + u64::from(period);
            let exponent = match timing {
                ContributionTiming::PeriodStart => total_periods - index,
                ContributionTiming::SourceOrder => index,
            };
            contributed += per_period * compound(period_rate, exponent);
        }
    }

    Ok(base + contributed)
}

/// Growth of one unit of currency over the horizon, without contributions.
pub fn tvm_factor(rate: f64, years: u32, periods_per_year: u32) -> Result<f64, ProjectionError> {
    accumulate(1.0, rate, years, periods_per_year, Contributions::Scalar(0.0))
}

fn compound(period_rate: f64, periods: u64) -> f64 {
    match i32::try_from(periods) {
        Ok(exp) => (1.0 + period_rate).powi(exp),
        Err(_) => (1.0 + period_rate).powf(periods as f64),
    }
}
