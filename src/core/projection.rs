use serde::Serialize;
use tracing::debug;

use super::accumulation::{DEFAULT_PERIODS_PER_YEAR, accumulate, tvm_factor};
use super::drawdown::simulate_drawdown;
use super::error::ProjectionError;
use super::types::{Contributions, ParameterSet, SavingsSnapshot};

/// Career accumulation followed by retirement drawdown for one parameter set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub retirement_age: u32,
    pub retirement_year: i32,
    pub years_until_retirement: u32,
    pub yearly_stipend: f64,
    pub tvm_factor: f64,
    pub savings_at_retirement: f64,
    pub total_contributed: f64,
    pub upfront_investment: f64,
    /// Retirement age plus the number of stipends the savings cover, ignoring
    /// growth during retirement.
    pub lasts_until_age: f64,
    pub depletion_age: Option<u32>,
    pub retirement_years: Vec<SavingsSnapshot>,
}

pub fn run_projection(
    params: &ParameterSet,
    current_year: i32,
) -> Result<Projection, ProjectionError> {
    params.validate()?;

    let retirement_year = params.retirement_year()?;
    let years = params.years_until_retirement(current_year)?;
    let stipend = params.yearly_retirement_stipend();
    let stream = params.contribution_stream();

    let savings_at_retirement = accumulate(
        params.upfront_investment,
        params.career_return_rate,
        years,
        DEFAULT_PERIODS_PER_YEAR,
        Contributions::stream(stream.iter()),
    )?;
    debug!(
        years,
        savings_at_retirement, "accumulated savings through career"
    );

    let drawdown = simulate_drawdown(
        savings_at_retirement,
        params.retirement_age,
        params.life_span,
        stipend,
        params.retirement_return_rate,
    )?;
    let depletion_age = drawdown.clone().depletion_age();
    let retirement_years: Vec<SavingsSnapshot> = drawdown.collect();
    debug!(
        retirement_years = retirement_years.len(),
        ?depletion_age,
        "simulated retirement drawdown"
    );

    Ok(Projection {
        retirement_age: params.retirement_age,
        retirement_year,
        years_until_retirement: years,
        yearly_stipend: stipend,
        tvm_factor: tvm_factor(params.career_return_rate, years, DEFAULT_PERIODS_PER_YEAR)?,
        savings_at_retirement,
        total_contributed: stream.total(years),
        upfront_investment: params.upfront_investment,
        lasts_until_age: lasts_until_age(params.retirement_age, savings_at_retirement, stipend),
        depletion_age,
        retirement_years,
    })
}

fn lasts_until_age(retirement_age: u32, savings: f64, stipend: f64) -> f64 {
    if stipend <= 0.0 {
        return f64::INFINITY;
    }
    retirement_age as f64 + savings / stipend
}
