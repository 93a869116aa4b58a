mod accumulation;
mod contribution;
mod drawdown;
mod error;
mod projection;
mod types;

pub use accumulation::{DEFAULT_PERIODS_PER_YEAR, accumulate, accumulate_with_timing, tvm_factor};
pub use contribution::{ContributionIter, ContributionStream};
pub use drawdown::{Drawdown, simulate_drawdown};
pub use error::ProjectionError;
pub use projection::{Projection, run_projection};
pub use types::{
    ContributionTiming, Contributions, MAX_HORIZON_YEARS, ParameterSet,
    RETIREMENT_REDUCED_COST_FACTOR, SavingsSnapshot,
};
