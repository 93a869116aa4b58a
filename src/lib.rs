//! Retirement savings projection: compound growth of contributions through a
//! career, then a year-by-year drawdown through retirement.

pub mod api;
pub mod core;
