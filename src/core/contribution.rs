use std::iter::FusedIterator;

/// Yearly retirement contributions that grow with salary.
///
/// The amount for a year is a pure function of its index, so the stream can
/// be walked any number of times; each [`ContributionStream::iter`] call
/// starts again at year 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionStream {
    ratio: f64,
    salary: f64,
    growth_rate: f64,
}

impl ContributionStream {
    pub fn new(ratio: f64, salary: f64, growth_rate: f64) -> Self {
        Self {
            ratio,
            salary,
            growth_rate,
        }
    }

    /// `ratio * salary * (1 + growth)^year_index`
    pub fn contribution(&self, year_index: u32) -> f64 {
        self.ratio * self.salary * growth_factor(self.growth_rate, year_index)
    }

    pub fn iter(&self) -> ContributionIter {
        ContributionIter {
            stream: *self,
            year_index: 0,
        }
    }

    /// Sum of the first `years` contributions, i.e. the money put in.
    pub fn total(&self, years: u32) -> f64 {
        self.iter().take(years as usize).sum()
    }
}

impl<'a> IntoIterator for &'a ContributionStream {
    type Item = f64;
    type IntoIter = ContributionIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`ContributionStream`]; ends only when the year index
/// overflows `u32`.
#[derive(Debug, Clone)]
pub struct ContributionIter {
    stream: ContributionStream,
    year_index: u32,
}

impl Iterator for ContributionIter {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let value = self.stream.contribution(self.year_index);
        self.year_index = self.year_index.checked_add(1)?;
        Some(value)
    }
}

impl FusedIterator for ContributionIter {}

fn growth_factor(rate: f64, year_index: u32) -> f64 {
    match i32::try_from(year_index) {
        Ok(exp) => (1.0 + rate).powi(exp),
        Err(_) => (1.0 + rate).powf(year_index as f64),
    }
}
