//! The `(data, coverage)` pair produced by every sampling query.

/// A sampled scalar plus the fraction of the queried footprint backed by
/// real data.
///
/// `coverage` lives in `[0, 1]`: 0 means no data at all (the `data` field
/// must then be ignored), 1 means fully covered. Aggregators also use
/// coverage as a per-sample weight.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub data: f64,
    pub coverage: f64,
}

impl Sample {
    /// The "no data here" sample.
    pub const EMPTY: Self = Self {
        data: 0.0,
        coverage: 0.0,
    };

    #[must_use]
    pub const fn new(data: f64, coverage: f64) -> Self {
        Self { data, coverage }
    }

    /// A fully-covered sample.
    #[must_use]
    pub const fn full(data: f64) -> Self {
        Self {
            data,
            coverage: 1.0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coverage <= 0.0
    }

    /// The smaller of two coverages. Arithmetic combining two samples never
    /// invents confidence, so this is the coverage of every binary result.
    #[must_use]
    pub fn min_coverage(a: &Self, b: &Self) -> f64 {
        a.coverage.min(b.coverage)
    }
}
