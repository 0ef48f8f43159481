//! Pointwise operators applied by unary and binary tree nodes.
//!
//! Operators are closed enums rather than boxed closures so that trees can
//! be compared, cloned, and printed, and so the evaluator dispatches with a
//! plain match.

use crate::sample::Sample;

/// Threshold below which a secant result is considered degenerate.
const SECANT_MIN: f64 = 0.01;

/// Pointwise transform of a single sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnaryFn {
    /// Pass the sample through unchanged.
    Identity,
    /// Cosine of the input interpreted as degrees.
    CosDeg,
    /// Secant of the input interpreted as degrees. Results at or below a
    /// small positive threshold are treated as missing data, which rejects
    /// zenith angles past 90 degrees.
    SecDeg,
    /// Multiply by a constant.
    Scale(f64),
    /// Divide by a constant.
    InvScale(f64),
    /// Keep values inside `[min, max]`, discard the rest.
    BandPass { min: f64, max: f64 },
}

impl UnaryFn {
    /// Apply to one sample. Empty input always yields empty output, and
    /// coverage passes through untouched otherwise.
    #[must_use]
    pub fn apply(&self, input: Sample) -> Sample {
        if input.is_empty() {
            return Sample::EMPTY;
        }
        match self {
            Self::Identity => input,
            Self::CosDeg => Sample::new(input.data.to_radians().cos(), input.coverage),
            Self::SecDeg => {
                let sec = 1.0 / input.data.to_radians().cos();
                if sec <= SECANT_MIN {
                    Sample::EMPTY
                } else {
                    Sample::new(sec, input.coverage)
                }
            }
            Self::Scale(factor) => Sample::new(input.data * factor, input.coverage),
            Self::InvScale(divisor) => Sample::new(input.data / divisor, input.coverage),
            Self::BandPass { min, max } => {
                if input.data >= *min && input.data <= *max {
                    input
                } else {
                    Sample::EMPTY
                }
            }
        }
    }

    /// Short operator name for tree dumps.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::CosDeg => "cos",
            Self::SecDeg => "sec",
            Self::Scale(_) => "scale",
            Self::InvScale(_) => "invscale",
            Self::BandPass { .. } => "bandpass",
        }
    }
}

/// Pointwise combination of two samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinaryFn {
    Add,
    Sub,
    Mul,
    Div,
    /// Pass the right sample through where the left sample's data equals the
    /// key exactly, discard it elsewhere.
    Select(f64),
}

impl BinaryFn {
    /// Apply to a pair of samples.
    ///
    /// Arithmetic variants return empty when either input is empty, and take
    /// the smaller of the two input coverages otherwise. `Select` is a mask,
    /// not a blend: where the left sample's data equals the key exactly and
    /// the left sample has coverage, the right sample passes through with
    /// its own coverage untouched.
    #[must_use]
    pub fn apply(&self, left: Sample, right: Sample) -> Sample {
        if let Self::Select(key) = self {
            // Exact comparison is intentional. Selection keys come from
            // classification rasters holding small exact integers, and a
            // tolerance would merge adjacent classes.
            return if !left.is_empty() && left.data == *key {
                right
            } else {
                Sample::EMPTY
            };
        }
        if left.is_empty() || right.is_empty() {
            return Sample::EMPTY;
        }
        let coverage = Sample::min_coverage(&left, &right);
        let data = match self {
            Self::Add => left.data + right.data,
            Self::Sub => left.data - right.data,
            Self::Mul => left.data * right.data,
            // IEEE semantics on purpose: a zero divisor yields an infinite
            // or NaN quotient with the min coverage, not a missing sample.
            Self::Div => left.data / right.data,
            Self::Select(_) => return Sample::EMPTY,
        };
        Sample::new(data, coverage)
    }

    /// Short operator name for tree dumps.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Select(_) => "select",
        }
    }
}
