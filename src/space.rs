//! Probability arithmetics the decoder can run in.
//!
//! The recurrence only needs three things from its number system: which raw
//! values are legal, how two scores combine, and which score means "cannot
//! happen". [`ProbabilitySpace`] captures exactly that.
//!
//! - [`Linear`]: values in `[0, 1]`, combined by product; `0.0` is unreachable.
//! - [`LogSpace`]: values `<= 0` (natural log or any other base), combined by
//!   sum; `-inf` is a legal value and is unreachable.
//!
//! Long sequences underflow to `0.0` in linear arithmetic, which the decoder
//! reports as a broken path. Use [`LogSpace`] for those.

/// Arithmetic used to chain probabilities along a path.
pub trait ProbabilitySpace: Copy + Send + Sync + 'static {
    /// Short name used in error messages.
    const NAME: &'static str;

    /// Whether `p` is a legal table value in this arithmetic. NaN never is.
    fn is_valid(p: f64) -> bool;

    /// Whether a chained score can no longer contribute to any path.
    fn is_unreachable(score: f64) -> bool;

    /// Extend a chained score by one more factor.
    fn combine(score: f64, p: f64) -> f64;
}

/// Plain probabilities in `[0, 1]`, chained by multiplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linear;

/// Log-probabilities in `[-inf, 0]`, chained by addition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSpace;

impl ProbabilitySpace for Linear {
    const NAME: &'static str = "linear";

    #[inline]
    fn is_valid(p: f64) -> bool {
        (0.0..=1.0).contains(&p)
    }

    #[inline]
    fn is_unreachable(score: f64) -> bool {
        score <= 0.0
    }

    #[inline]
    fn combine(score: f64, p: f64) -> f64 {
        score * p
    }
}

impl ProbabilitySpace for LogSpace {
    const NAME: &'static str = "log";

    #[inline]
    fn is_valid(p: f64) -> bool {
        p <= 0.0
    }

    #[inline]
    fn is_unreachable(score: f64) -> bool {
        score == f64::NEG_INFINITY
    }

    #[inline]
    fn combine(score: f64, p: f64) -> f64 {
        score + p
    }
}
