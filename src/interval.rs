//! Symbol intervals in 64-bit fixed-point precision
//!
//! An [`Interval`] describes the probability mass that an entropy model assigns to a
//! symbol. It is the half-open range `[base, base + range + 1)` on the ring of 64-bit
//! integers, which is read as the binary fractions `[base / 2^64, (base + range + 1) /
//! 2^64)`. Storing `range` rather than the exclusive upper bound lets an interval cover the
//! full unit interval `[0, 1)`, whose upper bound `2^64` doesn't fit in a `u64`.

use core::fmt::{Debug, Display};

/// Smallest admissible value of [`Interval::range`], i.e., every symbol covers at least
/// four points of the 64-bit ring.
pub const MIN_RANGE: u64 = 3;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Error type for intervals that can't be used for entropy coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RangeError {
    /// The interval covers fewer than four points (`range < 3`), or its upper bound lies
    /// below its lower bound.
    TooNarrow,

    /// The interval extends beyond `1.0`, i.e., `base + range` overflows.
    ExceedsUnitInterval,

    /// A probability was not a finite number in the range `[0, 1]`.
    InvalidProbability,
}

impl Display for RangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooNarrow => write!(f, "Interval must cover at least four points."),
            Self::ExceedsUnitInterval => write!(f, "Interval must not extend beyond 1.0."),
            Self::InvalidProbability => write!(f, "Probabilities must be in the range [0, 1]."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RangeError {}

/// An immutable sub-interval of `[0, 1)` in 64-bit fixed-point representation.
///
/// # Example
///
/// ```
/// use entropy_coder::Interval;
///
/// let half = Interval::new(1 << 63, (1 << 63) - 1).unwrap();
/// assert_eq!(half.probability(), 0.5);
/// assert_eq!(half.entropy(), 1.0);
/// assert!(half.includes(u64::MAX));
/// assert!(!half.includes(0));
/// assert_eq!(half.to_string(), "[0.8000000000000000, 1.0000000000000000)");
///
/// let quarter = Interval::from_probability(0.25).unwrap();
/// assert_eq!(quarter.base(), 0);
/// assert_eq!(quarter.range(), (1 << 62) - 1);
/// assert!(half.disjoint(&quarter));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    base: u64,
    range: u64,
}

impl Default for Interval {
    /// Returns the full interval `[0, 1)`, i.e., a symbol with probability one.
    fn default() -> Self {
        Self {
            base: 0,
            range: u64::MAX,
        }
    }
}

impl Interval {
    /// Creates the interval `[base, base + range]` (both ends inclusive).
    ///
    /// Fails if `range < 3` or if `base + range` overflows.
    pub fn new(base: u64, range: u64) -> Result<Self, RangeError> {
        if range < MIN_RANGE {
            Err(RangeError::TooNarrow)
        } else if base.checked_add(range).is_none() {
            Err(RangeError::ExceedsUnitInterval)
        } else {
            Ok(Self { base, range })
        }
    }

    /// Creates an interval starting at zero whose size approximates `probability`.
    ///
    /// The size is `probability · 2^64` rounded to the nearest integer, but at least
    /// four points. A probability of exactly one yields the full interval.
    pub fn from_probability(probability: f64) -> Result<Self, RangeError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(RangeError::InvalidProbability);
        }
        if probability == 1.0 {
            return Ok(Self::default());
        }

        // `probability < 1.0`, so this is at most `2^64 - 2^11` and can't saturate.
        let size = libm::round(probability * TWO_POW_64) as u64;
        let range = if size > MIN_RANGE { size - 1 } else { MIN_RANGE };
        Ok(Self { base: 0, range })
    }

    #[inline(always)]
    pub fn base(&self) -> u64 {
        self.base
    }

    #[inline(always)]
    pub fn range(&self) -> u64 {
        self.range
    }

    /// The largest point that is still inside the interval, i.e., `base + range`.
    #[inline(always)]
    pub fn last(&self) -> u64 {
        self.base.wrapping_add(self.range)
    }

    pub fn probability(&self) -> f64 {
        (self.range as f64 + 1.0) / TWO_POW_64
    }

    /// Information content in bits.
    pub fn entropy(&self) -> f64 {
        -libm::log2(self.probability())
    }

    pub fn includes(&self, value: u64) -> bool {
        value.wrapping_sub(self.base) <= self.range
    }

    /// Returns `true` if `other` is a subset of `self`.
    pub fn includes_interval(&self, other: &Interval) -> bool {
        if self.base > other.base {
            return false;
        }

        // Each upper bound is compared together with the information whether it extends
        // beyond `2^64`.
        let top = self.base.wrapping_add(self.range);
        let other_top = other.base.wrapping_add(other.range);
        let overflows = top < self.base;
        let other_overflows = other_top < other.base;
        if overflows == other_overflows {
            other_top <= top
        } else {
            overflows
        }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.base > other.base {
            return other.overlaps(self);
        }

        let top = self.base.wrapping_add(self.range).wrapping_add(1);
        top <= self.base || other.base < top
    }

    #[inline(always)]
    pub fn disjoint(&self, other: &Interval) -> bool {
        !self.overlaps(other)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let top = self.base.wrapping_add(self.range).wrapping_add(1);
        let wraps = top <= self.base;
        write!(
            f,
            "[0.{:016x}, {}.{:016x})",
            self.base,
            if wraps { 1 } else { 0 },
            top
        )
    }
}
