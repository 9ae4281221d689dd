use crate::interval::{RangeError, MIN_RANGE};

use super::MSB;

/// The live interval of an encoding or decoding session.
///
/// Represents the points `[base, base + range]` of a 64-bit *coding window* that slides
/// along the compressed bit string. Unlike an [`Interval`](crate::Interval), a
/// `CodeInterval` may wrap around the end of the window: the part beyond `2^64` denotes
/// points whose bits differ from the bits already shifted out of the window by a carry.
///
/// The interval is narrowed once per symbol (see [`narrow`](Self::narrow)) and then
/// [`renormalize`](Self::renormalize)d, which slides the window by one bit for as long as
/// the interval spans less than half of it. Between symbols, `range >= 2^63` therefore
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeInterval {
    base: u64,
    range: u64,
}

impl Default for CodeInterval {
    fn default() -> Self {
        Self {
            base: 0,
            range: u64::MAX,
        }
    }
}

impl CodeInterval {
    #[inline(always)]
    pub fn base(&self) -> u64 {
        self.base
    }

    #[inline(always)]
    pub fn range(&self) -> u64 {
        self.range
    }

    /// Returns `true` if the interval extends beyond the end of the coding window.
    #[inline(always)]
    pub fn wraps(&self) -> bool {
        self.base.checked_add(self.range).is_none()
    }

    #[inline(always)]
    pub fn includes(&self, point: u64) -> bool {
        point.wrapping_sub(self.base) <= self.range
    }

    /// Restricts the interval to the symbol `[lo, hi]` (both inclusive), where `lo` and
    /// `hi` are fractions of the current interval in units of `2^-64`.
    ///
    /// Returns `Ok(true)` if the new interval starts beyond the end of the coding window,
    /// i.e., if a carry has to be propagated into bits that were already shifted out.
    /// Fails without modifying `self` if the symbol covers fewer than four points or if
    /// narrowing would leave nothing of `self` (the latter can only happen if the interval
    /// was not renormalized).
    pub fn narrow(&mut self, lo: u64, hi: u64) -> Result<bool, RangeError> {
        if hi < lo || hi - lo < MIN_RANGE {
            return Err(RangeError::TooNarrow);
        }

        let start = scale(self.range, lo as u128);
        let stop = scale(self.range, hi as u128 + 1);
        if stop <= start {
            return Err(RangeError::TooNarrow);
        }

        // `start < range + 1 <= 2^64` and `stop - start <= range + 1`, so neither truncates.
        let (base, carry) = self.base.overflowing_add(start as u64);
        self.base = base;
        self.range = (stop - start - 1) as u64;
        Ok(carry)
    }

    /// Slides the coding window by one bit if the interval spans less than half of it.
    ///
    /// Returns the bit that left the window (the top bit of `base`), or `None` if the
    /// interval was already wide enough.
    #[inline(always)]
    pub fn shift(&mut self) -> Option<bool> {
        if self.range >= MSB {
            return None;
        }
        let bit = self.base >= MSB;
        self.base <<= 1;
        self.range = (self.range << 1) | 1;
        Some(bit)
    }

    /// Shifts until the interval spans at least half of the coding window, passing each
    /// bit that leaves the window to `shifted`.
    pub fn renormalize<E>(
        &mut self,
        mut shifted: impl FnMut(bool) -> Result<(), E>,
    ) -> Result<(), E> {
        while let Some(bit) = self.shift() {
            shifted(bit)?;
        }
        Ok(())
    }

    /// Maps a point of the coding window back to a fraction of the interval.
    ///
    /// This inverts [`narrow`](Self::narrow): narrowing to `[lo, hi]` keeps `point` inside
    /// the interval if and only if `lo <= self.quantile(point) <= hi`. Points outside the
    /// interval saturate at `u64::MAX`.
    pub fn quantile(&self, point: u64) -> u64 {
        let offset = point.wrapping_sub(self.base) as u128;
        let width = self.range as u128 + 1;
        let quantile = ((offset << 64) | u64::MAX as u128) / width;
        u64::try_from(quantile).unwrap_or(u64::MAX)
    }
}

/// Returns `⌊(range + 1) · fraction / 2^64⌋` for `fraction <= 2^64` without overflowing.
#[inline(always)]
fn scale(range: u64, fraction: u128) -> u128 {
    let product = range as u128 * fraction;
    (product >> 64) + (((product & u64::MAX as u128) + fraction) >> 64)
}

#[cfg(test)]
mod tests {
    use rand::{RngCore, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;

    #[test]
    fn full_window() {
        let interval = CodeInterval::default();
        assert!(!interval.wraps());
        assert!(interval.includes(0));
        assert!(interval.includes(u64::MAX));
        assert_eq!(interval.quantile(12345), 12345);
    }

    #[test]
    fn narrowing_the_full_window_is_exact() {
        let mut interval = CodeInterval::default();
        assert_eq!(interval.narrow(100, 200), Ok(false));
        assert_eq!((interval.base(), interval.range()), (100, 100));

        let mut interval = CodeInterval::default();
        assert_eq!(interval.narrow(0, u64::MAX), Ok(false));
        assert_eq!(interval, CodeInterval::default());
    }

    #[test]
    fn rejects_degenerate_symbols() {
        let mut interval = CodeInterval::default();
        assert_eq!(interval.narrow(10, 12), Err(RangeError::TooNarrow));
        assert_eq!(interval.narrow(12, 10), Err(RangeError::TooNarrow));
        assert_eq!(interval, CodeInterval::default());
        assert_eq!(interval.narrow(10, 13), Ok(false));
        assert_eq!(interval.range(), 3);

        // Narrowing a tiny interval that was never renormalized leaves nothing.
        assert_eq!(interval.narrow(0, 3), Err(RangeError::TooNarrow));
    }

    #[test]
    fn carry_and_wrap() {
        let mut interval = CodeInterval::default();
        interval.narrow(1 << 62, (3 << 62) - 1).unwrap();
        assert_eq!(interval.shift(), Some(false));
        assert_eq!(interval.shift(), None);
        assert!(interval.wraps());
        assert!(interval.includes(u64::MAX));
        assert!(interval.includes(0));
        assert!(interval.includes((1 << 63) - 1));

        // The upper half of this interval lies beyond the end of the window.
        assert_eq!(interval.narrow(1 << 63, u64::MAX), Ok(true));
        assert_eq!(interval.base(), 0);
        assert!(!interval.wraps());
    }

    #[test]
    fn renormalization_reports_shifted_bits() {
        let mut interval = CodeInterval::default();
        interval.narrow(0b1011 << 60, (0b1100 << 60) - 1).unwrap();
        let mut bits = [false; 4];
        let mut len = 0;
        interval
            .renormalize(|bit| {
                bits[len] = bit;
                len += 1;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(len, 4);
        assert_eq!(bits, [true, false, true, true]);
        assert!(interval.range() >= MSB);
    }

    #[test]
    fn quantile_inverts_narrow() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(123);
        for _ in 0..1000 {
            let mut interval = CodeInterval::default();
            interval.narrow(rng.next_u64() >> 1, u64::MAX - (rng.next_u64() >> 2)).unwrap();
            interval.renormalize(|_| Ok::<(), ()>(())).unwrap();

            let lo = rng.next_u64() >> 1;
            let hi = lo + 3 + (rng.next_u64() >> 3);
            let mut narrowed = interval;
            narrowed.narrow(lo, hi).unwrap();

            for _ in 0..20 {
                let offset = rng.next_u64() as u128 % (interval.range() as u128 + 1);
                let point = interval.base().wrapping_add(offset as u64);
                let quantile = interval.quantile(point);
                assert_eq!(narrowed.includes(point), lo <= quantile && quantile <= hi);
            }
            let first = narrowed.base();
            let last = first.wrapping_add(narrowed.range());
            assert!(lo <= interval.quantile(first) && interval.quantile(first) <= hi);
            assert!(lo <= interval.quantile(last) && interval.quantile(last) <= hi);
        }
    }
}
