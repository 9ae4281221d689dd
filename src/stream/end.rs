//! Tracking of the shortest terminal point of a stream
//!
//! To finish a stream, the writer has to emit a binary fraction that lies inside the live
//! [`CodeInterval`]. The shorter the fraction, the fewer bits the stream needs. An [`End`]
//! keeps track of the shortest such fraction while the interval shrinks and its settled
//! leading bits get shifted out of the coding window.
//!
//! # Representation
//!
//! The candidate fraction is stored in `ending` in a format that extends the coding window
//! by one bit at the top. The most significant bit of `ending` is the integer digit (it is
//! set if the fraction lies beyond `1.0` of the window, which means the candidate carries
//! into bits that have already been shifted out). The remaining 63 bits hold the fraction,
//! followed by a *sentinel*: the lowest set bit of `ending` marks where the fraction ends
//! (and is not part of it). Thus, `ending << 1` is the candidate's position in the window,
//! and `ending.trailing_zeros()` decreases as the fraction gets longer. An `ending` of zero
//! stands for the empty fraction (a candidate of precision zero).
//!
//! The [`State`] remembers which bits the writer holds back because a future carry could
//! still flip them:
//!
//! - [`State::Settled`]: nothing is held back, all emitted bits are final. The candidate
//!   must not carry.
//! - [`State::Zero`]: the writer holds back a single zero bit.
//! - [`State::One`]: the writer holds back a zero bit followed by a run of one bits.
//!
//! A carry turns the held back bits `0 1...1` into `1 0...0`, which settles them.

use core::fmt::Display;

use super::{code_interval::CodeInterval, MSB};

/// Which bits are provisional, see [module level documentation](self).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// All emitted bits are final (`S` in the textual representation).
    Settled,
    /// A zero bit is held back.
    Zero,
    /// A zero bit followed by at least one one bit is held back.
    One,
}

/// Errors that indicate an internal inconsistency or exhausted precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EndError {
    /// A candidate with an integer digit was requested in [`State::Settled`].
    InvalidState,

    /// A carry occurred while no bits were held back.
    InvalidCarry,

    /// The live interval wraps around while no bits are held back, so a carry would have
    /// to propagate into settled bits.
    CarryInconsistent,

    /// All candidates up to 63 fractional bits have been used up.
    ///
    /// Can only happen after about `2^62` symbols in a row that don't shift a single bit
    /// out of the coding window.
    Overflow,
}

impl Display for EndError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidState => write!(f, "Terminal point carries while no bits are pending."),
            Self::InvalidCarry => write!(f, "Carry while no bits are pending."),
            Self::CarryInconsistent => write!(f, "Live interval wraps while no bits are pending."),
            Self::Overflow => write!(f, "Ran out of precision for the terminal point."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EndError {}

/// Shortest terminal point of the stream, see [module level documentation](self).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct End {
    state: State,
    ending: u64,
}

impl Default for End {
    fn default() -> Self {
        Self::new(State::Settled)
    }
}

impl End {
    /// Returns the first candidate in enumeration order for the given `state`.
    pub fn new(state: State) -> Self {
        let ending = match state {
            State::Settled | State::Zero => 0,
            State::One => MSB,
        };
        Self { state, ending }
    }

    pub fn with_ending(state: State, ending: u64) -> Result<Self, EndError> {
        if state == State::Settled && ending >= MSB {
            Err(EndError::InvalidState)
        } else {
            Ok(Self { state, ending })
        }
    }

    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline(always)]
    pub fn ending(&self) -> u64 {
        self.ending
    }

    /// Position of the candidate in the coding window and whether it carries.
    #[inline(always)]
    pub fn point(&self) -> (u64, bool) {
        (self.ending << 1, self.ending >= MSB)
    }

    #[inline(always)]
    fn last_bit(&self) -> u64 {
        self.ending & self.ending.wrapping_neg()
    }

    /// Returns `true` if the candidate identifies a point inside `interval` that the
    /// held back bits can express.
    pub fn is_valid(&self, interval: &CodeInterval) -> bool {
        let (point, carry) = self.point();
        interval.includes(point)
            && (!carry || interval.wraps())
            && carry == (point < interval.base())
    }

    /// Advances to the first valid candidate for `interval`, starting from the current one.
    pub fn first(&mut self, interval: &CodeInterval) -> Result<(), EndError> {
        if self.state == State::Settled && interval.wraps() {
            return Err(EndError::CarryInconsistent);
        }
        while !self.is_valid(interval) {
            self.next()?;
        }
        Ok(())
    }

    /// Advances to the next candidate.
    ///
    /// Candidates are enumerated by increasing precision and, within each precision, in
    /// increasing order. In [`State::Settled`], only candidates below `1.0` exist.
    pub fn next(&mut self) -> Result<(), EndError> {
        self.ending = match (self.state, self.ending) {
            (State::Settled, 0) => MSB >> 1,
            (State::Zero, 0) => MSB,
            (State::One, MSB) => 0,
            (State::One, 0) => MSB >> 1,
            (state, ending) => {
                let last_bit = self.last_bit();
                let ceiling = if state == State::Settled {
                    last_bit | MSB
                } else {
                    last_bit
                };
                let next = ending.wrapping_add(last_bit << 1);
                if next != ceiling {
                    next
                } else if last_bit == 1 {
                    return Err(EndError::Overflow);
                } else {
                    last_bit >> 1
                }
            }
        };
        Ok(())
    }

    /// Accounts for a carry into the held back bits, which settles them.
    pub fn carry(&mut self) -> Result<(), EndError> {
        self.ending = match self.state {
            State::Settled => return Err(EndError::InvalidCarry),
            State::One if self.ending == 0 => MSB >> 1,
            _ if self.ending == 0 => 0,
            _ if self.ending >= MSB => self.ending ^ MSB,
            _ => self.last_bit(),
        };
        self.state = State::Settled;
        Ok(())
    }

    /// Accounts for a zero bit that was shifted out of the coding window.
    pub fn zero(&mut self) {
        self.ending = if self.state == State::One && self.ending == MSB {
            0
        } else if self.ending >= MSB {
            self.last_bit()
        } else {
            self.ending << 1
        };
        self.state = State::Zero;
    }

    /// Accounts for a one bit that was shifted out of the coding window.
    pub fn one(&mut self) {
        self.ending = if self.ending == 0 {
            if self.state == State::Zero {
                MSB
            } else {
                0
            }
        } else if self.ending < MSB >> 1 {
            self.last_bit() << 1
        } else if self.ending < MSB | (MSB >> 1) {
            (self.ending << 1) ^ MSB
        } else {
            self.last_bit()
        };
        if self.state != State::Settled {
            self.state = State::One;
        }
    }
}

impl Display for End {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self.state {
            State::Settled => "S:",
            State::Zero => "0:",
            State::One => "1:",
        })?;
        let (mut fraction, carry) = self.point();
        f.write_str(if carry { "1." } else { "0." })?;
        while fraction != 0 {
            f.write_str(if fraction >= MSB { "1" } else { "0" })?;
            fraction <<= 1;
        }
        Ok(())
    }
}
