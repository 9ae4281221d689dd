//! Arithmetic coding of symbol streams
//!
//! This module contains the encoder [`EntropyWriter`] and the decoder [`EntropyReader`],
//! together with the two pieces of state they share: the live [`CodeInterval`] and the
//! terminal point tracker [`End`].
//!
//! # Encoding and Decoding
//!
//! A symbol is passed to the coder as a pair of inclusive bounds `(lo, hi)` in units of
//! `2^-64`, or equivalently as an [`Interval`](crate::Interval). The writer narrows its
//! live interval to the symbol and shifts bits out of the coding window as soon as they
//! are determined. Bits that a later carry could still flip are held back (at most one
//! zero bit followed by a run of one bits, whose length is all the writer stores).
//!
//! The reader mirrors every step of the writer. Before each symbol, [`EntropyReader::value`]
//! tells the caller where the compressed data points to within the live interval, so the
//! caller can look up the symbol whose interval contains this value and then confirm it
//! with [`EntropyReader::next`].
//!
//! # Termination
//!
//! [`EntropyWriter::finalize`] emits the shortest bit string that identifies the final
//! interval. Before each symbol, the writer also excludes the terminal point of the
//! stream written so far from all later terminations. Therefore, no stream is a
//! zero-extension of a shorter stream's encoding, and [`EntropyReader::eof`] reports the
//! end of the stream exactly after the last symbol. This even works for symbols with
//! probability one (e.g., the full interval), which add no information but still change
//! the encoding.
//!
//! # Example
//!
//! ```
//! use entropy_coder::stream::{DefaultEntropyReader, DefaultEntropyWriter, FrontendError};
//! use entropy_coder::CoderError;
//!
//! let mut writer = DefaultEntropyWriter::new();
//! writer.write(0, 0x3fff_ffff_ffff_ffff).unwrap(); // Probability 1/4.
//! writer.write(0x1000, 0xffff_ffff_ffff_ffff).unwrap(); // Probability almost one.
//! let compressed = writer.finalize().unwrap().into_inner();
//!
//! let mut reader = DefaultEntropyReader::from_compressed(compressed);
//! assert!(reader.value() <= 0x3fff_ffff_ffff_ffff);
//! reader.next(0, 0x3fff_ffff_ffff_ffff).unwrap();
//!
//! // Confirming a symbol that doesn't contain the current value is an error.
//! assert_eq!(
//!     reader.next(0, 0xfff),
//!     Err(CoderError::Frontend(FrontendError::InvalidData))
//! );
//! reader.next(0x1000, 0xffff_ffff_ffff_ffff).unwrap();
//! assert!(reader.eof());
//! ```

mod code_interval;
pub mod end;
pub mod queue;

use core::fmt::Display;

use crate::{interval::RangeError, CoderError};

pub use code_interval::CodeInterval;
pub use end::{End, EndError, State};
pub use queue::{DefaultEntropyReader, DefaultEntropyWriter, EntropyReader, EntropyWriter};

/// Top bit of the 64-bit coding window, i.e., the fraction `0.5`.
pub(crate) const MSB: u64 = 1 << 63;

/// Errors that originate in the coder itself rather than in its bit source or sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FrontendError {
    /// A symbol was degenerate, see [`RangeError`].
    Range(RangeError),

    /// The terminal point tracker failed, see [`EndError`].
    End(EndError),

    /// The value encoded in the compressed data does not lie in the symbol passed to
    /// [`EntropyReader::next`]. Either the compressed data is corrupted or the symbols
    /// are decoded with a different model than the one used for encoding.
    InvalidData,
}

impl FrontendError {
    pub fn into_coder_error<BackendError>(self) -> CoderError<Self, BackendError> {
        CoderError::Frontend(self)
    }
}

impl From<RangeError> for FrontendError {
    fn from(err: RangeError) -> Self {
        Self::Range(err)
    }
}

impl From<EndError> for FrontendError {
    fn from(err: EndError) -> Self {
        Self::End(err)
    }
}

impl Display for FrontendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Range(err) => write!(f, "Invalid symbol: {}", err),
            Self::End(err) => write!(f, "Invalid coder state: {}", err),
            Self::InvalidData => write!(f, "Tried to decode invalid data."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrontendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Range(source) => Some(source),
            Self::End(source) => Some(source),
            Self::InvalidData => None,
        }
    }
}
