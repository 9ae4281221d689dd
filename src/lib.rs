//! Binary Arithmetic Coding on 64-bit Fixed-Point Intervals
//!
//! The `entropy_coder` crate maps a sequence of symbols, each given as a sub-interval of
//! the unit interval in 64-bit fixed-point precision, to a short bit string, and maps the
//! bit string back to the same sequence of intervals. It is the entropy coding back end
//! that sits below a probability model: the model decides *which* interval a symbol gets,
//! this crate turns the sequence of intervals into bits.
//!
//! # Overview
//!
//! - [`Interval`]: an immutable sub-interval of the 64-bit ring, with exact probability and
//!   entropy accessors and wraparound-aware set relations.
//! - [`stream::CodeInterval`]: the live interval of an encoding or decoding session. It is
//!   narrowed to each symbol in turn and renormalized whenever leading bits are settled.
//! - [`stream::End`]: a small state machine that tracks the shortest binary fraction that
//!   still identifies the current interval. It decides which bits are final, absorbs
//!   carries without ever looking back more than one pending run, and picks the minimal
//!   flush sequence when the stream is finalized.
//! - [`stream::EntropyWriter`] and [`stream::EntropyReader`]: the encoder and decoder.
//!   They drive a bit-level collaborator (see module [`bits`]), which in turn packs bits
//!   into words and hands them to a word backend (see module [`backends`]).
//!
//! Streams are *self-delimiting*: the reader knows when it has decoded the last symbol
//! (see [`EntropyReader::eof`](stream::EntropyReader::eof)) without any length prefix.
//!
//! # Example
//!
//! ```
//! use entropy_coder::{
//!     stream::{DefaultEntropyReader, DefaultEntropyWriter},
//!     Interval,
//! };
//!
//! // A toy model with three symbols: "a" with probability 1/2, "b" and "c" with 1/4 each.
//! let model = [
//!     Interval::new(0, (1 << 63) - 1).unwrap(),
//!     Interval::new(1 << 63, (1 << 62) - 1).unwrap(),
//!     Interval::new(3 << 62, (1 << 62) - 1).unwrap(),
//! ];
//! let message = [0usize, 2, 1, 0, 0, 1];
//!
//! let mut writer = DefaultEntropyWriter::new();
//! for &symbol in &message {
//!     writer.write_interval(&model[symbol]).unwrap();
//! }
//! let compressed = writer.finalize().unwrap().into_inner();
//!
//! let mut reader = DefaultEntropyReader::from_compressed(compressed);
//! let mut decoded = Vec::new();
//! while !reader.eof() {
//!     let value = reader.value();
//!     let symbol = model.iter().position(|s| s.includes(value)).unwrap();
//!     reader.next_interval(&model[symbol]).unwrap();
//!     decoded.push(symbol);
//! }
//! assert_eq!(decoded, message);
//! ```

#![no_std]
#![warn(rust_2018_idioms, missing_debug_implementations)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod backends;
pub mod bits;
pub mod interval;
pub mod stream;

use core::{
    convert::Infallible,
    fmt::{Binary, Debug, Display, LowerHex, UpperHex},
};

use num_traits::{PrimInt, Unsigned, WrappingAdd, WrappingSub};

pub use interval::{Interval, RangeError};

// ERROR HANDLING =============================================================

/// Error type of all fallible coding operations.
///
/// Distinguishes between errors that originate in the coder itself (`Frontend`, e.g.,
/// a degenerate symbol or an inconsistency in the terminal point tracker) and errors that
/// originate in the bit or word backend (`Backend`, e.g., an I/O error or a full buffer).
/// For in-memory backends the `BackendError` is [`Infallible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderError<FrontendError, BackendError> {
    Frontend(FrontendError),
    Backend(BackendError),
}

impl<FrontendError, BackendError> CoderError<FrontendError, BackendError> {
    pub fn map_frontend<E>(
        self,
        f: impl FnOnce(FrontendError) -> E,
    ) -> CoderError<E, BackendError> {
        match self {
            Self::Frontend(err) => CoderError::Frontend(f(err)),
            Self::Backend(err) => CoderError::Backend(err),
        }
    }

    pub fn map_backend<E>(
        self,
        f: impl FnOnce(BackendError) -> E,
    ) -> CoderError<FrontendError, E> {
        match self {
            Self::Backend(err) => CoderError::Backend(f(err)),
            Self::Frontend(err) => CoderError::Frontend(err),
        }
    }
}

impl<FrontendError: Display, BackendError: Display> Display
    for CoderError<FrontendError, BackendError>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Frontend(err) => write!(f, "Coding error: {}", err),
            Self::Backend(err) => {
                write!(f, "Error while reading or writing compressed data: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<FrontendError, BackendError> std::error::Error for CoderError<FrontendError, BackendError>
where
    FrontendError: std::error::Error + 'static,
    BackendError: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Frontend(source) => Some(source),
            Self::Backend(source) => Some(source),
        }
    }
}

impl<FrontendError, BackendError> From<BackendError> for CoderError<FrontendError, BackendError> {
    fn from(read_error: BackendError) -> Self {
        Self::Backend(read_error)
    }
}

/// Unwraps results whose error type can never be instantiated.
///
/// In-memory backends like `Vec<Word>` report their errors as [`Infallible`]. Calling
/// `.unwrap_infallible()` instead of `.unwrap()` documents (and lets the compiler check)
/// that the call can't panic.
pub trait UnwrapInfallible<T> {
    fn unwrap_infallible(self) -> T;
}

impl<T> UnwrapInfallible<T> for Result<T, Infallible> {
    #[inline(always)]
    fn unwrap_infallible(self) -> T {
        match self {
            Ok(x) => x,
            Err(infallible) => match infallible {},
        }
    }
}

// BIT ARRAYS =================================================================

/// A trait for bit strings of fixed (and usually small) length.
///
/// Used for the words into which the [`bits`] module packs the compressed bit string. It
/// is implemented on all primitive unsigned integer types. There is usually no reason to
/// implement it on custom types.
///
/// # Safety
///
/// This trait is marked `unsafe` so that bit packers may rely on the assumption that all
/// `BitArray`s have precisely the same behavior as builtin unsigned integer types, and that
/// [`BitArray::BITS`] has the correct value.
pub unsafe trait BitArray:
    PrimInt
    + Unsigned
    + WrappingAdd
    + WrappingSub
    + Debug
    + LowerHex
    + UpperHex
    + Binary
    + Default
    + 'static
{
    /// The (fixed) length of the `BitArray` in bits.
    ///
    /// Defaults to `8 * core::mem::size_of::<Self>()`, which is suitable for all
    /// primitive unsigned integers.
    const BITS: usize = 8 * core::mem::size_of::<Self>();
}

unsafe impl BitArray for u8 {}
unsafe impl BitArray for u16 {}
unsafe impl BitArray for u32 {}
unsafe impl BitArray for u64 {}
unsafe impl BitArray for u128 {}
unsafe impl BitArray for usize {}
