//! Sources and sinks of compressed words
//!
//! The coders in module [`stream`](crate::stream) produce and consume individual *bits*.
//! The bit packers in module [`bits`](crate::bits) group these bits into words of a
//! fixed width (any [`BitArray`](crate::BitArray)) and pass the words on to a *backend*.
//! A backend is anything that implements [`WriteWords`] (for encoding) or [`ReadWords`]
//! (for decoding). Growable sinks are `Vec<Word>` and `SmallVec`; a [`Cursor`] reads from
//! any buffer of words and writes into a preallocated one.
//!
//! Words are always read back in the same order in which they were written, and bits
//! within a word are ordered from most significant to least significant.
//!
//! # Example
//!
//! Encoding into a fixed-size buffer on the stack, then decoding from the filled part.
//!
//! ```
//! use entropy_coder::{
//!     backends::{BoundedWriteError, Cursor},
//!     bits::{BitReader, BitWriter},
//!     stream::{EntropyReader, EntropyWriter},
//!     CoderError, Interval,
//! };
//!
//! // A fixed model with four equiprobable symbols, i.e., two bits per symbol.
//! let model = (0..4u64)
//!     .map(|i| Interval::new(i << 62, (1 << 62) - 1).unwrap())
//!     .collect::<Vec<_>>();
//! let symbols = [3usize, 1, 0, 2, 2, 1, 3, 0, 1];
//!
//! let mut buf = [0u8; 8];
//! let backend = Cursor::new_at_start(&mut buf[..]);
//! let mut writer = EntropyWriter::with_bits(BitWriter::<u8, _>::with_backend(backend));
//! for &symbol in &symbols {
//!     writer.write_interval(&model[symbol]).unwrap();
//! }
//! let len = writer.finalize().unwrap().into_inner().pos();
//! assert_eq!(len, 3);
//!
//! let mut reader = EntropyReader::<BitReader<u8, _>>::from_compressed(&buf[..len]);
//! for &symbol in &symbols {
//!     assert!(model[symbol].includes(reader.value()));
//!     reader.next_interval(&model[symbol]).unwrap();
//! }
//! assert!(reader.eof());
//!
//! // A buffer that's too small is reported as a backend error.
//! let mut tiny = [0u8; 1];
//! let backend = Cursor::new_at_start(&mut tiny[..]);
//! let mut writer = EntropyWriter::with_bits(BitWriter::<u8, _>::with_backend(backend));
//! let result = symbols
//!     .iter()
//!     .try_for_each(|&symbol| writer.write_interval(&model[symbol]));
//! assert_eq!(result, Err(CoderError::Backend(BoundedWriteError::OutOfSpace)));
//! ```

use alloc::vec::Vec;
use core::{
    convert::Infallible,
    fmt::{Debug, Display},
};

use smallvec::SmallVec;

// MAIN TRAITS FOR CAPABILITIES OF BACKENDS ===================================

/// A trait for sources of compressed words (used by decoders).
pub trait ReadWords<Word> {
    /// The error type that can occur when reading from the data source, or [`Infallible`].
    type ReadError: Debug;

    /// Returns the next word, or `Ok(None)` if the data source is exhausted.
    fn read(&mut self) -> Result<Option<Word>, Self::ReadError>;
}

/// A trait for sinks of compressed words (used by encoders).
pub trait WriteWords<Word> {
    /// The error type that can occur when writing to the data sink, or [`Infallible`].
    type WriteError: Debug;

    fn write(&mut self, word: Word) -> Result<(), Self::WriteError>;
}

/// Turns a container of compressed words into a [`ReadWords`] that takes ownership.
pub trait IntoReadWords<Word> {
    type IntoReadWords: ReadWords<Word>;

    fn into_read_words(self) -> Self::IntoReadWords;
}

impl<Word: Clone, Buf: AsRef<[Word]>> IntoReadWords<Word> for Buf {
    type IntoReadWords = Cursor<Buf>;

    fn into_read_words(self) -> Self::IntoReadWords {
        Cursor::new_at_start(self)
    }
}

// GROWABLE SINKS =============================================================

impl<Word> WriteWords<Word> for Vec<Word> {
    type WriteError = Infallible;

    #[inline(always)]
    fn write(&mut self, word: Word) -> Result<(), Self::WriteError> {
        self.push(word);
        Ok(())
    }
}

impl<Array> WriteWords<Array::Item> for SmallVec<Array>
where
    Array: smallvec::Array,
{
    type WriteError = Infallible;

    #[inline(always)]
    fn write(&mut self, word: Array::Item) -> Result<(), Self::WriteError> {
        self.push(word);
        Ok(())
    }
}

// ADAPTER FOR IN-MEMORY BUFFERS ==============================================

/// Reads words from, or writes words into, a fixed in-memory buffer.
///
/// Reading starts at the beginning of the buffer and proceeds towards its end. Writing
/// overwrites the buffer from the current position and fails with
/// [`BoundedWriteError::OutOfSpace`] once the buffer is full, so a `Cursor` over a
/// preallocated slice can serve as an encoding target without any heap allocation.
#[derive(Clone, Debug)]
pub struct Cursor<Buf> {
    buf: Buf,

    /// Index of the next word to be read or written.
    pos: usize,
}

impl<Buf> Cursor<Buf> {
    #[inline(always)]
    pub fn new_at_start(buf: Buf) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of words read or written so far.
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<Word, Buf: AsMut<[Word]>> WriteWords<Word> for Cursor<Buf> {
    type WriteError = BoundedWriteError;

    #[inline(always)]
    fn write(&mut self, word: Word) -> Result<(), Self::WriteError> {
        let target = self
            .buf
            .as_mut()
            .get_mut(self.pos)
            .ok_or(BoundedWriteError::OutOfSpace)?;
        *target = word;
        self.pos += 1;
        Ok(())
    }
}

impl<Word: Clone, Buf: AsRef<[Word]>> ReadWords<Word> for Cursor<Buf> {
    type ReadError = Infallible;

    #[inline(always)]
    fn read(&mut self) -> Result<Option<Word>, Self::ReadError> {
        let maybe_word = self.buf.as_ref().get(self.pos).cloned();
        if maybe_word.is_some() {
            self.pos += 1;
        }
        Ok(maybe_word)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BoundedWriteError {
    OutOfSpace,
}

impl Display for BoundedWriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfSpace => write!(f, "Out of space."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoundedWriteError {}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{vec, vec::Vec};

    use super::*;
    use crate::UnwrapInfallible;

    #[test]
    fn cursor_reads_front_to_back() {
        let mut cursor = Cursor::new_at_start(vec![1u16, 2, 3]);
        assert_eq!(ReadWords::<u16>::read(&mut cursor).unwrap_infallible(), Some(1));
        assert_eq!(ReadWords::<u16>::read(&mut cursor).unwrap_infallible(), Some(2));
        assert_eq!(ReadWords::<u16>::read(&mut cursor).unwrap_infallible(), Some(3));
        assert_eq!(ReadWords::<u16>::read(&mut cursor).unwrap_infallible(), None);
        assert_eq!(cursor.pos(), 3);

        let words = [5u8, 6];
        let mut borrowed = IntoReadWords::<u8>::into_read_words(&words[..]);
        assert_eq!(ReadWords::<u8>::read(&mut borrowed).unwrap_infallible(), Some(5));
        assert_eq!(ReadWords::<u8>::read(&mut borrowed).unwrap_infallible(), Some(6));
        assert_eq!(ReadWords::<u8>::read(&mut borrowed).unwrap_infallible(), None);
    }

    #[test]
    fn bounded_write_cursor() {
        let mut buf = [0u32; 2];
        let mut cursor = Cursor::new_at_start(&mut buf[..]);
        cursor.write(10u32).unwrap();
        cursor.write(20u32).unwrap();
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.write(30u32), Err(BoundedWriteError::OutOfSpace));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(buf, [10, 20]);
    }

    #[test]
    fn vec_and_smallvec_sinks() {
        let mut vec = Vec::<u32>::new();
        vec.write(1).unwrap_infallible();
        vec.write(2).unwrap_infallible();
        assert_eq!(vec, [1, 2]);

        let mut small = SmallVec::<[u8; 4]>::new();
        for word in 0..6 {
            small.write(word).unwrap_infallible();
        }
        assert_eq!(&small[..], &[0, 1, 2, 3, 4, 5]);
        assert!(small.spilled());
    }
}
