//! Bit-level access to compressed data
//!
//! The [`EntropyWriter`](crate::stream::EntropyWriter) and
//! [`EntropyReader`](crate::stream::EntropyReader) talk to their data through the traits
//! [`WriteBits`] and [`ReadBits`], one bit at a time. The provided implementations
//! [`BitWriter`] and [`BitReader`] pack bits into words of any [`BitArray`] type, most
//! significant bit first, and hand the words to a word backend from module
//! [`backends`](crate::backends).
//!
//! The final word of a stream is padded with zero bits. A [`BitReader`] treats any
//! trailing zero bits in the final word as if they weren't there, i.e., it reports the
//! end of the stream right after the last one bit. This is what allows the
//! [`EntropyReader`](crate::stream::EntropyReader) to detect the end of a stream exactly.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::{
    backends::{Cursor, IntoReadWords, ReadWords, WriteWords},
    BitArray,
};

/// A sink of individual bits.
pub trait WriteBits {
    type WriteError: Debug;

    fn write_bit(&mut self, bit: bool) -> Result<(), Self::WriteError>;

    /// Writes out any partially filled data, padding it with zero bits.
    fn flush(&mut self) -> Result<(), Self::WriteError>;
}

/// A source of individual bits.
pub trait ReadBits {
    type ReadError: Debug;

    /// Returns the next bit, or `Ok(None)` once no significant bits are left.
    fn read_bit(&mut self) -> Result<Option<bool>, Self::ReadError>;
}

// BIT WRITER =================================================================

/// Packs bits into words and writes each completed word to a backend.
#[derive(Debug, Clone)]
pub struct BitWriter<Word: BitArray, Backend = Vec<Word>> {
    backend: Backend,

    /// Bits that don't yet fill a complete word, right-aligned.
    buf: Word,

    /// Number of valid bits in `buf`, always smaller than `Word::BITS`.
    len: usize,
}

/// A [`BitWriter`] that collects 32-bit words in a `Vec`.
pub type DefaultBitWriter = BitWriter<u32, Vec<u32>>;

impl<Word: BitArray> BitWriter<Word, Vec<Word>> {
    pub fn new() -> Self {
        Self::with_backend(Vec::new())
    }
}

impl<Word: BitArray> Default for BitWriter<Word, Vec<Word>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Word: BitArray, Backend> BitWriter<Word, Backend> {
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            buf: Word::zero(),
            len: 0,
        }
    }

    /// Returns the backend, ignoring any bits that have not yet been flushed.
    pub fn into_inner(self) -> Backend {
        self.backend
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Number of bits written so far that have not been flushed to the backend yet.
    pub fn num_pending_bits(&self) -> usize {
        self.len
    }
}

impl<Word: BitArray, Backend: WriteWords<Word>> WriteBits for BitWriter<Word, Backend> {
    type WriteError = Backend::WriteError;

    #[inline(always)]
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::WriteError> {
        let bit = if bit { Word::one() } else { Word::zero() };
        let buf = (self.buf << 1) | bit;
        if self.len + 1 == Word::BITS {
            self.backend.write(buf)?;
            self.buf = Word::zero();
            self.len = 0;
        } else {
            self.buf = buf;
            self.len += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::WriteError> {
        if self.len != 0 {
            self.backend.write(self.buf << (Word::BITS - self.len))?;
            self.buf = Word::zero();
            self.len = 0;
        }
        Ok(())
    }
}

// BIT READER =================================================================

/// Reads bits from the words of a backend, most significant bit first.
///
/// Holds one word of lookahead so that it can tell whether the current word is the last
/// one. Once all remaining bits of the last word are zero, [`read_bit`](ReadBits::read_bit)
/// returns `Ok(None)`.
#[derive(Debug, Clone)]
pub struct BitReader<Word: BitArray, Backend> {
    backend: Backend,

    /// Unread bits of the current word, left-aligned (unread bits sit at the top).
    current: Word,

    /// Number of unread bits in `current`.
    remaining: usize,

    lookahead: Option<Word>,
}

/// A [`BitReader`] that reads 32-bit words from an owned `Vec`.
pub type DefaultBitReader = BitReader<u32, Cursor<Vec<u32>>>;

impl<Word: BitArray, Backend: ReadWords<Word>> BitReader<Word, Backend> {
    pub fn with_backend(mut backend: Backend) -> Result<Self, Backend::ReadError> {
        let lookahead = backend.read()?;
        Ok(Self {
            backend,
            current: Word::zero(),
            remaining: 0,
            lookahead,
        })
    }

    pub fn from_compressed<Buf>(compressed: Buf) -> Result<Self, Backend::ReadError>
    where
        Buf: IntoReadWords<Word, IntoReadWords = Backend>,
    {
        Self::with_backend(compressed.into_read_words())
    }

    /// Returns `true` if no further significant bit can be read.
    pub fn is_exhausted(&self) -> bool {
        self.current == Word::zero() && self.lookahead.is_none()
    }

    /// Returns the backend. Any unread bits of the current word and the lookahead word
    /// are lost.
    pub fn into_inner(self) -> Backend {
        self.backend
    }
}

impl<Word: BitArray, Backend: ReadWords<Word>> ReadBits for BitReader<Word, Backend> {
    type ReadError = Backend::ReadError;

    #[inline(always)]
    fn read_bit(&mut self) -> Result<Option<bool>, Self::ReadError> {
        if self.remaining == 0 {
            match self.lookahead.take() {
                None => return Ok(None),
                Some(word) => {
                    self.current = word;
                    self.remaining = Word::BITS;
                    self.lookahead = self.backend.read()?;
                }
            }
        }

        if self.is_exhausted() {
            return Ok(None);
        }

        let bit = self.current >> (Word::BITS - 1) != Word::zero();
        self.current = self.current << 1;
        self.remaining -= 1;
        Ok(Some(bit))
    }
}
