//! Encoder and decoder with "first in first out" semantics
//!
//! The [`EntropyWriter`] encodes a sequence of symbols into a bit string, and the
//! [`EntropyReader`] decodes them again in the same order. Both operate on the fly: the
//! writer passes each bit to its bit sink as soon as no carry can flip it anymore, and
//! the reader pulls bits from its bit source only when they enter the coding window.
//!
//! See the [parent module](super) for an overview and an example.

use alloc::vec::Vec;

use super::{CodeInterval, End, FrontendError, State, MSB};
use crate::{
    backends::Cursor,
    bits::{BitReader, BitWriter, ReadBits, WriteBits},
    BitArray, CoderError, Interval, UnwrapInfallible,
};

#[inline(always)]
fn frontend_error<BackendError>(
    err: impl Into<FrontendError>,
) -> CoderError<FrontendError, BackendError> {
    err.into().into_coder_error()
}

// ENCODER ====================================================================

/// Encodes symbols into a self-delimiting bit string.
///
/// Call [`write`](Self::write) (or [`write_interval`](Self::write_interval)) once per
/// symbol and [`finalize`](Self::finalize) at the end. Finalizing consumes the writer, so
/// no symbols can be appended to a finished stream.
#[derive(Debug, Clone)]
pub struct EntropyWriter<Bits> {
    current: CodeInterval,
    end: End,
    pending: PendingBits<Bits>,
}

/// An [`EntropyWriter`] that packs the compressed bits into a `Vec<u32>`.
pub type DefaultEntropyWriter = EntropyWriter<BitWriter<u32, Vec<u32>>>;

/// The output side of an [`EntropyWriter`].
///
/// Which bits are held back is determined by the [`State`] of the writer's [`End`]: none
/// in `Settled`, a single zero bit in `Zero`, and a zero bit followed by `ones` one bits
/// in `One`.
#[derive(Debug, Clone)]
struct PendingBits<Bits> {
    bits: Bits,
    ones: usize,
    num_bits: usize,
}

impl<Bits: WriteBits> PendingBits<Bits> {
    #[inline(always)]
    fn emit(&mut self, bit: bool) -> Result<(), Bits::WriteError> {
        self.bits.write_bit(bit)?;
        self.num_bits += 1;
        Ok(())
    }

    fn emit_run(&mut self, bit: bool, len: usize) -> Result<(), Bits::WriteError> {
        for _ in 0..len {
            self.emit(bit)?;
        }
        Ok(())
    }

    /// Emits the held back bits unchanged.
    fn release(&mut self, state: State) -> Result<(), Bits::WriteError> {
        if state != State::Settled {
            self.emit(false)?;
        }
        let ones = core::mem::take(&mut self.ones);
        self.emit_run(true, ones)
    }

    /// Emits the held back bits after a carry turned `0 1...1` into `1 0...0`.
    fn release_carried(&mut self) -> Result<(), Bits::WriteError> {
        self.emit(true)?;
        let zeros = core::mem::take(&mut self.ones);
        self.emit_run(false, zeros)
    }

    /// Handles a bit that was shifted out of the coding window. `state` is the state of
    /// the writer's [`End`] before the shift.
    fn shifted(&mut self, bit: bool, state: State) -> Result<(), Bits::WriteError> {
        match (bit, state) {
            // The new zero bit is held back and shields everything before it from carries.
            (false, _) => self.release(state),
            (true, State::Settled) => self.emit(true),
            (true, _) => {
                self.ones += 1;
                Ok(())
            }
        }
    }
}

impl<Word: BitArray> EntropyWriter<BitWriter<Word, Vec<Word>>> {
    pub fn new() -> Self {
        Self::with_bits(BitWriter::new())
    }
}

impl<Word: BitArray> Default for EntropyWriter<BitWriter<Word, Vec<Word>>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Bits: WriteBits> EntropyWriter<Bits> {
    pub fn with_bits(bits: Bits) -> Self {
        Self {
            current: CodeInterval::default(),
            end: End::default(),
            pending: PendingBits {
                bits,
                ones: 0,
                num_bits: 0,
            },
        }
    }

    /// Encodes a symbol that covers the fractions `[lo, hi]` (both inclusive) of the unit
    /// interval, in units of `2^-64`.
    ///
    /// The symbol must cover at least four points, i.e., `hi - lo >= 3`. An invalid symbol
    /// leaves the writer unchanged. After any other error, the writer should be discarded.
    pub fn write(
        &mut self,
        lo: u64,
        hi: u64,
    ) -> Result<(), CoderError<FrontendError, Bits::WriteError>> {
        let mut narrowed = self.current;
        let carry = narrowed.narrow(lo, hi).map_err(frontend_error)?;

        // The stream written so far terminates at the current candidate. Skipping it keeps
        // any longer stream from terminating there too.
        self.end.first(&self.current).map_err(frontend_error)?;
        self.end.next().map_err(frontend_error)?;

        self.current = narrowed;
        if carry {
            self.end.carry().map_err(frontend_error)?;
            self.pending.release_carried()?;
        }

        let Self {
            current,
            end,
            pending,
        } = self;
        current.renormalize(|bit| -> Result<(), Bits::WriteError> {
            let state = end.state();
            if bit {
                end.one();
            } else {
                end.zero();
            }
            pending.shifted(bit, state)
        })?;

        Ok(())
    }

    #[inline(always)]
    pub fn write_interval(
        &mut self,
        symbol: &Interval,
    ) -> Result<(), CoderError<FrontendError, Bits::WriteError>> {
        self.write(symbol.base(), symbol.last())
    }

    /// Emits the shortest bit string that terminates the stream, flushes the bit sink, and
    /// returns it.
    ///
    /// Fails with [`EndError::Overflow`](super::EndError::Overflow) if every terminal point
    /// of up to 63 fractional bits inside the final interval was already taken by a shorter
    /// stream. There is no deeper candidate to fall back to, since a longer one could not
    /// be told apart from a stream with more symbols. This requires about `2^62` symbols
    /// without a single renormalization.
    pub fn finalize(mut self) -> Result<Bits, CoderError<FrontendError, Bits::WriteError>> {
        self.end.first(&self.current).map_err(frontend_error)?;
        let (mut fraction, carry) = self.end.point();
        let state = self.end.state();
        let pending = &mut self.pending;

        // Zero bits right before the end of the stream are implied.
        match (carry, fraction == 0) {
            (true, false) => pending.release_carried()?,
            (true, true) => pending.emit(true)?,
            (false, true) if state == State::Zero => {}
            (false, _) => pending.release(state)?,
        }
        while fraction != 0 {
            pending.emit(fraction >= MSB)?;
            fraction <<= 1;
        }

        pending.bits.flush()?;
        Ok(self.pending.bits)
    }

    /// Number of bits passed to the bit sink so far.
    ///
    /// Does not include bits that are held back because a carry could still flip them
    /// (see [`num_pending_bits`](Self::num_pending_bits)).
    pub fn num_bits(&self) -> usize {
        self.pending.num_bits
    }

    pub fn num_pending_bits(&self) -> usize {
        match self.end.state() {
            State::Settled => 0,
            State::Zero => 1,
            State::One => 1 + self.pending.ones,
        }
    }

    pub fn interval(&self) -> CodeInterval {
        self.current
    }

    pub fn end(&self) -> End {
        self.end
    }

    pub fn bits(&self) -> &Bits {
        &self.pending.bits
    }
}

// DECODER ====================================================================

/// Decodes symbols from a bit string written by an [`EntropyWriter`].
///
/// For each symbol, look up which symbol interval contains [`value`](Self::value) and
/// then confirm that symbol with [`next`](Self::next). Use [`eof`](Self::eof) to find out
/// whether any symbols are left.
#[derive(Debug, Clone)]
pub struct EntropyReader<Bits> {
    bits: Bits,
    current: CodeInterval,
    end: End,

    /// The 64 bits of the compressed data that are currently in the coding window.
    point: u64,

    /// Number of zero bits in `point` that were made up after the data ran out.
    past_end: usize,
}

/// An [`EntropyReader`] that reads from a `Vec<u32>`, e.g., as returned by a
/// [`DefaultEntropyWriter`].
pub type DefaultEntropyReader = EntropyReader<BitReader<u32, Cursor<Vec<u32>>>>;

impl<Word: BitArray, Buf: AsRef<[Word]>> EntropyReader<BitReader<Word, Cursor<Buf>>> {
    pub fn from_compressed(compressed: Buf) -> Self {
        let bits = BitReader::with_backend(Cursor::new_at_start(compressed)).unwrap_infallible();
        Self::with_bits(bits).unwrap_infallible()
    }
}

impl<Bits: ReadBits> EntropyReader<Bits> {
    /// Fills the coding window from `bits`, padding with zeros if fewer than 64 bits are
    /// available.
    pub fn with_bits(mut bits: Bits) -> Result<Self, Bits::ReadError> {
        let mut point = 0;
        let mut past_end = 0;
        for _ in 0..64 {
            let bit = bits.read_bit()?;
            point = (point << 1) | u64::from(bit.unwrap_or(false));
            past_end += usize::from(bit.is_none());
        }

        Ok(Self {
            bits,
            current: CodeInterval::default(),
            end: End::default(),
            point,
            past_end,
        })
    }

    /// Returns the position of the compressed data within the current symbol's coordinate
    /// system, i.e., the `lo` and `hi` of the next symbol satisfy `lo <= value() <= hi`.
    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.current.quantile(self.point)
    }

    /// Returns `true` if all symbols have been decoded.
    pub fn eof(&self) -> bool {
        if self.past_end == 0 {
            return false;
        }

        // If the scan fails, the next call to `next` fails the same way and reports it.
        let mut end = self.end;
        end.first(&self.current).is_ok() && end.point().0 == self.point
    }

    /// Consumes the symbol `[lo, hi]`, which must be the same as the one passed to
    /// [`EntropyWriter::write`] at this position of the stream.
    ///
    /// Fails with [`FrontendError::InvalidData`] (without changing `self`) if
    /// [`value`](Self::value) does not lie within `[lo, hi]`.
    pub fn next(
        &mut self,
        lo: u64,
        hi: u64,
    ) -> Result<(), CoderError<FrontendError, Bits::ReadError>> {
        let mut narrowed = self.current;
        let carry = narrowed.narrow(lo, hi).map_err(frontend_error)?;
        let value = self.value();
        if value < lo || value > hi {
            return Err(FrontendError::InvalidData.into_coder_error());
        }

        self.end.first(&self.current).map_err(frontend_error)?;
        self.end.next().map_err(frontend_error)?;

        self.current = narrowed;
        if carry {
            self.end.carry().map_err(frontend_error)?;
        }

        let Self {
            bits,
            current,
            end,
            point,
            past_end,
        } = self;
        current.renormalize(|bit| -> Result<(), Bits::ReadError> {
            if bit {
                end.one();
            } else {
                end.zero();
            }
            let next_bit = bits.read_bit()?;
            *point = (*point << 1) | u64::from(next_bit.unwrap_or(false));
            *past_end += usize::from(next_bit.is_none());
            Ok(())
        })?;

        Ok(())
    }

    #[inline(always)]
    pub fn next_interval(
        &mut self,
        symbol: &Interval,
    ) -> Result<(), CoderError<FrontendError, Bits::ReadError>> {
        self.next(symbol.base(), symbol.last())
    }

    pub fn interval(&self) -> CodeInterval {
        self.current
    }

    pub fn end(&self) -> End {
        self.end
    }

    pub fn into_inner(self) -> Bits {
        self.bits
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{vec, vec::Vec};

    use super::*;
    use crate::{interval::RangeError, stream::EndError};

    const HALF: u64 = 1 << 63;

    #[test]
    fn empty_stream() {
        let compressed = DefaultEntropyWriter::new().finalize().unwrap().into_inner();
        assert!(compressed.is_empty());

        let reader = DefaultEntropyReader::from_compressed(compressed);
        assert!(reader.eof());
    }

    #[test]
    fn single_halves() {
        let mut writer = DefaultEntropyWriter::new();
        writer.write(HALF, u64::MAX).unwrap();
        assert_eq!(writer.num_bits(), 1);
        let compressed = writer.finalize().unwrap().into_inner();
        assert_eq!(compressed, vec![0x8000_0000]);

        let mut reader = DefaultEntropyReader::from_compressed(compressed);
        assert!(!reader.eof());
        assert!(reader.value() >= HALF);
        reader.next(HALF, u64::MAX).unwrap();
        assert!(reader.eof());
    }

    #[test]
    fn probability_one_symbols_are_counted() {
        for amt in 0..40 {
            let mut writer = DefaultEntropyWriter::new();
            for _ in 0..amt {
                writer.write(0, u64::MAX).unwrap();
            }
            let compressed = writer.finalize().unwrap().into_inner();

            let mut reader = DefaultEntropyReader::from_compressed(compressed);
            for _ in 0..amt {
                assert!(!reader.eof());
                assert_eq!(reader.interval(), CodeInterval::default());
                reader.next(0, u64::MAX).unwrap();
            }
            assert!(reader.eof());
        }
    }

    #[test]
    fn carries_are_resolved() {
        // Symbols close to the top of the interval make the terminal candidate carry.
        let symbols = [
            (0x5555_5555_5555_5555, 0xaaaa_aaaa_aaaa_aaaa),
            (0xffff_ffff_0000_0000, u64::MAX),
            (0, 0x0000_0000_ffff_ffff),
            (0x7fff_ffff_ffff_0000, 0x8000_0000_0000_ffff),
            (0x7fff_ffff_ffff_fff0, 0x8000_0000_0000_000f),
            (0xffff_ffff_ffff_fff0, u64::MAX),
            (0x8000_0000_0000_0000, 0x8000_0000_0000_0003),
        ];

        let mut writer = DefaultEntropyWriter::new();
        for &(lo, hi) in &symbols {
            writer.write(lo, hi).unwrap();
            assert!(writer.interval().range() >= HALF);
            assert!(writer.end().state() != State::Settled || !writer.interval().wraps());
        }
        let compressed = writer.finalize().unwrap().into_inner();

        let mut reader = EntropyReader::<BitReader<u32, _>>::from_compressed(&compressed[..]);
        for &(lo, hi) in &symbols {
            assert!(!reader.eof());
            let value = reader.value();
            assert!(lo <= value && value <= hi);
            reader.next(lo, hi).unwrap();
        }
        assert!(reader.eof());
    }

    #[test]
    fn errors() {
        let mut writer = DefaultEntropyWriter::new();
        assert_eq!(
            writer.write(5, 7),
            Err(CoderError::Frontend(FrontendError::Range(RangeError::TooNarrow)))
        );
        assert_eq!(writer.num_bits(), 0);
        writer.write(0, 0xffff).unwrap();
        let compressed = writer.finalize().unwrap().into_inner();

        let mut reader = DefaultEntropyReader::from_compressed(compressed);
        let before = reader.clone();
        assert_eq!(
            reader.next(0x1_0000, u64::MAX),
            Err(CoderError::Frontend(FrontendError::InvalidData))
        );
        assert_eq!(reader.value(), before.value());
        assert_eq!(reader.interval(), before.interval());
        reader.next(0, 0xffff).unwrap();
        assert!(reader.eof());

        let end = End::with_ending(State::Settled, MSB).map_err(FrontendError::from);
        assert_eq!(end, Err(FrontendError::End(EndError::InvalidState)));
    }

    #[test]
    fn borrowed_and_owned_buffers_decode_alike() {
        let mut writer = DefaultEntropyWriter::new();
        writer.write(0x1234, 0x8000_0000_0000_0000).unwrap();
        writer.write(HALF, u64::MAX).unwrap();
        let compressed = writer.finalize().unwrap().into_inner();

        let mut borrowed = EntropyReader::<BitReader<u32, _>>::from_compressed(&compressed[..]);
        let mut owned = DefaultEntropyReader::from_compressed(compressed.clone());
        for (lo, hi) in [(0x1234, 0x8000_0000_0000_0000), (HALF, u64::MAX)] {
            assert_eq!(borrowed.value(), owned.value());
            borrowed.next(lo, hi).unwrap();
            owned.next(lo, hi).unwrap();
        }
        assert!(borrowed.eof() && owned.eof());
    }

    #[test]
    fn finalize_reports_exhausted_terminal_points() {
        // Only the deepest candidate in the settled state is left, and it lies outside of
        // the interval `[0, 0.75)`.
        let mut interval = CodeInterval::default();
        interval.narrow(0, (3 << 62) - 1).unwrap();
        let mut writer = DefaultEntropyWriter::new();
        writer.current = interval;
        writer.end = End::with_ending(State::Settled, MSB - 1).unwrap();

        assert_eq!(
            writer.finalize().map(|_| ()),
            Err(CoderError::Frontend(FrontendError::End(EndError::Overflow)))
        );
    }

    #[test]
    fn pending_bits_are_accounted_for() {
        let mut writer = DefaultEntropyWriter::new();
        // [0.25, 0.75) shifts out a zero bit that is held back until it can't carry anymore.
        writer.write(1 << 62, (3 << 62) - 1).unwrap();
        assert_eq!(writer.num_bits(), 0);
        assert_eq!(writer.num_pending_bits(), 1);
        assert_eq!(writer.end().state(), State::Zero);

        let compressed = writer.finalize().unwrap();
        assert_eq!(compressed.num_pending_bits(), 0);
        let compressed = compressed.into_inner();
        assert_eq!(compressed.len(), 1);

        let mut reader = DefaultEntropyReader::from_compressed(compressed);
        reader.next(1 << 62, (3 << 62) - 1).unwrap();
        assert!(reader.eof());
    }

    #[test]
    fn small_words() {
        let symbols: Vec<(u64, u64)> = (0..100u64)
            .map(|i| {
                let lo = i.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 1;
                (lo, lo + (1 << 61))
            })
            .collect();

        let mut writer = EntropyWriter::with_bits(BitWriter::<u8, Vec<u8>>::new());
        for &(lo, hi) in &symbols {
            writer.write(lo, hi).unwrap();
        }
        let compressed = writer.finalize().unwrap().into_inner();
        assert_eq!(compressed.len(), 38);

        let mut reader = EntropyReader::<BitReader<u8, _>>::from_compressed(compressed);
        for &(lo, hi) in &symbols {
            assert!(!reader.eof());
            reader.next(lo, hi).unwrap();
        }
        assert!(reader.eof());
    }
}
