//! Forkable, bounds-checked cursor over an ABI-encoded buffer.
//!
//! A `Cursor` is a lightweight view: the root buffer, the absolute offset the
//! view starts at, and a position inside the view. Forking a cursor creates
//! a new view over the same buffer and shares the parent's `ReadBudget`, so
//! every view derived from one root counts against one inflation limit.
//! Dynamic offsets are producer-controlled integers; without the shared
//! budget a small crafted buffer could force an unbounded re-read walk.

use std::cell::Cell;

use chainquery_core::{ResolveError, WORD_SIZE};

/// Cumulative read counter shared by every cursor forked from one root.
#[derive(Debug)]
pub struct ReadBudget {
    bytes_read: Cell<usize>,
    buffer_len: usize,
    max_inflation: usize,
}

impl ReadBudget {
    /// `max_inflation == 0` disables the limit.
    pub fn new(buffer_len: usize, max_inflation: usize) -> Self {
        Self {
            bytes_read: Cell::new(0),
            buffer_len,
            max_inflation,
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read.get()
    }

    fn consume(&self, count: usize) -> Result<(), ResolveError> {
        let total = self.bytes_read.get().saturating_add(count);
        self.bytes_read.set(total);

        if self.max_inflation > 0 && total > self.max_inflation.saturating_mul(self.buffer_len) {
            return Err(ResolveError::InflationExceeded {
                bytes_read: total,
                buffer_len: self.buffer_len,
                max_inflation: self.max_inflation,
            });
        }
        Ok(())
    }
}

/// A position-tracking view into an immutable buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    budget: &'a ReadBudget,
    allow_loose: bool,
    /// Absolute offset of this view inside `data`
    base: usize,
    /// Position relative to `base`
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Root cursor over the whole buffer.
    pub fn new(data: &'a [u8], budget: &'a ReadBudget, allow_loose: bool) -> Self {
        Self {
            data,
            budget,
            allow_loose,
            base: 0,
            offset: 0,
        }
    }

    /// Bytes consumed within this view.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    /// Absolute offset this view starts at.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Absolute offset of the next read.
    pub fn position(&self) -> usize {
        self.base + self.offset
    }

    /// Length of this view, from its base to the end of the buffer.
    pub fn view_len(&self) -> usize {
        self.data.len() - self.base
    }

    /// Bytes left between the current position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position())
    }

    pub fn buffer_len(&self) -> usize {
        self.data.len()
    }

    /// Move to `offset` within this view.
    pub fn jump_to(&mut self, offset: usize) -> Result<(), ResolveError> {
        if offset > self.view_len() {
            return Err(ResolveError::JumpOutOfBounds {
                offset,
                view_len: self.view_len(),
            });
        }
        self.offset = offset;
        Ok(())
    }

    fn peek_bytes(&self, length: usize, loose: bool) -> Result<&'a [u8], ResolveError> {
        let start = self.position();
        let out_of_bounds = |length| ResolveError::OutOfBounds {
            offset: start,
            length,
            buffer_len: self.data.len(),
        };

        let aligned = length
            .checked_next_multiple_of(WORD_SIZE)
            .ok_or_else(|| out_of_bounds(length))?;

        let end = match start.checked_add(aligned) {
            Some(end) if end <= self.data.len() => end,
            _ => match start.checked_add(length) {
                Some(end) if self.allow_loose && loose && end <= self.data.len() => end,
                _ => return Err(out_of_bounds(aligned)),
            },
        };
        Ok(&self.data[start..end])
    }

    fn read(&mut self, length: usize, loose: bool) -> Result<&'a [u8], ResolveError> {
        let bytes = self.peek_bytes(length, loose)?;
        self.budget.consume(length)?;
        self.offset += bytes.len();
        Ok(&bytes[..length])
    }

    /// Read the next `length` bytes, advancing by the word-aligned length.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], ResolveError> {
        self.read(length, false)
    }

    /// Like `read_bytes`, but tolerates a missing final padding when the
    /// cursor was created in loose mode.
    pub fn read_bytes_loose(&mut self, length: usize) -> Result<&'a [u8], ResolveError> {
        self.read(length, true)
    }

    pub fn read_word(&mut self) -> Result<&'a [u8], ResolveError> {
        self.read_bytes(WORD_SIZE)
    }

    /// Read one word as a pointer, length or element count.
    pub fn read_index(&mut self) -> Result<usize, ResolveError> {
        let at = self.position();
        let word = self.read_word()?;
        let (high, low) = word.split_at(WORD_SIZE - 8);
        if high.iter().any(|b| *b != 0) {
            return Err(ResolveError::ValueOverflow { offset: at });
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(low);
        usize::try_from(u64::from_be_bytes(buf)).map_err(|_| ResolveError::ValueOverflow { offset: at })
    }

    /// New view starting `relative` bytes past the current position.
    pub fn sub_reader(&self, relative: usize) -> Result<Cursor<'a>, ResolveError> {
        let start = self
            .position()
            .checked_add(relative)
            .ok_or(ResolveError::JumpOutOfBounds {
                offset: relative,
                view_len: self.view_len(),
            })?;
        self.sub_reader_absolute(start)
    }

    /// New view starting at absolute buffer offset `offset`.
    pub fn sub_reader_absolute(&self, offset: usize) -> Result<Cursor<'a>, ResolveError> {
        if offset > self.data.len() {
            return Err(ResolveError::JumpOutOfBounds {
                offset,
                view_len: self.data.len(),
            });
        }
        Ok(Cursor {
            data: self.data,
            budget: self.budget,
            allow_loose: self.allow_loose,
            base: offset,
            offset: 0,
        })
    }

    /// Read a head word and open a view at the tail it points to.
    /// Pointers are relative to the start of this view.
    pub fn read_pointer(&mut self) -> Result<Cursor<'a>, ResolveError> {
        let at = self.position();
        let pointer = self.read_index()?;
        let out_of_bounds = ResolveError::PointerOutOfBounds {
            pointer,
            at,
            buffer_len: self.data.len(),
        };
        let target = self.base.checked_add(pointer).ok_or(out_of_bounds.clone())?;
        self.sub_reader_absolute(target).map_err(|_| out_of_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(v: u64) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[24..].copy_from_slice(&v.to_be_bytes());
        w
    }

    #[test]
    fn reads_advance_by_aligned_length() {
        let data = [word(7), word(9)].concat();
        let budget = ReadBudget::new(data.len(), 1024);
        let mut cursor = Cursor::new(&data, &budget, false);

        let first = cursor.read_bytes(3).unwrap();
        assert_eq!(first, &[0, 0, 0]);
        assert_eq!(cursor.consumed(), 32);
        assert_eq!(cursor.read_index().unwrap(), 9);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(budget.bytes_read(), 35);
    }

    #[test]
    fn read_past_end_fails() {
        let data = word(1);
        let budget = ReadBudget::new(data.len(), 1024);
        let mut cursor = Cursor::new(&data, &budget, false);
        cursor.read_word().unwrap();
        let err = cursor.read_word().unwrap_err();
        assert!(matches!(err, ResolveError::OutOfBounds { offset: 32, .. }));
    }

    #[test]
    fn loose_mode_accepts_unpadded_tail_only_when_enabled() {
        let data = vec![0xaa; 40];
        let budget = ReadBudget::new(data.len(), 1024);

        let mut strict = Cursor::new(&data, &budget, false);
        strict.jump_to(32).unwrap();
        assert!(strict.read_bytes_loose(8).is_err());

        let mut loose = Cursor::new(&data, &budget, true);
        loose.jump_to(32).unwrap();
        assert!(loose.read_bytes(8).is_err(), "non-loose reads stay strict");
        assert_eq!(loose.read_bytes_loose(8).unwrap(), &[0xaa; 8]);
        assert_eq!(loose.position(), 40);
    }

    #[test]
    fn jump_outside_view_fails() {
        let data = [word(0), word(0)].concat();
        let budget = ReadBudget::new(data.len(), 1024);
        let cursor = Cursor::new(&data, &budget, false);
        let mut sub = cursor.sub_reader(32).unwrap();
        assert_eq!(sub.view_len(), 32);
        assert!(sub.jump_to(32).is_ok());
        assert!(matches!(
            sub.jump_to(33),
            Err(ResolveError::JumpOutOfBounds { offset: 33, view_len: 32 })
        ));
    }

    #[test]
    fn pointers_are_relative_to_view_base() {
        // view at 32: [ptr=32][pad][value=5]
        let data = [word(0), word(32), word(0), word(5)].concat();
        let budget = ReadBudget::new(data.len(), 1024);
        let root = Cursor::new(&data, &budget, false);
        let mut view = root.sub_reader_absolute(32).unwrap();
        let mut tail = view.read_pointer().unwrap();
        assert_eq!(tail.base(), 64);
        tail.read_word().unwrap();
        assert_eq!(tail.read_index().unwrap(), 5);
    }

    #[test]
    fn pointer_outside_buffer_fails() {
        let data = word(4096);
        let budget = ReadBudget::new(data.len(), 1024);
        let mut cursor = Cursor::new(&data, &budget, false);
        let err = cursor.read_pointer().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::PointerOutOfBounds { pointer: 4096, at: 0, .. }
        ));
    }

    #[test]
    fn oversized_word_is_not_an_index() {
        let mut data = word(0);
        data[0] = 1;
        let budget = ReadBudget::new(data.len(), 1024);
        let mut cursor = Cursor::new(&data, &budget, false);
        assert_eq!(
            cursor.read_index().unwrap_err(),
            ResolveError::ValueOverflow { offset: 0 }
        );
    }

    #[test]
    fn forks_share_one_budget() {
        let data = word(0);
        let budget = ReadBudget::new(data.len(), 2);
        let root = Cursor::new(&data, &budget, false);

        let mut a = root.sub_reader_absolute(0).unwrap();
        let mut b = root.sub_reader_absolute(0).unwrap();
        a.read_word().unwrap();
        b.read_word().unwrap();
        let mut c = root.sub_reader_absolute(0).unwrap();
        let err = c.read_word().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InflationExceeded {
                bytes_read: 96,
                buffer_len: 32,
                max_inflation: 2
            }
        ));
    }

    #[test]
    fn zero_inflation_disables_guard() {
        let data = word(0);
        let budget = ReadBudget::new(data.len(), 0);
        let root = Cursor::new(&data, &budget, false);
        for _ in 0..64 {
            root.sub_reader_absolute(0).unwrap().read_word().unwrap();
        }
        assert_eq!(budget.bytes_read(), 64 * 32);
    }
}
