//! Readers operate on a `Sequence`: an immutable view of bytes which may be split into several
//! discontiguous segments, for instance the chunks of a network stream as they arrived. A sequence is
//! `Copy`; a window into a sequence is again a sequence, which is how values straddling segment
//! boundaries are handed out without copying.

use std::fmt;

#[derive(Clone, Copy)]
enum Chunks<'a> {
    One(&'a [u8]),
    Many(&'a [&'a [u8]]),
}

impl<'a> Chunks<'a> {

    #[inline]
    fn count(&self) -> usize {
        match *self {
            Chunks::One(_) => 1,
            Chunks::Many(s) => s.len(),
        }
    }

    /// Empty for indices past the last segment
    #[inline]
    fn get(&self, index: usize) -> &'a [u8] {
        match *self {
            Chunks::One(s) if index == 0 => s,
            Chunks::One(_) => &[],
            Chunks::Many(s) => s.get(index).copied().unwrap_or(&[]),
        }
    }

}

/// A marker for the next byte to read. Positions are only meaningful for the sequence (or windows of the
/// sequence) they were obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    segment: usize,
    offset: usize,
    absolute: usize,
}

impl Position {
    /// The logical offset from the start of the underlying input.
    pub fn absolute(&self) -> usize {
        self.absolute
    }
}

#[derive(Clone, Copy)]
pub struct Sequence<'a> {
    chunks: Chunks<'a>,
    start: Position,
    len: usize,
}

impl<'a> Sequence<'a> {

    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(Chunks::One(slice))
    }

    pub fn from_segments(segments: &'a [&'a [u8]]) -> Self {
        Self::new(Chunks::Many(segments))
    }

    fn new(chunks: Chunks<'a>) -> Self {
        let len = (0..chunks.count()).map(|i| chunks.get(i).len()).sum();
        let mut seq = Self { chunks, start: Position::default(), len };
        seq.start = seq.advance(Position::default(), 0);
        seq
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.advance(self.start, self.len)
    }

    /// Bytes left between `pos` and the end of this sequence
    #[inline]
    pub fn remaining(&self, pos: Position) -> usize {
        (self.start.absolute + self.len).saturating_sub(pos.absolute)
    }

    /// The whole sequence as one slice if it does not straddle a segment boundary.
    pub fn as_contiguous(&self) -> Option<&'a [u8]> {
        if self.len == 0 {
            return Some(&[]);
        }
        let seg = self.chunks.get(self.start.segment);
        seg.get(self.start.offset..self.start.offset + self.len)
    }

    pub fn is_contiguous(&self) -> bool {
        self.as_contiguous().is_some()
    }

    /// Iterates over the non-empty parts of the sequence in order.
    pub fn segments(&self) -> Segments<'a> {
        Segments { chunks: self.chunks, pos: self.start, remaining: self.len }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for seg in self.segments() {
            out.extend_from_slice(seg);
        }
        out
    }

    /// Moves `pos` forward by `n` bytes. The resulting position never rests at the end of a segment unless it
    /// is the end of the input, so the byte at a position is always `chunks[segment][offset]`.
    pub(crate) fn advance(&self, mut pos: Position, mut n: usize) -> Position {
        pos.absolute += n;
        while pos.segment < self.chunks.count() {
            let avail = self.chunks.get(pos.segment).len() - pos.offset;
            if n < avail {
                pos.offset += n;
                return pos;
            }
            n -= avail;
            pos.segment += 1;
            pos.offset = 0;
        }
        pos
    }

    #[inline]
    pub(crate) fn peek_byte(&self, pos: Position) -> Option<u8> {
        if self.remaining(pos) == 0 {
            None
        } else {
            self.chunks.get(pos.segment).get(pos.offset).copied()
        }
    }

    /// Fills `dst` starting at `pos` and returns the position behind the copied bytes, or `None` if there are
    /// not enough bytes left.
    pub(crate) fn copy_to(&self, pos: Position, dst: &mut [u8]) -> Option<Position> {
        if self.remaining(pos) < dst.len() {
            return None;
        }
        let seg = self.chunks.get(pos.segment);
        if let Some(src) = seg.get(pos.offset..pos.offset + dst.len()) {
            dst.copy_from_slice(src);
            return Some(self.advance(pos, dst.len()));
        }
        let mut written = 0;
        for part in self.window(pos, dst.len()).segments() {
            dst[written..written + part.len()].copy_from_slice(part);
            written += part.len();
        }
        Some(self.advance(pos, dst.len()))
    }

    /// The sub-sequence of `len` bytes starting at `pos`. The caller checks `len` against `remaining`.
    pub(crate) fn window(&self, pos: Position, len: usize) -> Sequence<'a> {
        Sequence { chunks: self.chunks, start: pos, len: len.min(self.remaining(pos)) }
    }

}

impl<'a> From<&'a [u8]> for Sequence<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Sequence::from_slice(slice)
    }
}

impl<'a> From<&'a Vec<u8>> for Sequence<'a> {
    fn from(vec: &'a Vec<u8>) -> Self {
        Sequence::from_slice(vec.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Sequence<'a> {
    fn from(array: &'a [u8; N]) -> Self {
        Sequence::from_slice(&array[..])
    }
}

impl<'a> From<&'a [&'a [u8]]> for Sequence<'a> {
    fn from(segments: &'a [&'a [u8]]) -> Self {
        Sequence::from_segments(segments)
    }
}

impl<'a> PartialEq for Sequence<'a> {
    fn eq(&self, other: &Sequence<'_>) -> bool {
        self.len == other.len && self.segments().flatten().eq(other.segments().flatten())
    }
}

impl<'a> Eq for Sequence<'a> {}

impl<'a> fmt::Debug for Sequence<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments()).finish()
    }
}

pub struct Segments<'a> {
    chunks: Chunks<'a>,
    pos: Position,
    remaining: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while self.remaining > 0 && self.pos.segment < self.chunks.count() {
            let seg = &self.chunks.get(self.pos.segment)[self.pos.offset..];
            let take = seg.len().min(self.remaining);
            self.pos.segment += 1;
            self.pos.offset = 0;
            if take > 0 {
                self.remaining -= take;
                return Some(&seg[..take]);
            }
        }
        None
    }
}
