//! Positional decoding of MessagePack primitives from a [`Sequence`].
//!
//! Every read follows the same three steps: peek at the format code, reject it with
//! [`DecodeError::TypeMismatch`] if it is not legal for the requested type, reject it with
//! [`DecodeError::Eof`] if the value it announces extends past the end of the input, and only then advance
//! the cursor. A failed read therefore leaves the reader exactly where it was, which allows streaming callers
//! to buffer more bytes and try again. The single exception is [`DecodeError::Overflow`] (and
//! [`DecodeError::InvalidChar`] for `read_char`): the integer has been fully decoded and consumed, it just
//! doesn't fit into the requested type.
//!
//! Nothing in the reader allocates in proportion to a declared length. Headers return the count and leave it
//! to the caller to read the elements one by one, which is naturally bounded by the bytes actually present.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::str::from_utf8;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::code::{Family, Marker, TIMESTAMP_EXT};
use crate::error::DecodeError;
use crate::ext::{ExtHeader, Timestamp};
use crate::integer::Integer;
use crate::sequence::{Position, Sequence};

/// How many elements `skip` processes between two looks at the cancellation flag
const CANCELLATION_INTERVAL: u64 = 1024;

#[derive(Clone, Debug)]
pub struct Reader<'a> {
    sequence: Sequence<'a>,
    position: Position,
    /// Nesting level maintained by callers descending into arrays and maps. The reader never looks at it.
    pub depth: usize,
    cancellation: Option<&'a AtomicBool>,
}

macro_rules! read_narrowed {
    ($($(#[$doc:meta])* $name:ident => $t:ty),*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$t, DecodeError> {
                <$t>::try_from(self.read_integer()?)
            }
        )*
    };
}

macro_rules! try_read {
    ($($try_name:ident => $name:ident -> $t:ty),*) => {
        $(
            /// Like the non-`try` variant, but returns `Ok(None)` instead of [`DecodeError::Eof`]. All other errors
            /// are still reported.
            pub fn $try_name(&mut self) -> Result<Option<$t>, DecodeError> {
                optional(self.$name())
            }
        )*
    };
}

impl<'a> Reader<'a> {

    pub fn new<S: Into<Sequence<'a>>>(input: S) -> Self {
        let sequence = input.into();
        Self { position: sequence.start(), sequence, depth: 0, cancellation: None }
    }

    pub fn from_segments(segments: &'a [&'a [u8]]) -> Self {
        Self::new(Sequence::from_segments(segments))
    }

    /// Let `skip` and `read_raw` give up with [`DecodeError::Cancelled`] once `flag` is set.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// An independent copy for lookahead. Reading from the copy never moves this reader.
    pub fn peek(&self) -> Reader<'a> {
        self.clone()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Number of bytes consumed since the start of the sequence
    pub fn consumed(&self) -> usize {
        self.position.absolute() - self.sequence.start().absolute()
    }

    pub fn remaining(&self) -> usize {
        self.sequence.remaining(self.position)
    }

    pub fn end_of_stream(&self) -> bool {
        self.remaining() == 0
    }

    pub fn sequence(&self) -> Sequence<'a> {
        self.sequence
    }

    /// The unread rest of the input
    pub fn remaining_sequence(&self) -> Sequence<'a> {
        self.sequence.window(self.position, self.remaining())
    }

    pub fn next_code(&self) -> Result<u8, DecodeError> {
        self.code_at(self.position)
    }

    pub fn next_marker(&self) -> Result<Marker, DecodeError> {
        self.next_code().map(Marker::from_u8)
    }

    pub fn next_family(&self) -> Result<Family, DecodeError> {
        self.next_marker().map(Marker::family)
    }

    /// Whether the next value is nil. False at the end of input.
    pub fn is_nil(&self) -> bool {
        matches!(self.next_marker(), Ok(Marker::Nil))
    }

    /// Consumes the next value only if it is nil.
    pub fn try_read_nil(&mut self) -> bool {
        if self.is_nil() {
            self.position = self.sequence.advance(self.position, 1);
            true
        } else {
            false
        }
    }

    pub fn read_nil(&mut self) -> Result<(), DecodeError> {
        let code = self.next_code()?;
        match Marker::from_u8(code) {
            Marker::Nil => {
                self.position = self.sequence.advance(self.position, 1);
                Ok(())
            }
            _ => Err(mismatch(code, "nil")),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let code = self.next_code()?;
        let value = match Marker::from_u8(code) {
            Marker::True => true,
            Marker::False => false,
            _ => return Err(mismatch(code, "bool")),
        };
        self.position = self.sequence.advance(self.position, 1);
        Ok(value)
    }

    /// Reads an integer of any width.
    pub fn read_integer(&mut self) -> Result<Integer, DecodeError> {
        let mut pos = self.position;
        let value = self.integer(&mut pos)?;
        self.position = pos;
        Ok(value)
    }

    read_narrowed! {
        /// Reads an integer of any width and narrows it. Fails with [`DecodeError::Overflow`] after consuming
        /// the value if it does not fit.
        read_u8 => u8,
        read_u16 => u16,
        read_u32 => u32,
        read_u64 => u64,
        read_i8 => i8,
        read_i16 => i16,
        read_i32 => i32,
        read_i64 => i64
    }

    /// Accepts float 32, float 64 and integers, converting with `as` semantics.
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let mut pos = self.position;
        let code = self.code_at(pos)?;
        let value = match Marker::from_u8(code) {
            Marker::Float32 => {
                pos = self.sequence.advance(pos, 1);
                f32::from_be_bytes(self.take(&mut pos)?)
            }
            Marker::Float64 => {
                pos = self.sequence.advance(pos, 1);
                f64::from_be_bytes(self.take(&mut pos)?) as f32
            }
            m if m.family() == Family::Int => self.integer(&mut pos)?.to_i128() as f32,
            _ => return Err(mismatch(code, "float")),
        };
        self.position = pos;
        Ok(value)
    }

    /// Accepts float 32, float 64 and integers.
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let mut pos = self.position;
        let code = self.code_at(pos)?;
        let value = match Marker::from_u8(code) {
            Marker::Float32 => {
                pos = self.sequence.advance(pos, 1);
                f64::from(f32::from_be_bytes(self.take(&mut pos)?))
            }
            Marker::Float64 => {
                pos = self.sequence.advance(pos, 1);
                f64::from_be_bytes(self.take(&mut pos)?)
            }
            m if m.family() == Family::Int => self.integer(&mut pos)?.to_i128() as f64,
            _ => return Err(mismatch(code, "float")),
        };
        self.position = pos;
        Ok(value)
    }

    /// Chars travel as their unsigned scalar value. An integer which is no scalar value is consumed and
    /// reported as [`DecodeError::InvalidChar`].
    pub fn read_char(&mut self) -> Result<char, DecodeError> {
        let value = self.read_u32()?;
        std::char::from_u32(value).ok_or(DecodeError::InvalidChar(value))
    }

    /// Reads a string header and returns the length of the payload in bytes, leaving the cursor in front of
    /// the payload.
    pub fn read_str_len(&mut self) -> Result<usize, DecodeError> {
        let mut pos = self.position;
        let len = self.str_len(&mut pos)?;
        self.position = pos;
        Ok(len)
    }

    /// Returns the raw bytes of a string, possibly spread over several segments.
    pub fn read_str_sequence(&mut self) -> Result<Sequence<'a>, DecodeError> {
        let mut pos = self.position;
        let len = self.str_len(&mut pos)?;
        let payload = self.payload(&mut pos, len)?;
        self.position = pos;
        Ok(payload)
    }

    /// Returns the raw bytes of a string without copying if they lie within a single segment. If they don't,
    /// nothing is consumed and `Ok(None)` is returned; use `read_str_sequence` or `read_str` instead.
    pub fn read_str_contiguous(&mut self) -> Result<Option<&'a [u8]>, DecodeError> {
        let mut pos = self.position;
        let len = self.str_len(&mut pos)?;
        match self.payload(&mut pos, len)?.as_contiguous() {
            Some(bytes) => {
                self.position = pos;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }

    /// Borrows the string from the input if it is contiguous, otherwise reassembles it. Invalid Utf-8 is
    /// reported without consuming the value.
    pub fn read_str(&mut self) -> Result<Cow<'a, str>, DecodeError> {
        let mut pos = self.position;
        let len = self.str_len(&mut pos)?;
        let payload = self.payload(&mut pos, len)?;
        let value = match payload.as_contiguous() {
            Some(bytes) => Cow::Borrowed(from_utf8(bytes)?),
            None => Cow::Owned(String::from_utf8(payload.to_vec()).map_err(|e| e.utf8_error())?),
        };
        self.position = pos;
        Ok(value)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        self.read_str().map(Cow::into_owned)
    }

    /// Reads a binary header and returns the payload length. String headers are accepted as well since
    /// old-spec writers use them for binary data.
    pub fn read_bin_len(&mut self) -> Result<usize, DecodeError> {
        let mut pos = self.position;
        let len = self.bin_len(&mut pos)?;
        self.position = pos;
        Ok(len)
    }

    pub fn read_bin_sequence(&mut self) -> Result<Sequence<'a>, DecodeError> {
        let mut pos = self.position;
        let len = self.bin_len(&mut pos)?;
        let payload = self.payload(&mut pos, len)?;
        self.position = pos;
        Ok(payload)
    }

    /// Borrows the payload if it is contiguous and copies it otherwise.
    pub fn read_bin(&mut self) -> Result<Cow<'a, [u8]>, DecodeError> {
        let payload = self.read_bin_sequence()?;
        Ok(match payload.as_contiguous() {
            Some(bytes) => Cow::Borrowed(bytes),
            None => Cow::Owned(payload.to_vec()),
        })
    }

    /// Returns the number of elements the array announces. Nothing is allocated for them.
    pub fn read_array_header(&mut self) -> Result<usize, DecodeError> {
        let mut pos = self.position;
        let code = self.code_at(pos)?;
        let marker = Marker::from_u8(code);
        pos = self.sequence.advance(pos, 1);
        let len = match marker {
            Marker::FixArray(len) => u32::from(len),
            Marker::Array16 | Marker::Array32 => self.take_len(&mut pos, marker.width())?,
            _ => return Err(mismatch(code, "array")),
        };
        let len = to_usize(len)?;
        self.position = pos;
        Ok(len)
    }

    /// Returns the number of key-value pairs the map announces. Nothing is allocated for them.
    pub fn read_map_header(&mut self) -> Result<usize, DecodeError> {
        let mut pos = self.position;
        let code = self.code_at(pos)?;
        let marker = Marker::from_u8(code);
        pos = self.sequence.advance(pos, 1);
        let len = match marker {
            Marker::FixMap(len) => u32::from(len),
            Marker::Map16 | Marker::Map32 => self.take_len(&mut pos, marker.width())?,
            _ => return Err(mismatch(code, "map")),
        };
        let len = to_usize(len)?;
        self.position = pos;
        Ok(len)
    }

    /// Reads an extension header, leaving the cursor in front of the payload.
    pub fn read_ext_header(&mut self) -> Result<ExtHeader, DecodeError> {
        let mut pos = self.position;
        let header = self.ext_header(&mut pos)?;
        self.position = pos;
        Ok(header)
    }

    /// Reads an extension header and its payload.
    pub fn read_ext(&mut self) -> Result<(i8, Sequence<'a>), DecodeError> {
        let mut pos = self.position;
        let header = self.ext_header(&mut pos)?;
        let payload = self.payload(&mut pos, to_usize(header.len)?)?;
        self.position = pos;
        Ok((header.type_code, payload))
    }

    /// Reads a timestamp extension. The layout is selected by the payload length alone.
    pub fn read_timestamp(&mut self) -> Result<Timestamp, DecodeError> {
        let mut pos = self.position;
        let header = self.ext_header(&mut pos)?;
        if header.type_code != TIMESTAMP_EXT {
            return Err(DecodeError::ExtType { expected: TIMESTAMP_EXT, found: header.type_code });
        }
        let (seconds, nanoseconds) = match header.len {
            4 => (i64::from(u32::from_be_bytes(self.take(&mut pos)?)), 0),
            8 => {
                let data = u64::from_be_bytes(self.take(&mut pos)?);
                ((data & 0x0000_0003_ffff_ffff) as i64, (data >> 34) as u32)
            }
            12 => {
                let nanoseconds = u32::from_be_bytes(self.take(&mut pos)?);
                (i64::from_be_bytes(self.take(&mut pos)?), nanoseconds)
            }
            len => return Err(DecodeError::InvalidTimestamp { len }),
        };
        let value = Timestamp::new(seconds, nanoseconds).ok_or(DecodeError::TimestampNanos(nanoseconds))?;
        self.position = pos;
        Ok(value)
    }

    try_read! {
        try_read_array_header => read_array_header -> usize,
        try_read_map_header => read_map_header -> usize,
        try_read_str_sequence => read_str_sequence -> Sequence<'a>,
        try_read_bin_sequence => read_bin_sequence -> Sequence<'a>,
        try_read_ext_header => read_ext_header -> ExtHeader
    }

    /// Skips the next value including everything nested in it. Deeply nested input does not grow the stack:
    /// the number of values still to skip is tracked in a counter.
    pub fn skip(&mut self) -> Result<(), DecodeError> {
        let mut pos = self.position;
        self.skip_at(&mut pos)?;
        self.position = pos;
        Ok(())
    }

    /// Returns the encoded bytes of the next value, including everything nested in it, and skips them.
    pub fn read_raw(&mut self) -> Result<Sequence<'a>, DecodeError> {
        let start = self.position;
        let mut pos = start;
        self.skip_at(&mut pos)?;
        self.position = pos;
        Ok(self.sequence.window(start, pos.absolute() - start.absolute()))
    }

    fn skip_at(&self, pos: &mut Position) -> Result<(), DecodeError> {
        let mut pending: u64 = 1;
        let mut visited: u64 = 0;
        while pending > 0 {
            if visited % CANCELLATION_INTERVAL == 0 {
                self.check_cancelled()?;
            }
            visited += 1;
            pending -= 1;
            let code = self.code_at(*pos)?;
            let marker = Marker::from_u8(code);
            *pos = self.sequence.advance(*pos, 1);
            let payload: u64 = match marker {
                Marker::NeverUsed => return Err(mismatch(code, "any value")),
                Marker::FixArray(len) => { pending += u64::from(len); 0 }
                Marker::FixMap(len) => { pending += 2 * u64::from(len); 0 }
                Marker::Array16 | Marker::Array32 => { pending += u64::from(self.take_len(pos, marker.width())?); 0 }
                Marker::Map16 | Marker::Map32 => { pending += 2 * u64::from(self.take_len(pos, marker.width())?); 0 }
                Marker::FixStr(len) => u64::from(len),
                Marker::Str8 | Marker::Str16 | Marker::Str32
                    | Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => u64::from(self.take_len(pos, marker.width())?),
                // type code plus data
                Marker::FixExt1 => 1 + 1,
                Marker::FixExt2 => 1 + 2,
                Marker::FixExt4 => 1 + 4,
                Marker::FixExt8 => 1 + 8,
                Marker::FixExt16 => 1 + 16,
                Marker::Ext8 | Marker::Ext16 | Marker::Ext32 => 1 + u64::from(self.take_len(pos, marker.width())?),
                _ => marker.width() as u64,
            };
            let payload = usize::try_from(payload).map_err(|_| DecodeError::Length(payload))?;
            self.payload(pos, payload)?;
        }
        Ok(())
    }

    /// Fails with [`DecodeError::Cancelled`] once the cancellation flag is set. Collaborators walking nested
    /// values call this between elements.
    pub fn check_cancelled(&self) -> Result<(), DecodeError> {
        match self.cancellation {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(DecodeError::Cancelled),
            _ => Ok(()),
        }
    }

    #[inline]
    fn code_at(&self, pos: Position) -> Result<u8, DecodeError> {
        self.sequence.peek_byte(pos).ok_or(DecodeError::Eof { needed: 1, available: 0 })
    }

    #[inline]
    fn take<const N: usize>(&self, pos: &mut Position) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        match self.sequence.copy_to(*pos, &mut buf) {
            Some(next) => {
                *pos = next;
                Ok(buf)
            }
            None => Err(DecodeError::Eof { needed: N, available: self.sequence.remaining(*pos) }),
        }
    }

    /// Reads a big-endian length field of 1, 2 or 4 bytes.
    fn take_len(&self, pos: &mut Position, width: usize) -> Result<u32, DecodeError> {
        Ok(match width {
            1 => u32::from(self.take::<1>(pos)?[0]),
            2 => u32::from(u16::from_be_bytes(self.take(pos)?)),
            _ => u32::from_be_bytes(self.take(pos)?),
        })
    }

    fn payload(&self, pos: &mut Position, len: usize) -> Result<Sequence<'a>, DecodeError> {
        let available = self.sequence.remaining(*pos);
        if available < len {
            return Err(DecodeError::Eof { needed: len, available });
        }
        let window = self.sequence.window(*pos, len);
        *pos = self.sequence.advance(*pos, len);
        Ok(window)
    }

    fn integer(&self, pos: &mut Position) -> Result<Integer, DecodeError> {
        let code = self.code_at(*pos)?;
        let marker = Marker::from_u8(code);
        if marker.family() != Family::Int {
            return Err(mismatch(code, "integer"));
        }
        *pos = self.sequence.advance(*pos, 1);
        Ok(match marker {
            Marker::PositiveFixInt(v) => Integer::from(v),
            Marker::NegativeFixInt(v) => Integer::from(v),
            Marker::UInt8 => Integer::from(u8::from_be_bytes(self.take(pos)?)),
            Marker::UInt16 => Integer::from(u16::from_be_bytes(self.take(pos)?)),
            Marker::UInt32 => Integer::from(u32::from_be_bytes(self.take(pos)?)),
            Marker::UInt64 => Integer::from(u64::from_be_bytes(self.take(pos)?)),
            Marker::Int8 => Integer::from(i8::from_be_bytes(self.take(pos)?)),
            Marker::Int16 => Integer::from(i16::from_be_bytes(self.take(pos)?)),
            Marker::Int32 => Integer::from(i32::from_be_bytes(self.take(pos)?)),
            _ => Integer::from(i64::from_be_bytes(self.take(pos)?)),
        })
    }

    fn str_len(&self, pos: &mut Position) -> Result<usize, DecodeError> {
        let code = self.code_at(*pos)?;
        let marker = Marker::from_u8(code);
        let len = match marker {
            Marker::FixStr(len) => {
                *pos = self.sequence.advance(*pos, 1);
                u32::from(len)
            }
            Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                *pos = self.sequence.advance(*pos, 1);
                self.take_len(pos, marker.width())?
            }
            _ => return Err(mismatch(code, "string")),
        };
        to_usize(len)
    }

    fn bin_len(&self, pos: &mut Position) -> Result<usize, DecodeError> {
        let code = self.code_at(*pos)?;
        let marker = Marker::from_u8(code);
        match marker {
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                *pos = self.sequence.advance(*pos, 1);
                to_usize(self.take_len(pos, marker.width())?)
            }
            _ if marker.family() == Family::Str => self.str_len(pos),
            _ => Err(mismatch(code, "binary")),
        }
    }

    fn ext_header(&self, pos: &mut Position) -> Result<ExtHeader, DecodeError> {
        let code = self.code_at(*pos)?;
        let marker = Marker::from_u8(code);
        *pos = self.sequence.advance(*pos, 1);
        let len = match marker {
            Marker::FixExt1 => 1,
            Marker::FixExt2 => 2,
            Marker::FixExt4 => 4,
            Marker::FixExt8 => 8,
            Marker::FixExt16 => 16,
            Marker::Ext8 | Marker::Ext16 | Marker::Ext32 => self.take_len(pos, marker.width())?,
            _ => return Err(mismatch(code, "extension")),
        };
        let type_code = i8::from_be_bytes(self.take(pos)?);
        Ok(ExtHeader { type_code, len })
    }

}

#[inline]
fn mismatch(code: u8, expected: &'static str) -> DecodeError {
    DecodeError::TypeMismatch { code, expected }
}

#[inline]
fn to_usize(value: u32) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| DecodeError::Length(u64::from(value)))
}

/// Turns running out of input into `None`, keeping every other outcome.
fn optional<T>(result: Result<T, DecodeError>) -> Result<Option<T>, DecodeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DecodeError::Eof { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::{DecodeError, Family, Integer, Timestamp, Writer};
    use std::borrow::Cow;
    use std::sync::atomic::AtomicBool;

    fn encoded<F: FnOnce(&mut Writer<Vec<u8>>)>(f: F) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        f(&mut writer);
        writer.into_inner()
    }

    #[test]
    fn mixed_array() {
        let buf = [0x93u8, 0x01, 0xa2, 0x68, 0x69, 0xc3];
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(3), reader.read_array_header());
        assert_eq!(Ok(1), reader.read_i32());
        assert_eq!(Ok(Cow::Borrowed("hi")), reader.read_str());
        assert_eq!(Ok(true), reader.read_bool());
        assert!(reader.end_of_stream());
        assert_eq!(6, reader.consumed());
    }

    #[test]
    fn overflow_consumes() {
        let buf = encoded(|w| { w.write_u64(1 << 32).unwrap(); });
        assert_eq!(9, buf.len());
        let mut reader = Reader::new(&buf);
        assert!(matches!(reader.read_u32(), Err(DecodeError::Overflow { target: "u32", .. })));
        assert!(reader.end_of_stream());
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(1 << 32), reader.read_u64());
    }

    #[test]
    fn empty_map() {
        let buf = encoded(|w| { w.write_map_header(0).unwrap(); });
        assert_eq!(vec![0x80], buf);
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(0), reader.read_map_header());
        assert!(reader.end_of_stream());
    }

    #[test]
    fn mismatch_does_not_move() {
        let buf = [0xa2u8, 0x68, 0x69];
        let mut reader = Reader::new(&buf);
        assert_eq!(Err(DecodeError::TypeMismatch { code: 0xa2, expected: "integer" }), reader.read_u8());
        assert_eq!(Err(DecodeError::TypeMismatch { code: 0xa2, expected: "bool" }), reader.read_bool());
        assert_eq!(Err(DecodeError::TypeMismatch { code: 0xa2, expected: "array" }), reader.read_array_header());
        assert_eq!(0, reader.consumed());
        assert_eq!(Ok("hi".to_string()), reader.read_string());
    }

    #[test]
    fn truncation_does_not_move() {
        let buf = [0xdau8, 0x00, 0x05, b'a', b'b'];
        let mut reader = Reader::new(&buf);
        assert_eq!(Err(DecodeError::Eof { needed: 5, available: 2 }), reader.read_str_sequence());
        assert_eq!(0, reader.consumed());
        assert_eq!(Ok(None), reader.try_read_str_sequence());
        assert_eq!(0, reader.consumed());
        let mut reader = Reader::new(&buf[..2]);
        assert_eq!(Err(DecodeError::Eof { needed: 2, available: 1 }), reader.read_str_len());
        assert_eq!(Ok(None), Reader::new(&[0u8; 0]).try_read_array_header());
    }

    type Read = fn(&mut Reader<'_>) -> Result<String, DecodeError>;

    fn show<T: std::fmt::Debug>(value: T) -> String {
        format!("{:?}", value)
    }

    /// Every proper prefix fails with `Eof` without moving, and every split into two segments reads the same.
    fn atomic_and_splittable(buf: &[u8], read: Read) {
        let expected = read(&mut Reader::new(buf)).unwrap();
        for end in 0..buf.len() {
            let mut reader = Reader::new(&buf[..end]);
            assert!(matches!(read(&mut reader), Err(DecodeError::Eof { .. })), "{:02x?} cut at {}", buf, end);
            assert_eq!(0, reader.consumed(), "{:02x?} cut at {}", buf, end);
        }
        for at in 0..=buf.len() {
            let parts: [&[u8]; 2] = [&buf[..at], &buf[at..]];
            let mut reader = Reader::from_segments(&parts);
            assert_eq!(Ok(expected.clone()), read(&mut reader), "{:02x?} split at {}", buf, at);
            assert!(reader.end_of_stream());
        }
    }

    #[test]
    fn typed_reads_are_atomic() {
        atomic_and_splittable(&encoded(|w| { w.write_bool(true).unwrap(); }), |r| r.read_bool().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_u64(u64::MAX).unwrap(); }), |r| r.read_u64().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_i32_block(-70_000).unwrap(); }), |r| r.read_i32().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_u16_block(300).unwrap(); }), |r| r.read_u16().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_f32(1.5).unwrap(); }), |r| r.read_f32().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_f64(-0.125).unwrap(); }), |r| r.read_f64().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_char('€').unwrap(); }), |r| r.read_char().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_str(&"ä".repeat(20)).unwrap(); }), |r| r.read_str().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_bin(&[7; 300]).unwrap(); }), |r| r.read_bin().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_map_header(16).unwrap(); }), |r| r.read_map_header().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_array_header(70_000).unwrap(); }), |r| r.read_array_header().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_ext_header(5, 300).unwrap(); }), |r| r.read_ext_header().map(show));
        atomic_and_splittable(&encoded(|w| { w.write_ext(5, &[1, 2, 3]).unwrap(); }),
            |r| r.read_ext().map(|(t, payload)| show((t, payload.to_vec()))));
        for (seconds, nanoseconds) in [(1i64, 0u32), (1, 5), (-1, 0)] {
            let ts = Timestamp::new(seconds, nanoseconds).unwrap();
            atomic_and_splittable(&encoded(|w| { w.write_timestamp(ts).unwrap(); }), |r| r.read_timestamp().map(show));
        }
    }

    #[test]
    fn try_read_reports_malformed_input() {
        let mut reader = Reader::new(&[0xc3u8]);
        assert!(matches!(reader.try_read_map_header(), Err(DecodeError::TypeMismatch { .. })));
        let mut reader = Reader::new(&[0xdcu8, 0x00]);
        assert_eq!(Ok(None), reader.try_read_array_header());
        assert_eq!(0, reader.consumed());
    }

    #[test]
    fn hostile_array_header() {
        let buf = [0xddu8, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(u32::MAX as usize), reader.read_array_header());
        assert_eq!(Ok(1), reader.read_u8());
        assert!(matches!(reader.read_u8(), Err(DecodeError::Eof { .. })));
        let mut reader = Reader::new(&buf);
        assert!(matches!(reader.skip(), Err(DecodeError::Eof { .. })));
        assert_eq!(0, reader.consumed());
    }

    #[test]
    fn cross_width() {
        let buf = encoded(|w| {
            w.write_i64(-129).unwrap();
            w.write_u8_block(7).unwrap();
            w.write_i64_block(300).unwrap();
        });
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(-129), reader.peek().read_i64());
        assert_eq!(Ok(-129), reader.peek().read_i16());
        assert!(matches!(reader.peek().read_i8(), Err(DecodeError::Overflow { .. })));
        assert!(matches!(reader.read_u16(), Err(DecodeError::Overflow { .. })));
        assert_eq!(Ok(7), reader.peek().read_i8());
        assert_eq!(Ok(7), reader.read_u64());
        assert_eq!(Ok(Integer::from(300u16)), reader.peek().read_integer());
        assert_eq!(Ok(300), reader.read_u16());
    }

    #[test]
    fn floats_accept_integers() {
        let buf = encoded(|w| {
            w.write_f32(1.5).unwrap();
            w.write_f64(-2.25).unwrap();
            w.write_i8(-3).unwrap();
        });
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(1.5), reader.read_f64());
        assert_eq!(Ok(-2.25), reader.read_f32());
        assert_eq!(Ok(-3.0), reader.read_f64());
        assert!(matches!(Reader::new(&[0xc0u8]).read_f32(), Err(DecodeError::TypeMismatch { .. })));
    }

    #[test]
    fn chars() {
        let buf = encoded(|w| {
            w.write_char('ß').unwrap();
            w.write_u32(0xd800).unwrap();
        });
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok('ß'), reader.read_char());
        assert_eq!(Err(DecodeError::InvalidChar(0xd800)), reader.read_char());
        assert!(reader.end_of_stream());
    }

    #[test]
    fn peek_is_independent() {
        let buf = [0xc0u8, 0x01];
        let mut reader = Reader::new(&buf);
        let mut lookahead = reader.peek();
        assert_eq!(Ok(()), lookahead.read_nil());
        assert_eq!(1, lookahead.consumed());
        assert_eq!(0, reader.consumed());
        assert!(reader.is_nil());
        assert!(reader.try_read_nil());
        assert!(!reader.try_read_nil());
        assert_eq!(Ok(Family::Int), reader.next_family());
    }

    #[test]
    fn string_split_inside_codepoint() {
        // "ä" is 0xc3 0xa4, split between the two segments
        let first: &[u8] = &[0xa3, b'a', 0xc3];
        let second: &[u8] = &[0xa4];
        let parts = [first, second];
        let mut reader = Reader::from_segments(&parts);
        assert_eq!(Ok(None), reader.peek().read_str_contiguous());
        assert_eq!(2, reader.peek().read_str_sequence().unwrap().segments().count());
        let value = reader.read_str().unwrap();
        assert!(matches!(value, Cow::Owned(_)));
        assert_eq!("aä", value);
        assert!(reader.end_of_stream());
    }

    #[test]
    fn contiguous_string_is_borrowed() {
        let first: &[u8] = &[0xa2, b'o', b'k', 0xa1];
        let second: &[u8] = &[b'!'];
        let parts = [first, second];
        let mut reader = Reader::from_segments(&parts);
        assert_eq!(Ok(Some(&b"ok"[..])), reader.read_str_contiguous());
        assert_eq!(Ok(Cow::Borrowed("!")), reader.read_str());
    }

    #[test]
    fn invalid_utf8_does_not_move() {
        let buf = [0xa2u8, 0xc3, 0x28];
        let mut reader = Reader::new(&buf);
        assert!(matches!(reader.read_str(), Err(DecodeError::Utf8(_))));
        assert_eq!(0, reader.consumed());
        assert_eq!(Ok(&[0xc3u8, 0x28][..]), reader.read_bin().as_deref());
    }

    #[test]
    fn binary_and_old_spec_strings() {
        let buf = encoded(|w| {
            w.write_bin(&[1, 2, 3]).unwrap();
            w.write_str("raw").unwrap();
        });
        let mut reader = Reader::new(&buf);
        assert_eq!(Ok(Cow::Borrowed(&[1u8, 2, 3][..])), reader.read_bin());
        assert_eq!(Ok(Cow::Borrowed(&b"raw"[..])), reader.read_bin());
        assert!(matches!(Reader::new(&buf).read_str(), Err(DecodeError::TypeMismatch { .. })));
    }

    #[test]
    fn extensions() {
        let buf = encoded(|w| {
            w.write_ext(5, &[9; 3]).unwrap();
            w.write_ext(-7, &[1; 16]).unwrap();
        });
        let mut reader = Reader::new(&buf);
        let (type_code, data) = reader.read_ext().unwrap();
        assert_eq!((5, vec![9; 3]), (type_code, data.to_vec()));
        let header = reader.read_ext_header().unwrap();
        assert_eq!((-7, 16), (header.type_code, header.len));
        assert_eq!(16, reader.remaining());
    }

    #[test]
    fn timestamps() {
        for ts in [
            Timestamp::new(0, 0).unwrap(),
            Timestamp::new(1_600_000_000, 0).unwrap(),
            Timestamp::new(1_600_000_000, 123_456_789).unwrap(),
            Timestamp::new(-1, 999_999_999).unwrap(),
            Timestamp::new(i64::MAX, 1).unwrap(),
        ] {
            let buf = encoded(|w| { w.write_timestamp(ts).unwrap(); });
            let mut reader = Reader::new(&buf);
            assert_eq!(Ok(ts), reader.read_timestamp());
            assert!(reader.end_of_stream());
        }
    }

    #[test]
    fn invalid_timestamps() {
        let wrong_len = [0xc7u8, 0x05, 0xff, 0, 0, 0, 0, 0];
        assert_eq!(Err(DecodeError::InvalidTimestamp { len: 5 }), Reader::new(&wrong_len).read_timestamp());
        let wrong_type = [0xd6u8, 0x01, 0, 0, 0, 0];
        assert_eq!(Err(DecodeError::ExtType { expected: -1, found: 1 }), Reader::new(&wrong_type).read_timestamp());
        let nanos = [0xd7u8, 0xff, 0xff, 0xff, 0xff, 0xfc, 0, 0, 0, 0];
        assert!(matches!(Reader::new(&nanos).read_timestamp(), Err(DecodeError::TimestampNanos(_))));
    }

    #[test]
    fn skip_and_raw() {
        let buf = encoded(|w| {
            w.write_map_header(2).unwrap();
            w.write_str("a").unwrap();
            w.write_array_header(2).unwrap();
            w.write_f64(1.0).unwrap();
            w.write_ext(1, &[0; 20]).unwrap();
            w.write_str("b").unwrap();
            w.write_nil().unwrap();
            w.write_bool(false).unwrap();
        });
        let mut reader = Reader::new(&buf);
        let raw = reader.read_raw().unwrap();
        assert_eq!(buf.len() - 1, raw.len());
        assert_eq!(Ok(false), reader.read_bool());
        let mut reader = Reader::new(&buf[..buf.len() - 2]);
        assert!(matches!(reader.skip(), Err(DecodeError::Eof { .. })));
        assert_eq!(0, reader.consumed());
        assert!(matches!(Reader::new(&[0xc1u8]).skip(), Err(DecodeError::TypeMismatch { code: 0xc1, .. })));
    }

    #[test]
    fn cancellation() {
        let cancelled = AtomicBool::new(true);
        let buf = [0x91u8, 0xc0];
        let mut reader = Reader::new(&buf).with_cancellation(&cancelled);
        assert_eq!(Err(DecodeError::Cancelled), reader.peek().skip());
        assert_eq!(Ok(1), reader.read_array_header());
        assert_eq!(Ok(()), reader.read_nil());
    }

}
