//! Encoding of MessagePack primitives into a [`Sink`].
//!
//! All write functions return the number of written bytes. Each value is written with the shortest legal
//! encoding unless one of the `_block` functions explicitly asks for a fixed width. A value is either written
//! completely or not at all: the writer reserves the full size before it appends anything.

use std::convert::TryFrom;

use crate::code::{Marker, TIMESTAMP_EXT};
use crate::error::EncodeError;
use crate::ext::Timestamp;
use crate::sink::Sink;

/// A format code followed by up to eight bytes of length or value, assembled on the stack.
struct Head {
    bytes: [u8; 9],
    len: usize,
}

impl Head {

    #[inline]
    fn new(marker: Marker) -> Self {
        let mut bytes = [0u8; 9];
        bytes[0] = marker.to_u8();
        Self { bytes, len: 1 }
    }

    #[inline]
    fn push(mut self, data: &[u8]) -> Self {
        self.bytes[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        self
    }

    /// Appends `value` with the width the marker demands.
    #[inline]
    fn with_len(self, marker: Marker, value: u32) -> Self {
        match marker.width() {
            1 => self.push(&[value as u8]),
            2 => self.push(&(value as u16).to_be_bytes()),
            4 => self.push(&value.to_be_bytes()),
            _ => self,
        }
    }

    #[inline]
    fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

}

pub struct Writer<S: Sink> {
    sink: S,
    old_spec: bool,
}

macro_rules! write_blocks {
    ($($(#[$doc:meta])* $name:ident($t:ty) => $marker:ident),*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: $t) -> Result<usize, EncodeError> {
                self.emit(Head::new(Marker::$marker).push(&value.to_be_bytes()).as_slice(), &[])
            }
        )*
    };
}

impl<S: Sink> Writer<S> {

    pub fn new(sink: S) -> Self {
        Self { sink, old_spec: false }
    }

    /// In old-spec mode strings never use `str 8` and binary data is written with string headers, so that
    /// readers predating the 2013 revision of MessagePack understand the output.
    pub fn old_spec(mut self, enabled: bool) -> Self {
        self.old_spec = enabled;
        self
    }

    pub fn is_old_spec(&self) -> bool {
        self.old_spec
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.sink.flush()
    }

    #[inline]
    fn emit(&mut self, head: &[u8], payload: &[u8]) -> Result<usize, EncodeError> {
        let len = head.len() + payload.len();
        self.sink.reserve(len)?;
        self.sink.append(head);
        self.sink.append(payload);
        Ok(len)
    }

    #[inline]
    fn marker(&mut self, marker: Marker) -> Result<usize, EncodeError> {
        self.emit(&[marker.to_u8()], &[])
    }

    pub fn write_nil(&mut self) -> Result<usize, EncodeError> {
        self.marker(Marker::Nil)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<usize, EncodeError> {
        self.marker(if value { Marker::True } else { Marker::False })
    }

    pub fn write_u64(&mut self, value: u64) -> Result<usize, EncodeError> {
        let marker = Marker::for_uint(value);
        let head = Head::new(marker);
        let head = match marker {
            Marker::UInt8 => head.push(&[value as u8]),
            Marker::UInt16 => head.push(&(value as u16).to_be_bytes()),
            Marker::UInt32 => head.push(&(value as u32).to_be_bytes()),
            Marker::UInt64 => head.push(&value.to_be_bytes()),
            _ => head,
        };
        self.emit(head.as_slice(), &[])
    }

    pub fn write_i64(&mut self, value: i64) -> Result<usize, EncodeError> {
        if value >= 0 {
            return self.write_u64(value as u64);
        }
        let marker = Marker::for_int(value);
        let head = Head::new(marker);
        let head = match marker {
            Marker::Int8 => head.push(&(value as i8).to_be_bytes()),
            Marker::Int16 => head.push(&(value as i16).to_be_bytes()),
            Marker::Int32 => head.push(&(value as i32).to_be_bytes()),
            Marker::Int64 => head.push(&value.to_be_bytes()),
            _ => head,
        };
        self.emit(head.as_slice(), &[])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<usize, EncodeError> {
        self.write_u64(u64::from(value))
    }

    pub fn write_u16(&mut self, value: u16) -> Result<usize, EncodeError> {
        self.write_u64(u64::from(value))
    }

    pub fn write_u32(&mut self, value: u32) -> Result<usize, EncodeError> {
        self.write_u64(u64::from(value))
    }

    pub fn write_i8(&mut self, value: i8) -> Result<usize, EncodeError> {
        self.write_i64(i64::from(value))
    }

    pub fn write_i16(&mut self, value: i16) -> Result<usize, EncodeError> {
        self.write_i64(i64::from(value))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<usize, EncodeError> {
        self.write_i64(i64::from(value))
    }

    write_blocks! {
        /// Always writes the full `uint 8` block, for slots which get patched later.
        write_u8_block(u8) => UInt8,
        write_u16_block(u16) => UInt16,
        write_u32_block(u32) => UInt32,
        write_u64_block(u64) => UInt64,
        write_i8_block(i8) => Int8,
        write_i16_block(i16) => Int16,
        write_i32_block(i32) => Int32,
        write_i64_block(i64) => Int64,
        write_f32(f32) => Float32,
        write_f64(f64) => Float64
    }

    /// Chars are written as the integer value of the scalar.
    pub fn write_char(&mut self, value: char) -> Result<usize, EncodeError> {
        self.write_u32(u32::from(value))
    }

    pub fn write_str_header(&mut self, len: usize) -> Result<usize, EncodeError> {
        let len = to_u32(len)?;
        let marker = Marker::for_str_len(len, self.old_spec);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), &[])
    }

    pub fn write_str(&mut self, value: &str) -> Result<usize, EncodeError> {
        self.write_str_bytes(value.as_bytes())
    }

    /// Writes an already Utf-8 encoded string, for instance a cached map key.
    pub fn write_str_bytes(&mut self, utf8: &[u8]) -> Result<usize, EncodeError> {
        let len = to_u32(utf8.len())?;
        let marker = Marker::for_str_len(len, self.old_spec);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), utf8)
    }

    pub fn write_bin_header(&mut self, len: usize) -> Result<usize, EncodeError> {
        let len = to_u32(len)?;
        let marker = Marker::for_bin_len(len, self.old_spec);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), &[])
    }

    pub fn write_bin(&mut self, value: &[u8]) -> Result<usize, EncodeError> {
        let len = to_u32(value.len())?;
        let marker = Marker::for_bin_len(len, self.old_spec);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), value)
    }

    pub fn write_array_header(&mut self, len: usize) -> Result<usize, EncodeError> {
        let len = to_u32(len)?;
        let marker = Marker::for_array_len(len);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), &[])
    }

    pub fn write_map_header(&mut self, len: usize) -> Result<usize, EncodeError> {
        let len = to_u32(len)?;
        let marker = Marker::for_map_len(len);
        self.emit(Head::new(marker).with_len(marker, len).as_slice(), &[])
    }

    pub fn write_ext_header(&mut self, type_code: i8, len: usize) -> Result<usize, EncodeError> {
        let len = to_u32(len)?;
        let marker = Marker::for_ext_len(len);
        self.emit(Head::new(marker).with_len(marker, len).push(&type_code.to_be_bytes()).as_slice(), &[])
    }

    pub fn write_ext(&mut self, type_code: i8, payload: &[u8]) -> Result<usize, EncodeError> {
        let len = to_u32(payload.len())?;
        let marker = Marker::for_ext_len(len);
        self.emit(Head::new(marker).with_len(marker, len).push(&type_code.to_be_bytes()).as_slice(), payload)
    }

    /// Writes the smallest of the three timestamp layouts that holds the value.
    pub fn write_timestamp(&mut self, value: Timestamp) -> Result<usize, EncodeError> {
        let (buf, len) = value.encode();
        self.write_ext(TIMESTAMP_EXT, &buf[..len])
    }

    /// Copies pre-encoded MessagePack verbatim. The caller is responsible for its validity.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<usize, EncodeError> {
        self.emit(&[], bytes)
    }

}

#[inline]
fn to_u32(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::Length(len as u64))
}
