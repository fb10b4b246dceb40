//! The dynamic representation of a MessagePack document.
//!
//! Strings, binary data and extension payloads are borrowed from the input whenever they lie within a single
//! segment and copied otherwise. Containers need their own heap space; their initial capacity is capped at
//! [`PREALLOC_LIMIT`](crate::PREALLOC_LIMIT) so that a hostile length prefix can't make the decoder reserve
//! memory the input does not back.

use std::borrow::Cow;

use crate::code::{Family, Marker};
use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::integer::Integer;
use crate::reader::Reader;
use crate::sequence::Sequence;
use crate::sink::Sink;
use crate::writer::Writer;
use crate::PREALLOC_LIMIT;

/// The possible values according to the MessagePack data model.
///
/// Maps are a `Vec` of key-value pairs since keys may be of any type, including floats which implement
/// neither `Ord` nor `Hash`. This also preserves the order and duplicates found on wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Nil,
    Bool(bool),
    Int(Integer),
    F32(f32),
    F64(f64),
    Str(Cow<'a, str>),
    Bin(Cow<'a, [u8]>),
    Array(Vec<Value<'a>>),
    Map(Vec<(Value<'a>, Value<'a>)>),
    Ext(i8, Cow<'a, [u8]>),
}

impl<'a> Value<'a> {

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Nil       => "nil",
            Self::Bool(_)   => "bool",
            Self::Int(_)    => "integer",
            Self::F32(_)    => "f32",
            Self::F64(_)    => "f64",
            Self::Str(_)    => "string",
            Self::Bin(_)    => "binary",
            Self::Array(_)  => "array",
            Self::Map(_)    => "map",
            Self::Ext(_, _) => "extension",
        }
    }

    /// Detaches the value from the buffer it was decoded from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Nil          => Value::Nil,
            Value::Bool(v)      => Value::Bool(v),
            Value::Int(v)       => Value::Int(v),
            Value::F32(v)       => Value::F32(v),
            Value::F64(v)       => Value::F64(v),
            Value::Str(v)       => Value::Str(Cow::Owned(v.into_owned())),
            Value::Bin(v)       => Value::Bin(Cow::Owned(v.into_owned())),
            Value::Array(v)     => Value::Array(v.into_iter().map(Value::into_owned).collect()),
            Value::Map(v)       => Value::Map(v.into_iter().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()),
            Value::Ext(t, v)    => Value::Ext(t, Cow::Owned(v.into_owned())),
        }
    }

}

/// Encodes `Value`s with a [`Writer`], using the shortest encoding for every part.
pub struct Encoder;

impl Encoder {

    /// Encode a value with the given writer. The resulting `usize` is the amount of bytes that got written.
    /// A failure may leave a partially written document behind, though every single primitive is atomic.
    pub fn encode<S: Sink>(value: &Value, writer: &mut Writer<S>) -> Result<usize, EncodeError> {
        match value {
            Value::Nil          => writer.write_nil(),
            Value::Bool(v)      => writer.write_bool(*v),
            Value::Int(v)       => match v.as_u64() {
                Some(u) => writer.write_u64(u),
                None    => writer.write_i64(v.as_i64().unwrap_or(i64::MIN)),
            },
            Value::F32(v)       => writer.write_f32(*v),
            Value::F64(v)       => writer.write_f64(*v),
            Value::Str(v)       => writer.write_str(v),
            Value::Bin(v)       => writer.write_bin(v),
            Value::Ext(t, v)    => writer.write_ext(*t, v),
            Value::Array(inner) => {
                let mut c = writer.write_array_header(inner.len())?;
                for element in inner.iter() {
                    c += Self::encode(element, writer)?;
                }
                Ok(c)
            },
            Value::Map(inner) => {
                let mut c = writer.write_map_header(inner.len())?;
                for (key, val) in inner.iter() {
                    c += Self::encode(key, writer)?;
                    c += Self::encode(val, writer)?;
                }
                Ok(c)
            },
        }
    }

}

/// Decodes `Value`s from a [`Reader`]. Nesting deeper than `max_depth` is rejected with
/// [`DecodeError::Depth`] so that hostile input can't exhaust the stack.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self { max_depth: Self::DEFAULT_MAX_DEPTH }
    }
}

impl Decoder {

    pub const DEFAULT_MAX_DEPTH: usize = 500;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decode a single value from the start of the input with the default settings. Returns the value and the
    /// number of consumed bytes; anything following the value is left alone.
    pub fn decode<'a, S: Into<Sequence<'a>>>(input: S) -> Result<(Value<'a>, usize), DecoderError> {
        Self::default().decode_with(input)
    }

    pub fn decode_with<'a, S: Into<Sequence<'a>>>(&self, input: S) -> Result<(Value<'a>, usize), DecoderError> {
        let mut reader = Reader::new(input);
        let value = self.read(&mut reader)?;
        Ok((value, reader.consumed()))
    }

    /// Reads the next complete value. On failure the reader stays where it was, which makes this usable on a
    /// stream that is still being buffered. The error carries the position of the offending primitive.
    pub fn read<'a>(&self, reader: &mut Reader<'a>) -> Result<Value<'a>, DecoderError> {
        let mut lookahead = reader.peek();
        let value = self.read_value(&mut lookahead).map_err(|e| e.at(lookahead.position().absolute()))?;
        *reader = lookahead;
        Ok(value)
    }

    fn read_value<'a>(&self, reader: &mut Reader<'a>) -> Result<Value<'a>, DecodeError> {
        let marker = reader.next_marker()?;
        match marker.family() {
            Family::Nil       => reader.read_nil().map(|_| Value::Nil),
            Family::Bool      => reader.read_bool().map(Value::Bool),
            Family::Int       => reader.read_integer().map(Value::Int),
            Family::Float if marker == Marker::Float32 => reader.read_f32().map(Value::F32),
            Family::Float     => reader.read_f64().map(Value::F64),
            Family::Str       => reader.read_str().map(Value::Str),
            Family::Bin       => reader.read_bin().map(Value::Bin),
            Family::Ext       => {
                let (type_code, payload) = reader.read_ext()?;
                Ok(Value::Ext(type_code, borrow_or_copy(payload)))
            },
            Family::Array     => {
                let len = reader.read_array_header()?;
                self.descend(reader)?;
                let mut elements = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    reader.check_cancelled()?;
                    elements.push(self.read_value(reader)?);
                }
                reader.depth -= 1;
                Ok(Value::Array(elements))
            },
            Family::Map       => {
                let len = reader.read_map_header()?;
                self.descend(reader)?;
                let mut elements = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    reader.check_cancelled()?;
                    let key = self.read_value(reader)?;
                    let val = self.read_value(reader)?;
                    elements.push((key, val));
                }
                reader.depth -= 1;
                Ok(Value::Map(elements))
            },
            Family::NeverUsed => Err(DecodeError::TypeMismatch { code: marker.to_u8(), expected: "any value" }),
        }
    }

    fn descend(&self, reader: &mut Reader<'_>) -> Result<(), DecodeError> {
        if reader.depth >= self.max_depth {
            return Err(DecodeError::Depth(self.max_depth));
        }
        reader.depth += 1;
        Ok(())
    }

}

fn borrow_or_copy(payload: Sequence<'_>) -> Cow<'_, [u8]> {
    match payload.as_contiguous() {
        Some(bytes) => Cow::Borrowed(bytes),
        None        => Cow::Owned(payload.to_vec()),
    }
}
