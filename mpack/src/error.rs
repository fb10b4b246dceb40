use std::fmt::{Display, Formatter, self};

use crate::code::Marker;
use crate::integer::Integer;

/// A `DecodeError` annotated with the absolute input position at which decoding of the failing value started.
#[derive(Debug, PartialEq)]
pub struct DecoderError {
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn position(&self) -> usize {
        self.at
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} at input position {}", self.inner, self.at)
    }
}

/// Everything that can go wrong while reading. Except for `Overflow`, a reader which returns one of these has
/// not moved its cursor.
#[derive(Debug, PartialEq)]
pub enum DecodeError {
    /// The format code is not legal for the requested read
    TypeMismatch { code: u8, expected: &'static str },
    /// The value extends past the end of the available bytes. More data may turn this into a success.
    Eof { needed: usize, available: usize },
    /// The integer was decoded but does not fit the requested type. The cursor has moved past it.
    Overflow { value: Integer, target: &'static str },
    Utf8(std::str::Utf8Error),
    InvalidChar(u32),
    InvalidTimestamp { len: u32 },
    TimestampNanos(u32),
    ExtType { expected: i8, found: i8 },
    Length(u64),
    Depth(usize),
    Cancelled,
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }

    /// Whether this error only means that not enough bytes are buffered yet.
    pub fn is_eof(&self) -> bool {
        matches!(self, DecodeError::Eof { .. })
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> DecodeError {
        DecodeError::Utf8(e)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::TypeMismatch { code, expected } =>
                write!(f, "Unexpected format code {:#04x} ({}) while reading {}", code, Marker::from_u8(*code).name(), expected),
            DecodeError::Eof { needed, available } =>
                write!(f, "Unexpected end of input: needed {} bytes but only {} are available", needed, available),
            DecodeError::Overflow { value, target } => write!(f, "Integer {} does not fit into {}", value, target),
            DecodeError::Utf8(e) => write!(f, "String slice was not valid Utf-8: {}", e),
            DecodeError::InvalidChar(value) => write!(f, "{:#x} is not a unicode scalar value", value),
            DecodeError::InvalidTimestamp { len } => write!(f, "Timestamp payload of length {} is invalid", len),
            DecodeError::TimestampNanos(value) => write!(f, "Timestamp nanoseconds {} exceed 999999999", value),
            DecodeError::ExtType { expected, found } => write!(f, "Expected extension type {}, found {}", expected, found),
            DecodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, usize::MAX),
            DecodeError::Depth(max) => write!(f, "Nesting exceeds maximum depth of {}", max),
            DecodeError::Cancelled => f.write_str("Reading was cancelled"),
        }
    }
}

#[derive(Debug)]
pub enum EncodeError {
    /// A fixed-capacity sink cannot hold the value. Nothing was written.
    Capacity { needed: usize, available: usize },
    /// The length cannot be represented on wire
    Length(u64),
    Io(std::io::Error),
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> EncodeError {
        EncodeError::Io(e)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Capacity { needed, available } =>
                write!(f, "Buffer too small: needed {} bytes but only {} are left", needed, available),
            EncodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, u32::MAX),
            EncodeError::Io(e) => write!(f, "IO error {}", e),
        }
    }
}
