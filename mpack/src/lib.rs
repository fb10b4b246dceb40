//! A MessagePack codec. [`Writer`] appends values to a [`Sink`] using the shortest legal encoding, [`Reader`]
//! decodes them from a [`Sequence`] which may be split into several segments. Both operate on primitives: a
//! single scalar, or the header of a string, binary blob, array, map or extension. [`Value`] together with
//! [`Encoder`] and [`Decoder`] handles whole documents.
//!
//! All encoding functions return the amount of written bytes. A failing write has written nothing, and a
//! failing read has consumed nothing, with the one exception of integers which are out of range for the
//! requested type. This makes it possible to feed the reader with data as it arrives and retry once more
//! bytes are buffered; the `try_read_*` functions return `Ok(None)` in this situation.
//!
//! # A note on `usize`
//!
//! MessagePack limits lengths to 32 bits. Writing a string, binary blob, array or map with more elements
//! fails with `EncodeError::Length`. On architectures where `usize` is smaller than 32 bits, some valid
//! messages can't be decoded and a `DecodeError::Length` is raised instead.
//!
//! # Examples
//!
//! ```
//! use mpack::*;
//! use std::borrow::Cow;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_array_header(3).unwrap();
//! writer.write_u8(1).unwrap();
//! writer.write_str("hi").unwrap();
//! writer.write_bool(true).unwrap();
//! let buf = writer.into_inner();
//! assert_eq!(buf, [
//!     0x93, // fixarray of length 3
//!     0x01, // positive fixint 1
//!     0xa2, // fixstr of length 2
//!     0x68, // 'h'
//!     0x69, // 'i'
//!     0xc3, // true
//! ]);
//!
//! let mut reader = Reader::new(&buf);
//! assert_eq!(Ok(3), reader.read_array_header());
//! assert_eq!(Ok(1), reader.read_i32());
//! assert_eq!(Ok(Cow::Borrowed("hi")), reader.read_str());
//! assert_eq!(Ok(true), reader.read_bool());
//!
//! let (value, consumed) = Decoder::decode(&buf).unwrap();
//! assert_eq!(6, consumed);
//! assert!(matches!(value, Value::Array(ref elements) if elements.len() == 3));
//! ```

pub mod code;
mod error;
mod ext;
mod integer;
mod reader;
mod sequence;
mod sink;
mod value;
mod writer;

#[cfg(test)]
mod properties;

pub use code::{Family, Marker};
pub use error::*;
pub use ext::{ExtHeader, Timestamp};
pub use integer::Integer;
pub use reader::Reader;
pub use sequence::{Position, Segments, Sequence};
pub use sink::{IoSink, Sink, SliceSink};
pub use value::*;
pub use writer::Writer;

/// Upper bound for the number of elements reserved up front when a container is decoded. Collections grow
/// beyond it only as their elements actually arrive.
pub const PREALLOC_LIMIT: usize = 4096;
