use serde::Deserialize;
use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::{BorrowedBytesDeserializer, BytesDeserializer};
use mpack::{DecodeError, Decoder, Family, Marker, Reader, Sequence, PREALLOC_LIMIT};
use std::borrow::Cow;

use crate::error::{DeserializationError, Error, Result};

pub struct Deserializer<'de> {
    reader: Reader<'de>,
    max_depth: usize,
}

impl<'de> Deserializer<'de> {

    pub fn new<S: Into<Sequence<'de>>>(input: S) -> Self {
        Self::from_reader(Reader::new(input))
    }

    pub fn from_bytes(input: &'de [u8]) -> Self {
        Self::new(input)
    }

    /// Strings and binary data which straddle a segment boundary are handed to the visitor as owned values,
    /// all others are borrowed.
    pub fn from_segments(segments: &'de [&'de [u8]]) -> Self {
        Self::new(Sequence::from_segments(segments))
    }

    pub fn from_reader(reader: Reader<'de>) -> Self {
        Self { reader, max_depth: Decoder::DEFAULT_MAX_DEPTH }
    }

    /// Maximum nesting of sequences, maps and enum variants. Deeper input fails instead of exhausting the stack.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of consumed bytes
    pub fn position(&self) -> usize {
        self.reader.consumed()
    }

    /// Fails if there is input left after the deserialized value.
    pub fn end(&self) -> Result<()> {
        if self.reader.end_of_stream() {
            Ok(())
        } else {
            Err(Error::Trailing)
        }
    }

    pub fn into_reader(self) -> Reader<'de> {
        self.reader
    }

}

pub fn from_bytes<'a, T: Deserialize<'a>>(s: &'a [u8]) -> std::result::Result<T, DeserializationError> {
    from_deserializer(Deserializer::from_bytes(s))
}

pub fn from_segments<'a, T: Deserialize<'a>>(segments: &'a [&'a [u8]]) -> std::result::Result<T, DeserializationError> {
    from_deserializer(Deserializer::from_segments(segments))
}

fn from_deserializer<'a, T: Deserialize<'a>>(mut deserializer: Deserializer<'a>) -> std::result::Result<T, DeserializationError> {
    let t = T::deserialize(&mut deserializer).map_err(|e| e.at(deserializer.position()))?;
    deserializer.end().map_err(|e| e.at(deserializer.position()))?;
    Ok(t)
}

impl<'de> Deserializer<'de> {

    fn descend(&mut self) -> Result<()> {
        if self.reader.depth >= self.max_depth {
            return Err(DecodeError::Depth(self.max_depth).into());
        }
        self.reader.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.reader.depth -= 1;
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        match self.reader.next_family() {
            Ok(family) => Error::UnexpectedType(expected, family.name()),
            Err(e) => Error::Decode(e),
        }
    }

    fn visit_str<V: Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        match self.reader.read_str()? {
            Cow::Borrowed(v) => visitor.visit_borrowed_str(v),
            Cow::Owned(v) => visitor.visit_string(v),
        }
    }

    fn visit_bin<V: Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        match self.reader.read_bin()? {
            Cow::Borrowed(v) => visitor.visit_borrowed_bytes(v),
            Cow::Owned(v) => visitor.visit_byte_buf(v),
        }
    }

    fn visit_array<V: Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        let len = self.reader.read_array_header()?;
        self.descend()?;
        let mut access = SeqDeserializer::new(self, len);
        let value = visitor.visit_seq(&mut access)?;
        access.finish()?;
        self.ascend();
        Ok(value)
    }

    fn visit_map<V: Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        let len = self.reader.read_map_header()?;
        self.descend()?;
        let mut access = MapDeserializer::new(self, len);
        let value = visitor.visit_map(&mut access)?;
        access.finish()?;
        self.ascend();
        Ok(value)
    }

}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let marker = self.reader.next_marker()?;
        match marker.family() {
            Family::Nil => {
                self.reader.read_nil()?;
                visitor.visit_unit()
            },
            Family::Bool => visitor.visit_bool(self.reader.read_bool()?),
            Family::Int => {
                let v = self.reader.read_integer()?;
                match (v.as_u64(), v.as_i64()) {
                    (Some(u), _) => visitor.visit_u64(u),
                    (None, Some(i)) => visitor.visit_i64(i),
                    (None, None) => Err(Error::UnexpectedType("integer", "out of range integer")),
                }
            },
            Family::Float if marker == Marker::Float32 => visitor.visit_f32(self.reader.read_f32()?),
            Family::Float => visitor.visit_f64(self.reader.read_f64()?),
            Family::Str => self.visit_str(visitor),
            Family::Bin => self.visit_bin(visitor),
            Family::Array => self.visit_array(visitor),
            Family::Map => self.visit_map(visitor),
            Family::Ext => {
                let (type_code, payload) = self.reader.read_ext()?;
                visitor.visit_seq(ExtDeserializer { type_code, payload, pos: 0 })
            },
            Family::NeverUsed => Err(DecodeError::TypeMismatch { code: marker.to_u8(), expected: "any value" }.into()),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.reader.read_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.reader.read_i8()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.reader.read_i16()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.reader.read_i32()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.reader.read_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.reader.read_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.reader.read_u16()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.reader.read_u32()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.reader.read_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.reader.read_f32()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.reader.read_f64()?)
    }

    /// Accepts a string of exactly one character as well as an integer scalar value.
    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.reader.next_family()? != Family::Str {
            return visitor.visit_char(self.reader.read_char()?);
        }
        let v = self.reader.peek().read_str()?;
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                self.reader.skip()?;
                visitor.visit_char(c)
            },
            _ => Err(Error::UnexpectedType("single character", "string")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_str(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_bin(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.reader.next_family()? {
            Family::Array => {
                let len = self.reader.read_array_header()?;
                let mut bytes = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    bytes.push(self.reader.read_u8()?);
                }
                visitor.visit_byte_buf(bytes)
            },
            _ => self.visit_bin(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.reader.try_read_nil() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.reader.read_nil()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_array(visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.visit_map(visitor)
    }

    /// Structs may come as a map keyed by field name or as an array of field values.
    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.reader.next_family()? {
            Family::Map => self.visit_map(visitor),
            Family::Array => self.visit_array(visitor),
            _ => Err(self.unexpected("map or array")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str],  visitor: V) -> Result<V::Value> {
        match self.reader.next_family()? {
            Family::Str => match self.reader.read_str()? {
                Cow::Borrowed(s) => visitor.visit_enum(s.into_deserializer()),
                Cow::Owned(s) => visitor.visit_enum(s.into_deserializer()),
            },
            Family::Map => {
                let mut lookahead = self.reader.peek();
                if lookahead.read_map_header()? != 1 {
                    return Err(Error::UnexpectedType("map with a single variant", "map"));
                }
                self.reader = lookahead;
                self.descend()?;
                let value = visitor.visit_enum(EnumDeserializer::new(self))?;
                self.ascend();
                Ok(value)
            },
            _ => Err(self.unexpected("string or map")),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.reader.next_family()? {
            Family::Int => visitor.visit_u64(self.reader.read_u64()?),
            _ => self.visit_str(visitor),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.reader.skip()?;
        visitor.visit_unit()
    }

    fn is_human_readable(&self) -> bool {
        false
    }

}

struct MapDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> MapDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>, remaining: usize) -> Self {
        Self { de, remaining }
    }

    /// Visitors which stop early would leave the reader in the middle of the map.
    fn finish(&self) -> Result<()> {
        match self.remaining {
            0 => Ok(()),
            _ => Err(de::Error::invalid_length(self.remaining, &"fewer entries")),
        }
    }
}

impl<'de, 'a, 'b> MapAccess<'de> for &'b mut MapDeserializer<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        if self.remaining == 0 {
            Ok(None)
        } else {
            self.remaining -= 1;
            seed.deserialize(&mut *self.de).map(Some)
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining.min(PREALLOC_LIMIT))
    }
}

struct SeqDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> SeqDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>, remaining: usize) -> Self {
        Self { de, remaining }
    }

    fn finish(&self) -> Result<()> {
        match self.remaining {
            0 => Ok(()),
            _ => Err(de::Error::invalid_length(self.remaining, &"fewer elements")),
        }
    }
}

impl<'de, 'a, 'b> SeqAccess<'de> for &'b mut SeqDeserializer<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            Ok(None)
        } else {
            self.remaining -= 1;
            seed.deserialize(&mut *self.de).map(Some)
        }
    }

    /// Capped so that collections don't reserve what a hostile header announces.
    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining.min(PREALLOC_LIMIT))
    }

}

struct EnumDeserializer<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> EnumDeserializer<'a, 'de> {
    fn new(de: &'a mut Deserializer<'de>) -> Self {
        Self { de }
    }
}

impl<'de, 'a> EnumAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de, 'a> VariantAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        self.de.reader.read_nil()?;
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(self.de, "", fields, visitor)
    }

}

/// Presents an extension to self-describing visitors as the pair of its type code and payload.
struct ExtDeserializer<'de> {
    type_code: i8,
    payload: Sequence<'de>,
    pos: u8,
}

impl<'de> SeqAccess<'de> for ExtDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let element = match self.pos {
            0 => seed.deserialize(IntoDeserializer::<'de, Error>::into_deserializer(self.type_code))?,
            1 => match self.payload.as_contiguous() {
                Some(bytes) => seed.deserialize(BorrowedBytesDeserializer::<Error>::new(bytes))?,
                None => seed.deserialize(BytesDeserializer::<Error>::new(&self.payload.to_vec()))?,
            },
            _ => return Ok(None),
        };
        self.pos += 1;
        Ok(Some(element))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(2usize.saturating_sub(usize::from(self.pos)))
    }
}
