use serde::{ser, Serialize};
use mpack::{IoSink, Sink, SliceSink, Writer};
use std::io::Write;

use crate::error::{Error, Result};

/// How structs and struct variants go on wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructLayout {
    /// A map keyed by field name. Robust against reordered or added fields.
    Map,
    /// An array of the field values in declaration order. Smaller, but both sides must agree on the layout.
    Array,
}

impl Default for StructLayout {
    fn default() -> Self {
        StructLayout::Map
    }
}

pub struct Serializer<S: Sink> {
    writer: Writer<S>,
    struct_layout: StructLayout,
}

pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut serializer = Serializer::new(Vec::new());
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

/// Serializes into an `io::Write`, buffering the output and flushing it once the value is complete.
pub fn to_writer<T: ?Sized + Serialize, W: Write>(writer: W, value: &T) -> Result<()> {
    let mut serializer = Serializer::new(IoSink::new(writer));
    value.serialize(&mut serializer)?;
    serializer.flush()
}

/// Serializes into a caller-provided buffer and returns the number of used bytes. Fails with a capacity error
/// if the buffer is too small.
pub fn to_slice<T: ?Sized + Serialize>(buf: &mut [u8], value: &T) -> Result<usize> {
    let mut serializer = Serializer::new(SliceSink::new(buf));
    value.serialize(&mut serializer)?;
    Ok(serializer.writer.sink().position())
}

impl<S: Sink> Serializer<S> {

    pub fn new(sink: S) -> Self {
        Self { writer: Writer::new(sink), struct_layout: StructLayout::default() }
    }

    /// Write strings and binary data the way pre-2013 MessagePack implementations expect.
    pub fn old_spec(mut self, enabled: bool) -> Self {
        self.writer = self.writer.old_spec(enabled);
        self
    }

    pub fn struct_layout(mut self, layout: StructLayout) -> Self {
        self.struct_layout = layout;
        self
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }

    pub fn into_inner(self) -> S {
        self.writer.into_inner()
    }

    fn struct_header(&mut self, len: usize) -> Result<()> {
        match self.struct_layout {
            StructLayout::Map   => self.writer.write_map_header(len)?,
            StructLayout::Array => self.writer.write_array_header(len)?,
        };
        Ok(())
    }

    fn struct_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        if self.struct_layout == StructLayout::Map {
            self.writer.write_str(key)?;
        }
        value.serialize(&mut *self)
    }

    /// Enums with data are a map with the variant name as the single key.
    fn variant(&mut self, variant: &'static str) -> Result<()> {
        self.writer.write_map_header(1)?;
        self.writer.write_str(variant)?;
        Ok(())
    }

}

impl<'a, S: Sink> ser::Serializer for &'a mut Serializer<S> {

    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.write_bool(v)?;
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.writer.write_i64(v)?;
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.writer.write_u64(v)?;
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.writer.write_f32(v)?;
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.write_f64(v)?;
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.writer.write_str(v)?;
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.writer.write_bin(v)?;
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        self.writer.write_nil()?;
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.writer.write_nil()?;
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, variant: &'static str, value: &T) -> Result<()> {
        self.variant(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match len {
            Some(l) => {
                self.writer.write_array_header(l)?;
                Ok(self)
            },
            None => Err(Error::Length),
        }
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<Self::SerializeTupleVariant> {
        self.variant(variant)?;
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        match len {
            Some(len) => {
                self.writer.write_map_header(len)?;
                Ok(self)
            },
            None => Err(Error::Length)
        }
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.struct_header(len)?;
        Ok(self)
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<Self::SerializeStructVariant> {
        self.variant(variant)?;
        self.struct_header(len)?;
        Ok(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }

}

impl<'a, S: Sink> ser::SerializeSeq for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, S: Sink> ser::SerializeTuple for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, S: Sink> ser::SerializeTupleStruct for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, S: Sink> ser::SerializeTupleVariant for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, S: Sink> ser::SerializeMap for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, S: Sink> ser::SerializeStruct for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.struct_field(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}

impl<'a, S: Sink> ser::SerializeStructVariant for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.struct_field(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }

}
