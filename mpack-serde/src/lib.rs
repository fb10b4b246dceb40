//! Conveniently serialize and deserialize your Rust data structures into MessagePack.
//!
//! # Data model
//!
//! Structs become maps keyed by field name, or arrays of their field values if the serializer is configured
//! with [`StructLayout::Array`]; the deserializer accepts both. Unit variants are written as their name,
//! all other variants as a map with the variant name as the single key. `Option::None` and `()` are nil.
//! Chars are strings of one character.
//!
//! Deserialization borrows strings and byte slices from the input whenever possible. When the input is
//! split into segments (see [`from_segments`]) and a value straddles a boundary, it is copied instead, so
//! types which insist on borrowing (`&str` fields) fail in this case while `String` and `Cow<str>` work.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use mpack_serde::{Serializer, StructLayout};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat<'a> {
//!     name: &'a str,
//!     species: Species,
//! }
//!
//! let cat = Cat { name: "Jessica", species: Species::LynxLynx };
//!
//! let bytes = mpack_serde::to_bytes(&cat).unwrap();
//! assert_eq!(bytes, [
//!   0x82,                                                   // fixmap of length 2
//!     0xa4,                                                 // fixstr of length 4
//!       0x6e, 0x61, 0x6d, 0x65,                             // 'name'
//!     0xa7,                                                 // fixstr of length 7
//!       0x4a, 0x65, 0x73, 0x73, 0x69, 0x63, 0x61,           // 'Jessica'
//!     0xa7,                                                 // fixstr of length 7
//!       0x73, 0x70, 0x65, 0x63, 0x69, 0x65, 0x73,           // 'species'
//!     0xa8,                                                 // fixstr of length 8, a unit variant
//!       0x4c, 0x79, 0x6e, 0x78, 0x4c, 0x79, 0x6e, 0x78,     // 'LynxLynx'
//! ]);
//! assert_eq!(cat, mpack_serde::from_bytes::<Cat>(&bytes).unwrap());
//!
//! let mut serializer = Serializer::new(Vec::new()).struct_layout(StructLayout::Array);
//! cat.serialize(&mut serializer).unwrap();
//! let compact = serializer.into_inner();
//! assert_eq!(compact.len(), 18);
//! assert_eq!(cat, mpack_serde::from_bytes::<Cat>(&compact).unwrap());
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_segments, Deserializer};
pub use error::{DeserializationError, Error, Result};
pub use ser::{to_bytes, to_slice, to_writer, Serializer, StructLayout};

#[cfg(test)]
mod tests {
    use serde::{Serialize, Deserialize};
    use std::borrow::Cow;
    use std::collections::HashMap;
    use mpack::{DecodeError, EncodeError};
    use super::{to_bytes, to_slice, to_writer, from_bytes, from_segments, Deserializer, Error, Serializer, StructLayout};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Enum {
        UnitVariant,
        NewtypeVariant(bool),
        TupleVariant(f32, f32),
        StructVariant{ a: usize, b: usize, c: usize },
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Struct {
        field: u8,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct UnitStruct;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct NewtypeStruct(String);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TupleStruct(char, char, char);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Test {
        bool: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        f32: f32,
        f64: f64,
        char: char,
        str: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        none: Option<u8>,
        some: Option<u8>,
        unit: (),
        unit_struct: UnitStruct,
        newtype_struct: NewtypeStruct,
        tuple_struct: TupleStruct,
        seq: Vec<String>,
        tuple: (u16, u16, u16),
        map: HashMap<usize, String>,
        r#struct: Struct,
        unit_variant: Enum,
        newtype_variant: Enum,
        tuple_variant: Enum,
        struct_variant: Enum,
    }

    fn message() -> Test {
        Test {
            bool: true,
            i8: -1,
            i16: -20,
            i32: -7000,
            i64: i64::MIN,
            u8: 1,
            u16: 20,
            u32: 7000,
            u64: u64::MAX,
            f32: 1337.8472,
            f64: 1337.8472,
            char: 'x',
            str: "Test".to_string(),
            bytes: vec![0x93, 0x01, 0xa2, 0x68, 0x69, 0xc3, 0x00, 0xff],
            none: None,
            some: Some(0),
            unit: (),
            unit_struct: UnitStruct,
            newtype_struct: NewtypeStruct("Qapla'".to_string()),
            tuple_struct: TupleStruct('ä', 'ß', '€'),
            seq: vec![
                "Elen".to_string(),
                "síla".to_string(),
                "lúmenn'".to_string(),
                "omentielvo".to_string(),
            ],
            tuple: (0, 0, 0),
            map: [
                (1701, "Enterprise".to_string()),
                (74656, "Voyager".to_string())
            ].into_iter().collect(),
            r#struct: Struct {
                field: 42,
            },
            unit_variant: Enum::UnitVariant,
            newtype_variant: Enum::NewtypeVariant(false),
            tuple_variant: Enum::TupleVariant(1.0, 0.999),
            struct_variant: Enum::StructVariant {
                a: 255,
                b: 0,
                c: 33,
            }
        }
    }

    #[test]
    fn roundtrip() {
        let message = message();
        assert_eq!(message, from_bytes::<Test>(&to_bytes(&message).unwrap()).unwrap());
    }

    #[test]
    fn roundtrip_array_layout() {
        let message = message();
        let mut serializer = Serializer::new(Vec::new()).struct_layout(StructLayout::Array);
        message.serialize(&mut serializer).unwrap();
        let compact = serializer.into_inner();
        assert!(compact.len() < to_bytes(&message).unwrap().len());
        assert_eq!(message, from_bytes::<Test>(&compact).unwrap());
    }

    #[test]
    fn roundtrip_old_spec() {
        let message = message();
        let mut serializer = Serializer::new(Vec::new()).old_spec(true);
        message.serialize(&mut serializer).unwrap();
        let old = serializer.into_inner();
        assert_ne!(to_bytes(&message).unwrap(), old);
        assert_eq!(message, from_bytes::<Test>(&old).unwrap());
        let mut serializer = Serializer::new(Vec::new()).old_spec(true);
        serde_bytes::Bytes::new(&[1, 2]).serialize(&mut serializer).unwrap();
        assert_eq!(vec![0xa2, 1, 2], serializer.into_inner());
    }

    #[test]
    fn every_split() {
        let message = message();
        let bytes = to_bytes(&message).unwrap();
        for at in 0..=bytes.len() {
            let parts: [&[u8]; 2] = [&bytes[..at], &bytes[at..]];
            assert_eq!(message, from_segments::<Test>(&parts).unwrap(), "split at {}", at);
        }
    }

    #[test]
    fn borrowing() {
        #[derive(Deserialize)]
        struct Borrowed<'a> {
            #[serde(borrow)]
            text: Cow<'a, str>,
            #[serde(with = "serde_bytes")]
            data: &'a [u8],
        }
        let bytes = [0x82, 0xa4, b't', b'e', b'x', b't', 0xa2, b'h', b'i', 0xa4, b'd', b'a', b't', b'a', 0xc4, 0x01, 0x07];
        let value: Borrowed = from_bytes(&bytes).unwrap();
        assert!(matches!(value.text, Cow::Borrowed("hi")));
        assert_eq!(&[7], value.data);
    }

    #[test]
    fn enums() {
        assert_eq!(vec![0xab, b'U', b'n', b'i', b't', b'V', b'a', b'r', b'i', b'a', b'n', b't'], to_bytes(&Enum::UnitVariant).unwrap());
        let bytes = to_bytes(&Enum::NewtypeVariant(true)).unwrap();
        assert_eq!(&[0x81, 0xae], &bytes[..2]);
        assert_eq!(Some(&0xc3), bytes.last());
        let too_many = [0x82, 0xa1, b'a', 0xc0, 0xa1, b'b', 0xc0];
        assert!(matches!(from_bytes::<Enum>(&too_many).unwrap_err().into_inner(), Error::UnexpectedType(_, _)));
    }

    #[test]
    fn to_io_and_slices() {
        let message = message();
        let expected = to_bytes(&message).unwrap();
        let mut out = Vec::new();
        to_writer(&mut out, &message).unwrap();
        assert_eq!(expected, out);
        let mut buf = vec![0u8; expected.len()];
        assert_eq!(expected.len(), to_slice(&mut buf, &message).unwrap());
        assert_eq!(expected, buf);
        let mut short = vec![0u8; expected.len() - 1];
        assert!(matches!(to_slice(&mut short, &message), Err(Error::Encode(EncodeError::Capacity { .. }))));
    }

    #[test]
    fn errors() {
        let err = from_bytes::<Struct>(&[0x81, 0xa5, b'f', b'i', b'e', b'l', b'd', 0xcd, 0x01, 0x00]).unwrap_err();
        // out of range integers are consumed before they are rejected
        assert_eq!(10, err.position());
        assert!(matches!(err.into_inner(), Error::Decode(DecodeError::Overflow { .. })));
        let err = from_bytes::<u8>(&[0x01, 0x02]).unwrap_err();
        assert_eq!(1, err.position());
        assert!(matches!(err.into_inner(), Error::Trailing));
        let err = from_bytes::<String>(&[0xa5, b'a']).unwrap_err();
        assert!(matches!(err.into_inner(), Error::Decode(DecodeError::Eof { needed: 5, available: 1 })));
        let err = from_bytes::<(u8, u8)>(&[0x93, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err.into_inner(), Error::Message(_)));
    }

    #[test]
    fn depth() {
        let mut nested = vec![0x91u8; 600];
        nested.push(0xc0);
        assert!(from_bytes::<serde::de::IgnoredAny>(&nested).is_ok());
        #[derive(Deserialize, Debug)]
        struct Nested(Vec<Nested>);
        let mut deep = vec![0x91u8; 200];
        deep.push(0xc0);
        let mut deserializer = Deserializer::from_bytes(&deep).max_depth(100);
        let err = Vec::<Nested>::deserialize(&mut deserializer).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Depth(100))));
        let shallow: Nested = from_bytes(&[0x92, 0x90, 0x91, 0x90]).unwrap();
        assert_eq!(vec![0, 1], shallow.0.iter().map(|n| n.0.len()).collect::<Vec<_>>());
    }

}
