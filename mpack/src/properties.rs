use std::borrow::Cow;
use std::convert::TryFrom;

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use quickcheck_macros::quickcheck;

use crate::{DecodeError, Decoder, Encoder, Integer, Reader, SliceSink, Value, Writer};

/// Floats which compare equal to themselves
fn finite_f64(g: &mut Gen) -> f64 {
    let mut value = f64::arbitrary(g);
    while !value.is_finite() {
        value = f64::arbitrary(g);
    }
    value
}

impl Arbitrary for Value<'static> {
    fn arbitrary(g: &mut Gen) -> Self {
        fn scalar(g: &mut Gen) -> Value<'static> {
            match usize::arbitrary(g) % 9 {
                0 => Value::Nil,
                1 => Value::Bool(bool::arbitrary(g)),
                2 => Value::Int(Integer::from(u64::arbitrary(g))),
                3 => Value::Int(Integer::from(i64::arbitrary(g))),
                4 => Value::F32(finite_f64(g) as f32),
                5 => Value::F64(finite_f64(g)),
                6 => Value::Str(Cow::Owned(String::arbitrary(g))),
                7 => Value::Bin(Cow::Owned(Vec::<u8>::arbitrary(g))),
                _ => Value::Ext(i8::arbitrary(g), Cow::Owned(Vec::<u8>::arbitrary(g))),
            }
        }
        fn gen_val(g: &mut Gen, depth: usize) -> Value<'static> {
            if depth == 0 {
                return scalar(g);
            }
            match usize::arbitrary(g) % 4 {
                0 => Value::Array((0..usize::arbitrary(g) % 4).map(|_| gen_val(g, depth - 1)).collect()),
                1 => Value::Map((0..usize::arbitrary(g) % 4).map(|_| (scalar(g), gen_val(g, depth - 1))).collect()),
                _ => scalar(g),
            }
        }
        let depth = usize::arbitrary(g) % 4;
        gen_val(g, depth)
    }
}

fn encode(value: &Value) -> Vec<u8> {
    let mut writer = Writer::new(Vec::new());
    Encoder::encode(value, &mut writer).unwrap();
    writer.into_inner()
}

#[quickcheck]
fn roundtrip(value: Value<'static>) -> bool {
    let buf = encode(&value);
    matches!(Decoder::decode(&buf), Ok((decoded, consumed)) if decoded == value && consumed == buf.len())
}

/// Every proper prefix of a document is reported as incomplete and leaves the reader where it was.
#[quickcheck]
fn truncation_is_eof(value: Value<'static>) -> bool {
    let buf = encode(&value);
    let decoder = Decoder::new();
    (0..buf.len()).all(|end| {
        let mut reader = Reader::new(&buf[..end]);
        let eof = matches!(decoder.read(&mut reader).map_err(|e| e.into_inner()), Err(DecodeError::Eof { .. }));
        eof && reader.consumed() == 0
    })
}

/// Splitting the input at any point must not change what is decoded, including splits inside headers and
/// multi-byte characters.
#[quickcheck]
fn every_split_decodes_alike(value: Value<'static>) -> bool {
    let buf = encode(&value);
    (0..=buf.len()).all(|at| {
        let parts: [&[u8]; 2] = [&buf[..at], &buf[at..]];
        matches!(Decoder::decode(&parts[..]), Ok((decoded, consumed)) if decoded == value && consumed == buf.len())
    })
}

#[test]
fn arbitrary_chunking() {
    fn prop(value: Value<'static>, splits: Vec<usize>) -> bool {
        let buf = encode(&value);
        let mut parts: Vec<&[u8]> = Vec::new();
        let mut rest = &buf[..];
        for s in splits {
            let size = s % (rest.len() + 1);
            let (head, tail) = rest.split_at(size);
            parts.push(head);
            rest = tail;
        }
        parts.push(rest);
        matches!(Decoder::decode(&parts[..]), Ok((decoded, _)) if decoded == value)
    }

    QuickCheck::new()
        .tests(1_000)
        .quickcheck(prop as fn(Value<'static>, Vec<usize>) -> bool);
}

/// Shortest-fit sizes: one byte for fixints, then the smallest of 8, 16, 32 and 64 bit.
#[quickcheck]
fn integers_are_minimal(value: i64) -> bool {
    let mut writer = Writer::new(Vec::new());
    let written = writer.write_i64(value).unwrap();
    let expected = match value {
        -32..=127 => 1,
        v if i8::try_from(v).is_ok() || u8::try_from(v).is_ok() => 2,
        v if i16::try_from(v).is_ok() || u16::try_from(v).is_ok() => 3,
        v if i32::try_from(v).is_ok() || u32::try_from(v).is_ok() => 5,
        _ => 9,
    };
    let buf = writer.into_inner();
    written == expected && Reader::new(&buf).read_i64() == Ok(value)
}

/// A value written at full width reads back as any narrower type it fits into, and overflows otherwise.
#[quickcheck]
fn narrowing_is_checked(value: i64) -> bool {
    let mut writer = Writer::new(Vec::new());
    writer.write_i64_block(value).unwrap();
    let buf = writer.into_inner();
    let fits_i16 = Reader::new(&buf).read_i16().map(i64::from);
    let fits_u32 = Reader::new(&buf).read_u32().map(i64::from);
    let expected = |fits: bool| if fits { Ok(value) } else { Err(()) };
    fits_i16.map_err(|_| ()) == expected(i16::try_from(value).is_ok())
        && fits_u32.map_err(|_| ()) == expected(u32::try_from(value).is_ok())
}

/// A write into a buffer that is too small leaves no trace.
#[quickcheck]
fn writes_are_atomic(capacity: u8, value: String) -> TestResult {
    if value.len() > 300 {
        return TestResult::discard();
    }
    let mut buf = vec![0u8; usize::from(capacity)];
    let mut writer = Writer::new(SliceSink::new(&mut buf));
    let result = writer.write_str(&value);
    let position = writer.sink().position();
    TestResult::from_bool(match result {
        Ok(written) => written == position,
        Err(_) => position == 0,
    })
}
