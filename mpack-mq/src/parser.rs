use nom::{
    character::complete::{char, digit1, none_of},
    Finish,
    IResult,
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    branch::alt,
    bytes::complete::{tag, take_while, escaped_transform},
};
use mpack::{Integer, Value};
use anyhow::{anyhow, Result};
use std::borrow::Cow;

const WHITESPACE: &str = " \t\r\n";
const B64_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

/// Whitespace and an optional comma between elements
fn separator(i: &str) -> IResult<&str, ()> {
    value((), tuple((white, opt(char(',')), white)))(i)
}

fn keyword(i: &str) -> IResult<&str, Value<'static>> {
    alt((
            value(Value::Nil, tag("nil")),
            value(Value::Bool(true), tag("true")),
            value(Value::Bool(false), tag("false")),
    ))(i)
}

fn float(i: &str) -> IResult<&str, &str> {
    alt((
        tag("NaN"),
        recognize(pair(opt(tag("-")), tag("inf"))),
        recognize(tuple((opt(tag("-")), opt(digit1), opt(tag(".")), opt(digit1)))),
    ))(i)
}

fn float32(i: &str) -> IResult<&str, f32> {
    map_res(preceded(tag("$"), float), |n: &str| n.parse())(i)
}

fn float64(i: &str) -> IResult<&str, f64> {
    map_res(preceded(tag("$$"), float), |n: &str| n.parse())(i)
}

fn integer(i: &str) -> IResult<&str, Integer> {
    map_res(recognize(pair(opt(char('-')), digit1)), |n: &str| if n.starts_with('-') {
        n.parse::<i64>().map(Integer::from)
    } else {
        n.parse::<u64>().map(Integer::from)
    })(i)
}

fn b64(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(delimited(char('\''), take_while(move |c| B64_CHARS.contains(c)), char('\'')), |s: &str| base64::decode(s))(i)
}

fn ext(i: &str) -> IResult<&str, (i8, Vec<u8>)> {
    preceded(char('@'), pair(map_res(recognize(pair(opt(char('-')), digit1)), |n: &str| n.parse::<i8>()), b64))(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
            char('"'),
            map(opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                        value("\n", tag("n")),
                )))), |c| c.unwrap_or_default()),
            char('"')
    )(i)
}

fn array(i: &str) -> IResult<&str, Vec<Value<'static>>> {
    delimited(
        pair(char('['), white),
        many0(terminated(mq_value, separator)),
        char(']'),
    )(i)
}

fn map_entries(i: &str) -> IResult<&str, Vec<(Value<'static>, Value<'static>)>> {
    delimited(
        pair(char('{'), white),
        many0(terminated(separated_pair(mq_value, tuple((white, char(':'), white)), mq_value), separator)),
        char('}'),
    )(i)
}

fn mq_value(i: &str) -> IResult<&str, Value<'static>> {
    alt((
        map(string, |s| Value::Str(Cow::Owned(s))),
        map(b64, |b| Value::Bin(Cow::Owned(b))),
        map(ext, |(t, b)| Value::Ext(t, Cow::Owned(b))),
        map(float64, Value::F64),
        map(float32, Value::F32),
        map(integer, Value::Int),
        map(array, Value::Array),
        map(map_entries, Value::Map),
        keyword,
    ))(i)
}

/// Parses any number of whitespace separated values.
pub fn parse(i: &str) -> Result<Vec<Value<'static>>> {
    Ok(all_consuming(delimited(white, many0(terminated(mq_value, white)), white))(i).finish().map_err(|e| anyhow!("{}", e))?.1)
}
