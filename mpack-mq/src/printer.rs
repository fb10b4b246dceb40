use mpack::Value;
use std::fmt::{self, Display, Formatter};

/// Renders a value in the textual notation understood by the parser, one element per line.
pub struct Pretty<'v, 'a>(pub &'v Value<'a>);

fn escape(s: &str) -> String {
    s.replace("\\", "\\\\").replace("\"", "\\\"").replace("\n", "\\n")
}

fn indent(s: String) -> Vec<String> {
    s.lines().map(|line| format!("  {}", line)).collect()
}

impl<'v, 'a> Display for Pretty<'v, 'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Nil          => f.write_str("nil"),
            Value::Bool(true)   => f.write_str("true"),
            Value::Bool(false)  => f.write_str("false"),
            Value::Int(v)       => write!(f, "{}", v),
            Value::F32(v)       => write!(f, "${}", v),
            Value::F64(v)       => write!(f, "$${}", v),
            Value::Str(v)       => write!(f, "\"{}\"", escape(v)),
            Value::Bin(v)       => write!(f, "'{}'", base64::encode(v)),
            Value::Ext(t, v)    => write!(f, "@{}'{}'", t, base64::encode(v)),
            Value::Array(v) if v.is_empty() => f.write_str("[]"),
            Value::Map(v) if v.is_empty()   => f.write_str("{}"),
            Value::Array(v)     => write!(f, "[\n{}\n]", v.iter()
                .flat_map(|e| indent(format!("{},", Pretty(e))))
                .collect::<Vec<String>>().join("\n")),
            Value::Map(v)       => write!(f, "{{\n{}\n}}", v.iter()
                .flat_map(|(k, e)| indent(format!("{}: {},", Pretty(k), Pretty(e))))
                .collect::<Vec<String>>().join("\n")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Pretty;
    use mpack::{Integer, Value};
    use std::borrow::Cow;

    #[test]
    fn scalars() {
        assert_eq!("nil", Pretty(&Value::Nil).to_string());
        assert_eq!("-5", Pretty(&Value::Int(Integer::from(-5i8))).to_string());
        assert_eq!("$1.5", Pretty(&Value::F32(1.5)).to_string());
        assert_eq!("$$-0.25", Pretty(&Value::F64(-0.25)).to_string());
        assert_eq!("\"a\\\"b\\nc\"", Pretty(&Value::Str(Cow::Borrowed("a\"b\nc"))).to_string());
        assert_eq!("'AQID'", Pretty(&Value::Bin(Cow::Borrowed(&[1, 2, 3]))).to_string());
        assert_eq!("@-1'AAAAAQ=='", Pretty(&Value::Ext(-1, Cow::Borrowed(&[0, 0, 0, 1]))).to_string());
    }

    #[test]
    fn nested() {
        let value = Value::Map(vec![
            (Value::Str(Cow::Borrowed("cats")), Value::Array(vec![
                Value::Str(Cow::Borrowed("Jessica")),
                Value::Array(vec![]),
            ])),
        ]);
        assert_eq!("{\n  \"cats\": [\n    \"Jessica\",\n    [],\n  ],\n}", Pretty(&value).to_string());
    }

}
