use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

use crate::error::DecodeError;

/// An integer as it was found on wire, at its native width. MessagePack integers range from `i64::MIN` to
/// `u64::MAX`; negative values are kept as `i64`, all others as `u64` so that the same number compares equal
/// no matter which tag was used to encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Integer(Repr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Neg(i64),
    Pos(u64),
}

impl Integer {

    pub fn as_u64(self) -> Option<u64> {
        match self.0 {
            Repr::Pos(v) => Some(v),
            Repr::Neg(_) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self.0 {
            Repr::Pos(v) => i64::try_from(v).ok(),
            Repr::Neg(v) => Some(v),
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self.0, Repr::Neg(_))
    }

    pub fn to_i128(self) -> i128 {
        match self.0 {
            Repr::Pos(v) => v as i128,
            Repr::Neg(v) => v as i128,
        }
    }

}

impl From<u64> for Integer {
    fn from(v: u64) -> Integer {
        Integer(Repr::Pos(v))
    }
}

impl From<i64> for Integer {
    fn from(v: i64) -> Integer {
        if v < 0 {
            Integer(Repr::Neg(v))
        } else {
            Integer(Repr::Pos(v as u64))
        }
    }
}

macro_rules! widen {
    ($via:ty => $($t:ty),*) => {
        $(impl From<$t> for Integer {
            fn from(v: $t) -> Integer {
                Integer::from(v as $via)
            }
        })*
    };
}

widen!(u64 => u8, u16, u32);
widen!(i64 => i8, i16, i32);

macro_rules! narrow {
    ($($t:ty),*) => {
        $(impl TryFrom<Integer> for $t {
            type Error = DecodeError;

            fn try_from(v: Integer) -> Result<$t, DecodeError> {
                let out = match v.0 {
                    Repr::Pos(i) => <$t>::try_from(i).ok(),
                    Repr::Neg(i) => <$t>::try_from(i).ok(),
                };
                out.ok_or(DecodeError::Overflow { value: v, target: stringify!($t) })
            }
        })*
    };
}

narrow!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Display for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Pos(v) => write!(f, "{}", v),
            Repr::Neg(v) => write!(f, "{}", v),
        }
    }
}
