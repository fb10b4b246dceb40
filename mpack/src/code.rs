//! The MessagePack format code table. Every encoded value starts with a single byte, the format code,
//! which identifies its type. For some types (`fixint`, `fixstr`, `fixarray`, `fixmap`) the code
//! itself also carries the value or the length, for all others the code is followed by a big-endian
//! length or payload of fixed width.
//!
//! ```text
//! 0x00 - 0x7f  positive fixint     0xc0  nil           0xcc - 0xcf  uint 8/16/32/64
//! 0x80 - 0x8f  fixmap              0xc1  never used    0xd0 - 0xd3  int 8/16/32/64
//! 0x90 - 0x9f  fixarray            0xc2  false         0xd4 - 0xd8  fixext 1/2/4/8/16
//! 0xa0 - 0xbf  fixstr              0xc3  true          0xd9 - 0xdb  str 8/16/32
//!                                  0xc4 - 0xc6  bin    0xdc - 0xdd  array 16/32
//!                                  0xc7 - 0xc9  ext    0xde - 0xdf  map 16/32
//!                                  0xca - 0xcb  float  0xe0 - 0xff  negative fixint
//! ```

pub const POSITIVE_FIXINT_MAX: u8 = 0x7f;
pub const FIXMAP_MIN: u8 = 0x80;
pub const FIXMAP_MAX: u8 = 0x8f;
pub const FIXARRAY_MIN: u8 = 0x90;
pub const FIXARRAY_MAX: u8 = 0x9f;
pub const FIXSTR_MIN: u8 = 0xa0;
pub const FIXSTR_MAX: u8 = 0xbf;
pub const NIL: u8 = 0xc0;
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;
pub const NEGATIVE_FIXINT_MIN: u8 = 0xe0;

/// Largest length carried inside a fixstr code
pub const FIXSTR_LEN_MAX: u32 = 31;
/// Largest length carried inside a fixarray or fixmap code
pub const FIXCOLLECTION_LEN_MAX: u32 = 15;
/// Smallest value carried inside a negative fixint code
pub const NEGATIVE_FIXINT_MIN_VALUE: i64 = -32;

/// The extension type code reserved for timestamps
pub const TIMESTAMP_EXT: i8 = -1;

/// The coarse type a format code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Bin,
    Array,
    Map,
    Ext,
    /// `0xc1` is reserved and never produced by a compliant writer
    NeverUsed,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match *self {
            Family::Nil       => "nil",
            Family::Bool      => "bool",
            Family::Int       => "integer",
            Family::Float     => "float",
            Family::Str       => "string",
            Family::Bin       => "binary",
            Family::Array     => "array",
            Family::Map       => "map",
            Family::Ext       => "extension",
            Family::NeverUsed => "never used",
        }
    }
}

/// A classified format code. Codes carrying a value or length in their low bits keep it as payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    PositiveFixInt(u8),
    FixMap(u8),
    FixArray(u8),
    FixStr(u8),
    Nil,
    NeverUsed,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    Ext8,
    Ext16,
    Ext32,
    Float32,
    Float64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    FixExt1,
    FixExt2,
    FixExt4,
    FixExt8,
    FixExt16,
    Str8,
    Str16,
    Str32,
    Array16,
    Array32,
    Map16,
    Map32,
    NegativeFixInt(i8),
}

impl Marker {

    /// Classifies a byte into exactly one of the format code ranges. Total: every byte has a marker.
    pub const fn from_u8(code: u8) -> Marker {
        match code {
            0x00..=POSITIVE_FIXINT_MAX => Marker::PositiveFixInt(code),
            FIXMAP_MIN..=FIXMAP_MAX     => Marker::FixMap(code & 0x0f),
            FIXARRAY_MIN..=FIXARRAY_MAX => Marker::FixArray(code & 0x0f),
            FIXSTR_MIN..=FIXSTR_MAX     => Marker::FixStr(code & 0x1f),
            NIL        => Marker::Nil,
            NEVER_USED => Marker::NeverUsed,
            FALSE      => Marker::False,
            TRUE       => Marker::True,
            BIN8       => Marker::Bin8,
            BIN16      => Marker::Bin16,
            BIN32      => Marker::Bin32,
            EXT8       => Marker::Ext8,
            EXT16      => Marker::Ext16,
            EXT32      => Marker::Ext32,
            FLOAT32    => Marker::Float32,
            FLOAT64    => Marker::Float64,
            UINT8      => Marker::UInt8,
            UINT16     => Marker::UInt16,
            UINT32     => Marker::UInt32,
            UINT64     => Marker::UInt64,
            INT8       => Marker::Int8,
            INT16      => Marker::Int16,
            INT32      => Marker::Int32,
            INT64      => Marker::Int64,
            FIXEXT1    => Marker::FixExt1,
            FIXEXT2    => Marker::FixExt2,
            FIXEXT4    => Marker::FixExt4,
            FIXEXT8    => Marker::FixExt8,
            FIXEXT16   => Marker::FixExt16,
            STR8       => Marker::Str8,
            STR16      => Marker::Str16,
            STR32      => Marker::Str32,
            ARRAY16    => Marker::Array16,
            ARRAY32    => Marker::Array32,
            MAP16      => Marker::Map16,
            MAP32      => Marker::Map32,
            NEGATIVE_FIXINT_MIN..=0xff => Marker::NegativeFixInt(code as i8),
        }
    }

    /// The byte this marker is written as.
    pub const fn to_u8(self) -> u8 {
        match self {
            Marker::PositiveFixInt(v) => v & POSITIVE_FIXINT_MAX,
            Marker::FixMap(len)       => FIXMAP_MIN | (len & 0x0f),
            Marker::FixArray(len)     => FIXARRAY_MIN | (len & 0x0f),
            Marker::FixStr(len)       => FIXSTR_MIN | (len & 0x1f),
            Marker::Nil       => NIL,
            Marker::NeverUsed => NEVER_USED,
            Marker::False     => FALSE,
            Marker::True      => TRUE,
            Marker::Bin8      => BIN8,
            Marker::Bin16     => BIN16,
            Marker::Bin32     => BIN32,
            Marker::Ext8      => EXT8,
            Marker::Ext16     => EXT16,
            Marker::Ext32     => EXT32,
            Marker::Float32   => FLOAT32,
            Marker::Float64   => FLOAT64,
            Marker::UInt8     => UINT8,
            Marker::UInt16    => UINT16,
            Marker::UInt32    => UINT32,
            Marker::UInt64    => UINT64,
            Marker::Int8      => INT8,
            Marker::Int16     => INT16,
            Marker::Int32     => INT32,
            Marker::Int64     => INT64,
            Marker::FixExt1   => FIXEXT1,
            Marker::FixExt2   => FIXEXT2,
            Marker::FixExt4   => FIXEXT4,
            Marker::FixExt8   => FIXEXT8,
            Marker::FixExt16  => FIXEXT16,
            Marker::Str8      => STR8,
            Marker::Str16     => STR16,
            Marker::Str32     => STR32,
            Marker::Array16   => ARRAY16,
            Marker::Array32   => ARRAY32,
            Marker::Map16     => MAP16,
            Marker::Map32     => MAP32,
            Marker::NegativeFixInt(v) => (v as u8) | NEGATIVE_FIXINT_MIN,
        }
    }

    pub fn family(self) -> Family {
        match self {
            Marker::Nil => Family::Nil,
            Marker::NeverUsed => Family::NeverUsed,
            Marker::False | Marker::True => Family::Bool,
            Marker::PositiveFixInt(_) | Marker::NegativeFixInt(_)
                | Marker::UInt8 | Marker::UInt16 | Marker::UInt32 | Marker::UInt64
                | Marker::Int8 | Marker::Int16 | Marker::Int32 | Marker::Int64 => Family::Int,
            Marker::Float32 | Marker::Float64 => Family::Float,
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => Family::Str,
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => Family::Bin,
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => Family::Array,
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => Family::Map,
            Marker::FixExt1 | Marker::FixExt2 | Marker::FixExt4 | Marker::FixExt8 | Marker::FixExt16
                | Marker::Ext8 | Marker::Ext16 | Marker::Ext32 => Family::Ext,
        }
    }

    /// Returns the mnemonic of the marker. This is useful for error messages.
    pub fn name(self) -> &'static str {
        match self {
            Marker::PositiveFixInt(_) => "positive fixint",
            Marker::FixMap(_)   => "fixmap",
            Marker::FixArray(_) => "fixarray",
            Marker::FixStr(_)   => "fixstr",
            Marker::Nil         => "nil",
            Marker::NeverUsed   => "never used",
            Marker::False       => "false",
            Marker::True        => "true",
            Marker::Bin8        => "bin 8",
            Marker::Bin16       => "bin 16",
            Marker::Bin32       => "bin 32",
            Marker::Ext8        => "ext 8",
            Marker::Ext16       => "ext 16",
            Marker::Ext32       => "ext 32",
            Marker::Float32     => "float 32",
            Marker::Float64     => "float 64",
            Marker::UInt8       => "uint 8",
            Marker::UInt16      => "uint 16",
            Marker::UInt32      => "uint 32",
            Marker::UInt64      => "uint 64",
            Marker::Int8        => "int 8",
            Marker::Int16       => "int 16",
            Marker::Int32       => "int 32",
            Marker::Int64       => "int 64",
            Marker::FixExt1     => "fixext 1",
            Marker::FixExt2     => "fixext 2",
            Marker::FixExt4     => "fixext 4",
            Marker::FixExt8     => "fixext 8",
            Marker::FixExt16    => "fixext 16",
            Marker::Str8        => "str 8",
            Marker::Str16       => "str 16",
            Marker::Str32       => "str 32",
            Marker::Array16     => "array 16",
            Marker::Array32     => "array 32",
            Marker::Map16       => "map 16",
            Marker::Map32       => "map 32",
            Marker::NegativeFixInt(_) => "negative fixint",
        }
    }

    /// The smallest marker able to hold a non-negative integer.
    pub fn for_uint(value: u64) -> Marker {
        if value <= POSITIVE_FIXINT_MAX as u64 {
            Marker::PositiveFixInt(value as u8)
        } else if value <= u8::MAX as u64 {
            Marker::UInt8
        } else if value <= u16::MAX as u64 {
            Marker::UInt16
        } else if value <= u32::MAX as u64 {
            Marker::UInt32
        } else {
            Marker::UInt64
        }
    }

    /// The smallest marker able to hold a signed integer. Non-negative values share the unsigned codes.
    pub fn for_int(value: i64) -> Marker {
        if value >= 0 {
            Self::for_uint(value as u64)
        } else if value >= NEGATIVE_FIXINT_MIN_VALUE {
            Marker::NegativeFixInt(value as i8)
        } else if value >= i8::MIN as i64 {
            Marker::Int8
        } else if value >= i16::MIN as i64 {
            Marker::Int16
        } else if value >= i32::MIN as i64 {
            Marker::Int32
        } else {
            Marker::Int64
        }
    }

    /// The smallest string header for `len` bytes. Old-spec writers know no `str 8`; their `fixstr` (then
    /// called fixraw) covers the same 0 to 31 range.
    pub fn for_str_len(len: u32, old_spec: bool) -> Marker {
        if len <= FIXSTR_LEN_MAX {
            Marker::FixStr(len as u8)
        } else if len <= u8::MAX as u32 && !old_spec {
            Marker::Str8
        } else if len <= u16::MAX as u32 {
            Marker::Str16
        } else {
            Marker::Str32
        }
    }

    /// The smallest binary header for `len` bytes. Old-spec writers have no binary type and fall back
    /// to the raw string headers.
    pub fn for_bin_len(len: u32, old_spec: bool) -> Marker {
        if old_spec {
            Self::for_str_len(len, true)
        } else if len <= u8::MAX as u32 {
            Marker::Bin8
        } else if len <= u16::MAX as u32 {
            Marker::Bin16
        } else {
            Marker::Bin32
        }
    }

    pub fn for_array_len(len: u32) -> Marker {
        if len <= FIXCOLLECTION_LEN_MAX {
            Marker::FixArray(len as u8)
        } else if len <= u16::MAX as u32 {
            Marker::Array16
        } else {
            Marker::Array32
        }
    }

    pub fn for_map_len(len: u32) -> Marker {
        if len <= FIXCOLLECTION_LEN_MAX {
            Marker::FixMap(len as u8)
        } else if len <= u16::MAX as u32 {
            Marker::Map16
        } else {
            Marker::Map32
        }
    }

    /// `fixext` when the payload length matches one of the fixed sizes exactly, else the smallest `ext`.
    pub fn for_ext_len(len: u32) -> Marker {
        match len {
            1  => Marker::FixExt1,
            2  => Marker::FixExt2,
            4  => Marker::FixExt4,
            8  => Marker::FixExt8,
            16 => Marker::FixExt16,
            l if l <= u8::MAX as u32  => Marker::Ext8,
            l if l <= u16::MAX as u32 => Marker::Ext16,
            _  => Marker::Ext32,
        }
    }

    /// Number of bytes between the marker and the payload which hold a length or the value itself.
    /// Extension markers additionally carry one byte for the type code which is not counted here.
    pub fn width(self) -> usize {
        match self {
            Marker::UInt8 | Marker::Int8 | Marker::Str8 | Marker::Bin8 | Marker::Ext8 => 1,
            Marker::UInt16 | Marker::Int16 | Marker::Str16 | Marker::Bin16 | Marker::Ext16
                | Marker::Array16 | Marker::Map16 => 2,
            Marker::UInt32 | Marker::Int32 | Marker::Str32 | Marker::Bin32 | Marker::Ext32
                | Marker::Array32 | Marker::Map32 | Marker::Float32 => 4,
            Marker::UInt64 | Marker::Int64 | Marker::Float64 => 8,
            _ => 0,
        }
    }

}

impl From<u8> for Marker {
    fn from(code: u8) -> Marker {
        Marker::from_u8(code)
    }
}

impl From<Marker> for u8 {
    fn from(marker: Marker) -> u8 {
        marker.to_u8()
    }
}
