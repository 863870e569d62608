use std::fmt;
use std::io::{Read, Result, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::definition::Vr;

pub mod constants {
    /// Marks the boundary between two instances of a repeated group.
    pub const TAG_SEPARATOR: u8 = 0x00;
    /// Closes the contents of a group.
    pub const TAG_GROUP_END: u8 = 0xff;

    pub const WIRE_U8: u8 = 0;
    pub const WIRE_U16: u8 = 1;
    pub const WIRE_U32: u8 = 2;
    pub const WIRE_S8: u8 = 3;
    pub const WIRE_S16: u8 = 4;
    pub const WIRE_S32: u8 = 5;
    pub const WIRE_FLOAT: u8 = 6;
    pub const WIRE_U16_ARRAY: u8 = 7;
    pub const WIRE_FLOAT_ARRAY: u8 = 8;
    pub const WIRE_U8_ARRAY: u8 = 9;
    pub const WIRE_GROUP: u8 = 10;
    pub const WIRE_BOOL: u8 = 11;
    pub const WIRE_S32_ARRAY: u8 = 12;
}

use self::constants::*;

/// The encoding byte that follows every tag in the stream.
///
/// Writers pick the narrowest type able to hold a value, so a reader has to
/// accept every wire type that is compatible with the declared value
/// representation. Knowing the wire type is also enough to skip an item
/// without knowing its definition.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub enum WireType {
    U8,
    U16,
    U32,
    S8,
    S16,
    S32,
    Float,
    U16Array,
    FloatArray,
    U8Array,
    Group,
    Bool,
    S32Array,
}

impl WireType {
    pub const fn id(self) -> u8 {
        use WireType::*;

        match self {
            U8 => WIRE_U8,
            U16 => WIRE_U16,
            U32 => WIRE_U32,
            S8 => WIRE_S8,
            S16 => WIRE_S16,
            S32 => WIRE_S32,
            Float => WIRE_FLOAT,
            U16Array => WIRE_U16_ARRAY,
            FloatArray => WIRE_FLOAT_ARRAY,
            U8Array => WIRE_U8_ARRAY,
            Group => WIRE_GROUP,
            Bool => WIRE_BOOL,
            S32Array => WIRE_S32_ARRAY,
        }
    }

    pub const fn from_id(id: u8) -> Option<WireType> {
        use WireType::*;

        let ty = match id {
            WIRE_U8 => U8,
            WIRE_U16 => U16,
            WIRE_U32 => U32,
            WIRE_S8 => S8,
            WIRE_S16 => S16,
            WIRE_S32 => S32,
            WIRE_FLOAT => Float,
            WIRE_U16_ARRAY => U16Array,
            WIRE_FLOAT_ARRAY => FloatArray,
            WIRE_U8_ARRAY => U8Array,
            WIRE_GROUP => Group,
            WIRE_BOOL => Bool,
            WIRE_S32_ARRAY => S32Array,
            _ => return None,
        };

        Some(ty)
    }

    /// Arrays carry a u16 element count before their elements.
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            WireType::U16Array | WireType::FloatArray | WireType::U8Array | WireType::S32Array
        )
    }

    /// Width in bytes of one scalar, or of one element for arrays.
    ///
    /// A group header is its u16 element count.
    pub const fn width(self) -> u64 {
        use WireType::*;

        match self {
            U8 | S8 | Bool | U8Array => 1,
            U16 | S16 | U16Array | Group => 2,
            U32 | S32 | Float | FloatArray | S32Array => 4,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use WireType::*;

        let s = match self {
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            S8 => "s8",
            S16 => "s16",
            S32 => "s32",
            Float => "float32",
            U16Array => "u16 array",
            FloatArray => "float32 array",
            U8Array => "u8 array",
            Group => "group",
            Bool => "bool",
            S32Array => "s32 array",
        };

        write!(f, "{}", s)
    }
}

impl fmt::Debug for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Element types of the fixed-width array encodings: `u8`, `u16`, `i32`
/// and `f32`.
pub trait Element: Copy + Default {
    const WIRE_TYPE: WireType;
    /// Value representation the definition must declare for the array.
    const VR: Vr;

    fn write_element<W: Write>(self, writer: &mut W) -> Result<()>;
    fn read_element<R: Read>(reader: &mut R) -> Result<Self>;
}

impl Element for u8 {
    const VR: Vr = Vr::Unsigned;
    const WIRE_TYPE: WireType = WireType::U8Array;

    fn write_element<W: Write>(self, writer: &mut W) -> Result<()> {
        writer.write_u8(self)
    }

    fn read_element<R: Read>(reader: &mut R) -> Result<Self> {
        reader.read_u8()
    }
}

impl Element for u16 {
    const VR: Vr = Vr::Unsigned;
    const WIRE_TYPE: WireType = WireType::U16Array;

    fn write_element<W: Write>(self, writer: &mut W) -> Result<()> {
        writer.write_u16::<BigEndian>(self)
    }

    fn read_element<R: Read>(reader: &mut R) -> Result<Self> {
        reader.read_u16::<BigEndian>()
    }
}

impl Element for i32 {
    const VR: Vr = Vr::Signed;
    const WIRE_TYPE: WireType = WireType::S32Array;

    fn write_element<W: Write>(self, writer: &mut W) -> Result<()> {
        writer.write_i32::<BigEndian>(self)
    }

    fn read_element<R: Read>(reader: &mut R) -> Result<Self> {
        reader.read_i32::<BigEndian>()
    }
}

impl Element for f32 {
    const VR: Vr = Vr::Float;
    const WIRE_TYPE: WireType = WireType::FloatArray;

    fn write_element<W: Write>(self, writer: &mut W) -> Result<()> {
        writer.write_f32::<BigEndian>(self)
    }

    fn read_element<R: Read>(reader: &mut R) -> Result<Self> {
        reader.read_f32::<BigEndian>()
    }
}
