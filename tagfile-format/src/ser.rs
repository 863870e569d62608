use std::io::{Result, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::wire::{Element, WireType};

/// A scalar as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Scalar {
    U8(u8),
    U16(u16),
    U32(u32),
    S8(i8),
    S16(i16),
    S32(i32),
    Float(f32),
    Bool(bool),
}

impl Scalar {
    /// Narrowest unsigned encoding holding `value`.
    pub(crate) fn unsigned(value: u32) -> Scalar {
        if let Ok(v) = u8::try_from(value) {
            Scalar::U8(v)
        } else if let Ok(v) = u16::try_from(value) {
            Scalar::U16(v)
        } else {
            Scalar::U32(value)
        }
    }

    /// Narrowest signed encoding holding `value`.
    pub(crate) fn signed(value: i32) -> Scalar {
        if let Ok(v) = i8::try_from(value) {
            Scalar::S8(v)
        } else if let Ok(v) = i16::try_from(value) {
            Scalar::S16(v)
        } else {
            Scalar::S32(value)
        }
    }

    pub(crate) fn wire_type(self) -> WireType {
        match self {
            Scalar::U8(_) => WireType::U8,
            Scalar::U16(_) => WireType::U16,
            Scalar::U32(_) => WireType::U32,
            Scalar::S8(_) => WireType::S8,
            Scalar::S16(_) => WireType::S16,
            Scalar::S32(_) => WireType::S32,
            Scalar::Float(_) => WireType::Float,
            Scalar::Bool(_) => WireType::Bool,
        }
    }
}

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for WireType {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.id())
    }
}

impl Serialize for Scalar {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.wire_type().write(writer)?;

        match *self {
            Scalar::U8(v) => writer.write_u8(v),
            Scalar::U16(v) => writer.write_u16::<BigEndian>(v),
            Scalar::U32(v) => writer.write_u32::<BigEndian>(v),
            Scalar::S8(v) => writer.write_i8(v),
            Scalar::S16(v) => writer.write_i16::<BigEndian>(v),
            Scalar::S32(v) => writer.write_i32::<BigEndian>(v),
            Scalar::Float(v) => writer.write_f32::<BigEndian>(v),
            Scalar::Bool(v) => writer.write_u8(v as u8),
        }
    }
}

/// Wire type, u16 count, then the elements. The caller guarantees the
/// length fits in the count.
impl<T: Element> Serialize for [T] {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        debug_assert!(self.len() <= u16::MAX as usize);

        T::WIRE_TYPE.write(writer)?;
        writer.write_u16::<BigEndian>(self.len() as u16)?;
        for item in self.iter() {
            item.write_element(writer)?;
        }
        Ok(())
    }
}

/// Group header: wire type and the declared number of instances.
pub(crate) struct GroupHeader(pub(crate) u16);

impl Serialize for GroupHeader {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        WireType::Group.write(writer)?;
        writer.write_u16::<BigEndian>(self.0)
    }
}
