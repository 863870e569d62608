use std::io::{Read, Result};

use byteorder::{BigEndian, ReadBytesExt};

use crate::definition::Value;
use crate::ser::Scalar;
use crate::wire::{Element, WireType};

/// Reads the payload of a scalar wire type.
pub(crate) fn read_scalar<R: Read>(reader: &mut R, wire: WireType) -> Result<Scalar> {
    let scalar = match wire {
        WireType::U8 => Scalar::U8(reader.read_u8()?),
        WireType::U16 => Scalar::U16(reader.read_u16::<BigEndian>()?),
        WireType::U32 => Scalar::U32(reader.read_u32::<BigEndian>()?),
        WireType::S8 => Scalar::S8(reader.read_i8()?),
        WireType::S16 => Scalar::S16(reader.read_i16::<BigEndian>()?),
        WireType::S32 => Scalar::S32(reader.read_i32::<BigEndian>()?),
        WireType::Float => Scalar::Float(reader.read_f32::<BigEndian>()?),
        WireType::Bool => Scalar::Bool(reader.read_u8()? != 0),
        other => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a scalar wire type", other),
            ));
        }
    };

    Ok(scalar)
}

/// Element count of an array, or instance count of a group.
#[inline(always)]
pub(crate) fn read_count<R: Read>(reader: &mut R) -> Result<u16> {
    reader.read_u16::<BigEndian>()
}

pub(crate) fn read_elements<R: Read, T: Element>(reader: &mut R, out: &mut [T]) -> Result<()> {
    for slot in out.iter_mut() {
        *slot = T::read_element(reader)?;
    }
    Ok(())
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Value {
        match scalar {
            Scalar::U8(v) => Value::Unsigned(v.into()),
            Scalar::U16(v) => Value::Unsigned(v.into()),
            Scalar::U32(v) => Value::Unsigned(v),
            Scalar::S8(v) => Value::Signed(v.into()),
            Scalar::S16(v) => Value::Signed(v.into()),
            Scalar::S32(v) => Value::Signed(v),
            Scalar::Float(v) => Value::Float(v),
            Scalar::Bool(v) => Value::Bool(v),
        }
    }
}
