use crate::protocol::parts::type_code::TypeCode;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

/// Metadata for a single parameter of a prepared statement.
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    parameter_option: u8,
    type_code: TypeCode,
    direction: ParameterDirection,
    length: i16,
    fraction: i16,
    name: Option<String>,
}

impl ParameterDescriptor {
    /// Returns true if the parameter can be set to NULL.
    pub fn is_nullable(&self) -> bool {
        (self.parameter_option & 0b_0000_0010) != 0
    }

    /// Returns true if the parameter has a default value.
    pub fn has_default(&self) -> bool {
        (self.parameter_option & 0b_0000_0100) != 0
    }

    /// Returns the type code of the parameter.
    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    /// Length resp. precision of the parameter.
    pub fn length(&self) -> i16 {
        self.length
    }

    /// Fraction (scale) for decimal parameters.
    pub fn fraction(&self) -> i16 {
        self.fraction
    }

    /// Describes whether the parameter is used for input, output, or both.
    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    /// Returns the name of the parameter, if the server supplied one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn is_input(&self) -> bool {
        matches!(
            self.direction,
            ParameterDirection::In | ParameterDirection::InOut
        )
    }

    pub(crate) fn is_output(&self) -> bool {
        matches!(
            self.direction,
            ParameterDirection::Out | ParameterDirection::InOut
        )
    }

    // Records are 16 bytes each; parameter names follow the fixed part,
    // referenced by offset.
    pub(crate) fn parse_part(count: usize, rdr: &mut dyn io::Read) -> io::Result<Vec<Self>> {
        let mut descriptors = Vec::<Self>::with_capacity(count);
        let mut name_offsets = Vec::<u32>::with_capacity(count);
        for _ in 0..count {
            let parameter_option = rdr.read_u8()?;
            let type_code = TypeCode::try_new(rdr.read_u8()?)?;
            let direction = ParameterDirection::from_u8(rdr.read_u8()?)?;
            rdr.read_u8()?; // filler
            name_offsets.push(rdr.read_u32::<LittleEndian>()?);
            let length = rdr.read_i16::<LittleEndian>()?;
            let fraction = rdr.read_i16::<LittleEndian>()?;
            rdr.read_u32::<LittleEndian>()?; // filler
            descriptors.push(Self {
                parameter_option,
                type_code,
                direction,
                length,
                fraction,
                name: None,
            });
        }
        for (descriptor, name_offset) in descriptors.iter_mut().zip(name_offsets.iter()) {
            if *name_offset != u32::MAX {
                let length = rdr.read_u8()?;
                let name = util::string_from_cesu8(util::parse_bytes(length as usize, rdr)?)?;
                descriptor.name = Some(name);
            }
        }
        Ok(descriptors)
    }
}

/// Describes whether a parameter is used for input, output, or both.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParameterDirection {
    /// Input parameter.
    In,
    /// Input and output parameter.
    InOut,
    /// Output parameter.
    Out,
}

impl ParameterDirection {
    fn from_u8(v: u8) -> io::Result<Self> {
        match v {
            1 => Ok(Self::In),
            2 => Ok(Self::InOut),
            4 => Ok(Self::Out),
            _ => Err(util::io_error(format!(
                "invalid value for ParameterDirection: {v}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParameterDescriptor, ParameterDirection};
    use crate::protocol::parts::type_code::TypeCode;
    use byteorder::{LittleEndian, WriteBytesExt};

    // two named INT parameters: A at name offset 0, B following it
    #[test]
    fn parse_descriptors_with_names() {
        let mut buf = Vec::new();
        for (direction, offset) in [(1_u8, 0_u32), (4_u8, 2_u32)] {
            buf.write_u8(0b10).unwrap();
            buf.write_u8(3).unwrap(); // INT
            buf.write_u8(direction).unwrap();
            buf.write_u8(0).unwrap();
            buf.write_u32::<LittleEndian>(offset).unwrap();
            buf.write_i16::<LittleEndian>(10).unwrap();
            buf.write_i16::<LittleEndian>(0).unwrap();
            buf.write_u32::<LittleEndian>(0).unwrap();
        }
        buf.extend_from_slice(&[1, b'A']);
        buf.extend_from_slice(&[1, b'B']);

        let descriptors = ParameterDescriptor::parse_part(2, &mut &buf[..]).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name(), Some("A"));
        assert_eq!(descriptors[0].direction(), ParameterDirection::In);
        assert!(descriptors[0].is_nullable());
        assert_eq!(descriptors[1].name(), Some("B"));
        assert_eq!(descriptors[1].direction(), ParameterDirection::Out);
        assert_eq!(descriptors[1].type_code(), TypeCode::Int);
    }
}
