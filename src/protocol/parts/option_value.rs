use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::Write;

// A typed value within an option-list part. The type byte reuses the codes
// of the field codec.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    INT(i32),
    BIGINT(i64),
    DOUBLE(f64),
    BOOLEAN(bool),
    STRING(String),
    BSTRING(Vec<u8>),
}

impl OptionValue {
    pub fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_u8(self.type_id())?; // I1
        match *self {
            OptionValue::INT(i) => w.write_i32::<LittleEndian>(i)?,
            OptionValue::BIGINT(i) => w.write_i64::<LittleEndian>(i)?,
            OptionValue::DOUBLE(f) => w.write_f64::<LittleEndian>(f)?,
            OptionValue::BOOLEAN(b) => w.write_u8(u8::from(b))?,
            OptionValue::STRING(ref s) => emit_length_and_bytes(&cesu8::to_cesu8(s), w)?,
            OptionValue::BSTRING(ref v) => emit_length_and_bytes(v, w)?,
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        1 + match *self {
            OptionValue::INT(_) => 4,
            OptionValue::BIGINT(_) | OptionValue::DOUBLE(_) => 8,
            OptionValue::BOOLEAN(_) => 1,
            OptionValue::STRING(ref s) => util::cesu8_length(s) + 2,
            OptionValue::BSTRING(ref v) => v.len() + 2,
        }
    }

    fn type_id(&self) -> u8 {
        match *self {
            OptionValue::INT(_) => 3,
            OptionValue::BIGINT(_) => 4,
            OptionValue::DOUBLE(_) => 7,
            OptionValue::BOOLEAN(_) => 28,
            OptionValue::STRING(_) => 29,
            OptionValue::BSTRING(_) => 33,
        }
    }

    pub fn parse(rdr: &mut dyn io::Read) -> io::Result<OptionValue> {
        match rdr.read_u8()? {
            3 => Ok(OptionValue::INT(rdr.read_i32::<LittleEndian>()?)),
            4 => Ok(OptionValue::BIGINT(rdr.read_i64::<LittleEndian>()?)),
            7 => Ok(OptionValue::DOUBLE(rdr.read_f64::<LittleEndian>()?)),
            28 => Ok(OptionValue::BOOLEAN(rdr.read_u8()? > 0)),
            29 | 30 => Ok(OptionValue::STRING(parse_length_and_string(rdr)?)),
            33 => Ok(OptionValue::BSTRING(parse_length_and_binary(rdr)?)),
            tc => Err(util::io_error(format!(
                "OptionValue::parse() not implemented for type code {tc}"
            ))),
        }
    }
}

fn emit_length_and_bytes(v: &[u8], w: &mut dyn io::Write) -> io::Result<()> {
    #[allow(clippy::cast_possible_truncation)]
    w.write_i16::<LittleEndian>(v.len() as i16)?; // I2: length of value
    w.write_all(v)?; // B (varying)
    Ok(())
}

fn parse_length_and_string(rdr: &mut dyn io::Read) -> io::Result<String> {
    util::string_from_cesu8(parse_length_and_binary(rdr)?)
}

fn parse_length_and_binary(rdr: &mut dyn io::Read) -> io::Result<Vec<u8>> {
    let len = rdr.read_i16::<LittleEndian>()? as usize; // I2: length of value
    util::parse_bytes(len, rdr)
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            OptionValue::INT(v) => write!(f, "{v}"),
            OptionValue::BIGINT(v) => write!(f, "{v}"),
            OptionValue::DOUBLE(v) => write!(f, "{v}"),
            OptionValue::BOOLEAN(v) => write!(f, "{v}"),
            OptionValue::STRING(v) => write!(f, "{v}"),
            OptionValue::BSTRING(v) => write!(f, "{v:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OptionValue;

    #[test]
    fn option_value_round_trip() {
        for value in [
            OptionValue::INT(-17),
            OptionValue::BIGINT(1 << 40),
            OptionValue::DOUBLE(2.75),
            OptionValue::BOOLEAN(true),
            OptionValue::STRING("en_US".to_string()),
            OptionValue::BSTRING(vec![1, 2, 3]),
        ] {
            let mut buf = Vec::new();
            value.emit(&mut buf).unwrap();
            assert_eq!(buf.len(), value.size());
            let parsed = OptionValue::parse(&mut &buf[..]).unwrap();
            assert_eq!(parsed, value);
        }
    }
}
