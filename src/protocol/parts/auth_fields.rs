use crate::protocol::util;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::Write;

// The AUTHENTICATION part: a count-prefixed list of length-prefixed byte
// strings. The handshake packs user name, method name, and method data
// into such a list; the server answers in the same format.
#[derive(Debug, Default)]
pub struct AuthFields(Vec<AuthField>);

impl AuthFields {
    pub fn with_capacity(count: usize) -> Self {
        Self(Vec::<AuthField>::with_capacity(count))
    }

    pub fn parse(rdr: &mut dyn io::Read) -> io::Result<Self> {
        let field_count = rdr.read_u16::<LittleEndian>()? as usize; // I2
        let mut auth_fields = Self(Vec::<AuthField>::with_capacity(field_count));
        for _ in 0..field_count {
            auth_fields.0.push(AuthField::parse(rdr)?);
        }
        Ok(auth_fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn pop(&mut self) -> Option<Vec<u8>> {
        self.0.pop().map(AuthField::data)
    }

    pub fn size(&self) -> usize {
        let mut size = 2;
        for field in &self.0 {
            size += field.size();
        }
        size
    }

    pub fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        #[allow(clippy::cast_possible_truncation)]
        w.write_i16::<LittleEndian>(self.0.len() as i16)?;
        for field in &self.0 {
            field.emit(w)?;
        }
        Ok(())
    }

    pub fn push(&mut self, vec: Vec<u8>) {
        self.0.push(AuthField(vec));
    }

    pub fn push_string(&mut self, s: &str) {
        self.0.push(AuthField(s.as_bytes().to_vec()));
    }
}

#[derive(Debug)]
struct AuthField(Vec<u8>);

impl AuthField {
    fn data(self) -> Vec<u8> {
        self.0
    }

    fn size(&self) -> usize {
        1 + self.0.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        match self.0.len() {
            l if l <= util::MAX_1_BYTE_LENGTH as usize => w.write_u8(l as u8)?,
            l if l <= 0xFFFF => {
                w.write_u8(util::LENGTH_INDICATOR_2BYTE)?; // B1: 246
                w.write_u16::<LittleEndian>(l as u16)?; // U2: length of value
            }
            l => {
                return Err(util::io_error(format!("AuthField too long: {l}")));
            }
        }
        w.write_all(&self.0)?;
        Ok(())
    }

    fn parse(rdr: &mut dyn io::Read) -> io::Result<Self> {
        let len = match rdr.read_u8()? {
            l8 @ 0..=util::MAX_1_BYTE_LENGTH => l8 as usize,
            util::LENGTH_INDICATOR_2BYTE => rdr.read_u16::<LittleEndian>()? as usize,
            util::LENGTH_INDICATOR_4BYTE => rdr.read_u32::<LittleEndian>()? as usize,
            // the server's initial challenge announces method data this way
            util::LENGTH_INDICATOR_NULL => rdr.read_u16::<BigEndian>()? as usize,
            l8 => {
                return Err(util::io_error(format!(
                    "unknown length indicator for AuthField: {l8}"
                )));
            }
        };
        Ok(Self(util::parse_bytes(len, rdr)?))
    }
}

#[cfg(test)]
mod tests {
    use super::AuthFields;

    #[test]
    fn auth_fields_round_trip() {
        let mut fields = AuthFields::with_capacity(3);
        fields.push_string("SYSTEM");
        fields.push_string("SCRAMSHA256");
        fields.push(vec![0xAB; 64]);

        let mut buf = Vec::new();
        fields.emit(&mut buf).unwrap();
        assert_eq!(buf.len(), fields.size());

        let mut parsed = AuthFields::parse(&mut &buf[..]).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.pop().unwrap(), vec![0xAB; 64]);
        assert_eq!(parsed.pop().unwrap(), b"SCRAMSHA256".to_vec());
        assert_eq!(parsed.pop().unwrap(), b"SYSTEM".to_vec());
    }
}
