use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::Write;

const LOB_OPTION_DATA_INCLUDED: u8 = 0b_010;
const LOB_OPTION_LAST_DATA: u8 = 0b_100;

// Sends one follow-up chunk of a LOB whose head went inline with the
// EXECUTE request. The locator comes from the server's WriteLobReply.
#[derive(Debug)]
pub struct WriteLobRequest {
    locator_id: u64,
    offset: i64,
    data: Vec<u8>,
    last_data: bool,
}

impl WriteLobRequest {
    pub fn new(locator_id: u64, offset: i64, data: Vec<u8>, last_data: bool) -> Self {
        trace!(
            "WriteLobRequest offset = {}, chunk length = {}, last = {}",
            offset,
            data.len(),
            last_data
        );
        Self {
            locator_id,
            offset,
            data,
            last_data,
        }
    }

    pub fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        let options = if self.last_data {
            LOB_OPTION_DATA_INCLUDED | LOB_OPTION_LAST_DATA
        } else {
            LOB_OPTION_DATA_INCLUDED
        };
        w.write_u64::<LittleEndian>(self.locator_id)?; // I8
        w.write_u8(options)?; // I1
        w.write_i64::<LittleEndian>(self.offset)?; // I8
        #[allow(clippy::cast_possible_truncation)]
        w.write_u32::<LittleEndian>(self.data.len() as u32)?; // I4
        w.write_all(&self.data)?;
        Ok(())
    }

    pub fn size(&self) -> usize {
        21 + self.data.len()
    }
}

// One locator id per LOB parameter that still expects data.
#[derive(Debug)]
pub struct WriteLobReply {
    locator_ids: Vec<u64>,
}

impl WriteLobReply {
    pub fn locator_ids(&self) -> &[u64] {
        &self.locator_ids
    }

    pub fn into_locator_ids(self) -> Vec<u64> {
        self.locator_ids
    }

    pub fn parse(count: usize, rdr: &mut dyn io::Read) -> io::Result<Self> {
        let mut locator_ids = Vec::<u64>::with_capacity(count);
        for _ in 0..count {
            locator_ids.push(rdr.read_u64::<LittleEndian>()?); // I8
        }
        Ok(Self { locator_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::{WriteLobReply, WriteLobRequest};

    #[test]
    fn request_layout() {
        let mut buf = Vec::new();
        let request = WriteLobRequest::new(7, 128, b"abc".to_vec(), true);
        request.emit(&mut buf).unwrap();
        assert_eq!(buf.len(), request.size());
        assert_eq!(buf[8], 0b_110); // data included | last data
        assert_eq!(&buf[21..], b"abc");
    }

    #[test]
    fn reply_parse() {
        let buf = [7_u64.to_le_bytes(), 9_u64.to_le_bytes()].concat();
        let reply = WriteLobReply::parse(2, &mut &buf[..]).unwrap();
        assert_eq!(reply.locator_ids(), &[7, 9]);
    }
}
