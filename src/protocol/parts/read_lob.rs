use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;

const LOB_OPTION_IS_NULL: u8 = 0b_001;
const LOB_OPTION_LAST_DATA: u8 = 0b_100;

// Requests a range of a LOB by locator. The server counts offsets from 1.
#[derive(Debug)]
pub struct ReadLobRequest {
    locator_id: u64,
    offset: u64,
    length: u32,
}

impl ReadLobRequest {
    pub fn new(locator_id: u64, offset: u64, length: u32) -> Self {
        trace!("ReadLobRequest offset = {}, length = {}", offset, length);
        Self {
            locator_id,
            offset,
            length,
        }
    }

    pub fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.locator_id)?; // I8
        w.write_u64::<LittleEndian>(self.offset + 1)?; // I8, 1-based
        w.write_u32::<LittleEndian>(self.length)?; // I4
        w.write_u32::<LittleEndian>(0_u32)?; // FILLER
        Ok(())
    }

    pub fn size() -> usize {
        24
    }
}

#[derive(Debug)]
pub struct ReadLobReply {
    locator_id: u64,
    is_last_data: bool,
    is_null: bool,
    data: Vec<u8>,
}

impl ReadLobReply {
    pub fn locator_id(&self) -> u64 {
        self.locator_id
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn into_data_and_last(self) -> (Vec<u8>, bool) {
        (self.data, self.is_last_data)
    }

    pub fn parse(rdr: &mut dyn io::Read) -> io::Result<Self> {
        let locator_id = rdr.read_u64::<LittleEndian>()?; // I8
        let options = rdr.read_u8()?; // I1
        if options & LOB_OPTION_IS_NULL != 0 {
            return Ok(Self {
                locator_id,
                is_last_data: false,
                is_null: true,
                data: Vec::new(),
            });
        }
        let is_last_data = (options & LOB_OPTION_LAST_DATA) != 0;
        let chunk_length = rdr.read_i32::<LittleEndian>()?; // I4
        util::skip_bytes(3, rdr)?; // B3 filler
        let data = util::parse_bytes(chunk_length as usize, rdr)?; // B[chunk_length]
        Ok(Self {
            locator_id,
            is_last_data,
            is_null: false,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadLobReply, ReadLobRequest};
    use byteorder::{LittleEndian, WriteBytesExt};

    #[test]
    fn request_offset_is_one_based() {
        let mut buf = Vec::new();
        ReadLobRequest::new(0x11, 1024, 476).emit(&mut buf).unwrap();
        assert_eq!(buf.len(), ReadLobRequest::size());
        assert_eq!(&buf[8..16], &1025_u64.to_le_bytes());
        assert_eq!(&buf[16..20], &476_u32.to_le_bytes());
    }

    #[test]
    fn reply_parse() {
        let mut buf = Vec::new();
        buf.write_u64::<LittleEndian>(0x11).unwrap();
        buf.write_u8(0b_110).unwrap(); // data included, last data
        buf.write_i32::<LittleEndian>(5).unwrap();
        buf.extend_from_slice(&[0, 0, 0]);
        buf.extend_from_slice(b"tail!");

        let reply = ReadLobReply::parse(&mut &buf[..]).unwrap();
        assert_eq!(reply.locator_id(), 0x11);
        assert!(!reply.is_null());
        let (data, last) = reply.into_data_and_last();
        assert_eq!(data, b"tail!");
        assert!(last);
    }
}
