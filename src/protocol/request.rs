//! Since there is no use case for multiple segments in one request, message
//! and segment are modeled together: a request serializes into exactly one
//! packet with exactly one segment.

use crate::protocol::part::{Part, SEGMENT_HEADER_SIZE};
use crate::protocol::request_type::RequestType;
use crate::ScnpResult;
use byteorder::{LittleEndian, WriteBytesExt};

pub const PACKET_HEADER_SIZE: usize = 32;

#[derive(Debug)]
pub struct Request {
    request_type: RequestType,
    command_options: u8,
    parts: Vec<Part>,
}

impl Request {
    pub fn new(request_type: RequestType, command_options: u8) -> Request {
        Request {
            request_type,
            command_options,
            parts: Vec::<Part>::new(),
        }
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    // Serializes the complete packet into one buffer, which goes out with a
    // single write. The headers carry the exact layout arithmetic: the
    // packet's var-part length is the segment length, which is its header
    // plus all parts with their padding.
    pub fn into_bytes(
        self,
        session_id: i64,
        seq_number: i32,
        auto_commit_flag: i8,
    ) -> ScnpResult<Vec<u8>> {
        let varpart_size = self.varpart_size()?;
        let total_size = PACKET_HEADER_SIZE as u32 + varpart_size;
        debug!(
            "serializing request {:?} for session {} with seq_number {} and total size {}",
            self.request_type, session_id, seq_number, total_size
        );

        let mut w = Vec::<u8>::with_capacity(total_size as usize);

        // PACKET HEADER, 32 bytes
        w.write_i64::<LittleEndian>(session_id)?; // I8
        w.write_i32::<LittleEndian>(seq_number)?; // I4
        w.write_u32::<LittleEndian>(varpart_size)?; // UI4
        w.write_u32::<LittleEndian>(varpart_size)?; // UI4 var-part size
        w.write_i16::<LittleEndian>(1)?; // I2 number of segments
        for _ in 0..10 {
            w.write_u8(0)?; // I1 packet options + B[9] reserved
        }

        // SEGMENT HEADER, 24 bytes
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        {
            w.write_i32::<LittleEndian>(varpart_size as i32)?; // I4 segment length
            w.write_i32::<LittleEndian>(0)?; // I4 offset within the packet
            w.write_i16::<LittleEndian>(self.parts.len() as i16)?; // I2 number of parts
        }
        w.write_i16::<LittleEndian>(1)?; // I2 segment number, 1-based
        w.write_i8(1)?; // I1 segment kind: request
        w.write_i8(self.request_type.to_i8())?; // I1 message type
        w.write_i8(auto_commit_flag)?; // I1
        w.write_u8(self.command_options)?; // I1
        for _ in 0..8 {
            w.write_u8(0)?; // B[8] reserved
        }

        // PARTS
        let mut remaining_bufsize = varpart_size - SEGMENT_HEADER_SIZE as u32;
        for part in &self.parts {
            remaining_bufsize = part.emit(remaining_bufsize, &mut w)?;
        }

        debug_assert_eq!(w.len() as u32, total_size);
        Ok(w)
    }

    // Length of the single segment: its header plus all parts with padding.
    fn varpart_size(&self) -> ScnpResult<u32> {
        let mut len = SEGMENT_HEADER_SIZE;
        for part in &self.parts {
            len += part.size(true)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(len as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::{Request, PACKET_HEADER_SIZE};
    use crate::protocol::argument::Argument;
    use crate::protocol::part::{Part, PART_HEADER_SIZE, SEGMENT_HEADER_SIZE};
    use crate::protocol::partkind::PartKind;
    use crate::protocol::request_type::RequestType;
    use byteorder::{ByteOrder, LittleEndian};

    #[test]
    fn packet_layout_arithmetic() {
        let mut request = Request::new(RequestType::ExecuteDirect, 0);
        request.push(Part::new(
            PartKind::Command,
            Argument::Command("select * from DUMMY".to_string()),
        ));

        let bytes = request.into_bytes(123, 7, 1).unwrap();

        let varpart_length = LittleEndian::read_u32(&bytes[12..16]) as usize;
        assert_eq!(bytes.len(), PACKET_HEADER_SIZE + varpart_length);

        // one segment whose length equals the var part
        assert_eq!(LittleEndian::read_i16(&bytes[20..22]), 1);
        let segment_length = LittleEndian::read_i32(&bytes[32..36]) as usize;
        assert_eq!(segment_length, varpart_length);

        // the command part: 19 bytes of SQL, padded to 24
        let sql_len = "select * from DUMMY".len();
        let padded = sql_len + (8 - sql_len % 8);
        assert_eq!(
            segment_length,
            SEGMENT_HEADER_SIZE + PART_HEADER_SIZE + padded
        );

        // header echo of session id and sequence number
        assert_eq!(LittleEndian::read_i64(&bytes[0..8]), 123);
        assert_eq!(LittleEndian::read_i32(&bytes[8..12]), 7);

        // segment kind request, message type, auto-commit flag
        assert_eq!(bytes[44], 1);
        assert_eq!(bytes[45], 2);
        assert_eq!(bytes[46], 1);
    }

    #[test]
    fn multi_part_request_layout() {
        let mut request = Request::new(RequestType::FetchNext, 0);
        request.push(Part::new(PartKind::ResultSetId, Argument::ResultSetId(99)));
        request.push(Part::new(PartKind::FetchSize, Argument::FetchSize(32)));

        let bytes = request.into_bytes(1, 2, 0).unwrap();
        let varpart_length = LittleEndian::read_u32(&bytes[12..16]) as usize;
        assert_eq!(bytes.len(), PACKET_HEADER_SIZE + varpart_length);
        // 8-byte id stays unpadded, the 4-byte fetch size is padded to 8
        assert_eq!(
            varpart_length,
            SEGMENT_HEADER_SIZE + PART_HEADER_SIZE + 8 + PART_HEADER_SIZE + 8
        );
        assert_eq!(LittleEndian::read_i16(&bytes[36..38]), 2); // number of parts
    }
}
