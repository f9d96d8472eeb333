use crate::conn::AmSessCore;
use crate::protocol::function_code::FunctionCode;
use crate::protocol::part::{Part, Parts};
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::util;
use crate::{ScnpError, ScnpResult};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io;
use std::sync::Arc;

// The fixed 32-byte packet header of a reply.
#[derive(Debug)]
pub struct PacketHeader {
    pub session_id: i64,
    pub packet_seq_number: i32,
    pub varpart_length: u32,
    pub no_of_segments: i16,
}

impl PacketHeader {
    pub fn from_bytes(raw: &[u8; 32]) -> PacketHeader {
        PacketHeader {
            session_id: LittleEndian::read_i64(&raw[0..8]),
            packet_seq_number: LittleEndian::read_i32(&raw[8..12]),
            varpart_length: LittleEndian::read_u32(&raw[12..16]),
            no_of_segments: LittleEndian::read_i16(&raw[20..22]),
        }
    }
}

// A parsed reply: the function code of its single segment, and its parts.
#[derive(Debug)]
pub struct Reply {
    pub function_code: FunctionCode,
    pub parts: Parts,
}

impl Reply {
    // Parses segment header and parts from the complete var part of a reply
    // packet. Metadata for result rows resp. output parameters is injected
    // for FETCH and EXECUTE calls of prepared statements.
    pub fn parse(
        header: &PacketHeader,
        varpart: Vec<u8>,
        am_sess: Option<&AmSessCore>,
        o_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
    ) -> ScnpResult<Reply> {
        match header.no_of_segments {
            0 => {
                return Err(ScnpError::protocol("reply", "empty reply packet"));
            }
            1 => {}
            n => {
                return Err(ScnpError::protocol(
                    "reply",
                    format!("got {n} reply segments, expected 1"),
                ));
            }
        }

        let mut rdr = io::Cursor::new(varpart);

        // SEGMENT HEADER, 24 bytes
        rdr.read_i32::<LittleEndian>()?; // I4 segment length
        rdr.read_i32::<LittleEndian>()?; // I4 segment offset
        let no_of_parts = rdr.read_i16::<LittleEndian>()?; // I2
        rdr.read_i16::<LittleEndian>()?; // I2 segment number
        let segment_kind = rdr.read_i8()?; // I1
        match segment_kind {
            // 2: reply; 5: error reply (the difference shows in the ERROR part)
            2 | 5 => {}
            1 => {
                return Err(ScnpError::protocol("reply", "cannot parse a request segment"));
            }
            k => {
                return Err(ScnpError::protocol(
                    "reply",
                    format!("invalid reply segment kind {k}"),
                ));
            }
        }
        util::skip_bytes(1, &mut rdr)?; // I1 reserved
        let function_code = FunctionCode::parse(rdr.read_i16::<LittleEndian>()?)?; // I2
        util::skip_bytes(8, &mut rdr)?; // B[8] reserved
        debug!(
            "parsing reply of function code {:?} with {} parts for session {}",
            function_code, no_of_parts, header.session_id
        );

        let mut reply = Reply {
            function_code,
            parts: Parts::default(),
        };
        for _ in 0..no_of_parts {
            if let Some(part) = Part::parse(
                &reply.parts,
                am_sess,
                o_rs_md,
                o_par_md,
                &mut rdr,
            )? {
                reply.parts.push(part);
            }
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::{PacketHeader, Reply};
    use crate::protocol::argument::Argument;
    use crate::protocol::function_code::FunctionCode;
    use crate::protocol::partkind::PartKind;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn reply_varpart(function_code: i16, parts: &[(i8, u8, i16, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (kind, attributes, count, payload) in parts {
            body.write_i8(*kind).unwrap();
            body.write_u8(*attributes).unwrap();
            body.write_i16::<LittleEndian>(*count).unwrap();
            body.write_i32::<LittleEndian>(0).unwrap();
            body.write_i32::<LittleEndian>(payload.len() as i32).unwrap();
            body.write_i32::<LittleEndian>(1 << 16).unwrap();
            body.extend_from_slice(payload);
            let pad = (8 - payload.len() % 8) % 8;
            body.extend(std::iter::repeat(0u8).take(pad));
        }

        let mut varpart = Vec::new();
        varpart
            .write_i32::<LittleEndian>(24 + body.len() as i32)
            .unwrap();
        varpart.write_i32::<LittleEndian>(0).unwrap();
        varpart.write_i16::<LittleEndian>(parts.len() as i16).unwrap();
        varpart.write_i16::<LittleEndian>(1).unwrap();
        varpart.write_i8(2).unwrap(); // reply segment
        varpart.write_i8(0).unwrap();
        varpart.write_i16::<LittleEndian>(function_code).unwrap();
        varpart.extend_from_slice(&[0_u8; 8]);
        varpart.extend_from_slice(&body);
        varpart
    }

    fn header(varpart_length: u32) -> PacketHeader {
        PacketHeader {
            session_id: 11,
            packet_seq_number: 0,
            varpart_length,
            no_of_segments: 1,
        }
    }

    #[test]
    fn parse_reply_with_statement_id() {
        let varpart = reply_varpart(3, &[(10, 0, 1, 77_u64.to_le_bytes().to_vec())]);
        let mut reply = Reply::parse(
            &header(varpart.len() as u32),
            varpart,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(reply.function_code, FunctionCode::Update);
        let part = reply.parts.take_first_of_kind(PartKind::StatementId).unwrap();
        match part.into_arg() {
            Argument::StatementId(id) => assert_eq!(id, 77),
            arg => panic!("unexpected argument {arg:?}"),
        }
    }

    #[test]
    fn unknown_part_kinds_are_skipped() {
        // part kind 57 (client info) is not implemented and must be skipped
        let varpart = reply_varpart(
            1,
            &[
                (57, 0, 1, vec![1, 2, 3]),
                (10, 0, 1, 5_u64.to_le_bytes().to_vec()),
            ],
        );
        let mut reply = Reply::parse(
            &header(varpart.len() as u32),
            varpart,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(reply.parts.len(), 1);
        assert!(reply.parts.take_first_of_kind(PartKind::StatementId).is_some());
    }

    #[test]
    fn multi_segment_replies_are_rejected() {
        let varpart = reply_varpart(1, &[]);
        let mut h = header(varpart.len() as u32);
        h.no_of_segments = 2;
        assert!(Reply::parse(&h, varpart, None, None, None).is_err());
    }
}
