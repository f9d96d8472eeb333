use crate::conn::AmSessCore;
use crate::protocol::argument::Argument;
use crate::protocol::part_attributes::PartAttributes;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::util;
use crate::ScnpResult;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::Read;
use std::sync::Arc;

pub const PART_HEADER_SIZE: usize = 16;
pub const SEGMENT_HEADER_SIZE: usize = 24;

#[derive(Debug)]
pub struct Part {
    kind: PartKind,
    attributes: PartAttributes,
    arg: Argument,
}

impl Part {
    pub fn new(kind: PartKind, arg: Argument) -> Part {
        Part {
            kind,
            attributes: PartAttributes::default(),
            arg,
        }
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn attributes(&self) -> PartAttributes {
        self.attributes
    }

    pub fn arg(&self) -> &Argument {
        &self.arg
    }

    pub fn into_arg(self) -> Argument {
        self.arg
    }

    pub fn size(&self, with_padding: bool) -> ScnpResult<usize> {
        let mut size = PART_HEADER_SIZE + self.arg.size()?;
        if with_padding {
            size += padsize(size);
        }
        Ok(size)
    }

    // Emits header, payload, and padding; returns the buffer space that
    // remains for the following parts.
    pub fn emit(&self, mut remaining_bufsize: u32, w: &mut dyn io::Write) -> ScnpResult<u32> {
        debug!("emitting part of kind {:?}", self.kind);
        let arg_size = self.arg.size()?;

        w.write_i8(self.kind.to_i8())?; // I1
        w.write_u8(0)?; // U1 attributes, unused in requests
        match self.arg.count()? {
            count if count < i16::MAX as usize => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                w.write_i16::<LittleEndian>(count as i16)?; // I2
                w.write_i32::<LittleEndian>(0)?; // I4
            }
            count if count <= i32::MAX as usize => {
                // large argument counts go into the big-argument-count field
                w.write_i16::<LittleEndian>(-1)?;
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                w.write_i32::<LittleEndian>(count as i32)?;
            }
            count => {
                return Err(crate::ScnpError::usage(format!(
                    "argument count {count} exceeds i32::MAX"
                )));
            }
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        w.write_i32::<LittleEndian>(arg_size as i32)?; // I4 buffer length
        #[allow(clippy::cast_possible_wrap)]
        w.write_i32::<LittleEndian>(remaining_bufsize as i32)?; // I4 buffer size

        remaining_bufsize -= PART_HEADER_SIZE as u32;
        self.arg.emit(w)?;
        let padding = padsize(arg_size);
        for _ in 0..padding {
            w.write_u8(0)?;
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            remaining_bufsize -= (arg_size + padding) as u32;
        }
        Ok(remaining_bufsize)
    }

    // Parses one part of a reply. The padded payload is consumed in full
    // even when the argument parser needs less of it; parts of unknown kind
    // are skipped and reported as None.
    pub fn parse(
        already_parsed: &Parts,
        am_sess: Option<&AmSessCore>,
        o_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
        rdr: &mut dyn io::Read,
    ) -> ScnpResult<Option<Part>> {
        let kind_raw = rdr.read_i8()?; // I1
        let attributes = PartAttributes::new(rdr.read_u8()?); // U1
        let no_of_args_i16 = rdr.read_i16::<LittleEndian>()?; // I2
        let no_of_args_i32 = rdr.read_i32::<LittleEndian>()?; // I4
        let buffer_length = rdr.read_i32::<LittleEndian>()?; // I4
        rdr.read_i32::<LittleEndian>()?; // I4 buffer size, unused

        #[allow(clippy::cast_sign_loss)]
        let no_of_args = i32::from(no_of_args_i16).max(no_of_args_i32).max(0) as usize;
        let payload_len = buffer_length.max(0) as usize;
        let payload = util::parse_bytes(payload_len, rdr)?;
        // the last part of a segment may come without its padding
        let mut padding = vec![0_u8; padsize(payload_len)];
        rdr.read(&mut padding)?;

        let kind = match PartKind::try_from_i8(kind_raw) {
            Some(kind) => kind,
            None => {
                warn!("skipping part of unknown kind {}", kind_raw);
                return Ok(None);
            }
        };
        debug!(
            "parsing part of kind {:?} with attributes {:?}, buffer length {} and {} arguments",
            kind, attributes, buffer_length, no_of_args
        );

        let mut cursor = io::Cursor::new(payload);
        let arg = Argument::parse(
            kind,
            attributes,
            no_of_args,
            already_parsed,
            am_sess,
            o_rs_md,
            o_par_md,
            &mut cursor,
        )?;
        Ok(Some(Part {
            kind,
            attributes,
            arg,
        }))
    }
}

// parts are padded to an 8-byte boundary
pub fn padsize(size: usize) -> usize {
    match size % 8 {
        0 => 0,
        r => 8 - r,
    }
}

#[derive(Debug, Default)]
pub struct Parts(Vec<Part>);

impl Parts {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, part: Part) {
        self.0.push(part);
    }

    // Removes and returns the first part of the given kind, wherever it sits.
    pub fn take_first_of_kind(&mut self, kind: PartKind) -> Option<Part> {
        let index = self.0.iter().position(|part| part.kind == kind)?;
        Some(self.0.remove(index))
    }

    // The metadata part of this reply, if one was already parsed.
    pub fn metadata_arc(&self) -> Option<&Arc<ResultSetMetadata>> {
        self.0.iter().rev().find_map(|part| match part.arg() {
            Argument::ResultSetMetadata(md) => Some(md),
            _ => None,
        })
    }

}

#[cfg(test)]
mod tests {
    use super::padsize;

    #[test]
    fn padding_to_eight_bytes() {
        assert_eq!(padsize(0), 0);
        assert_eq!(padsize(1), 7);
        assert_eq!(padsize(8), 0);
        assert_eq!(padsize(13), 3);
        assert_eq!(padsize(16), 0);
    }
}
