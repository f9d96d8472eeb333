//! Locator-backed LOB handles.
//!
//! A LOB field of a result row arrives with its first chunk inline; the
//! handle keeps the server-side locator and pulls further ranges with
//! READ_LOB roundtrips when reads run past the buffered prefix.

use crate::conn::{session_core, AmSessCore, WeakSessCore};
use crate::protocol::argument::Argument;
use crate::protocol::part::Part;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::read_lob::ReadLobRequest;
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::protocol::util;
use crate::{ScnpError, ScnpResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

const LOB_OPTION_IS_NULL: u8 = 0b_001;
const LOB_OPTION_LAST_DATA: u8 = 0b_100;

/// The content type of a LOB.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LobKind {
    /// Binary content.
    Blob,
    /// ASCII text.
    Clob,
    /// Unicode text (CESU-8 on the wire).
    NClob,
}

impl LobKind {
    fn from_u8(v: u8) -> io::Result<Self> {
        match v {
            1 => Ok(Self::Blob),
            2 => Ok(Self::Clob),
            3 => Ok(Self::NClob),
            _ => Err(util::io_error(format!("invalid LOB type {v}"))),
        }
    }
}

/// Position for [`Lob::seek`].
pub use std::io::SeekFrom;

/// A seekable reader over a LOB value of a result row.
///
/// Reading past the buffered prefix triggers READ_LOB roundtrips on the
/// owning session; seeking is a local operation. The handle refers to its
/// session weakly: once the session is dropped or closed, reads of
/// unbuffered ranges fail with `Closed`.
#[derive(Clone, Debug)]
pub struct Lob {
    am_sess: WeakSessCore,
    kind: LobKind,
    char_length: u64,
    byte_length: u64,
    locator_id: u64,
    is_data_complete: bool,
    data: Vec<u8>,
    pos: u64,
}

impl Lob {
    // In-row wire format: type (I1), options (I1), then - unless NULL -
    // 2 reserved bytes, char length (I8), byte length (I8), locator (B8),
    // chunk length (I4), and the first chunk inline.
    pub(crate) fn parse_in_row(
        am_sess: Option<&AmSessCore>,
        rdr: &mut dyn io::Read,
    ) -> io::Result<Option<Lob>> {
        let kind = LobKind::from_u8(rdr.read_u8()?)?;
        let options = rdr.read_u8()?;
        if options & LOB_OPTION_IS_NULL != 0 {
            return Ok(None);
        }
        rdr.read_u16::<LittleEndian>()?; // reserved
        let char_length = rdr.read_u64::<LittleEndian>()?;
        let byte_length = rdr.read_u64::<LittleEndian>()?;
        let locator_id = rdr.read_u64::<LittleEndian>()?;
        let chunk_length = rdr.read_i32::<LittleEndian>()?;
        let data = util::parse_bytes(chunk_length as usize, rdr)?;
        let am_sess = am_sess.ok_or_else(|| {
            util::io_error("cannot materialize a LOB value without a session")
        })?;
        trace!(
            "parsed in-row {:?} with byte length {}, {} bytes buffered",
            kind,
            byte_length,
            data.len()
        );
        Ok(Some(Lob {
            am_sess: WeakSessCore::new(am_sess),
            kind,
            char_length,
            byte_length,
            locator_id,
            is_data_complete: options & LOB_OPTION_LAST_DATA != 0,
            data,
            pos: 0,
        }))
    }

    /// The content type of this LOB.
    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Total length in bytes.
    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }

    /// Total length in characters (for CLOB and NCLOB).
    pub fn char_length(&self) -> u64 {
        self.char_length
    }

    /// Number of bytes currently buffered on the client.
    pub fn buffered_length(&self) -> usize {
        self.data.len()
    }

    /// The current logical read position.
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Moves the logical read position without network traffic.
    pub fn seek(&mut self, pos: SeekFrom) -> ScnpResult<u64> {
        #[allow(clippy::cast_possible_wrap)]
        let new_pos = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.pos) + i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.byte_length) + i128::from(offset),
        };
        if new_pos < 0 || new_pos > i128::from(self.byte_length) {
            return Err(ScnpError::usage(format!(
                "seek position {new_pos} outside of the LOB (length {})",
                self.byte_length
            )));
        }
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        {
            self.pos = new_pos as u64;
        }
        Ok(self.pos)
    }

    /// Reads up to `n` bytes from the current position, fetching missing
    /// ranges from the server. Returns fewer bytes at the end of the LOB.
    pub fn read(&mut self, n: usize) -> ScnpResult<Vec<u8>> {
        let end = (self.pos + n as u64).min(self.byte_length);
        self.fetch_up_to(end)?;
        #[allow(clippy::cast_possible_truncation)]
        let start = self.pos as usize;
        let end = (end as usize).min(self.data.len());
        let chunk = self.data[start.min(end)..end].to_vec();
        self.pos += chunk.len() as u64;
        Ok(chunk)
    }

    /// Reads from the current position to the end of the LOB.
    pub fn read_all(&mut self) -> ScnpResult<Vec<u8>> {
        #[allow(clippy::cast_possible_truncation)]
        let remaining = (self.byte_length - self.pos) as usize;
        self.read(remaining)
    }

    /// Consumes the handle and returns the complete content.
    pub fn into_bytes(mut self) -> ScnpResult<Vec<u8>> {
        self.fetch_up_to(self.byte_length)?;
        Ok(self.data)
    }

    /// The complete content as a string (CESU-8 decoded for NCLOB).
    pub fn into_string(self) -> ScnpResult<String> {
        let bytes = self.into_bytes()?;
        util::string_from_cesu8(bytes).map_err(ScnpError::from)
    }

    // Pulls exactly the missing range [buffered, want) with as many READ_LOB
    // roundtrips as the server needs to serve it.
    fn fetch_up_to(&mut self, want: u64) -> ScnpResult<()> {
        while (self.data.len() as u64) < want && !self.is_data_complete {
            let offset = self.data.len() as u64;
            #[allow(clippy::cast_possible_truncation)]
            let length = (want - offset) as u32;
            let (mut chunk, is_last_data) = self.fetch_chunk(offset, length)?;
            if chunk.is_empty() && !is_last_data {
                return Err(ScnpError::protocol(
                    "lob",
                    "server returned an empty READ_LOB chunk",
                ));
            }
            self.data.append(&mut chunk);
            self.is_data_complete = is_last_data;
        }
        Ok(())
    }

    fn fetch_chunk(&self, offset: u64, length: u32) -> ScnpResult<(Vec<u8>, bool)> {
        trace!(
            "fetching {} bytes at offset {} of locator {}",
            length,
            offset,
            self.locator_id
        );
        let am_sess = self.am_sess.upgrade()?;
        let mut core = session_core::lock(&am_sess)?;
        let mut request = Request::new(RequestType::ReadLob, 0);
        request.push(Part::new(
            PartKind::ReadLobRequest,
            Argument::ReadLobRequest(ReadLobRequest::new(self.locator_id, offset, length)),
        ));
        let mut reply = core.roundtrip(request, &am_sess, None, None)?;
        match reply
            .parts
            .take_first_of_kind(PartKind::ReadLobReply)
            .map(Part::into_arg)
        {
            Some(Argument::ReadLobReply(read_lob_reply)) => {
                if read_lob_reply.locator_id() != self.locator_id {
                    return Err(ScnpError::protocol("lob", "locator ids do not match"));
                }
                if read_lob_reply.is_null() {
                    return Err(ScnpError::protocol(
                        "lob",
                        "server reported NULL for a non-null locator",
                    ));
                }
                Ok(read_lob_reply.into_data_and_last())
            }
            _ => Err(ScnpError::protocol(
                "lob",
                "READ_LOB reply carries no READ_LOB_REPLY part",
            )),
        }
    }
}
