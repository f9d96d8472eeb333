use crate::protocol::part::padsize;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;
use std::io::Read;

/// How bad a server-reported condition is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    /// A hint the server attaches to an otherwise successful reply.
    Warning,
    /// The statement failed; the session stays usable.
    Error,
    /// The failure ends the session.
    Fatal,
    /// A level this client has no name for.
    Unknown(i8),
}

impl Severity {
    fn from_wire(level: i8) -> Severity {
        match level {
            0 => Severity::Warning,
            1 => Severity::Error,
            2 => Severity::Fatal,
            level => Severity::Unknown(level),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal error"),
            Severity::Unknown(level) => write!(f, "condition of level {level}"),
        }
    }
}

/// One error record of an ERROR part.
///
/// The server can attach several of these to a single reply, e.g. one per
/// failed row of a batched DML statement.
#[derive(Clone, Debug)]
pub struct ServerError {
    code: i32,
    position: i32,
    severity: Severity,
    sqlstate: [u8; 5],
    text: String,
}

impl ServerError {
    /// The vendor error code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Offset into the SQL text the record refers to.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// How bad it is.
    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    /// The five-character SQLSTATE.
    pub fn sqlstate(&self) -> &[u8] {
        &self.sqlstate
    }

    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn parse(no_of_args: usize, rdr: &mut dyn Read) -> io::Result<Vec<ServerError>> {
        (0..no_of_args).map(|_| Self::parse_record(rdr)).collect()
    }

    // Record layout: code I4, position I4, text length I4, level I1,
    // sqlstate B5, then the message text in cesu-8. Records are aligned to
    // 8 bytes; the trailing one may arrive without its padding.
    fn parse_record(rdr: &mut dyn Read) -> io::Result<ServerError> {
        let code = rdr.read_i32::<LittleEndian>()?;
        let position = rdr.read_i32::<LittleEndian>()?;
        let text_length = rdr.read_i32::<LittleEndian>()?.max(0) as usize;
        let severity = Severity::from_wire(rdr.read_i8()?);
        let mut sqlstate = [0_u8; 5];
        rdr.read_exact(&mut sqlstate)?;
        let text = util::string_from_cesu8(util::parse_bytes(text_length, rdr)?)?;

        let mut alignment = vec![0_u8; padsize(4 + 4 + 4 + 1 + 5 + text_length)];
        rdr.read(&mut alignment)?;

        let server_error = ServerError {
            code,
            position,
            severity,
            sqlstate,
            text,
        };
        debug!("server reported: {}", server_error);
        Ok(server_error)
    }
}

impl std::error::Error for ServerError {}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} (sqlstate {}) at position {}: {}",
            self.severity,
            self.code,
            String::from_utf8_lossy(&self.sqlstate),
            self.position,
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerError, Severity};
    use byteorder::{LittleEndian, WriteBytesExt};

    fn record(code: i32, level: i8, text: &[u8], pad: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(code).unwrap();
        buf.write_i32::<LittleEndian>(8).unwrap();
        buf.write_i32::<LittleEndian>(text.len() as i32).unwrap();
        buf.write_i8(level).unwrap();
        buf.extend_from_slice(b"HY000");
        buf.extend_from_slice(text);
        if pad {
            while buf.len() % 8 != 0 {
                buf.push(0);
            }
        }
        buf
    }

    #[test]
    fn parse_aligned_records() {
        let buf = [
            record(259, 1, b"invalid table name", true),
            record(10, 0, b"row skipped", true),
        ]
        .concat();

        let errors = ServerError::parse(2, &mut &buf[..]).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code(), 259);
        assert_eq!(errors[0].position(), 8);
        assert_eq!(*errors[0].severity(), Severity::Error);
        assert_eq!(errors[0].sqlstate(), &b"HY000"[..]);
        assert_eq!(errors[0].text(), "invalid table name");
        assert_eq!(*errors[1].severity(), Severity::Warning);
    }

    #[test]
    fn trailing_record_may_be_unpadded() {
        let buf = record(2048, 2, b"fatal", false);
        let errors = ServerError::parse(1, &mut &buf[..]).unwrap();
        assert_eq!(*errors[0].severity(), Severity::Fatal);
        assert_eq!(errors[0].text(), "fatal");
    }
}
