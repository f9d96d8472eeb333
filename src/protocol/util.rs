use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::Read;

pub const MAX_1_BYTE_LENGTH: u8 = 245;
pub const LENGTH_INDICATOR_2BYTE: u8 = 246;
pub const LENGTH_INDICATOR_4BYTE: u8 = 247;
pub const LENGTH_INDICATOR_NULL: u8 = 255;

// Malformed wire data; ends up as ScnpError::Protocol.
pub fn io_error<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Read n bytes from the reader, return as Vec<u8>.
pub fn parse_bytes(len: usize, rdr: &mut dyn io::Read) -> io::Result<Vec<u8>> {
    let mut vec = vec![0_u8; len];
    rdr.read_exact(&mut vec)?;
    Ok(vec)
}

pub fn skip_bytes(n: usize, rdr: &mut dyn io::Read) -> io::Result<()> {
    for _ in 0..n {
        rdr.read_u8()?;
    }
    Ok(())
}

// Consumes the cesu8 bytes, returns a String with minimal allocation.
pub fn string_from_cesu8(bytes: Vec<u8>) -> io::Result<String> {
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Ok(cesu8::from_cesu8(e.as_bytes())
            .map_err(io_error)?
            .to_string()),
    }
}

/// cesu-8 is identical to utf-8, except for high code points which consume
/// 4 bytes in utf-8 and 6 in cesu-8; the first byte of such a code point in
/// utf8 has the bit pattern 11110xxx (240-247).
pub fn cesu8_length(s: &str) -> usize {
    let mut len = s.len();
    for b in s.as_bytes() {
        if *b >= 240_u8 {
            len += 2;
        }
    }
    len
}

// Variable-length prefix for strings and binary values:
// one byte carries lengths up to 245; 246 and 247 announce a two- resp.
// four-byte little-endian length; 255 is the NULL indicator.
pub fn emit_length_indicator(l: usize, w: &mut dyn io::Write) -> io::Result<()> {
    match l {
        l if l <= MAX_1_BYTE_LENGTH as usize => w.write_u8(l as u8)?,
        l if l <= 0xFFFF => {
            w.write_u8(LENGTH_INDICATOR_2BYTE)?;
            w.write_u16::<LittleEndian>(l as u16)?;
        }
        l if l <= 0xFFFF_FFFF => {
            w.write_u8(LENGTH_INDICATOR_4BYTE)?;
            w.write_u32::<LittleEndian>(l as u32)?;
        }
        l => {
            return Err(io_error(format!("value too big: {l}")));
        }
    }
    Ok(())
}

pub fn length_indicator_size(l: usize) -> usize {
    match l {
        l if l <= MAX_1_BYTE_LENGTH as usize => 1,
        l if l <= 0xFFFF => 3,
        _ => 5,
    }
}

// Returns None for the NULL indicator.
pub fn parse_length_indicator(rdr: &mut dyn io::Read) -> io::Result<Option<usize>> {
    let l8 = rdr.read_u8()?;
    match l8 {
        0..=MAX_1_BYTE_LENGTH => Ok(Some(l8 as usize)),
        LENGTH_INDICATOR_2BYTE => Ok(Some(rdr.read_u16::<LittleEndian>()? as usize)),
        LENGTH_INDICATOR_4BYTE => Ok(Some(rdr.read_u32::<LittleEndian>()? as usize)),
        LENGTH_INDICATOR_NULL => Ok(None),
        i => Err(io_error(format!("invalid length indicator: {i}"))),
    }
}
