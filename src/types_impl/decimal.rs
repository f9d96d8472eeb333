//! The packed 16-byte DECIMAL wire format.
//!
//! Little-endian; viewed from the most significant byte downwards:
//! 1 sign bit, 14 bits of base-10 exponent (biased by 6176), and a 113-bit
//! mantissa. A most significant byte of 0x70 denotes NULL.

use crate::protocol::util;
use crate::{ScnpError, ScnpResult};
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use std::io;
use std::io::Write;

const EXPONENT_BIAS: i32 = 6176;
const NULL_MSB: u8 = 0x70;

pub fn parse_decimal(rdr: &mut dyn io::Read) -> io::Result<Option<BigDecimal>> {
    let bytes = util::parse_bytes(16, rdr)?;
    if bytes[15] == NULL_MSB {
        return Ok(None);
    }

    let is_negative = bytes[15] & 0x80 != 0;
    let biased_exponent =
        ((i32::from(bytes[15] & 0x7F)) << 7) | ((i32::from(bytes[14] & 0xFE)) >> 1);
    let exponent = biased_exponent - EXPONENT_BIAS;

    let mut mantissa_bytes = [0_u8; 15];
    mantissa_bytes[..14].copy_from_slice(&bytes[..14]);
    mantissa_bytes[14] = bytes[14] & 0x01;

    let sign = if is_negative { Sign::Minus } else { Sign::Plus };
    let mantissa = BigInt::from_bytes_le(sign, &mantissa_bytes);

    // value = mantissa * 10^exponent
    Ok(Some(BigDecimal::new(mantissa, i64::from(-exponent))))
}

pub fn emit_decimal(bd: &BigDecimal, w: &mut dyn io::Write) -> ScnpResult<()> {
    let (mantissa, scale) = bd.as_bigint_and_exponent();
    let exponent = -scale;
    let biased_exponent = exponent + i64::from(EXPONENT_BIAS);
    if !(0..=0x3FFF).contains(&biased_exponent) {
        return Err(ScnpError::usage(format!(
            "DECIMAL exponent out of range: {bd}"
        )));
    }

    let (sign, magnitude) = mantissa.into_parts();
    let mag_bytes = magnitude.to_bytes_le();
    if mag_bytes.len() > 15 || (mag_bytes.len() == 15 && mag_bytes[14] > 1) {
        return Err(ScnpError::usage(format!(
            "DECIMAL mantissa exceeds 113 bits: {bd}"
        )));
    }

    let mut bytes = [0_u8; 16];
    for (i, b) in mag_bytes.iter().take(14).enumerate() {
        bytes[i] = *b;
    }
    let mantissa_bit_112 = if mag_bytes.len() == 15 { mag_bytes[14] & 1 } else { 0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        bytes[14] = mantissa_bit_112 | (((biased_exponent as u16) as u8 & 0x7F) << 1);
        bytes[15] = ((biased_exponent >> 7) as u8) & 0x7F;
    }
    if sign == Sign::Minus {
        bytes[15] |= 0x80;
    }
    w.write_all(&bytes).map_err(ScnpError::from)
}

#[cfg(test)]
mod tests {
    use super::{emit_decimal, parse_decimal};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn round_trip(s: &str) {
        let bd = BigDecimal::from_str(s).unwrap();
        let mut buf = Vec::new();
        emit_decimal(&bd, &mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        let back = parse_decimal(&mut &buf[..]).unwrap().unwrap();
        assert_eq!(back, bd);
    }

    #[test]
    fn decimal_round_trip() {
        for s in [
            "0",
            "1",
            "-1",
            "3.1415",
            "-3.1415",
            "1234000000",
            "0.0000001234",
            "9999999999999999999999999999999999",
            "-9999999999999999999999999999999999",
        ] {
            round_trip(s);
        }
    }

    #[test]
    fn null_sentinel() {
        let mut bytes = [0_u8; 16];
        bytes[15] = 0x70;
        assert_eq!(parse_decimal(&mut &bytes[..]).unwrap(), None);
    }

    #[test]
    fn oversized_mantissa_is_rejected() {
        let bd = BigDecimal::from_str("99999999999999999999999999999999999999").unwrap();
        let mut buf = Vec::new();
        assert!(emit_decimal(&bd, &mut buf).is_err());
    }
}
