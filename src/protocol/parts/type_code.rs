use crate::protocol::util;

/// The 1-byte code that tags every column, parameter, and field value on the
/// wire.
///
/// In value encodings the high bit of the code signals NULL; the codes
/// themselves are always below 128.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeCode {
    /// 1: unsigned 8-bit integer.
    TinyInt,
    /// 2: 16-bit integer.
    SmallInt,
    /// 3: 32-bit integer.
    Int,
    /// 4: 64-bit integer.
    BigInt,
    /// 5: packed 16-byte fixed-point decimal.
    Decimal,
    /// 6: 32-bit float.
    Real,
    /// 7: 64-bit float.
    Double,
    /// 8: fixed-length character string.
    Char,
    /// 9: variable-length character string.
    VarChar,
    /// 10: fixed-length Unicode string.
    NChar,
    /// 11: variable-length Unicode string.
    NVarChar,
    /// 12: fixed-length binary.
    Binary,
    /// 13: variable-length binary.
    VarBinary,
    /// 14: calendar date.
    Date,
    /// 15: time of day.
    Time,
    /// 16: date and time, millisecond precision.
    Timestamp,
    /// 25: ASCII large object.
    Clob,
    /// 26: Unicode large object.
    NClob,
    /// 27: binary large object.
    Blob,
    /// 28: boolean.
    Boolean,
    /// 29: character string (the server reports most strings as this).
    String,
    /// 30: Unicode character string.
    NString,
    /// 33: binary string.
    BString,
    /// 51: TEXT column; selected values arrive as NCLOB.
    Text,
    /// 52: SHORTTEXT column.
    ShortText,
}

impl TypeCode {
    pub(crate) fn try_new(code: u8) -> std::io::Result<Self> {
        Ok(match code {
            1 => Self::TinyInt,
            2 => Self::SmallInt,
            3 => Self::Int,
            4 => Self::BigInt,
            5 => Self::Decimal,
            6 => Self::Real,
            7 => Self::Double,
            8 => Self::Char,
            9 => Self::VarChar,
            10 => Self::NChar,
            11 => Self::NVarChar,
            12 => Self::Binary,
            13 => Self::VarBinary,
            14 => Self::Date,
            15 => Self::Time,
            16 => Self::Timestamp,
            25 => Self::Clob,
            26 => Self::NClob,
            27 => Self::Blob,
            28 => Self::Boolean,
            29 => Self::String,
            30 => Self::NString,
            33 => Self::BString,
            51 => Self::Text,
            52 => Self::ShortText,
            // among others: 74 (ST_GEOMETRY) and 75 (ST_POINT), whose NULL
            // conventions are not pinned down
            _ => {
                return Err(util::io_error(format!("unsupported type code {code}")));
            }
        })
    }

    /// The numeric wire value of the code.
    pub fn code(self) -> u8 {
        match self {
            Self::TinyInt => 1,
            Self::SmallInt => 2,
            Self::Int => 3,
            Self::BigInt => 4,
            Self::Decimal => 5,
            Self::Real => 6,
            Self::Double => 7,
            Self::Char => 8,
            Self::VarChar => 9,
            Self::NChar => 10,
            Self::NVarChar => 11,
            Self::Binary => 12,
            Self::VarBinary => 13,
            Self::Date => 14,
            Self::Time => 15,
            Self::Timestamp => 16,
            Self::Clob => 25,
            Self::NClob => 26,
            Self::Blob => 27,
            Self::Boolean => 28,
            Self::String => 29,
            Self::NString => 30,
            Self::BString => 33,
            Self::Text => 51,
            Self::ShortText => 52,
        }
    }

    /// True for the three LOB codes and TEXT.
    pub fn is_lob(self) -> bool {
        matches!(self, Self::Clob | Self::NClob | Self::Blob | Self::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::TypeCode;

    #[test]
    fn code_round_trip() {
        for code in [1_u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 25, 26, 27, 28, 29, 30, 33, 51, 52] {
            assert_eq!(TypeCode::try_new(code).unwrap().code(), code);
        }
    }

    #[test]
    fn geometry_codes_are_unsupported() {
        assert!(TypeCode::try_new(74).is_err());
        assert!(TypeCode::try_new(75).is_err());
    }
}
