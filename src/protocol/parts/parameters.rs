use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::type_code::TypeCode;
use crate::protocol::parts::value::Value;
use crate::{ScnpError, ScnpResult};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

// Bit 1: data is included; bit 2: no more data remaining.
const LOB_OPTION_DATA_INCLUDED: u8 = 0b_010;
const LOB_OPTION_LAST_DATA: u8 = 0b_100;

/// The PARAMETERS part: input parameter rows, encoded positionally against
/// the statement's parameter metadata.
///
/// Rows are encoded eagerly at construction time; this is also where LOB
/// values are split into an inline head (within the session's per-statement
/// budget) and tails that are streamed afterwards with WRITE_LOB requests,
/// in the order of the locators the server returns.
#[derive(Debug)]
pub struct ParameterRows {
    rows: Vec<Vec<u8>>,
    lob_tails: Vec<Vec<u8>>,
}

impl ParameterRows {
    pub(crate) fn encode(
        rows: &[Vec<Value>],
        descriptors: &[ParameterDescriptor],
        lob_budget: usize,
        server_announced_budget: bool,
    ) -> ScnpResult<ParameterRows> {
        let in_descriptors: Vec<&ParameterDescriptor> =
            descriptors.iter().filter(|d| d.is_input()).collect();
        let mut encoded_rows = Vec::<Vec<u8>>::with_capacity(rows.len());
        let mut lob_tails = Vec::<Vec<u8>>::new();
        let mut budget = lob_budget;

        for row in rows {
            if row.len() != in_descriptors.len() {
                return Err(ScnpError::usage(format!(
                    "parameter count mismatch: statement expects {} input parameters, got {}",
                    in_descriptors.len(),
                    row.len()
                )));
            }

            let mut capacity = 0;
            for (value, descriptor) in row.iter().zip(in_descriptors.iter()) {
                let type_code = descriptor.type_code();
                if !type_code.is_lob() {
                    capacity += value.field_size(type_code)?;
                }
            }
            let mut buf = Vec::<u8>::with_capacity(capacity);
            let mut lob_heads = Vec::<Vec<u8>>::new();
            let mut data_pos = 0_i32;

            // first pass: all field headers resp. scalar values
            for (value, descriptor) in row.iter().zip(in_descriptors.iter()) {
                let type_code = descriptor.type_code();
                if type_code.is_lob() && !value.is_null() {
                    let bytes: Vec<u8> = match value {
                        Value::Binary(v) if type_code == TypeCode::Blob => v.clone(),
                        Value::String(s) => cesu8::to_cesu8(s).into_owned(),
                        _ => {
                            return Err(ScnpError::usage(format!(
                                "value {value:?} cannot be sent as parameter of type {type_code:?}"
                            )));
                        }
                    };
                    let head_len = bytes.len().min(budget);
                    if head_len < bytes.len() && !server_announced_budget {
                        return Err(ScnpError::usage(format!(
                            "LOB parameter of {} bytes exceeds the per-statement budget of {} bytes \
                             (LobTooLarge)",
                            bytes.len(),
                            lob_budget
                        )));
                    }
                    budget -= head_len;
                    let mut head = bytes;
                    let tail = head.split_off(head_len);
                    let options = if tail.is_empty() {
                        LOB_OPTION_DATA_INCLUDED | LOB_OPTION_LAST_DATA
                    } else {
                        lob_tails.push(tail);
                        LOB_OPTION_DATA_INCLUDED
                    };
                    buf.write_u8(type_code.code())?;
                    buf.write_u8(options)?;
                    #[allow(clippy::cast_possible_truncation)]
                    buf.write_i32::<LittleEndian>(head.len() as i32)?;
                    buf.write_i32::<LittleEndian>(data_pos)?;
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        data_pos += head.len() as i32;
                    }
                    lob_heads.push(head);
                } else if type_code.is_lob() {
                    buf.write_u8(type_code.code() | 0b_1000_0000)?;
                } else {
                    value.emit_field(type_code, &mut buf)?;
                }
            }

            // second pass: the LOB data of this row, back to back
            for head in lob_heads {
                buf.extend_from_slice(&head);
            }
            encoded_rows.push(buf);
        }

        Ok(ParameterRows {
            rows: encoded_rows,
            lob_tails,
        })
    }

    pub(crate) fn count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn size(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub(crate) fn emit(&self, w: &mut dyn std::io::Write) -> std::io::Result<()> {
        for row in &self.rows {
            w.write_all(row)?;
        }
        Ok(())
    }

    pub(crate) fn take_lob_tails(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lob_tails)
    }

    pub(crate) fn has_lob_tails(&self) -> bool {
        !self.lob_tails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ParameterRows;
    use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
    use crate::protocol::parts::value::Value;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn descriptors(type_codes: &[u8]) -> Vec<ParameterDescriptor> {
        // builds IN descriptors through the part parser
        let mut buf = Vec::new();
        for tc in type_codes {
            buf.write_u8(0b10).unwrap();
            buf.write_u8(*tc).unwrap();
            buf.write_u8(1).unwrap(); // IN
            buf.write_u8(0).unwrap();
            buf.write_u32::<LittleEndian>(u32::MAX).unwrap();
            buf.write_i16::<LittleEndian>(0).unwrap();
            buf.write_i16::<LittleEndian>(0).unwrap();
            buf.write_u32::<LittleEndian>(0).unwrap();
        }
        ParameterDescriptor::parse_part(type_codes.len(), &mut &buf[..]).unwrap()
    }

    #[test]
    fn scalar_row_encoding() {
        let descriptors = descriptors(&[3, 11]); // INT, NVARCHAR
        let rows = vec![vec![Value::Int(2), Value::from("ok")]];
        let pr = ParameterRows::encode(&rows, &descriptors, 1024, false).unwrap();
        assert_eq!(pr.count(), 1);
        let mut buf = Vec::new();
        pr.emit(&mut buf).unwrap();
        assert_eq!(buf, vec![3, 2, 0, 0, 0, 11, 2, b'o', b'k']);
    }

    #[test]
    fn parameter_count_mismatch() {
        let descriptors = descriptors(&[3]);
        let rows = vec![vec![Value::Int(1), Value::Int(2)]];
        assert!(ParameterRows::encode(&rows, &descriptors, 1024, false).is_err());
    }

    #[test]
    fn small_lob_is_sent_inline_and_marked_last() {
        let descriptors = descriptors(&[25]); // CLOB
        let rows = vec![vec![Value::from("hi")]];
        let pr = ParameterRows::encode(&rows, &descriptors, 1024, false).unwrap();
        assert!(!pr.has_lob_tails());
        let mut buf = Vec::new();
        pr.emit(&mut buf).unwrap();
        // code, options = data included | last, length 2, position 0, data
        assert_eq!(buf, vec![25, 0b110, 2, 0, 0, 0, 0, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn oversized_lob_without_negotiated_budget_is_rejected() {
        let descriptors = descriptors(&[27]); // BLOB
        let rows = vec![vec![Value::Binary(vec![0_u8; 100])]];
        let err = ParameterRows::encode(&rows, &descriptors, 10, false).unwrap_err();
        assert!(err.to_string().contains("LobTooLarge"));
    }

    #[test]
    fn oversized_lob_with_negotiated_budget_leaves_a_tail() {
        let descriptors = descriptors(&[27]);
        let rows = vec![vec![Value::Binary((0..100).collect())]];
        let mut pr = ParameterRows::encode(&rows, &descriptors, 10, true).unwrap();
        assert!(pr.has_lob_tails());
        let tails = pr.take_lob_tails();
        assert_eq!(tails.len(), 1);
        assert_eq!(tails[0].len(), 90);
        assert_eq!(tails[0][0], 10);
    }
}
