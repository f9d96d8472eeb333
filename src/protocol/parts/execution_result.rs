use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

// The ROWS_AFFECTED part: one i32 per executed row of a DML statement.
// Negative entries are server-side markers (-2: success without info,
// -3: execution failed); the row-count helpers treat them as zero.
pub(crate) fn parse_rows_affected(count: usize, rdr: &mut dyn io::Read) -> io::Result<Vec<i32>> {
    let mut values = Vec::<i32>::with_capacity(count);
    for _ in 0..count {
        values.push(rdr.read_i32::<LittleEndian>()?);
    }
    Ok(values)
}
