use crate::protocol::parts::type_code::TypeCode;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;
use vec_map::VecMap;

/// Metadata of a result set: the ordered list of its columns.
#[derive(Debug)]
pub struct ResultSetMetadata(Vec<FieldMetadata>);

impl ResultSetMetadata {
    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the result set has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The metadata of all columns, in result order.
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.0
    }

    // Fixed 24-byte records first; the name pool follows, with each column
    // record referencing its names by offset into the pool.
    pub(crate) fn parse_part(count: usize, rdr: &mut dyn io::Read) -> io::Result<Self> {
        let mut raw_fields = Vec::<RawFieldMetadata>::with_capacity(count);
        let mut names = VecMap::<String>::new();

        for _ in 0..count {
            let column_options = rdr.read_u8()?;
            let type_code = TypeCode::try_new(rdr.read_u8()?)?;
            let scale = rdr.read_i16::<LittleEndian>()?;
            let precision = rdr.read_i16::<LittleEndian>()?;
            rdr.read_i16::<LittleEndian>()?; // reserved
            let tablename_idx = rdr.read_u32::<LittleEndian>()?;
            add_to_names(&mut names, tablename_idx);
            let schemaname_idx = rdr.read_u32::<LittleEndian>()?;
            add_to_names(&mut names, schemaname_idx);
            let columnname_idx = rdr.read_u32::<LittleEndian>()?;
            add_to_names(&mut names, columnname_idx);
            let displayname_idx = rdr.read_u32::<LittleEndian>()?;
            add_to_names(&mut names, displayname_idx);

            raw_fields.push(RawFieldMetadata {
                column_options,
                type_code,
                scale,
                precision,
                tablename_idx,
                schemaname_idx,
                columnname_idx,
                displayname_idx,
            });
        }

        // the name pool: length-prefixed cesu-8 names, back to back
        let mut offset = 0_u32;
        for _ in 0..names.len() {
            let name_len = rdr.read_u8()?;
            let name = util::string_from_cesu8(util::parse_bytes(name_len as usize, rdr)?)?;
            names.insert(offset as usize, name);
            offset += u32::from(name_len) + 1;
        }

        let lookup = |idx: u32| -> String {
            if idx == u32::MAX {
                String::new()
            } else {
                names.get(idx as usize).cloned().unwrap_or_default()
            }
        };

        Ok(ResultSetMetadata(
            raw_fields
                .into_iter()
                .map(|raw| FieldMetadata {
                    column_options: raw.column_options,
                    type_code: raw.type_code,
                    scale: raw.scale,
                    precision: raw.precision,
                    tablename: lookup(raw.tablename_idx),
                    schemaname: lookup(raw.schemaname_idx),
                    columnname: lookup(raw.columnname_idx),
                    displayname: lookup(raw.displayname_idx),
                })
                .collect(),
        ))
    }

    // Procedure OUT parameters are exposed as a one-row result set; their
    // descriptors provide the column shape.
    pub(crate) fn from_output_parameters(
        descriptors: &[crate::protocol::parts::parameter_descriptor::ParameterDescriptor],
    ) -> Self {
        ResultSetMetadata(
            descriptors
                .iter()
                .map(|d| {
                    let name = d.name().unwrap_or_default().to_string();
                    FieldMetadata {
                        column_options: if d.is_nullable() { 0b10 } else { 0 },
                        type_code: d.type_code(),
                        scale: d.fraction(),
                        precision: d.length(),
                        tablename: String::new(),
                        schemaname: String::new(),
                        columnname: name.clone(),
                        displayname: name,
                    }
                })
                .collect(),
        )
    }
}

struct RawFieldMetadata {
    column_options: u8,
    type_code: TypeCode,
    scale: i16,
    precision: i16,
    tablename_idx: u32,
    schemaname_idx: u32,
    columnname_idx: u32,
    displayname_idx: u32,
}

fn add_to_names(names: &mut VecMap<String>, offset: u32) {
    if offset != u32::MAX {
        let offset = offset as usize;
        if !names.contains_key(offset) {
            names.insert(offset, String::new());
        }
    }
}

/// Metadata of a single result-set column.
#[derive(Clone, Debug)]
pub struct FieldMetadata {
    column_options: u8,
    type_code: TypeCode,
    scale: i16,
    precision: i16,
    tablename: String,
    schemaname: String,
    columnname: String,
    displayname: String,
}

impl FieldMetadata {
    /// The type code of the column.
    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    /// True if the column can contain NULL values.
    pub fn is_nullable(&self) -> bool {
        (self.column_options & 0b_0000_0010) != 0
    }

    /// Scale of the column (for decimals).
    pub fn scale(&self) -> i16 {
        self.scale
    }

    /// Precision resp. display length of the column.
    pub fn precision(&self) -> i16 {
        self.precision
    }

    /// The name of the table the column belongs to.
    pub fn tablename(&self) -> &str {
        &self.tablename
    }

    /// The name of the schema the column belongs to.
    pub fn schemaname(&self) -> &str {
        &self.schemaname
    }

    /// The name of the column.
    pub fn columnname(&self) -> &str {
        &self.columnname
    }

    /// The display name of the column.
    pub fn displayname(&self) -> &str {
        &self.displayname
    }
}

impl std::fmt::Display for ResultSetMetadata {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for field_metadata in &self.0 {
            write!(fmt, "{}, ", field_metadata.displayname())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSetMetadata;
    use byteorder::{LittleEndian, WriteBytesExt};

    // single NVARCHAR column "GREETING" from table "T", schema "S",
    // with table and column names shared through the name pool
    #[test]
    fn parse_single_column() {
        let mut buf = Vec::new();
        buf.write_u8(0b10).unwrap(); // nullable
        buf.write_u8(11).unwrap(); // NVARCHAR
        buf.write_i16::<LittleEndian>(0).unwrap();
        buf.write_i16::<LittleEndian>(18).unwrap();
        buf.write_i16::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap(); // tablename "T"
        buf.write_u32::<LittleEndian>(2).unwrap(); // schemaname "S"
        buf.write_u32::<LittleEndian>(4).unwrap(); // columnname "GREETING"
        buf.write_u32::<LittleEndian>(4).unwrap(); // displayname "GREETING"
        buf.extend_from_slice(&[1, b'T']);
        buf.extend_from_slice(&[1, b'S']);
        buf.extend_from_slice(&[8]);
        buf.extend_from_slice(b"GREETING");

        let md = ResultSetMetadata::parse_part(1, &mut &buf[..]).unwrap();
        assert_eq!(md.len(), 1);
        let field = &md.fields()[0];
        assert_eq!(field.tablename(), "T");
        assert_eq!(field.schemaname(), "S");
        assert_eq!(field.columnname(), "GREETING");
        assert_eq!(field.displayname(), "GREETING");
        assert_eq!(field.precision(), 18);
        assert!(field.is_nullable());
    }
}
