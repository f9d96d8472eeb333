use crate::conn::AmSessCore;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::value::Value;
use std::io;

// The OUTPUT_PARAMETERS part of a procedure-call reply: one value per OUT
// resp. INOUT parameter, encoded like a single result row.
#[derive(Debug)]
pub struct OutputParameters {
    values: Vec<Value>,
}

impl OutputParameters {
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub(crate) fn parse(
        am_sess: Option<&AmSessCore>,
        descriptors: &[ParameterDescriptor],
        rdr: &mut dyn io::Read,
    ) -> io::Result<Self> {
        let mut values = Vec::<Value>::new();
        for descriptor in descriptors.iter().filter(|d| d.is_output()) {
            values.push(Value::parse_field(descriptor.type_code(), am_sess, rdr)?);
        }
        Ok(Self { values })
    }
}
