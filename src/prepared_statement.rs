use crate::conn::{session_core, WeakSessCore};
use crate::protocol::argument::Argument;
use crate::protocol::part::Part;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::parts::value::Value;
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::{ScnpError, ScnpResult};
use std::sync::Arc;

/// A statement that was prepared on the server.
///
/// Holds the server-side statement id together with the parameter metadata
/// (and, for queries, the result-set metadata) that came back from PREPARE.
/// Dropping the handle frees the server-side statement.
#[derive(Debug)]
pub struct PreparedStatement {
    am_sess: WeakSessCore,
    statement_id: u64,
    descriptors: Arc<Vec<ParameterDescriptor>>,
    o_rs_md: Option<Arc<ResultSetMetadata>>,
}

impl PreparedStatement {
    pub(crate) fn new(
        am_sess: WeakSessCore,
        statement_id: u64,
        descriptors: Arc<Vec<ParameterDescriptor>>,
        o_rs_md: Option<Arc<ResultSetMetadata>>,
    ) -> Self {
        Self {
            am_sess,
            statement_id,
            descriptors,
            o_rs_md,
        }
    }

    pub(crate) fn statement_id(&self) -> u64 {
        self.statement_id
    }

    pub(crate) fn descriptors(&self) -> &Arc<Vec<ParameterDescriptor>> {
        &self.descriptors
    }

    pub(crate) fn o_rs_md(&self) -> Option<&Arc<ResultSetMetadata>> {
        self.o_rs_md.as_ref()
    }

    /// The parameter metadata of the statement, in positional order.
    pub fn parameter_descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    /// Resolves named parameter values into a positional row, using the
    /// parameter names the server reported with PREPARE.
    ///
    /// Input parameters without a binding become NULL.
    pub fn bind_by_name(&self, bindings: &[(&str, Value)]) -> ScnpResult<Vec<Value>> {
        let mut row = Vec::<Value>::new();
        let mut used = vec![false; bindings.len()];
        for descriptor in self.descriptors.iter().filter(|d| d.is_input()) {
            let name = descriptor.name().ok_or_else(|| {
                ScnpError::usage("statement has unnamed parameters, bind positionally")
            })?;
            match bindings.iter().position(|(n, _)| *n == name) {
                Some(index) => {
                    used[index] = true;
                    row.push(bindings[index].1.clone());
                }
                None => row.push(Value::Null),
            }
        }
        if let Some(index) = used.iter().position(|u| !u) {
            return Err(ScnpError::usage(format!(
                "no parameter named '{}' in the statement",
                bindings[index].0
            )));
        }
        Ok(row)
    }
}

impl Drop for PreparedStatement {
    // free the server-side statement, ignore all errors
    fn drop(&mut self) {
        trace!("dropping prepared statement {:x}", self.statement_id);
        if let Ok(am_sess) = self.am_sess.upgrade() {
            if let Ok(mut core) = session_core::lock(&am_sess) {
                let mut request = Request::new(RequestType::DropStatementId, 0);
                request.push(Part::new(
                    PartKind::StatementId,
                    Argument::StatementId(self.statement_id),
                ));
                if let Err(e) = core.roundtrip(request, &am_sess, None, None) {
                    debug!("DROP_STATEMENT_ID failed: {e}");
                }
            }
        }
    }
}
