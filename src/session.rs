use crate::conn::{authentication, session_core, AmSessCore, SessionCore, TransactionState, WeakSessCore};
use crate::connect_params::ConnectParams;
use crate::db_result::DbResult;
use crate::prepared_statement::PreparedStatement;
use crate::protocol::argument::Argument;
use crate::protocol::function_code::FunctionCode;
use crate::protocol::part::Part;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::parameters::ParameterRows;
use crate::protocol::parts::resultset::ResultSet;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::parts::server_error::ServerError;
use crate::protocol::parts::value::Value;
use crate::protocol::parts::write_lob::WriteLobRequest;
use crate::protocol::reply::Reply;
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::{ScnpError, ScnpResult};
use std::sync::{Arc, Mutex, MutexGuard};

/// An authenticated connection to a database instance.
///
/// A session serializes all its traffic over one TCP connection; only one
/// request/reply can be in flight at any time. Statements run either
/// directly ([`execute`](Session::execute)) or prepared
/// ([`prepare`](Session::prepare) /
/// [`execute_prepared`](Session::execute_prepared)).
///
/// Dropping the session sends a best-effort DISCONNECT. Prepared
/// statements, result sets, and LOB handles do not keep the session alive;
/// they fail with [`ScnpError::Closed`] once it is gone.
#[derive(Debug)]
pub struct Session {
    am_sess: AmSessCore,
}

impl Session {
    /// Opens a TCP connection, runs the protocol-initialization exchange and
    /// the SCRAM-SHA256 handshake, and returns the authenticated session.
    pub fn connect(params: ConnectParams) -> ScnpResult<Session> {
        debug!(
            "connecting to {}:{} as {}",
            params.host(),
            params.port(),
            params.dbuser()
        );
        let core = SessionCore::try_new(&params)?;
        let am_sess: AmSessCore = Arc::new(Mutex::new(core));
        authentication::authenticate(&am_sess, &params)?;
        info!(
            "session opened for {} on {}:{}",
            params.dbuser(),
            params.host(),
            params.port()
        );
        Ok(Session { am_sess })
    }

    /// Executes an SQL statement.
    ///
    /// Without parameters the SQL goes out directly; with parameters the
    /// statement is prepared, executed with the given row, and dropped
    /// again. For repeated execution use [`prepare`](Session::prepare).
    pub fn execute(&mut self, sql: &str, params: Option<Vec<Value>>) -> ScnpResult<DbResult> {
        match params {
            None => self.execute_direct(sql),
            Some(row) => {
                let stmt = self.prepare(sql)?;
                self.execute_prepared(&stmt, &[row])
            }
        }
    }

    /// Prepares an SQL statement on the server.
    pub fn prepare(&mut self, sql: &str) -> ScnpResult<PreparedStatement> {
        trace!("preparing {}", sql);
        let mut request = Request::new(RequestType::Prepare, 0);
        request.push(Part::new(
            PartKind::Command,
            Argument::Command(sql.to_string()),
        ));

        let mut core = self.lock()?;
        let mut reply = core.roundtrip(request, &self.am_sess, None, None)?;

        let statement_id = match reply
            .parts
            .take_first_of_kind(PartKind::StatementId)
            .map(Part::into_arg)
        {
            Some(Argument::StatementId(id)) => id,
            _ => {
                return Err(ScnpError::protocol(
                    "prepare",
                    "PREPARE reply carries no STATEMENT_ID part",
                ));
            }
        };
        let descriptors = match reply
            .parts
            .take_first_of_kind(PartKind::ParameterMetadata)
            .map(Part::into_arg)
        {
            Some(Argument::ParameterMetadata(descriptors)) => descriptors,
            _ => Arc::new(Vec::<ParameterDescriptor>::new()),
        };
        let o_rs_md = match reply
            .parts
            .take_first_of_kind(PartKind::ResultSetMetadata)
            .map(Part::into_arg)
        {
            Some(Argument::ResultSetMetadata(md)) => Some(md),
            _ => None,
        };

        Ok(PreparedStatement::new(
            WeakSessCore::new(&self.am_sess),
            statement_id,
            descriptors,
            o_rs_md,
        ))
    }

    /// Executes a prepared statement with zero or more parameter rows.
    ///
    /// Rows are encoded positionally against the statement's input
    /// parameters; use
    /// [`PreparedStatement::bind_by_name`] to build a positional row from
    /// named bindings. Procedure OUT parameters come back as
    /// [`DbResult::OutputParameters`].
    pub fn execute_prepared(
        &mut self,
        stmt: &PreparedStatement,
        rows: &[Vec<Value>],
    ) -> ScnpResult<DbResult> {
        let mut core = self.lock()?;
        let mut parameter_rows = ParameterRows::encode(
            rows,
            stmt.descriptors(),
            core.lob_write_length(),
            core.lob_write_negotiated(),
        )?;
        let lob_tails = parameter_rows.take_lob_tails();

        let mut request = Request::new(RequestType::Execute, 0);
        request.push(Part::new(
            PartKind::StatementId,
            Argument::StatementId(stmt.statement_id()),
        ));
        request.push(Part::new(
            PartKind::Parameters,
            Argument::Parameters(parameter_rows),
        ));

        let mut reply = core.roundtrip(
            request,
            &self.am_sess,
            stmt.o_rs_md(),
            Some(stmt.descriptors()),
        )?;

        self.stream_lob_tails(&mut core, &mut reply, lob_tails)?;
        self.evaluate_reply(&mut core, reply, stmt.o_rs_md(), Some(stmt.descriptors()))
    }

    /// Commits the current transaction.
    pub fn commit(&mut self) -> ScnpResult<()> {
        let mut core = self.lock()?;
        core.roundtrip(Request::new(RequestType::Commit, 0), &self.am_sess, None, None)?;
        Ok(())
    }

    /// Rolls the current transaction back.
    pub fn rollback(&mut self) -> ScnpResult<()> {
        let mut core = self.lock()?;
        core.roundtrip(Request::new(RequestType::Rollback, 0), &self.am_sess, None, None)?;
        Ok(())
    }

    /// Sends a best-effort DISCONNECT and closes the connection. Every
    /// subsequent operation fails with [`ScnpError::Closed`].
    pub fn close(&mut self) -> ScnpResult<()> {
        self.lock()?.disconnect();
        Ok(())
    }

    /// True once the session was closed, by the client or by the server.
    pub fn is_closed(&self) -> bool {
        self.lock().map_or(true, |core| core.is_dead())
    }

    /// Switches auto-commit on or off for subsequent statements.
    pub fn set_auto_commit(&mut self, auto_commit: bool) -> ScnpResult<()> {
        self.lock()?.set_auto_commit(auto_commit);
        Ok(())
    }

    /// The current auto-commit setting.
    pub fn is_auto_commit(&self) -> ScnpResult<bool> {
        Ok(self.lock()?.is_auto_commit())
    }

    /// Changes the number of rows per FETCH roundtrip for result sets that
    /// are opened afterwards.
    pub fn set_fetch_size(&mut self, fetch_size: u32) -> ScnpResult<()> {
        self.lock()?.set_fetch_size(fetch_size);
        Ok(())
    }

    /// The transaction state the server reported last.
    pub fn transaction_state(&self) -> ScnpResult<TransactionState> {
        Ok(self.lock()?.transaction_state())
    }

    /// Warnings the server attached to the last reply.
    pub fn pop_warnings(&mut self) -> ScnpResult<Vec<ServerError>> {
        Ok(self.lock()?.pop_warnings())
    }

    /// Failover topology information from the connect reply, if the server
    /// sent any, rendered one option per line. The engine itself does not
    /// act on it.
    pub fn topology(&self) -> ScnpResult<Option<String>> {
        Ok(self.lock()?.topology().map(ToString::to_string))
    }

    /// The server's product version from the initialization exchange.
    pub fn product_version(&self) -> ScnpResult<(i8, u16)> {
        Ok(self.lock()?.product_version())
    }

    /// The server's protocol version from the initialization exchange.
    pub fn protocol_version(&self) -> ScnpResult<(i8, u16)> {
        Ok(self.lock()?.protocol_version())
    }

    fn lock(&self) -> ScnpResult<MutexGuard<'_, SessionCore>> {
        session_core::lock(&self.am_sess)
    }

    fn execute_direct(&mut self, sql: &str) -> ScnpResult<DbResult> {
        trace!("executing {}", sql);
        let mut request = Request::new(RequestType::ExecuteDirect, 0);
        request.push(Part::new(
            PartKind::Command,
            Argument::Command(sql.to_string()),
        ));
        let mut core = self.lock()?;
        let reply = core.roundtrip(request, &self.am_sess, None, None)?;
        self.evaluate_reply(&mut core, reply, None, None)
    }

    // Streams the LOB tails that did not fit into the EXECUTE request, in
    // chunks of the session's write budget, against the locators of the
    // server's WRITE_LOB_REPLY part.
    fn stream_lob_tails(
        &self,
        core: &mut SessionCore,
        reply: &mut Reply,
        lob_tails: Vec<Vec<u8>>,
    ) -> ScnpResult<()> {
        let locator_ids = match reply
            .parts
            .take_first_of_kind(PartKind::WriteLobReply)
            .map(Part::into_arg)
        {
            Some(Argument::WriteLobReply(wlr)) => wlr.into_locator_ids(),
            _ => Vec::new(),
        };
        if locator_ids.len() != lob_tails.len() {
            return Err(ScnpError::protocol(
                "write-lob",
                format!(
                    "server expects data for {} LOB locators, client has {} pending",
                    locator_ids.len(),
                    lob_tails.len()
                ),
            ));
        }

        let chunk_size = core.lob_write_length().max(1);
        for (locator_id, tail) in locator_ids.into_iter().zip(lob_tails.into_iter()) {
            let mut chunks = tail.chunks(chunk_size).peekable();
            while let Some(chunk) = chunks.next() {
                let is_last = chunks.peek().is_none();
                let mut request = Request::new(RequestType::WriteLob, 0);
                request.push(Part::new(
                    PartKind::WriteLobRequest,
                    Argument::WriteLobRequest(WriteLobRequest::new(
                        locator_id,
                        -1, // append to what the server has for this locator
                        chunk.to_vec(),
                        is_last,
                    )),
                ));
                core.roundtrip(request, &self.am_sess, None, None)?;
            }
        }
        Ok(())
    }

    // Assembles the DbResult from the payload parts the reply digestion
    // left behind, guided by the reply's function code.
    fn evaluate_reply(
        &self,
        core: &mut SessionCore,
        mut reply: Reply,
        o_cached_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
    ) -> ScnpResult<DbResult> {
        match reply.function_code {
            FunctionCode::Select | FunctionCode::SelectForUpdate | FunctionCode::Explain => {
                self.assemble_resultset(core, &mut reply, o_cached_rs_md)
            }
            FunctionCode::Insert | FunctionCode::Update | FunctionCode::Delete => {
                match reply
                    .parts
                    .take_first_of_kind(PartKind::RowsAffected)
                    .map(Part::into_arg)
                {
                    Some(Argument::RowsAffected(counts)) => Ok(DbResult::RowsAffected(counts)),
                    _ => Err(ScnpError::protocol(
                        "execute",
                        "DML reply carries no ROWS_AFFECTED part",
                    )),
                }
            }
            FunctionCode::DbProcedureCall | FunctionCode::DbProcedureCallWithResult => {
                if let Some(part) = reply.parts.take_first_of_kind(PartKind::OutputParameters) {
                    let descriptors = o_par_md.ok_or_else(|| {
                        ScnpError::protocol("execute", "output parameters without metadata")
                    })?;
                    if let Argument::OutputParameters(op) = part.into_arg() {
                        let md = Arc::new(ResultSetMetadata::from_output_parameters(
                            &descriptors
                                .iter()
                                .filter(|d| d.is_output())
                                .cloned()
                                .collect::<Vec<ParameterDescriptor>>(),
                        ));
                        let row = crate::protocol::parts::row::Row::new(op.into_values());
                        return Ok(DbResult::OutputParameters(ResultSet::new_complete(
                            &self.am_sess,
                            md,
                            vec![row],
                        )));
                    }
                }
                match reply
                    .parts
                    .take_first_of_kind(PartKind::RowsAffected)
                    .map(Part::into_arg)
                {
                    Some(Argument::RowsAffected(counts)) => Ok(DbResult::RowsAffected(counts)),
                    _ => Ok(DbResult::Success),
                }
            }
            _ => match reply
                .parts
                .take_first_of_kind(PartKind::RowsAffected)
                .map(Part::into_arg)
            {
                Some(Argument::RowsAffected(counts)) => Ok(DbResult::RowsAffected(counts)),
                _ => Ok(DbResult::Success),
            },
        }
    }

    fn assemble_resultset(
        &self,
        core: &mut SessionCore,
        reply: &mut Reply,
        o_cached_rs_md: Option<&Arc<ResultSetMetadata>>,
    ) -> ScnpResult<DbResult> {
        let md = match reply.parts.metadata_arc() {
            Some(md) => Arc::clone(md),
            None => match o_cached_rs_md {
                Some(md) => Arc::clone(md),
                None => {
                    return Err(ScnpError::protocol(
                        "execute",
                        "SELECT reply carries no RESULT_SET_METADATA part",
                    ));
                }
            },
        };
        let resultset_id = match reply
            .parts
            .take_first_of_kind(PartKind::ResultSetId)
            .map(Part::into_arg)
        {
            Some(Argument::ResultSetId(id)) => id,
            _ => {
                return Err(ScnpError::protocol(
                    "execute",
                    "SELECT reply carries no RESULT_SET_ID part",
                ));
            }
        };
        let (attributes, rows) = match reply.parts.take_first_of_kind(PartKind::ResultSet) {
            Some(part) => {
                let attributes = part.attributes();
                match part.into_arg() {
                    Argument::Rows(rows) => (attributes, rows),
                    _ => (attributes, Vec::new()),
                }
            }
            None => (crate::protocol::part_attributes::PartAttributes::new(0), Vec::new()),
        };
        Ok(DbResult::ResultSet(ResultSet::new(
            &self.am_sess,
            attributes,
            resultset_id,
            md,
            rows,
            core.fetch_size(),
        )))
    }
}
