use crate::conn::session_state::SessionState;
use crate::conn::{initial_request, TcpClient, TransactionState};
use crate::connect_params::ConnectParams;
use crate::protocol::argument::Argument;
use crate::protocol::part::Part;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::parts::server_error::{ServerError, Severity};
use crate::protocol::parts::topology::Topology;
use crate::protocol::reply::{PacketHeader, Reply};
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::protocol::trace;
use crate::{ScnpError, ScnpResult};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub type AmSessCore = Arc<Mutex<SessionCore>>;

pub fn lock(am_sess: &AmSessCore) -> ScnpResult<MutexGuard<'_, SessionCore>> {
    am_sess
        .lock()
        .map_err(|_| ScnpError::usage("session mutex poisoned"))
}

// Dependent objects (prepared statements, result sets, LOB handles) refer to
// the session weakly: they never keep it alive, and every operation on them
// re-checks that the session still exists.
#[derive(Clone, Debug)]
pub struct WeakSessCore(Weak<Mutex<SessionCore>>);

impl WeakSessCore {
    pub fn new(am_sess: &AmSessCore) -> Self {
        Self(Arc::downgrade(am_sess))
    }

    pub fn upgrade(&self) -> ScnpResult<AmSessCore> {
        self.0.upgrade().ok_or(ScnpError::Closed)
    }
}

// All state of one session, plus the transport it exclusively owns.
// Exactly one request/reply can be in flight at any time; the surrounding
// mutex serializes all access.
#[derive(Debug)]
pub struct SessionCore {
    authenticated: bool,
    dead: bool,
    session_id: i64,
    seq_number: i32,
    auto_commit: bool,
    fetch_size: u32,
    lob_write_length: usize,
    lob_write_negotiated: bool,
    trace: bool,
    statement_sequence: Option<i64>,
    session_state: SessionState,
    product_version: (i8, u16),
    protocol_version: (i8, u16),
    topology: Option<Topology>,
    warnings: Vec<ServerError>,
    tcp: Option<TcpClient>,
}

impl SessionCore {
    pub fn try_new(params: &ConnectParams) -> ScnpResult<SessionCore> {
        let mut tcp = TcpClient::try_new(params.host(), params.port(), params.timeout())?;
        let (product_version, protocol_version) = initial_request::send_and_receive(&mut tcp)?;

        Ok(SessionCore {
            authenticated: false,
            dead: false,
            session_id: -1,
            seq_number: -1,
            auto_commit: params.autocommit(),
            fetch_size: params.fetch_size(),
            lob_write_length: crate::DEFAULT_LOB_WRITE_LENGTH,
            lob_write_negotiated: false,
            trace: params.trace(),
            statement_sequence: None,
            session_state: SessionState::default(),
            product_version,
            protocol_version,
            topology: None,
            warnings: Vec::<ServerError>::new(),
            tcp: Some(tcp),
        })
    }

    pub fn set_authenticated(&mut self) {
        self.authenticated = true;
    }

    pub fn is_dead(&self) -> bool {
        self.dead || self.tcp.is_none()
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn set_auto_commit(&mut self, ac: bool) {
        self.auto_commit = ac;
    }

    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn fetch_size(&self) -> u32 {
        self.fetch_size
    }

    pub fn set_fetch_size(&mut self, fetch_size: u32) {
        self.fetch_size = fetch_size.max(1);
    }

    pub fn lob_write_length(&self) -> usize {
        self.lob_write_length
    }

    pub fn lob_write_negotiated(&self) -> bool {
        self.lob_write_negotiated
    }

    pub fn set_negotiated_lob_write_length(&mut self, lob_write_length: usize) {
        self.lob_write_length = lob_write_length;
        self.lob_write_negotiated = true;
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.session_state.ta_state
    }

    pub fn product_version(&self) -> (i8, u16) {
        self.product_version
    }

    pub fn protocol_version(&self) -> (i8, u16) {
        self.protocol_version
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = Some(topology);
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    // Warnings of the last reply that carried any.
    pub fn pop_warnings(&mut self) -> Vec<ServerError> {
        std::mem::take(&mut self.warnings)
    }

    fn next_seq_number(&mut self) -> i32 {
        self.seq_number += 1;
        self.seq_number
    }

    // One complete request/reply exchange: serialize into a single buffer,
    // send with one write, read the reply header and then the complete var
    // part, parse, and digest the state-bearing parts. TRANSACTION_FLAGS and
    // STATEMENT_CONTEXT are applied to the session before a server error is
    // raised; transport and protocol failures poison the session.
    pub fn roundtrip(
        &mut self,
        mut request: Request,
        am_sess: &AmSessCore,
        o_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
    ) -> ScnpResult<Reply> {
        if self.is_dead() {
            return Err(ScnpError::Closed);
        }
        if let Some(ssi) = self.statement_sequence {
            let mut stmt_ctx = crate::protocol::parts::statement_context::StatementContext::default();
            stmt_ctx.set_statement_sequence_info(ssi);
            request.push(Part::new(
                PartKind::StatementContext,
                Argument::StatementContext(stmt_ctx),
            ));
        }

        let auto_commit_flag: i8 = i8::from(self.auto_commit);
        let nsn = self.next_seq_number();
        let result = self.roundtrip_inner(request, nsn, auto_commit_flag, am_sess, o_rs_md, o_par_md);
        match result {
            Ok(mut reply) => match self.digest_reply(&mut reply) {
                Ok(()) => Ok(reply),
                Err(e) => Err(e),
            },
            Err(e) => {
                if e.is_fatal() {
                    debug!("poisoning session after fatal error: {}", e);
                    self.force_close();
                }
                Err(e)
            }
        }
    }

    fn roundtrip_inner(
        &mut self,
        request: Request,
        seq_number: i32,
        auto_commit_flag: i8,
        am_sess: &AmSessCore,
        o_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
    ) -> ScnpResult<Reply> {
        let request_bytes = request.into_bytes(self.session_id, seq_number, auto_commit_flag)?;
        if self.trace {
            trace::trace_packet("sending", &request_bytes);
        }

        let tcp = self.tcp.as_mut().ok_or(ScnpError::Closed)?;
        tcp.write_all(&request_bytes)?;

        let mut raw_header = [0_u8; 32];
        tcp.read_exact_into(&mut raw_header)?;
        let header = PacketHeader::from_bytes(&raw_header);
        let varpart = tcp.read_exact(header.varpart_length as usize)?;
        if self.trace {
            let mut whole = raw_header.to_vec();
            whole.extend_from_slice(&varpart);
            trace::trace_packet("received", &whole);
        }
        trace!(
            "reply header: session_id = {}, packet_seq_number = {}, varpart_length = {}",
            header.session_id,
            header.packet_seq_number,
            header.varpart_length
        );

        // adopt the session id the server assigns with the CONNECT reply;
        // the packet sequence starts over for the new id
        if self.session_id != header.session_id {
            debug!(
                "session id changed from {} to {}",
                self.session_id, header.session_id
            );
            self.session_id = header.session_id;
            self.seq_number = -1;
        }

        Reply::parse(&header, varpart, Some(am_sess), o_rs_md, o_par_md)
    }

    // Applies the state-bearing parts of a reply and turns ERROR parts into
    // a Database error. Warnings are kept on the session instead.
    fn digest_reply(&mut self, reply: &mut Reply) -> ScnpResult<()> {
        while let Some(part) = reply.parts.take_first_of_kind(PartKind::TransactionFlags) {
            if let Argument::TransactionFlags(ta_flags) = part.into_arg() {
                self.session_state.update(ta_flags);
            }
        }
        while let Some(part) = reply.parts.take_first_of_kind(PartKind::StatementContext) {
            if let Argument::StatementContext(stmt_ctx) = part.into_arg() {
                if let Some(micros) = stmt_ctx.server_processing_time() {
                    trace!("server processing time: {} microseconds", micros);
                }
                self.statement_sequence = stmt_ctx.statement_sequence_info();
            }
        }

        let mut errors = Vec::<ServerError>::new();
        if let Some(part) = reply.parts.take_first_of_kind(PartKind::Error) {
            if let Argument::Error(server_errors) = part.into_arg() {
                self.warnings.clear();
                for se in server_errors {
                    if *se.severity() == Severity::Warning {
                        self.warnings.push(se);
                    } else {
                        errors.push(se);
                    }
                }
            }
        }

        if self.session_state.dead {
            self.force_close();
            if errors.is_empty() {
                return Err(ScnpError::protocol("session", "server requested session close"));
            }
            return Err(ScnpError::Database(errors));
        }
        if !errors.is_empty() {
            return Err(ScnpError::Database(errors));
        }
        Ok(())
    }

    // Best-effort DISCONNECT, then drop the transport. After this, every
    // operation fails with Closed.
    pub fn disconnect(&mut self) {
        if self.authenticated && !self.dead {
            if let Some(ref mut tcp) = self.tcp {
                let request = Request::new(RequestType::Disconnect, 0);
                self.seq_number += 1;
                if let Ok(bytes) = request.into_bytes(self.session_id, self.seq_number, 0) {
                    if let Err(e) = tcp.write_all(&bytes) {
                        trace!("disconnect request failed: {}", e);
                    }
                }
            }
        }
        self.force_close();
    }

    pub fn force_close(&mut self) {
        self.dead = true;
        if let Some(mut tcp) = self.tcp.take() {
            tcp.shutdown();
        }
    }
}

impl Drop for SessionCore {
    // try to send a disconnect to the database, ignore all errors
    fn drop(&mut self) {
        trace!("dropping session core for session {}", self.session_id);
        self.disconnect();
    }
}
