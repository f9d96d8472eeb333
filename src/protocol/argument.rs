use crate::conn::AmSessCore;
use crate::protocol::part::Parts;
use crate::protocol::part_attributes::PartAttributes;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::auth_fields::AuthFields;
use crate::protocol::parts::client_context::ClientContext;
use crate::protocol::parts::connect_options::ConnectOptions;
use crate::protocol::parts::execution_result;
use crate::protocol::parts::output_parameters::OutputParameters;
use crate::protocol::parts::parameter_descriptor::ParameterDescriptor;
use crate::protocol::parts::parameters::ParameterRows;
use crate::protocol::parts::read_lob::{ReadLobReply, ReadLobRequest};
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::parts::row::Row;
use crate::protocol::parts::server_error::ServerError;
use crate::protocol::parts::statement_context::StatementContext;
use crate::protocol::parts::topology::Topology;
use crate::protocol::parts::transaction_flags::TransactionFlags;
use crate::protocol::parts::write_lob::{WriteLobReply, WriteLobRequest};
use crate::protocol::util;
use crate::{ScnpError, ScnpResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::{Read, Write};
use std::sync::Arc;

// The typed payload of a part. One variant per part kind; emit/parse
// dispatch happens through this enum instead of a runtime registry.
#[derive(Debug)]
pub enum Argument {
    Auth(AuthFields),
    ClientContext(ClientContext),
    ClientId(String),
    Command(String),
    ConnectOptions(ConnectOptions),
    Error(Vec<ServerError>),
    FetchSize(i32),
    OutputParameters(OutputParameters),
    ParameterMetadata(Arc<Vec<ParameterDescriptor>>),
    Parameters(ParameterRows),
    ReadLobRequest(ReadLobRequest),
    ReadLobReply(ReadLobReply),
    ResultSetId(u64),
    ResultSetMetadata(Arc<ResultSetMetadata>),
    Rows(Vec<Row>),
    RowsAffected(Vec<i32>),
    StatementContext(StatementContext),
    StatementId(u64),
    TopologyInformation(Topology),
    TransactionFlags(TransactionFlags),
    WriteLobRequest(WriteLobRequest),
    WriteLobReply(WriteLobReply),
}

impl Argument {
    // The argument count that goes into the part header.
    pub fn count(&self) -> ScnpResult<usize> {
        Ok(match *self {
            Argument::Auth(_)
            | Argument::ClientId(_)
            | Argument::Command(_)
            | Argument::FetchSize(_)
            | Argument::ReadLobRequest(_)
            | Argument::ResultSetId(_)
            | Argument::StatementId(_)
            | Argument::WriteLobRequest(_) => 1,
            Argument::ClientContext(ref opts) => opts.len(),
            Argument::ConnectOptions(ref opts) => opts.len(),
            Argument::Parameters(ref rows) => rows.count(),
            Argument::StatementContext(ref ctx) => ctx.len(),
            ref a => {
                return Err(ScnpError::protocol(
                    "request",
                    format!("Argument::count() called on non-request argument {a:?}"),
                ));
            }
        })
    }

    // Payload size without padding; only called when emitting.
    pub fn size(&self) -> ScnpResult<usize> {
        Ok(match *self {
            Argument::Auth(ref af) => af.size(),
            Argument::ClientContext(ref opts) => opts.wire_size(),
            Argument::ClientId(ref s) => s.len(),
            Argument::Command(ref s) => util::cesu8_length(s),
            Argument::ConnectOptions(ref opts) => opts.wire_size(),
            Argument::FetchSize(_) => 4,
            Argument::Parameters(ref rows) => rows.size(),
            Argument::ReadLobRequest(_) => ReadLobRequest::size(),
            Argument::ResultSetId(_) | Argument::StatementId(_) => 8,
            Argument::StatementContext(ref ctx) => ctx.wire_size(),
            Argument::WriteLobRequest(ref r) => r.size(),
            ref a => {
                return Err(ScnpError::protocol(
                    "request",
                    format!("Argument::size() called on non-request argument {a:?}"),
                ));
            }
        })
    }

    pub fn emit(&self, w: &mut dyn io::Write) -> ScnpResult<()> {
        match *self {
            Argument::Auth(ref af) => af.emit(w)?,
            Argument::ClientContext(ref opts) => opts.emit(w)?,
            Argument::ClientId(ref s) => w.write_all(s.as_bytes())?,
            Argument::Command(ref s) => w.write_all(&cesu8::to_cesu8(s))?,
            Argument::ConnectOptions(ref opts) => opts.emit(w)?,
            Argument::FetchSize(fs) => w.write_i32::<LittleEndian>(fs)?,
            Argument::Parameters(ref rows) => rows.emit(w)?,
            Argument::ReadLobRequest(ref r) => r.emit(w)?,
            Argument::ResultSetId(rs_id) => w.write_u64::<LittleEndian>(rs_id)?,
            Argument::StatementId(id) => w.write_u64::<LittleEndian>(id)?,
            Argument::StatementContext(ref ctx) => ctx.emit(w)?,
            Argument::WriteLobRequest(ref r) => r.emit(w)?,
            ref a => {
                return Err(ScnpError::protocol(
                    "request",
                    format!("Argument::emit() called on non-request argument {a:?}"),
                ));
            }
        }
        Ok(())
    }

    // Parses the payload of a reply part. `already_parsed` gives access to
    // parts of the same reply that arrived earlier (a RESULT_SET part needs
    // the RESULT_SET_METADATA part preceding it); metadata cached on the
    // client side is passed in through `o_rs_md` resp. `o_par_md`.
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        kind: PartKind,
        attributes: PartAttributes,
        no_of_args: usize,
        already_parsed: &Parts,
        am_sess: Option<&AmSessCore>,
        o_rs_md: Option<&Arc<ResultSetMetadata>>,
        o_par_md: Option<&Arc<Vec<ParameterDescriptor>>>,
        rdr: &mut dyn io::Read,
    ) -> io::Result<Argument> {
        Ok(match kind {
            PartKind::Authentication => Argument::Auth(AuthFields::parse(rdr)?),
            PartKind::ClientContext => {
                Argument::ClientContext(ClientContext::parse(no_of_args, rdr)?)
            }
            PartKind::Command => {
                let mut bytes = Vec::new();
                rdr.read_to_end(&mut bytes)?;
                Argument::Command(util::string_from_cesu8(bytes)?)
            }
            PartKind::ConnectOptions => {
                Argument::ConnectOptions(ConnectOptions::parse(no_of_args, rdr)?)
            }
            PartKind::Error => Argument::Error(ServerError::parse(no_of_args, rdr)?),
            PartKind::FetchSize => Argument::FetchSize(rdr.read_i32::<LittleEndian>()?),
            PartKind::OutputParameters => {
                let descriptors = o_par_md.ok_or_else(|| {
                    util::io_error("OUTPUT_PARAMETERS part without parameter metadata")
                })?;
                Argument::OutputParameters(OutputParameters::parse(am_sess, descriptors, rdr)?)
            }
            PartKind::ParameterMetadata => Argument::ParameterMetadata(Arc::new(
                ParameterDescriptor::parse_part(no_of_args, rdr)?,
            )),
            PartKind::ReadLobReply => Argument::ReadLobReply(ReadLobReply::parse(rdr)?),
            PartKind::ResultSet => {
                let row_not_found = attributes.row_not_found();
                let md_of_reply = already_parsed.metadata_arc();
                let md = match (md_of_reply, o_rs_md) {
                    (Some(md), _) | (None, Some(md)) => md,
                    (None, None) => {
                        return Err(util::io_error(
                            "RESULT_SET part without result set metadata",
                        ));
                    }
                };
                let mut rows = Vec::<Row>::with_capacity(no_of_args);
                if !row_not_found {
                    for _ in 0..no_of_args {
                        rows.push(Row::parse(md, am_sess, rdr)?);
                    }
                }
                Argument::Rows(rows)
            }
            PartKind::ResultSetId => Argument::ResultSetId(rdr.read_u64::<LittleEndian>()?),
            PartKind::ResultSetMetadata => Argument::ResultSetMetadata(Arc::new(
                ResultSetMetadata::parse_part(no_of_args, rdr)?,
            )),
            PartKind::RowsAffected => {
                Argument::RowsAffected(execution_result::parse_rows_affected(no_of_args, rdr)?)
            }
            PartKind::StatementContext => {
                Argument::StatementContext(StatementContext::parse(no_of_args, rdr)?)
            }
            PartKind::StatementId => Argument::StatementId(rdr.read_u64::<LittleEndian>()?),
            PartKind::TopologyInformation => {
                // servers vary in how they lay this part out; it is not acted
                // on, so tolerate unknown shapes
                match Topology::parse(no_of_args, rdr) {
                    Ok(topology) => Argument::TopologyInformation(topology),
                    Err(e) => {
                        warn!("ignoring unparseable topology information: {}", e);
                        Argument::TopologyInformation(Topology::default())
                    }
                }
            }
            PartKind::TransactionFlags => {
                Argument::TransactionFlags(TransactionFlags::parse(no_of_args, rdr)?)
            }
            PartKind::WriteLobReply => Argument::WriteLobReply(WriteLobReply::parse(no_of_args, rdr)?),
            PartKind::ClientId
            | PartKind::Parameters
            | PartKind::ReadLobRequest
            | PartKind::WriteLobRequest => {
                return Err(util::io_error(format!(
                    "unexpected request-only part kind {kind:?} in reply"
                )));
            }
        })
    }
}
