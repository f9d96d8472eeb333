mod scram_sha256;

use crate::conn::{session_core, AmSessCore};
use crate::connect_params::ConnectParams;
use crate::protocol::argument::Argument;
use crate::protocol::part::Part;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::auth_fields::AuthFields;
use crate::protocol::parts::client_context::ClientContext;
use crate::protocol::parts::connect_options::ConnectOptions;
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::{ScnpError, ScnpResult};

// The two-roundtrip session establishment: AUTHENTICATE carries the client
// challenge, the reply carries salt and server nonce; CONNECT carries the
// client proof together with the client's introduction and capabilities.
// Any failure closes the transport and surfaces as an Auth error.
pub fn authenticate(am_sess: &AmSessCore, params: &ConnectParams) -> ScnpResult<()> {
    match handshake(am_sess, params) {
        Ok(()) => {
            session_core::lock(am_sess)?.set_authenticated();
            Ok(())
        }
        Err(e) => {
            if let Ok(mut core) = session_core::lock(am_sess) {
                core.force_close();
            }
            Err(match e {
                ScnpError::Database(records) => ScnpError::Auth(
                    records
                        .first()
                        .map_or_else(|| "authentication rejected".to_string(), ToString::to_string),
                ),
                ScnpError::Auth(msg) => ScnpError::Auth(msg),
                e => e,
            })
        }
    }
}

fn handshake(am_sess: &AmSessCore, params: &ConnectParams) -> ScnpResult<()> {
    let client_challenge = scram_sha256::client_challenge();

    // round 1: AUTHENTICATE
    let mut auth_fields = AuthFields::with_capacity(3);
    auth_fields.push_string(params.dbuser());
    auth_fields.push_string(scram_sha256::METHOD_NAME);
    auth_fields.push(client_challenge.clone());
    let mut request = Request::new(RequestType::Authenticate, 0);
    request.push(Part::new(PartKind::Authentication, Argument::Auth(auth_fields)));

    let mut core = session_core::lock(am_sess)?;
    let mut reply = core.roundtrip(request, am_sess, None, None)?;
    let server_data = match reply
        .parts
        .take_first_of_kind(PartKind::Authentication)
        .map(Part::into_arg)
    {
        Some(Argument::Auth(mut af)) => {
            // the reply lists (method name, method data) pairs
            let data = af.pop();
            match (af.pop(), data) {
                (Some(method), Some(data))
                    if method == scram_sha256::METHOD_NAME.as_bytes() =>
                {
                    data
                }
                (Some(method), _) => {
                    return Err(ScnpError::Auth(format!(
                        "server offers only unsupported authentication methods (got {})",
                        String::from_utf8_lossy(&method)
                    )));
                }
                _ => {
                    return Err(ScnpError::Auth(
                        "malformed authentication reply".to_string(),
                    ));
                }
            }
        }
        _ => {
            return Err(ScnpError::Auth(
                "AUTHENTICATE reply carries no AUTHENTICATION part".to_string(),
            ));
        }
    };
    let (salt, server_nonce) = scram_sha256::parse_first_server_data(&server_data)?;
    let proof = scram_sha256::wrapped_client_proof(
        &salt,
        &server_nonce,
        &client_challenge,
        params.password(),
    )?;

    // round 2: CONNECT
    let mut auth_fields = AuthFields::with_capacity(3);
    auth_fields.push_string(params.dbuser());
    auth_fields.push_string(scram_sha256::METHOD_NAME);
    auth_fields.push(proof);
    let mut request = Request::new(RequestType::Connect, 0);
    request.push(Part::new(PartKind::Authentication, Argument::Auth(auth_fields)));
    request.push(Part::new(
        PartKind::ClientId,
        Argument::ClientId(client_id()),
    ));
    request.push(Part::new(
        PartKind::ClientContext,
        Argument::ClientContext(ClientContext::for_connect()),
    ));
    request.push(Part::new(
        PartKind::ConnectOptions,
        Argument::ConnectOptions(ConnectOptions::for_server(params.clientlocale())),
    ));

    let mut reply = core.roundtrip(request, am_sess, None, None)?;
    debug!("connected, session id {}", core.session_id());

    if let Some(part) = reply.parts.take_first_of_kind(PartKind::ConnectOptions) {
        if let Argument::ConnectOptions(server_options) = part.into_arg() {
            if let Some(budget) = server_options.lob_write_budget() {
                core.set_negotiated_lob_write_length(budget);
            }
            // the large-number-of-parameters flag widens the argument-count
            // field; the part emitter switches on the count itself, so the
            // flag needs no further bookkeeping here
            trace!(
                "server connect options: large parameter support = {}",
                server_options.supports_large_number_of_parameters()
            );
        }
    }
    if let Some(part) = reply.parts.take_first_of_kind(PartKind::TopologyInformation) {
        if let Argument::TopologyInformation(topology) = part.into_arg() {
            core.set_topology(topology);
        }
    }
    // the server's proof confirmation needs no verification for SCRAMSHA256
    reply.parts.take_first_of_kind(PartKind::Authentication);

    Ok(())
}

fn client_id() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    format!("scnp-{}@{}", std::process::id(), user)
}
