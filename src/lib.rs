//! Native rust client for the SQL Command Network Protocol of SAP HANA(TM).
//!
//! The crate speaks the binary wire protocol directly over a plain TCP
//! connection: it opens an authenticated session (SCRAM-SHA256), prepares and
//! executes SQL statements, streams result sets in fetch-sized batches,
//! streams LOB content in both directions, and tracks the transaction state
//! that the server reports with every reply.
//!
//! A session is strictly synchronous: one request goes out, one reply comes
//! back, nothing is pipelined. Concurrent use of a single [`Session`] from
//! several threads must be serialized by the caller.
//!
//! ```no_run
//! use scnp::{ConnectParams, Session};
//!
//! # fn main() -> scnp::ScnpResult<()> {
//! let params = ConnectParams::builder("hana.example.com", 30015)
//!     .dbuser("SYSTEM")
//!     .password("secret")
//!     .build()?;
//! let mut session = Session::connect(params)?;
//! let mut rs = session.execute("select 'Hello' from DUMMY", None)?.into_resultset()?;
//! let row = rs.fetch_one()?;
//! session.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod conn;
mod connect_params;
mod db_result;
mod prepared_statement;
mod protocol;
mod scnp_error;
mod session;
mod types_impl;

pub use crate::connect_params::{ConnectParams, ConnectParamsBuilder};
pub use crate::db_result::DbResult;
pub use crate::prepared_statement::PreparedStatement;
pub use crate::protocol::function_code::FunctionCode;
pub use crate::protocol::parts::parameter_descriptor::{ParameterDescriptor, ParameterDirection};
pub use crate::protocol::parts::resultset::ResultSet;
pub use crate::protocol::parts::resultset_metadata::{FieldMetadata, ResultSetMetadata};
pub use crate::protocol::parts::row::Row;
pub use crate::protocol::parts::server_error::{ServerError, Severity};
pub use crate::protocol::parts::type_code::TypeCode;
pub use crate::protocol::parts::value::Value;
pub use crate::scnp_error::{ScnpError, ScnpResult};
pub use crate::session::Session;
pub use crate::conn::TransactionState;
pub use crate::types_impl::lob::{Lob, LobKind, SeekFrom};

/// Number of rows that are requested from the server with each FETCH
/// roundtrip, unless configured differently.
pub const DEFAULT_FETCH_SIZE: u32 = 32;

/// Per-statement budget for LOB data sent inline with an EXECUTE request,
/// used when the server did not announce a limit of its own.
pub const DEFAULT_LOB_WRITE_LENGTH: usize = 128 * 1024;
