use crate::protocol::util;

/// Classifies what kind of statement or operation a reply belongs to.
///
/// The server attaches this code to every reply segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FunctionCode {
    /// No specific classification.
    Nil,
    /// DDL statement.
    Ddl,
    /// INSERT statement.
    Insert,
    /// UPDATE statement.
    Update,
    /// DELETE statement.
    Delete,
    /// SELECT statement.
    Select,
    /// SELECT ... FOR UPDATE statement.
    SelectForUpdate,
    /// EXPLAIN statement.
    Explain,
    /// CALL statement.
    DbProcedureCall,
    /// CALL statement returning one or more results.
    DbProcedureCallWithResult,
    /// Reply to a FETCH request.
    Fetch,
    /// Reply to a COMMIT request or statement.
    Commit,
    /// Reply to a ROLLBACK request or statement.
    Rollback,
    /// Reply to a CONNECT or AUTHENTICATE request.
    Connect,
    /// Reply to a WRITE_LOB request.
    WriteLob,
    /// Reply to a READ_LOB request.
    ReadLob,
    /// Reply to a DISCONNECT request.
    Disconnect,
    /// Reply to a CLOSE_RESULT_SET request.
    CloseCursor,
    /// Reply to a DROP_STATEMENT_ID request.
    DropStatementId,
}
impl FunctionCode {
    pub(crate) fn parse(val: i16) -> std::io::Result<Self> {
        match val {
            0 => Ok(Self::Nil),
            1 => Ok(Self::Ddl),
            2 => Ok(Self::Insert),
            3 => Ok(Self::Update),
            4 => Ok(Self::Delete),
            5 => Ok(Self::Select),
            6 => Ok(Self::SelectForUpdate),
            7 => Ok(Self::Explain),
            8 => Ok(Self::DbProcedureCall),
            9 => Ok(Self::DbProcedureCallWithResult),
            10 => Ok(Self::Fetch),
            11 => Ok(Self::Commit),
            12 => Ok(Self::Rollback),
            14 => Ok(Self::Connect),
            15 => Ok(Self::WriteLob),
            16 => Ok(Self::ReadLob),
            18 => Ok(Self::Disconnect),
            19 => Ok(Self::CloseCursor),
            21 => Ok(Self::DropStatementId),
            _ => Err(util::io_error(format!(
                "unexpected function code {val} in reply segment"
            ))),
        }
    }

    /// True for the data-manipulation codes that produce a row count.
    pub fn is_dml(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}
