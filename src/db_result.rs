use crate::protocol::parts::resultset::ResultSet;
use crate::{ScnpError, ScnpResult};

/// The outcome of executing a statement.
#[derive(Debug)]
pub enum DbResult {
    /// A query produced a result set.
    ResultSet(ResultSet),
    /// A DML statement reported affected-row counts, one per input row.
    RowsAffected(Vec<i32>),
    /// A procedure call produced output parameters, presented as a one-row
    /// result set.
    OutputParameters(ResultSet),
    /// The statement succeeded without payload (DDL, commit, ...).
    Success,
}

impl DbResult {
    /// The result set of a query resp. the output parameters of a call.
    ///
    /// # Errors
    ///
    /// `ScnpError::Usage` if the statement produced no result set.
    pub fn into_resultset(self) -> ScnpResult<ResultSet> {
        match self {
            DbResult::ResultSet(rs) | DbResult::OutputParameters(rs) => Ok(rs),
            r => Err(ScnpError::usage(format!(
                "statement produced no result set, but {r:?}"
            ))),
        }
    }

    /// The total number of affected rows; 0 for DDL and queries.
    pub fn rowcount(&self) -> usize {
        match self {
            DbResult::RowsAffected(counts) => counts
                .iter()
                .map(|&c| usize::try_from(c).unwrap_or(0))
                .sum(),
            _ => 0,
        }
    }

    /// True unless the statement produced a result set.
    pub fn is_success(&self) -> bool {
        !matches!(self, DbResult::ResultSet(_))
    }
}
