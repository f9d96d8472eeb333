use crate::protocol::parts::option_part::{OptionId, OptionPart};

/// Attached by the server to many replies: reports whether the current
/// transaction was committed or rolled back, whether a write transaction
/// was opened, and session-level changes such as a new isolation level,
/// a changed DDL commit mode, read-only mode, or a forced session end.
pub type TransactionFlags = OptionPart<TaFlagId>;

#[derive(Clone, Debug, PartialEq)]
pub enum TaFlagId {
    RolledBack,                // 0, bool
    Committed,                 // 1, bool
    NewIsolationLevel,         // 2, int
    DdlCommitModeChanged,      // 3, bool
    WriteTransactionStarted,   // 4, bool
    NoWriteTransactionStarted, // 5, bool
    SessionClosing,            // 6, bool
    ReadOnly,                  // 7, bool
    Other(u8),
}

impl OptionId for TaFlagId {
    fn from_wire(id: u8) -> Self {
        match id {
            0 => Self::RolledBack,
            1 => Self::Committed,
            2 => Self::NewIsolationLevel,
            3 => Self::DdlCommitModeChanged,
            4 => Self::WriteTransactionStarted,
            5 => Self::NoWriteTransactionStarted,
            6 => Self::SessionClosing,
            7 => Self::ReadOnly,
            id => {
                warn!("transaction flag with unknown id {} received", id);
                Self::Other(id)
            }
        }
    }

    fn wire_id(&self) -> u8 {
        match *self {
            Self::RolledBack => 0,
            Self::Committed => 1,
            Self::NewIsolationLevel => 2,
            Self::DdlCommitModeChanged => 3,
            Self::WriteTransactionStarted => 4,
            Self::NoWriteTransactionStarted => 5,
            Self::SessionClosing => 6,
            Self::ReadOnly => 7,
            Self::Other(id) => id,
        }
    }
}
