use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;

// Statement visibility context. The sequence info ties the statements of a
// transaction together and is echoed back with every follow-up request of
// the session; the other entries are server-side execution statistics and
// hints.
pub type StatementContext = OptionPart<StatementContextId>;

impl StatementContext {
    pub fn statement_sequence_info(&self) -> Option<i64> {
        match self.value(&StatementContextId::StatementSequenceInfo) {
            Some(&OptionValue::BIGINT(sequence)) => Some(sequence),
            _ => None,
        }
    }

    pub fn set_statement_sequence_info(&mut self, sequence: i64) {
        self.set_value(
            StatementContextId::StatementSequenceInfo,
            OptionValue::BIGINT(sequence),
        );
    }

    // Time the server spent on the statement, in microseconds.
    pub fn server_processing_time(&self) -> Option<i32> {
        match self.value(&StatementContextId::ServerProcessingTime) {
            Some(&OptionValue::INT(micros)) => Some(micros),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementContextId {
    StatementSequenceInfo,         // 1, bigint
    ServerProcessingTime,          // 2, int, microseconds
    SchemaName,                    // 3, string
    FlagSet,                       // 4, int
    QueryTimeout,                  // 5, bigint
    ClientReconnectionWaitTimeout, // 6, int
    Other(u8),
}

impl OptionId for StatementContextId {
    fn from_wire(id: u8) -> Self {
        match id {
            1 => Self::StatementSequenceInfo,
            2 => Self::ServerProcessingTime,
            3 => Self::SchemaName,
            4 => Self::FlagSet,
            5 => Self::QueryTimeout,
            6 => Self::ClientReconnectionWaitTimeout,
            id => Self::Other(id),
        }
    }

    fn wire_id(&self) -> u8 {
        match *self {
            Self::StatementSequenceInfo => 1,
            Self::ServerProcessingTime => 2,
            Self::SchemaName => 3,
            Self::FlagSet => 4,
            Self::QueryTimeout => 5,
            Self::ClientReconnectionWaitTimeout => 6,
            Self::Other(id) => id,
        }
    }
}
