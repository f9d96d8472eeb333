use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;

// Capability negotiation between client and server: sent with the CONNECT
// request, and the server's reply is retained on the session. Two reply
// entries influence the engine directly: the large-number-of-parameters
// flag widens the part argument-count field, and the LOB write budget
// replaces the client's conservative per-statement default.
pub type ConnectOptions = OptionPart<ConnOptId>;

impl ConnectOptions {
    pub fn for_server(client_locale: &str) -> Self {
        let mut opts = Self::default();
        opts.set_value(
            ConnOptId::ClientLocale,
            OptionValue::STRING(client_locale.to_string()),
        );
        opts.set_value(ConnOptId::CompleteArrayExecution, OptionValue::BOOLEAN(true));
        opts.set_value(ConnOptId::DataFormatVersion, OptionValue::INT(1));
        opts.set_value(ConnOptId::DataFormatVersion2, OptionValue::INT(1));
        opts.set_value(ConnOptId::ClientDistributionMode, OptionValue::INT(0));
        opts.set_value(
            ConnOptId::SelectForUpdateSupported,
            OptionValue::BOOLEAN(false),
        );
        opts.set_value(
            ConnOptId::DistributionProtocolVersion,
            OptionValue::INT(0),
        );
        opts.set_value(ConnOptId::SplitBatchCommands, OptionValue::BOOLEAN(true));
        opts
    }

    pub fn supports_large_number_of_parameters(&self) -> bool {
        matches!(
            self.value(&ConnOptId::LargeNumberOfParametersSupport),
            Some(OptionValue::BOOLEAN(true))
        )
    }

    // The per-statement budget for inline LOB data, when the server announces one.
    pub fn lob_write_budget(&self) -> Option<usize> {
        match self.value(&ConnOptId::LobWriteBudget) {
            Some(&OptionValue::INT(v)) if v > 0 => Some(v as usize),
            Some(&OptionValue::BIGINT(v)) if v > 0 => Some(v as usize),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnOptId {
    ConnectionId,                   // 1, int
    CompleteArrayExecution,         // 2, bool
    ClientLocale,                   // 3, string
    SupportsLargeBulkOperations,    // 4, bool
    LargeNumberOfParametersSupport, // 10, bool
    SystemId,                       // 11, string
    DataFormatVersion,              // 12, int
    SelectForUpdateSupported,       // 14, bool
    ClientDistributionMode,         // 15, int
    EngineDataFormatVersion,        // 16, int
    DistributionProtocolVersion,    // 17, int
    SplitBatchCommands,             // 18, bool
    UseTransactionFlagsOnly,        // 19, bool
    RowAndColumnOptimizedFormat,    // 20, bool
    IgnoreUnknownParts,             // 21, bool
    DataFormatVersion2,             // 23, int
    LobWriteBudget,                 // 24, int
    Other(u8),
}

impl OptionId for ConnOptId {
    fn from_wire(id: u8) -> Self {
        match id {
            1 => Self::ConnectionId,
            2 => Self::CompleteArrayExecution,
            3 => Self::ClientLocale,
            4 => Self::SupportsLargeBulkOperations,
            10 => Self::LargeNumberOfParametersSupport,
            11 => Self::SystemId,
            12 => Self::DataFormatVersion,
            14 => Self::SelectForUpdateSupported,
            15 => Self::ClientDistributionMode,
            16 => Self::EngineDataFormatVersion,
            17 => Self::DistributionProtocolVersion,
            18 => Self::SplitBatchCommands,
            19 => Self::UseTransactionFlagsOnly,
            20 => Self::RowAndColumnOptimizedFormat,
            21 => Self::IgnoreUnknownParts,
            23 => Self::DataFormatVersion2,
            24 => Self::LobWriteBudget,
            id => Self::Other(id),
        }
    }

    fn wire_id(&self) -> u8 {
        match *self {
            Self::ConnectionId => 1,
            Self::CompleteArrayExecution => 2,
            Self::ClientLocale => 3,
            Self::SupportsLargeBulkOperations => 4,
            Self::LargeNumberOfParametersSupport => 10,
            Self::SystemId => 11,
            Self::DataFormatVersion => 12,
            Self::SelectForUpdateSupported => 14,
            Self::ClientDistributionMode => 15,
            Self::EngineDataFormatVersion => 16,
            Self::DistributionProtocolVersion => 17,
            Self::SplitBatchCommands => 18,
            Self::UseTransactionFlagsOnly => 19,
            Self::RowAndColumnOptimizedFormat => 20,
            Self::IgnoreUnknownParts => 21,
            Self::DataFormatVersion2 => 23,
            Self::LobWriteBudget => 24,
            Self::Other(id) => id,
        }
    }
}
