// All part kinds this client sends or evaluates. Kinds the server may send
// but the client has no use for (e.g. session variables) are not listed;
// the reply parser skips them by length.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PartKind {
    Command = 3,             // SQL command text
    ResultSet = 5,           // Tabular result data
    Error = 6,               // Error information
    StatementId = 10,        // Prepared statement identifier
    RowsAffected = 12,       // Number of affected rows of a DML statement
    ResultSetId = 13,        // Identifier of a result set
    TopologyInformation = 15, // Failover host list
    ReadLobRequest = 17,     // Request data of a READ_LOB message
    ReadLobReply = 18,       // Reply data of a READ_LOB message
    WriteLobRequest = 28,    // Request data of a WRITE_LOB message
    ClientContext = 29,      // Client introduction strings
    WriteLobReply = 30,      // Reply data of a WRITE_LOB message
    Parameters = 32,         // Input parameter rows
    Authentication = 33,     // Authentication field list
    ClientId = 35,           // Client process identification
    StatementContext = 39,   // Statement visibility context
    OutputParameters = 41,   // Procedure output parameter values
    ConnectOptions = 42,     // Connection capability negotiation
    FetchSize = 45,          // Number of rows to fetch
    ParameterMetadata = 47,  // Parameter type/length/name information
    ResultSetMetadata = 48,  // Column type/length/name information
    TransactionFlags = 64,   // Transaction state reporting
}
impl PartKind {
    pub fn to_i8(self) -> i8 {
        self as i8
    }

    // Unknown kinds are not an error at this level: the reply parser needs
    // the raw value to decide whether it can skip the part.
    pub fn try_from_i8(val: i8) -> Option<Self> {
        match val {
            3 => Some(Self::Command),
            5 => Some(Self::ResultSet),
            6 => Some(Self::Error),
            10 => Some(Self::StatementId),
            12 => Some(Self::RowsAffected),
            13 => Some(Self::ResultSetId),
            15 => Some(Self::TopologyInformation),
            17 => Some(Self::ReadLobRequest),
            18 => Some(Self::ReadLobReply),
            28 => Some(Self::WriteLobRequest),
            29 => Some(Self::ClientContext),
            30 => Some(Self::WriteLobReply),
            32 => Some(Self::Parameters),
            33 => Some(Self::Authentication),
            35 => Some(Self::ClientId),
            39 => Some(Self::StatementContext),
            41 => Some(Self::OutputParameters),
            42 => Some(Self::ConnectOptions),
            45 => Some(Self::FetchSize),
            47 => Some(Self::ParameterMetadata),
            48 => Some(Self::ResultSetMetadata),
            64 => Some(Self::TransactionFlags),
            _ => None,
        }
    }
}
