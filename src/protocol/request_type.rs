// The message type of a request segment tells the server which operation is
// being requested.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestType {
    ExecuteDirect = 2,
    Prepare = 3,
    Execute = 13,
    ReadLob = 16,
    WriteLob = 17,
    Authenticate = 65,
    Connect = 66,
    Commit = 67,
    Rollback = 68,
    CloseResultSet = 69,
    DropStatementId = 70,
    FetchNext = 71,
    Disconnect = 77,
}
impl RequestType {
    pub fn to_i8(self) -> i8 {
        self as i8
    }
}
