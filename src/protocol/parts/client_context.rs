use crate::protocol::parts::option_part::{OptionId, OptionPart};
use crate::protocol::parts::option_value::OptionValue;

// Identifies this client to the server. Sent once, with the CONNECT
// request: crate version, client type, and the name of the running program.
pub type ClientContext = OptionPart<ClientContextId>;

impl ClientContext {
    pub fn for_connect() -> Self {
        let program = std::env::args().next().unwrap_or_default();
        let entries = [
            (ClientContextId::Version, env!("CARGO_PKG_VERSION").to_string()),
            (
                ClientContextId::Type,
                format!("{} (rust)", env!("CARGO_PKG_NAME")),
            ),
            (ClientContextId::ApplicationProgram, program),
        ];

        let mut part = Self::default();
        for (id, text) in entries {
            part.set_value(id, OptionValue::STRING(text));
        }
        part
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClientContextId {
    Version,            // 1, string
    Type,               // 2, string
    ApplicationProgram, // 3, string
    Other(u8),
}

impl OptionId for ClientContextId {
    fn from_wire(id: u8) -> Self {
        match id {
            1 => Self::Version,
            2 => Self::Type,
            3 => Self::ApplicationProgram,
            id => Self::Other(id),
        }
    }

    fn wire_id(&self) -> u8 {
        match *self {
            Self::Version => 1,
            Self::Type => 2,
            Self::ApplicationProgram => 3,
            Self::Other(id) => id,
        }
    }
}
