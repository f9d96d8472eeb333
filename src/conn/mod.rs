pub mod authentication;
mod initial_request;
pub mod session_core;
mod session_state;
mod tcp_client;

pub use session_core::{AmSessCore, SessionCore, WeakSessCore};
pub use session_state::TransactionState;
pub use tcp_client::TcpClient;
