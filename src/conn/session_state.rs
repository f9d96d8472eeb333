use crate::protocol::parts::option_value::OptionValue;
use crate::protocol::parts::transaction_flags::{TaFlagId, TransactionFlags};

// What the server has told us about the session so far, folded together
// from all TRANSACTION_FLAGS parts. Fields that the server has not
// reported yet stay None.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub ta_state: TransactionState,
    pub isolation_level: Option<u8>,
    pub ddl_commit_mode: Option<bool>,
    pub read_only: bool,
    pub dead: bool,
}

impl SessionState {
    pub fn update(&mut self, flags: TransactionFlags) {
        for (id, value) in flags {
            match id {
                TaFlagId::Committed if is_set(&value) => {
                    self.ta_state = TransactionState::Committed;
                }
                TaFlagId::RolledBack if is_set(&value) => {
                    self.ta_state = TransactionState::RolledBack;
                }
                TaFlagId::WriteTransactionStarted if is_set(&value) => {
                    self.ta_state = TransactionState::WriteTransaction;
                }
                TaFlagId::NoWriteTransactionStarted if is_set(&value) => {
                    self.ta_state = TransactionState::ReadTransaction;
                }
                TaFlagId::SessionClosing => {
                    self.dead = is_set(&value);
                }
                TaFlagId::NewIsolationLevel => {
                    if let OptionValue::INT(level) = value {
                        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                        {
                            self.isolation_level = Some(level as u8);
                        }
                    }
                }
                TaFlagId::DdlCommitModeChanged => {
                    self.ddl_commit_mode = Some(is_set(&value));
                }
                TaFlagId::ReadOnly => {
                    self.read_only = is_set(&value);
                }
                id => {
                    trace!("transaction flag {:?} = {} not tracked", id, value);
                }
            }
        }
    }
}

fn is_set(value: &OptionValue) -> bool {
    matches!(value, OptionValue::BOOLEAN(true))
}

/// The transaction state of a session, as last reported by the server.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransactionState {
    /// No transaction-state report received yet.
    #[default]
    Initial,
    /// The last transaction was rolled back.
    RolledBack,
    /// The last transaction was committed.
    Committed,
    /// A read transaction is open.
    ReadTransaction,
    /// A write transaction is open.
    WriteTransaction,
}

#[cfg(test)]
mod tests {
    use super::{SessionState, TransactionState};
    use crate::protocol::parts::option_value::OptionValue;
    use crate::protocol::parts::transaction_flags::{TaFlagId, TransactionFlags};

    #[test]
    fn flags_fold_into_the_state() {
        let mut state = SessionState::default();
        assert_eq!(state.ta_state, TransactionState::Initial);
        assert_eq!(state.isolation_level, None);

        let mut flags = TransactionFlags::default();
        flags.set_value(TaFlagId::Committed, OptionValue::BOOLEAN(true));
        state.update(flags);
        assert_eq!(state.ta_state, TransactionState::Committed);
        assert!(!state.dead);

        let mut flags = TransactionFlags::default();
        flags.set_value(TaFlagId::RolledBack, OptionValue::BOOLEAN(true));
        flags.set_value(TaFlagId::NewIsolationLevel, OptionValue::INT(3));
        state.update(flags);
        assert_eq!(state.ta_state, TransactionState::RolledBack);
        assert_eq!(state.isolation_level, Some(3));
    }

    #[test]
    fn a_false_flag_does_not_change_the_transaction_state() {
        let mut state = SessionState::default();
        let mut flags = TransactionFlags::default();
        flags.set_value(TaFlagId::Committed, OptionValue::BOOLEAN(false));
        state.update(flags);
        assert_eq!(state.ta_state, TransactionState::Initial);
    }

    #[test]
    fn session_closing_marks_the_state_dead() {
        let mut state = SessionState::default();
        let mut flags = TransactionFlags::default();
        flags.set_value(TaFlagId::SessionClosing, OptionValue::BOOLEAN(true));
        state.update(flags);
        assert!(state.dead);
    }
}
