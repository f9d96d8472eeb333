use crate::protocol::parts::option_value::OptionValue;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt::Debug;
use std::io;

// Option ids travel as a single byte; each part type maps that byte onto
// its own id enum, with a catch-all for ids the client does not know.
pub trait OptionId: Sized {
    fn from_wire(id: u8) -> Self;
    fn wire_id(&self) -> u8;
}

// The count-prefixed list of (id, type, value) triples that several parts
// share: STATEMENT_CONTEXT, TRANSACTION_FLAGS, TOPOLOGY_INFORMATION,
// CONNECT_OPTIONS, and CLIENT_CONTEXT. The argument count of the enclosing
// part is the number of triples. Entries keep their wire order; ids are
// unique within one list.
#[derive(Clone, Debug)]
pub struct OptionPart<T>(Vec<(T, OptionValue)>);

impl<T> Default for OptionPart<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: OptionId + Debug + PartialEq> OptionPart<T> {
    pub fn set_value(&mut self, id: T, value: OptionValue) {
        match self.0.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => self.0[index].1 = value,
            None => self.0.push((id, value)),
        }
    }

    pub fn value(&self, id: &T) -> Option<&OptionValue> {
        self.0
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    // Wire length of all triples: one id byte plus the typed value each.
    pub fn wire_size(&self) -> usize {
        self.0.iter().map(|(_, value)| 1 + value.size()).sum()
    }

    pub fn emit(&self, w: &mut dyn io::Write) -> io::Result<()> {
        for (id, value) in &self.0 {
            w.write_u8(id.wire_id())?;
            value.emit(w)?;
        }
        Ok(())
    }

    pub fn parse(count: usize, rdr: &mut dyn io::Read) -> io::Result<Self> {
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let id = T::from_wire(rdr.read_u8()?);
            let value = OptionValue::parse(rdr)?;
            trace!("parsed option {:?} = {}", id, value);
            entries.push((id, value));
        }
        Ok(Self(entries))
    }
}

impl<T> IntoIterator for OptionPart<T> {
    type Item = (T, OptionValue);
    type IntoIter = std::vec::IntoIter<(T, OptionValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: Debug> std::fmt::Display for OptionPart<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (id, value) in &self.0 {
            writeln!(f, "{id:?}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionId, OptionPart};
    use crate::protocol::parts::option_value::OptionValue;

    #[derive(Clone, Debug, PartialEq)]
    enum TestId {
        Alpha,
        Beta,
        Other(u8),
    }
    impl OptionId for TestId {
        fn from_wire(id: u8) -> Self {
            match id {
                1 => Self::Alpha,
                2 => Self::Beta,
                id => Self::Other(id),
            }
        }
        fn wire_id(&self) -> u8 {
            match *self {
                Self::Alpha => 1,
                Self::Beta => 2,
                Self::Other(id) => id,
            }
        }
    }

    #[test]
    fn option_list_round_trip_with_overwrite() {
        let mut part = OptionPart::<TestId>::default();
        part.set_value(TestId::Alpha, OptionValue::INT(5));
        part.set_value(TestId::Beta, OptionValue::BOOLEAN(true));
        part.set_value(TestId::Alpha, OptionValue::INT(7));
        assert_eq!(part.len(), 2);

        let mut buf = Vec::new();
        part.emit(&mut buf).unwrap();
        assert_eq!(buf.len(), part.wire_size());

        let parsed = OptionPart::<TestId>::parse(2, &mut &buf[..]).unwrap();
        assert_eq!(parsed.value(&TestId::Alpha), Some(&OptionValue::INT(7)));
        assert_eq!(parsed.value(&TestId::Beta), Some(&OptionValue::BOOLEAN(true)));
        assert_eq!(parsed.value(&TestId::Other(9)), None);
    }
}
