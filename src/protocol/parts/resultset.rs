use crate::conn::{session_core, AmSessCore, WeakSessCore};
use crate::protocol::argument::Argument;
use crate::protocol::part::Part;
use crate::protocol::part_attributes::PartAttributes;
use crate::protocol::partkind::PartKind;
use crate::protocol::parts::resultset_metadata::ResultSetMetadata;
use crate::protocol::parts::row::Row;
use crate::protocol::request::Request;
use crate::protocol::request_type::RequestType;
use crate::{ScnpError, ScnpResult};
use std::collections::VecDeque;
use std::sync::Arc;

/// A forward-only cursor over the rows of a query result.
///
/// The first batch of rows arrives with the EXECUTE reply; further batches
/// are fetched on demand in `fetch_size`-row portions. The server signals
/// exhaustion through the part attributes; afterwards fetch calls drain the
/// local buffer and then return nothing.
#[derive(Debug)]
pub struct ResultSet {
    am_sess: WeakSessCore,
    metadata: Arc<ResultSetMetadata>,
    resultset_id: u64,
    attributes: PartAttributes,
    row_buffer: VecDeque<Row>,
    fetch_size: u32,
    explicitly_closed: bool,
}

impl ResultSet {
    pub(crate) fn new(
        am_sess: &AmSessCore,
        attributes: PartAttributes,
        resultset_id: u64,
        metadata: Arc<ResultSetMetadata>,
        rows: Vec<Row>,
        fetch_size: u32,
    ) -> Self {
        Self {
            am_sess: WeakSessCore::new(am_sess),
            metadata,
            resultset_id,
            attributes,
            row_buffer: rows.into(),
            fetch_size,
            explicitly_closed: false,
        }
    }

    // for procedure output parameters: a local one-row result set that has
    // nothing left to fetch
    pub(crate) fn new_complete(
        am_sess: &AmSessCore,
        metadata: Arc<ResultSetMetadata>,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            am_sess: WeakSessCore::new(am_sess),
            metadata,
            resultset_id: 0,
            attributes: PartAttributes::new(0b_0001_0001),
            row_buffer: rows.into(),
            fetch_size: crate::DEFAULT_FETCH_SIZE,
            explicitly_closed: false,
        }
    }

    /// Access to the column metadata.
    pub fn metadata(&self) -> &ResultSetMetadata {
        &self.metadata
    }

    /// Changes the number of rows requested per FETCH roundtrip.
    pub fn set_fetch_size(&mut self, fetch_size: u32) {
        self.fetch_size = fetch_size.max(1);
    }

    /// Removes the next row and returns it, or `None` when the result set is
    /// exhausted.
    pub fn fetch_one(&mut self) -> ScnpResult<Option<Row>> {
        self.assert_open()?;
        if self.row_buffer.is_empty() && !self.is_complete() {
            self.fetch_next_batch()?;
        }
        Ok(self.row_buffer.pop_front())
    }

    /// Removes and returns up to `k` rows.
    pub fn fetch_many(&mut self, k: usize) -> ScnpResult<Vec<Row>> {
        self.assert_open()?;
        let mut rows = Vec::<Row>::with_capacity(k.min(1024));
        while rows.len() < k {
            if self.row_buffer.is_empty() {
                if self.is_complete() {
                    break;
                }
                self.fetch_next_batch()?;
                if self.row_buffer.is_empty() {
                    break;
                }
            }
            let missing = k - rows.len();
            rows.extend(self.row_buffer.drain(..missing.min(self.row_buffer.len())));
        }
        Ok(rows)
    }

    /// Removes and returns all remaining rows.
    pub fn fetch_all(&mut self) -> ScnpResult<Vec<Row>> {
        self.assert_open()?;
        let mut rows = Vec::<Row>::from(std::mem::take(&mut self.row_buffer));
        while !self.is_complete() {
            self.fetch_next_batch()?;
            if self.row_buffer.is_empty() && !self.is_complete() {
                // empty batch without a closed flag
                break;
            }
            rows.extend(self.row_buffer.drain(..));
        }
        Ok(rows)
    }

    /// Closes the result set on the server, unless the server closed it
    /// already. Further fetch calls fail.
    pub fn close(&mut self) -> ScnpResult<()> {
        if self.explicitly_closed {
            return Ok(());
        }
        self.explicitly_closed = true;
        if !self.attributes.resultset_is_closed() && !self.attributes.is_last_packet() {
            let am_sess = self.am_sess.upgrade()?;
            let mut core = session_core::lock(&am_sess)?;
            let mut request = Request::new(RequestType::CloseResultSet, 0);
            request.push(Part::new(
                PartKind::ResultSetId,
                Argument::ResultSetId(self.resultset_id),
            ));
            core.roundtrip(request, &am_sess, None, None)?;
        }
        Ok(())
    }

    fn assert_open(&self) -> ScnpResult<()> {
        if self.explicitly_closed {
            Err(ScnpError::usage("fetch from a closed result set"))
        } else {
            Ok(())
        }
    }

    // No more rows on the server: final fetch reply seen, or the server
    // closed the result set on its own.
    fn is_complete(&self) -> bool {
        self.attributes.is_last_packet() || self.attributes.resultset_is_closed()
    }

    fn fetch_next_batch(&mut self) -> ScnpResult<()> {
        trace!(
            "fetching next {} rows of result set {}",
            self.fetch_size,
            self.resultset_id
        );
        let am_sess = self.am_sess.upgrade()?;
        let mut core = session_core::lock(&am_sess)?;
        let mut request = Request::new(RequestType::FetchNext, 0);
        request.push(Part::new(
            PartKind::ResultSetId,
            Argument::ResultSetId(self.resultset_id),
        ));
        #[allow(clippy::cast_possible_wrap)]
        request.push(Part::new(
            PartKind::FetchSize,
            Argument::FetchSize(self.fetch_size as i32),
        ));

        let mut reply = core.roundtrip(request, &am_sess, Some(&self.metadata), None)?;
        match reply.parts.take_first_of_kind(PartKind::ResultSet) {
            Some(part) => {
                self.attributes = part.attributes();
                if let Argument::Rows(rows) = part.into_arg() {
                    self.row_buffer.extend(rows);
                }
            }
            None => {
                return Err(ScnpError::protocol(
                    "fetch",
                    "FETCH_NEXT reply carries no RESULT_SET part",
                ));
            }
        }
        Ok(())
    }
}

impl Drop for ResultSet {
    // inform the server in case the result set is not yet closed, ignore all errors
    fn drop(&mut self) {
        if !self.explicitly_closed && !self.is_complete() {
            if let Err(e) = self.close() {
                debug!("closing result set {} on drop failed: {e}", self.resultset_id);
            }
        }
    }
}
