//! The public, iterable view over an open query handle.
//!
//! Grounded on `hdbconnect_impl/src/base/rs_core.rs` (`Drop`-based best-effort close)
//! and `hdbconnect_impl/src/sync/resultset.rs` (the `Iterator` façade, silently
//! fetching further pages on demand).

use crate::conn::connection_core::ConnectionCore;
use crate::error::CasResult;
use crate::query::{ColumnMetadata, Row};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A streamed view over the rows of one query.
///
/// Further pages are fetched transparently as the buffered rows run out; iterating
/// can therefore fail partway through, which is why `Iterator::Item` is `CasResult<Row>`
/// rather than a bare `Row`.
#[derive(Debug)]
pub struct ResultSet {
    core: Arc<Mutex<ConnectionCore>>,
    handle: i32,
    columns: Vec<ColumnMetadata>,
    buffer: VecDeque<Row>,
    closed: bool,
}

impl ResultSet {
    pub(crate) fn new(
        core: Arc<Mutex<ConnectionCore>>,
        handle: i32,
        columns: Vec<ColumnMetadata>,
        first_page: Vec<Row>,
    ) -> Self {
        Self {
            core,
            handle,
            columns,
            buffer: first_page.into(),
            closed: false,
        }
    }

    /// A result set backed by a cache hit: no server-side handle exists, so once the
    /// buffered first page is drained there is nothing further to fetch or close
    /// (spec §4.5: "returns a null handle... the cache is intended for small result
    /// sets only").
    pub(crate) fn cached(columns: Vec<ColumnMetadata>, first_page: Vec<Row>, core: Arc<Mutex<ConnectionCore>>) -> Self {
        Self {
            core,
            handle: 0,
            columns,
            buffer: first_page.into(),
            closed: true,
        }
    }

    /// The server-assigned handle backing this result set.
    pub fn handle(&self) -> i32 {
        self.handle
    }

    /// Column descriptors, in the order values appear within each row.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Removes the next row, silently fetching a further page from the server if the
    /// local buffer is empty.
    ///
    /// # Errors
    /// Any `CasError` the underlying `fetch` can produce.
    pub fn next_row(&mut self) -> CasResult<Option<Row>> {
        if let Some(row) = self.buffer.pop_front() {
            return Ok(Some(row));
        }
        if self.closed {
            return Ok(None);
        }
        let more = {
            let mut core = self.core.lock().expect("connection core mutex poisoned");
            core.fetch(self.handle)?
        };
        if more.is_empty() {
            return Ok(None);
        }
        self.buffer.extend(more);
        Ok(self.buffer.pop_front())
    }

    /// Explicitly releases the server-side handle. Called automatically on drop if
    /// not called explicitly.
    pub fn close(mut self) -> CasResult<()> {
        self.close_mut()
    }

    fn close_mut(&mut self) -> CasResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut core = self.core.lock().expect("connection core mutex poisoned");
        core.close_query(self.handle)
    }
}

impl Iterator for ResultSet {
    type Item = CasResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close_mut() {
                warn!("best-effort close of result set {} failed: {e}", self.handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::params::ConnectParams;
    use crate::query::{CasValue, TypeCode};

    fn core() -> Arc<Mutex<ConnectionCore>> {
        let params = ConnectParams::builder()
            .host("localhost")
            .user("public")
            .password("")
            .build()
            .unwrap();
        Arc::new(Mutex::new(ConnectionCore::new(params)))
    }

    fn columns() -> Vec<ColumnMetadata> {
        vec![ColumnMetadata {
            name: "n".into(),
            type_code: TypeCode::Int,
        }]
    }

    #[test]
    fn drains_buffered_first_page_without_touching_the_connection() {
        let rows = vec![
            Row(vec![CasValue::Int(1)]),
            Row(vec![CasValue::Int(2)]),
        ];
        let mut rs = ResultSet::new(core(), 42, columns(), rows);
        assert_eq!(rs.next().unwrap().unwrap().values()[0], CasValue::Int(1));
        assert_eq!(rs.next().unwrap().unwrap().values()[0], CasValue::Int(2));
    }

    #[test]
    fn empty_first_page_with_no_handle_backing_ends_immediately() {
        let mut rs = ResultSet::new(core(), 0, columns(), vec![]);
        rs.closed = true; // simulates a handle that can never be fetched further
        assert!(rs.next().is_none());
    }
}
