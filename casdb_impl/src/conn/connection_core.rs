//! The session state machine and the single-in-flight-request discipline.
//!
//! Grounded on `hdbconnect_impl/src/conn/connection_core.rs` (owns the socket, drives
//! the handshake, tracks session state, best-effort `Drop` cleanup) and
//! `hdbconnect_impl/src/conn/am_conn_core.rs` (shared wrapper serializing access).
//! The teacher's several loosely-related booleans are replaced here by the single
//! `ConnState` enum the spec's own redesign note (§9) calls for.

use super::params::ConnectParams;
use super::statistics::SessionStatistics;
use super::tcp_client::{self, CasTransport};
use crate::cache::{CachedResult, ResponseCache};
use crate::error::{CasError, CasResult, StateError};
use crate::protocol::frame::{FrameReader, FrameWriter};
use crate::protocol::packet::{self, BrokerInfo};
use crate::query::{ColumnMetadata, QueryHandle, Row};
use std::io::{Read, Write};

/// The session lifecycle, replacing the several booleans a naive port would carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Closed,
    RendezvousPending,
    LoginPending,
    Idle,
    QueryPending,
    Closing,
}

/// The result of `execute`: either a fresh handle with its first page, or (on a cache
/// hit) no handle at all, signalling that no further page can be fetched.
pub struct ExecuteOutcome {
    pub handle: Option<i32>,
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
}

/// Owns the socket, the session identity, and the list of open query handles; drives
/// the handshake and serializes data-plane operations.
pub struct ConnectionCore {
    params: ConnectParams,
    state: ConnState,
    transport: Option<Box<dyn CasTransport>>,
    reader: FrameReader,
    cas_info: [u8; 4],
    session_id: i32,
    broker_info: Option<BrokerInfo>,
    autocommit: bool,
    handles: Vec<QueryHandle>,
    cache: ResponseCache,
    stats: SessionStatistics,
}

/// Hand-written rather than derived: `dyn CasTransport` has no `Debug` impl of its own
/// (a trait object doesn't automatically gain one just because its trait requires
/// `Debug` as a supertrait), so the transport is rendered as present/absent only.
impl std::fmt::Debug for ConnectionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCore")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("transport", &self.transport.is_some())
            .field("cas_info", &self.cas_info)
            .field("session_id", &self.session_id)
            .field("broker_info", &self.broker_info)
            .field("autocommit", &self.autocommit)
            .field("handles", &self.handles)
            .field("cache", &self.cache)
            .field("stats", &self.stats)
            .finish()
    }
}

const INITIAL_CAS_INFO: [u8; 4] = [0, 0xFF, 0xFF, 0xFF];

impl ConnectionCore {
    pub fn new(params: ConnectParams) -> Self {
        let cache = ResponseCache::new(params.cache_timeout_ms());
        let autocommit = params.autocommit();
        Self {
            params,
            state: ConnState::Closed,
            transport: None,
            reader: FrameReader::new(),
            cas_info: INITIAL_CAS_INFO,
            session_id: 0,
            broker_info: None,
            autocommit,
            handles: Vec::new(),
            cache,
            stats: SessionStatistics::default(),
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.stats
    }

    /// The immutable broker info block returned at handshake end, or `None` before a
    /// successful `open()` (spec §3).
    pub fn broker_info(&self) -> Option<BrokerInfo> {
        self.broker_info
    }

    pub fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    /// Column descriptors for an open handle, or an empty list if it is not known.
    pub fn open_handle_columns(&self, handle: i32) -> Vec<crate::query::ColumnMetadata> {
        self.handles
            .iter()
            .find(|h| h.handle() == handle)
            .map(|h| h.columns().to_vec())
            .unwrap_or_default()
    }

    /// Drives the handshake: rendezvous at the broker port, then login at the
    /// assigned connection port.
    ///
    /// # Errors
    /// `CasError::State` if a connect is already pending; `CasError::Transport` for
    /// socket failures after the configured retries are exhausted; `CasError::Server`
    /// if the broker rejects the login.
    pub fn open(&mut self) -> CasResult<()> {
        if self.state != ConnState::Closed {
            return Err(CasError::State(StateError::ConnectPending));
        }
        self.state = ConnState::RendezvousPending;

        let result = (|| {
            let new_port = self.rendezvous_with_retries()?;

            self.state = ConnState::LoginPending;
            let addr = format!("{}:{}", self.params.host(), new_port);
            debug!("opening data connection to {}", addr);
            let socket = tcp_client::connect(&addr)?;
            self.transport = Some(Box::new(socket));
            self.reader = FrameReader::new();

            let writer = packet::encode_open_database(
                self.params.database(),
                self.params.user(),
                self.params.password().unsecure(),
            );
            let (cas_info, body) = self.roundtrip(writer)?;
            packet::decode_open_database(cas_info, &body)
        })();

        // Any failed handshake step leaves the session closed and retryable, rather
        // than stuck at whichever pending state the failure interrupted.
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.transport = None;
                self.state = ConnState::Closed;
                return Err(e);
            }
        };

        self.cas_info = response.cas_info;
        self.session_id = response.session_id;
        self.autocommit = response.cas_info[3] & 1 != 0;
        debug!(
            "session {} opened, broker protocol version {}",
            self.session_id, response.broker_info.protocol_version
        );
        self.broker_info = Some(response.broker_info);
        self.state = ConnState::Idle;
        Ok(())
    }

    fn rendezvous_with_retries(&mut self) -> CasResult<i32> {
        let addr = format!("{}:{}", self.params.host(), self.params.port());
        let mut last_err = None;
        for attempt in 1..=self.params.max_connection_retry_count() {
            match self.rendezvous_once(&addr) {
                Ok(port) => return Ok(port),
                Err(e) => {
                    warn!("rendezvous attempt {attempt} failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("at least one attempt was made"))
    }

    fn rendezvous_once(&mut self, addr: &str) -> CasResult<i32> {
        trace!("rendezvous with broker at {addr}");
        let mut socket = tcp_client::connect(addr)?;
        socket.set_read_timeout(self.params.login_timeout())?;
        let mut reader = FrameReader::new();
        let writer = packet::encode_client_info_exchange(self.params.user());
        let frame = writer.finish(self.cas_info);
        socket.write_all(&frame)?;
        let (_, body) = Self::read_one_frame(&mut socket, &mut reader)?;
        packet::decode_client_info_exchange(&body)
    }

    /// Reads until a complete frame is assembled. A socket read that times out (per
    /// the `login_timeout`/`query_timeout` deadline set on the transport beforehand)
    /// surfaces as `CasError::Timeout` rather than the generic transport error (spec
    /// §5).
    fn read_one_frame(
        transport: &mut dyn CasTransport,
        reader: &mut FrameReader,
    ) -> CasResult<([u8; 4], Vec<u8>)> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(frame) = reader.take_frame()? {
                return Ok(frame);
            }
            match transport.read(&mut buf) {
                Ok(0) => {
                    return Err(CasError::Protocol(
                        "connection closed before a complete frame arrived".to_string(),
                    ))
                }
                Ok(n) => reader.feed(&buf[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(CasError::Timeout)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Writes one request frame and blocks for the matching response frame, updating
    /// the most-recently-received CAS info and the running statistics.
    ///
    /// The `login_timeout` deadline applies while still logging in; `query_timeout`
    /// applies to every later data-plane roundtrip. On a query timeout, the
    /// connection is torn down iff `disconnect_on_query_timeout` is set (spec §5).
    /// On any other terminal error (`CasError::is_terminal`: a transport failure or a
    /// protocol violation), the connection is always torn down (spec §4.3, §7) —
    /// unlike a `CasError::Server`, which leaves the session usable.
    fn roundtrip(&mut self, writer: FrameWriter) -> CasResult<([u8; 4], Vec<u8>)> {
        let timeout = if self.state == ConnState::LoginPending {
            self.params.login_timeout()
        } else {
            self.params.query_timeout()
        };
        let result = (move || {
            let transport = self
                .transport
                .as_mut()
                .ok_or_else(|| CasError::Protocol("no active connection".to_string()))?;
            transport.set_read_timeout(timeout)?;
            let frame = writer.finish(self.cas_info);
            transport.write_all(&frame)?;
            let sent = frame.len();
            let (cas_info, body) = Self::read_one_frame(transport.as_mut(), &mut self.reader)?;
            Ok((cas_info, body, sent))
        })();

        match result {
            Ok((cas_info, body, sent)) => {
                self.cas_info = cas_info;
                self.stats.record_roundtrip(sent, body.len());
                Ok((cas_info, body))
            }
            Err(CasError::Timeout) => {
                if self.state != ConnState::LoginPending && self.params.disconnect_on_query_timeout()
                {
                    warn!("query timed out, disconnecting per disconnect_on_query_timeout");
                    self.transport = None;
                    self.state = ConnState::Closed;
                }
                Err(CasError::Timeout)
            }
            Err(e) => {
                if e.is_terminal() {
                    warn!("terminal error on roundtrip, closing session: {e}");
                    self.transport = None;
                    self.state = ConnState::Closed;
                }
                Err(e)
            }
        }
    }

    fn enter_query_pending(&mut self) -> CasResult<()> {
        match self.state {
            ConnState::Idle => {
                self.state = ConnState::QueryPending;
                Ok(())
            }
            ConnState::QueryPending => Err(CasError::State(StateError::QueryPending)),
            _ => Err(CasError::State(StateError::ConnectPending)),
        }
    }

    fn leave_query_pending(&mut self) {
        if self.state == ConnState::QueryPending {
            self.state = ConnState::Idle;
        }
    }

    /// Runs a SQL statement that returns rows. Consults the response cache first; a
    /// hit returns a null handle (spec §4.5).
    ///
    /// # Errors
    /// `CasError::State` if a query is already pending; `CasError::Server` if the
    /// broker rejects the statement.
    pub fn execute_query(&mut self, sql: &str) -> CasResult<ExecuteOutcome> {
        if self.state == ConnState::QueryPending {
            return Err(CasError::State(StateError::QueryPending));
        }
        if let Some(cached) = self.cache.lookup(sql) {
            trace!("cache hit for query text");
            return Ok(ExecuteOutcome {
                handle: None,
                columns: cached.columns,
                rows: cached.rows,
            });
        }
        self.enter_query_pending()?;
        let result = (|| {
            let writer = packet::encode_execute_query(sql, self.autocommit);
            let (_, body) = self.roundtrip(writer)?;
            packet::decode_execute_query(&body)
        })();
        self.leave_query_pending();
        let response = result?;

        self.cache.insert(
            sql.to_string(),
            CachedResult {
                columns: response.columns.clone(),
                rows: response.rows.clone(),
            },
        );
        self.handles.push(QueryHandle::new(
            response.handle,
            response.total,
            response.rows.len() as i32,
            response.columns.clone(),
        ));
        Ok(ExecuteOutcome {
            handle: Some(response.handle),
            columns: response.columns,
            rows: response.rows,
        })
    }

    /// Retrieves the database engine's version string (spec §4.2).
    pub fn engine_version(&mut self) -> CasResult<String> {
        self.enter_query_pending()?;
        let result = (|| {
            let writer = packet::encode_get_engine_version();
            let (_, body) = self.roundtrip(writer)?;
            packet::decode_get_engine_version(&body)
        })();
        self.leave_query_pending();
        result
    }

    /// Schema introspection is treated as a single opaque request kind that this core
    /// does not implement (spec §1 Non-goals; spec §9 design notes on the source's
    /// `getSchema` stub).
    pub fn get_schema(&self) -> CasResult<()> {
        Err(CasError::NotImplemented("schema introspection"))
    }

    /// Runs statements that return no rows (e.g. DML), each with its own affected-row
    /// count.
    pub fn batch_execute(&mut self, statements: &[String]) -> CasResult<Vec<i32>> {
        self.enter_query_pending()?;
        let result = (|| {
            let writer = packet::encode_batch_execute(statements, self.autocommit);
            let (_, body) = self.roundtrip(writer)?;
            packet::decode_batch_execute(&body)
        })();
        self.leave_query_pending();
        result
    }

    /// Fetches the next page for `handle`. Completes with an empty page and no wire
    /// traffic once `current == total` (spec §4.4, §8).
    pub fn fetch(&mut self, handle: i32) -> CasResult<Vec<Row>> {
        let position = self
            .handles
            .iter()
            .position(|h| h.handle() == handle)
            .ok_or(CasError::State(StateError::NoActiveQuery))?;
        if self.handles[position].is_exhausted() {
            return Ok(Vec::new());
        }
        self.enter_query_pending()?;
        let start = self.handles[position].current() + 1;
        let columns = self.handles[position].columns().to_vec();
        let result = (|| {
            let writer =
                packet::encode_fetch(handle, start, crate::DEFAULT_FETCH_SIZE, true, 0);
            let (_, body) = self.roundtrip(writer)?;
            packet::decode_fetch(&body, &columns)
        })();
        self.leave_query_pending();
        let response = result?;
        self.handles[position].advance(response.tuple_count);
        Ok(response.rows)
    }

    /// Releases a server-side result set. Unlike the source this was ported from
    /// (which removed the handle before the server had confirmed the close), the
    /// handle is only dropped from the local list once the server has acknowledged it.
    pub fn close_query(&mut self, handle: i32) -> CasResult<()> {
        let Some(position) = self.handles.iter().position(|h| h.handle() == handle) else {
            return Ok(());
        };
        let writer = packet::encode_close_query(handle);
        let (_, body) = self.roundtrip(writer)?;
        packet::decode_close_query(&body)?;
        self.handles.remove(position);
        Ok(())
    }

    /// Changes auto-commit mode. A no-op, with zero bytes written, if already in the
    /// requested mode (spec §4.3).
    pub fn set_autocommit(&mut self, on: bool) -> CasResult<()> {
        if self.autocommit == on {
            return Ok(());
        }
        let writer = packet::encode_set_autocommit(on);
        let (_, body) = self.roundtrip(writer)?;
        packet::decode_set_autocommit(&body)?;
        self.autocommit = on;
        Ok(())
    }

    /// A no-op, with zero bytes written, when auto-commit is on (spec §4.3, §8).
    pub fn commit(&mut self) -> CasResult<()> {
        if self.autocommit {
            return Ok(());
        }
        let writer = packet::encode_commit();
        let (_, body) = self.roundtrip(writer)?;
        packet::decode_commit(&body)
    }

    /// A no-op, with zero bytes written, when auto-commit is on (spec §4.3, §8).
    pub fn rollback(&mut self) -> CasResult<()> {
        if self.autocommit {
            return Ok(());
        }
        let writer = packet::encode_rollback();
        let (_, body) = self.roundtrip(writer)?;
        packet::decode_rollback(&body)
    }

    /// Closes all open query handles (best-effort) and then the session itself.
    pub fn close(&mut self) -> CasResult<()> {
        if self.state == ConnState::Closed {
            return Ok(());
        }
        self.state = ConnState::Closing;
        for handle in self.handles.clone() {
            if let Err(e) = self.close_query(handle.handle()) {
                warn!("best-effort close of query handle {} failed: {e}", handle.handle());
            }
        }
        if self.transport.is_some() {
            let writer = packet::encode_close_database();
            let (_, body) = self.roundtrip(writer)?;
            packet::decode_close_database(&body)?;
        }
        self.transport = None;
        self.state = ConnState::Closed;
        Ok(())
    }
}

impl Drop for ConnectionCore {
    fn drop(&mut self) {
        if self.state != ConnState::Closed {
            if let Err(e) = self.close() {
                warn!("error while closing session during drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::FrameWriter as FW;
    use crate::query::{CasValue, ColumnMetadata, TypeCode};
    use std::io::{Cursor, Read, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct MockTransport {
        inbox: Cursor<Vec<u8>>,
        outbox: Arc<Mutex<Vec<u8>>>,
        always_times_out: bool,
        always_resets: bool,
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.always_times_out {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "mock read timeout",
                ));
            }
            if self.always_resets {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "mock connection reset",
                ));
            }
            self.inbox.read(buf)
        }
    }

    impl super::tcp_client::CasTransport for MockTransport {
        fn set_read_timeout(&mut self, _timeout: Option<std::time::Duration>) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outbox.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn params() -> ConnectParams {
        ConnectParams::builder()
            .host("localhost")
            .user("public")
            .password("")
            .build()
            .unwrap()
    }

    /// Builds an `Idle` core wired to a mock transport that yields `responses` on
    /// read and records everything written to `outbox`.
    fn core_with_mock(responses: Vec<u8>) -> (ConnectionCore, Arc<Mutex<Vec<u8>>>) {
        let outbox = Arc::new(Mutex::new(Vec::new()));
        let mut core = ConnectionCore::new(params());
        core.transport = Some(Box::new(MockTransport {
            inbox: Cursor::new(responses),
            outbox: Arc::clone(&outbox),
            always_times_out: false,
            always_resets: false,
        }));
        core.state = ConnState::Idle;
        (core, outbox)
    }

    fn core_with_timing_out_mock(params: ConnectParams) -> ConnectionCore {
        let mut core = ConnectionCore::new(params);
        core.transport = Some(Box::new(MockTransport {
            inbox: Cursor::new(Vec::new()),
            outbox: Arc::new(Mutex::new(Vec::new())),
            always_times_out: true,
            always_resets: false,
        }));
        core.state = ConnState::Idle;
        core
    }

    /// Wired to a mock transport whose reads always fail with a hard `io::Error`
    /// (distinct from a timeout), to exercise the `CasError::Transport` /
    /// `is_terminal()` path.
    fn core_with_resetting_mock() -> ConnectionCore {
        let mut core = ConnectionCore::new(params());
        core.transport = Some(Box::new(MockTransport {
            inbox: Cursor::new(Vec::new()),
            outbox: Arc::new(Mutex::new(Vec::new())),
            always_times_out: false,
            always_resets: true,
        }));
        core.state = ConnState::Idle;
        core
    }

    fn response_frame(cas_info: [u8; 4], body: FW) -> Vec<u8> {
        body.finish(cas_info)
    }

    #[test]
    fn second_connect_while_pending_is_rejected() {
        let mut core = ConnectionCore::new(params());
        core.state = ConnState::RendezvousPending;
        let err = core.open().unwrap_err();
        assert!(matches!(err, CasError::State(StateError::ConnectPending)));
    }

    #[test]
    fn second_query_while_pending_is_rejected() {
        let (mut core, _outbox) = core_with_mock(Vec::new());
        core.state = ConnState::QueryPending;
        let err = core.execute_query("select 1").unwrap_err();
        assert!(matches!(err, CasError::State(StateError::QueryPending)));
    }

    #[test]
    fn commit_with_autocommit_on_writes_nothing() {
        let (mut core, outbox) = core_with_mock(Vec::new());
        core.autocommit = true;
        core.commit().unwrap();
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn rollback_with_autocommit_on_writes_nothing() {
        let (mut core, outbox) = core_with_mock(Vec::new());
        core.autocommit = true;
        core.rollback().unwrap();
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn set_autocommit_is_idempotent_on_the_wire() {
        let (mut core, outbox) = core_with_mock(Vec::new());
        core.autocommit = true;
        core.set_autocommit(true).unwrap();
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn fetch_at_end_of_stream_emits_nothing() {
        let (mut core, outbox) = core_with_mock(Vec::new());
        core.handles.push(QueryHandle::new(1, 10, 10, vec![]));
        let rows = core.fetch(1).unwrap();
        assert!(rows.is_empty());
        assert!(outbox.lock().unwrap().is_empty());
    }

    #[test]
    fn fetch_unknown_handle_is_rejected() {
        let (mut core, _outbox) = core_with_mock(Vec::new());
        let err = core.fetch(999).unwrap_err();
        assert!(matches!(err, CasError::State(StateError::NoActiveQuery)));
    }

    #[test]
    fn fetch_advances_current_and_decodes_rows() {
        let columns = vec![ColumnMetadata {
            name: "n".into(),
            type_code: TypeCode::Int,
        }];
        let mut body = FW::new();
        body.write_i32(0); // response code
        body.write_i32(1); // tuple_count
        body.write_u8(0); // not null
        body.write_i32(42);
        let frame = response_frame([9, 9, 9, 9], body);

        let (mut core, _outbox) = core_with_mock(frame);
        core.handles.push(QueryHandle::new(7, 5, 4, columns));

        let rows = core.fetch(7).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values()[0], CasValue::Int(42));
        assert_eq!(core.handles[0].current(), 5);
    }

    #[test]
    fn close_query_on_unknown_handle_completes_quietly() {
        let (mut core, _outbox) = core_with_mock(Vec::new());
        assert!(core.close_query(123).is_ok());
    }

    #[test]
    fn engine_version_decodes_the_version_string() {
        let mut body = FW::new();
        body.write_i32(0); // response code
        body.write_cstr("10.1.0.0001");
        let frame = response_frame([0, 0xFF, 0xFF, 0xFF], body);

        let (mut core, _outbox) = core_with_mock(frame);
        assert_eq!(core.engine_version().unwrap(), "10.1.0.0001");
    }

    #[test]
    fn broker_info_is_unset_before_a_successful_open() {
        let core = ConnectionCore::new(params());
        assert!(core.broker_info().is_none());
    }

    #[test]
    fn broker_info_is_retained_after_a_successful_login() {
        let mut body = FW::new();
        body.write_i32(0);
        body.write_bytes(&[5, 0, 5, 0, 5, 0, 5, 0]);
        body.write_i32(3);
        let (cas_info, frame_body) = {
            let bytes = body.finish([0, 0xFF, 0xFF, 0xFF]);
            ([0u8, 0xFF, 0xFF, 0xFF], bytes[8..].to_vec())
        };
        let response = packet::decode_open_database(cas_info, &frame_body).unwrap();

        let (mut core, _outbox) = core_with_mock(Vec::new());
        core.broker_info = Some(response.broker_info);
        let info = core.broker_info().unwrap();
        assert_eq!(info.dbms_type, 5);
        assert_eq!(info.protocol_version, 5);
        assert!(info.statement_polling);
    }

    #[test]
    fn query_timeout_surfaces_as_timeout_error_and_leaves_session_usable() {
        let p = ConnectParams::builder()
            .host("localhost")
            .user("public")
            .password("")
            .query_timeout_ms(10)
            .build()
            .unwrap();
        let mut core = core_with_timing_out_mock(p);
        let err = core.execute_query("select 1").unwrap_err();
        assert!(matches!(err, CasError::Timeout));
        assert_eq!(core.state(), ConnState::Idle);
    }

    #[test]
    fn query_timeout_disconnects_when_configured_to() {
        let p = ConnectParams::builder()
            .host("localhost")
            .user("public")
            .password("")
            .query_timeout_ms(10)
            .disconnect_on_query_timeout(true)
            .build()
            .unwrap();
        let mut core = core_with_timing_out_mock(p);
        let err = core.execute_query("select 1").unwrap_err();
        assert!(matches!(err, CasError::Timeout));
        assert_eq!(core.state(), ConnState::Closed);
        assert!(core.transport.is_none());
    }

    #[test]
    fn get_schema_is_not_implemented() {
        let (core, _outbox) = core_with_mock(Vec::new());
        let err = core.get_schema().unwrap_err();
        assert!(matches!(err, CasError::NotImplemented(_)));
    }

    #[test]
    fn terminal_transport_error_during_a_query_closes_the_session() {
        let mut core = core_with_resetting_mock();
        let err = core.execute_query("select 1").unwrap_err();
        assert!(matches!(err, CasError::Transport { .. }));
        assert!(err.is_terminal());
        assert_eq!(core.state(), ConnState::Closed);
        assert!(core.transport.is_none());
    }

    #[test]
    fn server_error_during_a_query_leaves_the_session_usable() {
        let mut body = FW::new();
        body.write_i32(-1); // a negative response code the decoder surfaces as a server error
        body.write_i32(42); // error code
        body.write_cstr("bad statement");
        let frame = response_frame([0, 0xFF, 0xFF, 0xFF], body);

        let (mut core, _outbox) = core_with_mock(frame);
        let err = core.execute_query("not sql").unwrap_err();
        assert!(!err.is_terminal());
        assert_eq!(core.state(), ConnState::Idle);
        assert!(core.transport.is_some());
    }

    #[test]
    fn failed_handshake_leaves_the_session_closed_and_retryable() {
        // Nothing listens on this loopback port, so the connect attempt fails fast
        // with a real `CasError::Transport` rather than hanging.
        let p = ConnectParams::builder()
            .host("127.0.0.1")
            .port(1)
            .user("public")
            .password("")
            .max_connection_retry_count(1)
            .build()
            .unwrap();
        let mut core = ConnectionCore::new(p);

        let err = core.open().unwrap_err();
        assert!(matches!(err, CasError::Transport { .. }));
        assert_eq!(core.state(), ConnState::Closed);
        assert!(core.transport.is_none());

        // A session stuck at RendezvousPending/LoginPending could never open again;
        // retrying must fail the same way, not with `CasError::State`.
        let err = core.open().unwrap_err();
        assert!(matches!(err, CasError::Transport { .. }));
    }
}
