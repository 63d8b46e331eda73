//! The public session façade.
//!
//! Grounded on `hdbconnect_impl/src/sync/connection.rs`: a cheaply-`Clone`-able handle
//! (`Arc<Mutex<ConnectionCore>>`) whose methods take `&self` and serialize through the
//! mutex, rather than requiring `&mut self` everywhere.

use crate::conn::connection_core::ConnectionCore;
use crate::conn::params::{ConnectParams, IntoConnectParams};
use crate::conn::statistics::SessionStatistics;
use crate::error::CasResult;
use crate::protocol::packet::BrokerInfo;
use crate::query::Row;
use crate::result_set::ResultSet;
use std::sync::{Arc, Mutex};

/// An open (or not-yet-opened) session against a CAS broker.
///
/// ```rust,no_run
/// # use casdb_impl::session::Session;
/// # use casdb_impl::error::CasResult;
/// # fn main() -> CasResult<()> {
/// let session = Session::new("cas://public:@localhost:33000/demodb")?;
/// for row in session.query("select 1 from dual")? {
///     let row = row?;
///     println!("{row:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    core: Arc<Mutex<ConnectionCore>>,
}

impl Session {
    /// Opens a new session, running the full rendezvous + login handshake before
    /// returning.
    ///
    /// # Errors
    /// `CasError::Validation` if `params` does not resolve to valid connection
    /// parameters; `CasError::Transport` or `CasError::Server` if the handshake fails.
    pub fn new<P: IntoConnectParams>(params: P) -> CasResult<Self> {
        Self::with_params(params.into_connect_params()?)
    }

    /// Opens a new session from an already-built [`ConnectParams`].
    pub fn with_params(params: ConnectParams) -> CasResult<Self> {
        let mut core = ConnectionCore::new(params);
        core.open()?;
        Ok(Self {
            core: Arc::new(Mutex::new(core)),
        })
    }

    /// Runs a SQL statement that returns rows.
    ///
    /// On a cache hit the returned `ResultSet` iterates only the cached first page;
    /// on a miss it streams further pages from the server transparently (spec §4.4,
    /// §4.5).
    ///
    /// # Errors
    /// `CasError::State` if a query is already pending on this session;
    /// `CasError::Server` if the broker rejects the statement.
    pub fn query<S: AsRef<str>>(&self, sql: S) -> CasResult<ResultSet> {
        let outcome = {
            let mut core = self.core.lock().expect("connection core mutex poisoned");
            core.execute_query(sql.as_ref())?
        };
        Ok(match outcome.handle {
            Some(handle) => {
                ResultSet::new(Arc::clone(&self.core), handle, outcome.columns, outcome.rows)
            }
            None => ResultSet::cached(outcome.columns, outcome.rows, Arc::clone(&self.core)),
        })
    }

    /// Retrieves the database engine's version string.
    pub fn engine_version(&self) -> CasResult<String> {
        self.core
            .lock()
            .expect("connection core mutex poisoned")
            .engine_version()
    }

    /// Schema introspection is out of scope for this crate (spec §1 Non-goals):
    /// always fails with `CasError::NotImplemented`.
    pub fn get_schema(&self) -> CasResult<()> {
        self.core.lock().expect("connection core mutex poisoned").get_schema()
    }

    /// Runs statements that produce no rows, returning each statement's affected-row
    /// count in order.
    ///
    /// # Errors
    /// `CasError::State` if a query is already pending; `CasError::Server` if the
    /// broker rejects any statement.
    pub fn batch_execute(&self, statements: &[String]) -> CasResult<Vec<i32>> {
        self.core
            .lock()
            .expect("connection core mutex poisoned")
            .batch_execute(statements)
    }

    /// Equivalent to `set_autocommit(false)` (spec §4.3).
    pub fn begin_transaction(&self) -> CasResult<()> {
        self.set_autocommit(false)
    }

    /// Changes auto-commit mode. A no-op, with zero wire traffic, if already in the
    /// requested mode.
    pub fn set_autocommit(&self, on: bool) -> CasResult<()> {
        self.core
            .lock()
            .expect("connection core mutex poisoned")
            .set_autocommit(on)
    }

    pub fn is_autocommit(&self) -> bool {
        self.core.lock().expect("connection core mutex poisoned").is_autocommit()
    }

    /// A no-op, with zero wire traffic, when auto-commit is on.
    pub fn commit(&self) -> CasResult<()> {
        self.core.lock().expect("connection core mutex poisoned").commit()
    }

    /// A no-op, with zero wire traffic, when auto-commit is on.
    pub fn rollback(&self) -> CasResult<()> {
        self.core.lock().expect("connection core mutex poisoned").rollback()
    }

    /// Closes every open query handle (best-effort) and then the session itself.
    pub fn close(&self) -> CasResult<()> {
        self.core.lock().expect("connection core mutex poisoned").close()
    }

    /// A snapshot of this session's cumulative wire activity.
    pub fn statistics(&self) -> SessionStatistics {
        self.core.lock().expect("connection core mutex poisoned").statistics()
    }

    /// The immutable broker info block returned at handshake end.
    pub fn broker_info(&self) -> Option<BrokerInfo> {
        self.core.lock().expect("connection core mutex poisoned").broker_info()
    }
}
