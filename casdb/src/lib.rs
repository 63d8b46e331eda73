//! Synchronous native rust database driver for CAS (Common Application Server)
//! brokers.
//!
//! `casdb` provides a lean rust-API for talking to a database through its CAS
//! broker: a rendezvous/login handshake negotiates a worker connection, after
//! which SQL statements are executed and their results streamed back over a
//! length-prefixed binary protocol.
//!
//! ```rust,no_run
//! # use casdb::{CasResult, Session};
//! # fn main() -> CasResult<()> {
//! let session = Session::new("cas://public:@localhost:33000/demodb")?;
//! for row in session.query("select * from t")? {
//!     let row = row?;
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]

pub use casdb_impl::conn::{ConnState, ConnectParams, ConnectParamsBuilder, IntoConnectParams, SessionStatistics};
pub use casdb_impl::error::{CasError, CasResult, StateError};
pub use casdb_impl::protocol::packet::BrokerInfo;
pub use casdb_impl::query::{CasValue, ColumnMetadata, QueryHandle, Row, TypeCode};
pub use casdb_impl::result_set::ResultSet;
pub use casdb_impl::session::Session;

/// Default number of tuples requested per `fetch` roundtrip.
pub use casdb_impl::DEFAULT_FETCH_SIZE;
