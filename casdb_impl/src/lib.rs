//! Common implementation of `casdb`; not for direct use.
//!
//! This crate implements the wire protocol of a CAS (Common Application Server)
//! broker: the rendezvous/login handshake, the length-prefixed framing and packet
//! codec, the session state machine with its single-in-flight-request discipline, the
//! query handle/fetch lifecycle, and an advisory response cache. See the `casdb`
//! crate for the consumer-facing API.

#[macro_use]
extern crate log;

pub mod cache;
pub mod conn;
pub mod error;
pub mod protocol;
pub mod query;
pub mod result_set;
pub mod session;

pub use error::{CasError, CasResult};
pub use session::Session;

/// Default number of tuples requested per `fetch` roundtrip (spec §4.2).
pub const DEFAULT_FETCH_SIZE: i32 = 100;
