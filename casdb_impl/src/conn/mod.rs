//! Connection parameters, the socket abstraction, and the session core.

pub mod connection_core;
pub mod params;
pub mod statistics;
pub mod tcp_client;

pub use connection_core::ConnState;
pub use params::{ConnectParams, ConnectParamsBuilder, IntoConnectParams};
pub use statistics::SessionStatistics;
