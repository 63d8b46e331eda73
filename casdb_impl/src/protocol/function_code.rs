//! Numeric function codes that select the broker operation for a request frame.
//!
//! The only function code spec.md fixes literally is close-database = 7 (see the
//! "close database" end-to-end scenario). The remaining values are assigned a
//! self-consistent enumeration around that one fixed point; see `DESIGN.md`.

/// One byte, written immediately after the CAS info in every request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    ClientInfoExchange = 1,
    OpenDatabase = 2,
    GetEngineVersion = 4,
    ExecuteQuery = 5,
    BatchExecuteNoQuery = 6,
    CloseDatabase = 7,
    Fetch = 9,
    CloseQuery = 10,
    SetAutoCommitMode = 12,
    Commit = 13,
    Rollback = 14,
}

impl FunctionCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
