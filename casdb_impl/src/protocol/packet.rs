//! One encoder/decoder pair per broker operation.
//!
//! Grounded on the teacher's `Part` enum (`hdbconnect_impl/src/protocol/part.rs`):
//! there, one variant per wire entity each knows its own `emit`/`parse`. This
//! protocol's request/response shape per operation is flat and fixed rather than a
//! variable bag of parts, so the dispatch point is simply a free function per
//! [`FunctionCode`](super::function_code::FunctionCode) instead of an enum match.

use super::frame::{BodyReader, FrameWriter};
use super::function_code::FunctionCode;
use crate::error::{CasError, CasResult};
use crate::query::{CasValue, ColumnMetadata, Row, TypeCode};

const FIELD_LEN: usize = 32;

fn begin(code: FunctionCode) -> FrameWriter {
    let mut w = FrameWriter::new();
    w.write_u8(code.as_u8());
    w
}

/// Reads the common response tail (response code, and on failure the error code and
/// message). Returns `Ok(())` and leaves the reader positioned right after the
/// response code when the call succeeded.
fn expect_success(r: &mut BodyReader) -> CasResult<()> {
    let response_code = r.read_i32()?;
    if response_code < 0 {
        let error_code = r.read_i32()?;
        let message = r.read_cstr()?;
        let message = if message.is_empty() {
            super::error_code::resolve_message(error_code)
        } else {
            message
        };
        return Err(CasError::Server {
            code: error_code,
            message,
        });
    }
    Ok(())
}

// --- client info exchange ------------------------------------------------------

pub fn encode_client_info_exchange(client_id: &str) -> FrameWriter {
    let mut w = begin(FunctionCode::ClientInfoExchange);
    w.write_cstr(client_id);
    w
}

pub fn decode_client_info_exchange(body: &[u8]) -> CasResult<i32> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    r.read_i32()
}

// --- open database ---------------------------------------------------------------

/// Immutable snapshot of the 8-byte broker info block returned at handshake end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerInfo {
    pub dbms_type: u8,
    pub statement_polling: bool,
    pub protocol_version: u8,
}

impl BrokerInfo {
    fn parse(bytes: &[u8; 8]) -> Self {
        Self {
            dbms_type: bytes[0],
            statement_polling: bytes[2] != 0,
            protocol_version: bytes[4],
        }
    }
}

pub struct OpenDatabaseResponse {
    pub cas_info: [u8; 4],
    pub broker_info: BrokerInfo,
    pub session_id: i32,
}

pub fn encode_open_database(database: &str, user: &str, password: &str) -> FrameWriter {
    let mut w = begin(FunctionCode::OpenDatabase);
    w.write_padded_str(database, FIELD_LEN);
    w.write_padded_str(user, FIELD_LEN);
    w.write_padded_str(password, FIELD_LEN);
    w.write_filler(512, 0);
    w.write_filler(20, 0);
    w
}

pub fn decode_open_database(cas_info: [u8; 4], body: &[u8]) -> CasResult<OpenDatabaseResponse> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    let mut broker_info_bytes = [0u8; 8];
    broker_info_bytes.copy_from_slice(&r.read_bytes(8)?);
    let session_id = r.read_i32()?;
    Ok(OpenDatabaseResponse {
        cas_info,
        broker_info: BrokerInfo::parse(&broker_info_bytes),
        session_id,
    })
}

// --- get engine version -----------------------------------------------------------

pub fn encode_get_engine_version() -> FrameWriter {
    begin(FunctionCode::GetEngineVersion)
}

pub fn decode_get_engine_version(body: &[u8]) -> CasResult<String> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    r.read_cstr()
}

// --- execute query -----------------------------------------------------------------

pub struct ExecuteResponse {
    pub handle: i32,
    pub total: i32,
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
}

pub fn encode_execute_query(sql: &str, autocommit: bool) -> FrameWriter {
    let mut w = begin(FunctionCode::ExecuteQuery);
    w.write_length_prefixed(sql.as_bytes());
    w.write_u8(u8::from(autocommit));
    w
}

pub fn decode_execute_query(body: &[u8]) -> CasResult<ExecuteResponse> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    let handle = r.read_i32()?;
    let total = r.read_i32()?;
    let column_count = r.read_i32()?;
    let columns = read_columns(&mut r, column_count)?;
    let rows = read_rows(&mut r, &columns, total.min(crate::DEFAULT_FETCH_SIZE))?;
    Ok(ExecuteResponse {
        handle,
        total,
        columns,
        rows,
    })
}

// --- batch execute, no query ------------------------------------------------------

pub fn encode_batch_execute(statements: &[String], autocommit: bool) -> FrameWriter {
    let mut w = begin(FunctionCode::BatchExecuteNoQuery);
    w.write_i32(statements.len() as i32);
    for s in statements {
        w.write_length_prefixed(s.as_bytes());
    }
    w.write_u8(u8::from(autocommit));
    w
}

pub fn decode_batch_execute(body: &[u8]) -> CasResult<Vec<i32>> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    let count = r.read_i32()?;
    let mut affected = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        affected.push(r.read_i32()?);
    }
    Ok(affected)
}

// --- fetch -------------------------------------------------------------------------

pub struct FetchResponse {
    pub tuple_count: i32,
    pub rows: Vec<Row>,
}

pub fn encode_fetch(
    handle: i32,
    start: i32,
    fetch_size: i32,
    case_sensitive: bool,
    result_set_index: i32,
) -> FrameWriter {
    let mut w = begin(FunctionCode::Fetch);
    w.write_i32(handle);
    w.write_i32(start);
    w.write_i32(fetch_size);
    w.write_u8(u8::from(case_sensitive));
    w.write_i32(result_set_index);
    w
}

pub fn decode_fetch(body: &[u8], columns: &[ColumnMetadata]) -> CasResult<FetchResponse> {
    let mut r = BodyReader::new(body);
    expect_success(&mut r)?;
    let tuple_count = r.read_i32()?;
    let rows = read_rows(&mut r, columns, tuple_count)?;
    Ok(FetchResponse { tuple_count, rows })
}

// --- close query ---------------------------------------------------------------

pub fn encode_close_query(handle: i32) -> FrameWriter {
    let mut w = begin(FunctionCode::CloseQuery);
    w.write_i32(handle);
    w
}

pub fn decode_close_query(body: &[u8]) -> CasResult<()> {
    expect_success(&mut BodyReader::new(body))
}

// --- set autocommit mode -----------------------------------------------------------

pub fn encode_set_autocommit(mode: bool) -> FrameWriter {
    let mut w = begin(FunctionCode::SetAutoCommitMode);
    w.write_u8(u8::from(mode));
    w
}

pub fn decode_set_autocommit(body: &[u8]) -> CasResult<()> {
    expect_success(&mut BodyReader::new(body))
}

// --- commit / rollback / close database --------------------------------------------

pub fn encode_commit() -> FrameWriter {
    begin(FunctionCode::Commit)
}

pub fn decode_commit(body: &[u8]) -> CasResult<()> {
    expect_success(&mut BodyReader::new(body))
}

pub fn encode_rollback() -> FrameWriter {
    begin(FunctionCode::Rollback)
}

pub fn decode_rollback(body: &[u8]) -> CasResult<()> {
    expect_success(&mut BodyReader::new(body))
}

pub fn encode_close_database() -> FrameWriter {
    begin(FunctionCode::CloseDatabase)
}

pub fn decode_close_database(body: &[u8]) -> CasResult<()> {
    expect_success(&mut BodyReader::new(body))
}

// --- shared row/column decoding ----------------------------------------------------

fn read_columns(r: &mut BodyReader, count: i32) -> CasResult<Vec<ColumnMetadata>> {
    let mut columns = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let name = r.read_cstr()?;
        let type_byte = r.read_u8()?;
        let type_code = TypeCode::from_u8(type_byte)
            .ok_or_else(|| CasError::Protocol(format!("unknown column type code {type_byte}")))?;
        columns.push(ColumnMetadata { name, type_code });
    }
    Ok(columns)
}

fn read_rows(r: &mut BodyReader, columns: &[ColumnMetadata], count: i32) -> CasResult<Vec<Row>> {
    let mut rows = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            values.push(read_value(r, column.type_code)?);
        }
        rows.push(Row(values));
    }
    Ok(rows)
}

fn read_value(r: &mut BodyReader, type_code: TypeCode) -> CasResult<CasValue> {
    let is_null = r.read_u8()? != 0;
    if is_null {
        return Ok(CasValue::Null);
    }
    Ok(match type_code {
        TypeCode::Int => CasValue::Int(r.read_i32()?),
        TypeCode::BigInt => CasValue::BigInt(r.read_i64()?),
        TypeCode::Double => CasValue::Double(r.read_f64()?),
        TypeCode::Text => CasValue::Text(
            String::from_utf8(r.read_length_prefixed()?)
                .map_err(|e| CasError::Protocol(format!("invalid utf-8 in text field: {e}")))?,
        ),
        TypeCode::Bytes => CasValue::Bytes(r.read_length_prefixed()?),
    })
}
