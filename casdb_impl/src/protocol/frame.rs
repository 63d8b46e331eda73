//! Length-prefixed framing over a byte-oriented transport.
//!
//! A frame on the wire is `4-byte big-endian body length | 4-byte CAS info | body`.
//! The length field covers only the body; the CAS info is a fixed-size prefix that
//! sits outside of it. This module is pure (no I/O): the writer accumulates into an
//! in-memory buffer, and the reader is fed whatever chunks the transport happens to
//! deliver and reports when a complete frame is available.

use crate::error::{CasError, CasResult};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Size in bytes of the CAS info token that prefixes every frame after the length.
pub const CAS_INFO_SIZE: usize = 4;

/// Size in bytes of the length field itself.
const LENGTH_SIZE: usize = 4;

/// Accumulates a single request frame's body.
#[derive(Debug, Default)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i32(&mut self, value: i32) {
        WriteBytesExt::write_i32::<BigEndian>(&mut self.buf, value)
            .expect("writing to a Vec<u8> cannot fail");
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        WriteBytesExt::write_i64::<BigEndian>(&mut self.buf, value)
            .expect("writing to a Vec<u8> cannot fail");
    }

    pub fn write_f64(&mut self, value: f64) {
        WriteBytesExt::write_f64::<BigEndian>(&mut self.buf, value)
            .expect("writing to a Vec<u8> cannot fail");
    }

    /// Writes a 4-byte big-endian length followed by the raw bytes.
    pub fn write_length_prefixed(&mut self, bytes: &[u8]) {
        self.write_i32(bytes.len() as i32);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `s` into exactly `len` bytes: truncated if longer, zero-padded if shorter.
    pub fn write_padded_str(&mut self, s: &str, len: usize) {
        let bytes = s.as_bytes();
        let n = bytes.len().min(len);
        self.buf.extend_from_slice(&bytes[..n]);
        self.buf.resize(self.buf.len() + (len - n), 0);
    }

    pub fn write_cstr(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    pub fn write_filler(&mut self, len: usize, value: u8) {
        self.buf.resize(self.buf.len() + len, value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Finalizes the frame: prepends the body length and the CAS info prefix.
    pub fn finish(self, cas_info: [u8; CAS_INFO_SIZE]) -> Vec<u8> {
        let mut out = Vec::with_capacity(LENGTH_SIZE + CAS_INFO_SIZE + self.buf.len());
        out.write_i32::<BigEndian>(self.buf.len() as i32)
            .expect("writing to a Vec<u8> cannot fail");
        out.extend_from_slice(&cas_info);
        out.extend_from_slice(&self.buf);
        out
    }
}

/// Assembles complete frames out of arbitrarily-chunked transport reads.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly-read transport bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// If a complete frame is buffered, removes and returns it as `(cas_info, body)`.
    /// Otherwise returns `None` and leaves the buffer untouched.
    pub fn take_frame(&mut self) -> CasResult<Option<([u8; CAS_INFO_SIZE], Vec<u8>)>> {
        if self.buf.len() < LENGTH_SIZE + CAS_INFO_SIZE {
            return Ok(None);
        }
        let body_len = {
            let mut cursor = Cursor::new(&self.buf[0..LENGTH_SIZE]);
            cursor
                .read_i32::<BigEndian>()
                .map_err(|e| CasError::Protocol(format!("malformed length prefix: {e}")))?
        };
        if body_len < 0 {
            return Err(CasError::Protocol(format!(
                "negative frame length: {body_len}"
            )));
        }
        let total = LENGTH_SIZE + CAS_INFO_SIZE + body_len as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        let mut cas_info = [0u8; CAS_INFO_SIZE];
        cas_info.copy_from_slice(&self.buf[LENGTH_SIZE..LENGTH_SIZE + CAS_INFO_SIZE]);
        let body = self.buf[LENGTH_SIZE + CAS_INFO_SIZE..total].to_vec();
        self.buf.drain(0..total);
        Ok(Some((cas_info, body)))
    }
}

/// Cursor-style reader over one frame's already-extracted body.
pub struct BodyReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BodyReader<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(body),
        }
    }

    pub fn read_i32(&mut self) -> CasResult<i32> {
        self.cursor
            .read_i32::<BigEndian>()
            .map_err(|e| CasError::Protocol(format!("truncated frame reading i32: {e}")))
    }

    pub fn read_u8(&mut self) -> CasResult<u8> {
        self.cursor
            .read_u8()
            .map_err(|e| CasError::Protocol(format!("truncated frame reading u8: {e}")))
    }

    pub fn read_i64(&mut self) -> CasResult<i64> {
        self.cursor
            .read_i64::<BigEndian>()
            .map_err(|e| CasError::Protocol(format!("truncated frame reading i64: {e}")))
    }

    pub fn read_f64(&mut self) -> CasResult<f64> {
        self.cursor
            .read_f64::<BigEndian>()
            .map_err(|e| CasError::Protocol(format!("truncated frame reading f64: {e}")))
    }

    /// Reads a 4-byte big-endian length followed by that many raw bytes.
    pub fn read_length_prefixed(&mut self) -> CasResult<Vec<u8>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(CasError::Protocol(format!(
                "negative length-prefixed field: {len}"
            )));
        }
        self.read_bytes(len as usize)
    }

    pub fn read_bytes(&mut self, len: usize) -> CasResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        std::io::Read::read_exact(&mut self.cursor, &mut buf)
            .map_err(|e| CasError::Protocol(format!("truncated frame reading {len} bytes: {e}")))?;
        Ok(buf)
    }

    /// Reads a fixed-size, zero-padded field and trims the trailing zero bytes.
    pub fn read_padded_str(&mut self, len: usize) -> CasResult<String> {
        let raw = self.read_bytes(len)?;
        let trimmed_len = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8(raw[..trimmed_len].to_vec())
            .map_err(|e| CasError::Protocol(format!("invalid utf-8 in fixed field: {e}")))
    }

    pub fn read_cstr(&mut self) -> CasResult<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        String::from_utf8(bytes)
            .map_err(|e| CasError::Protocol(format!("invalid utf-8 in null-terminated field: {e}")))
    }

    /// Remaining, not yet consumed bytes of the body.
    pub fn remaining(&mut self) -> Vec<u8> {
        let pos = self.cursor.position() as usize;
        self.cursor.get_ref()[pos..].to_vec()
    }
}
