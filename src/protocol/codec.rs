//! Record codec for the agent/model channel.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] so that one `\n`-terminated
//! UTF-8 line is one record, bounded by the configured receive buffer.
//! Outbound records are terminated with `\r\n`; inbound records accept
//! `\r\n` or `\n`, and a final unterminated record at EOF.
//!
//! The receive buffer reserves one byte, so an encoded record (content
//! plus terminator) may use at most `max_message_bytes - 1` bytes.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Terminator appended to every outgoing record.
pub const RECORD_TERMINATOR: &str = "\r\n";

/// Line-framed record codec with a hard size limit in both directions.
#[derive(Debug)]
pub struct RecordCodec {
    lines: LinesCodec,
    max_record_bytes: usize,
}

impl RecordCodec {
    /// Create a codec for a receive buffer of `max_message_bytes`.
    #[must_use]
    pub fn new(max_message_bytes: usize) -> Self {
        let max_record_bytes = max_message_bytes.saturating_sub(1);
        Self {
            // LinesCodec's limit excludes the trailing `\n`.
            lines: LinesCodec::new_with_max_length(max_record_bytes.saturating_sub(1)),
            max_record_bytes,
        }
    }

    /// Largest encoded record (content plus terminator) this codec accepts.
    #[must_use]
    pub fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }
}

impl Decoder for RecordCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.lines.decode(src).map_err(|err| self.map_decode_error(err))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.lines
            .decode_eof(src)
            .map_err(|err| self.map_decode_error(err))
    }
}

impl Encoder<&str> for RecordCodec {
    type Error = AppError;

    /// Encode `item` as `item\r\n`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Send`] if `item` contains a line break or the
    /// encoded record exceeds the size limit.
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<()> {
        if item.contains(['\r', '\n']) {
            return Err(AppError::Send(
                "record must not contain a line break".into(),
            ));
        }

        let encoded_len = item.len() + RECORD_TERMINATOR.len();
        if encoded_len > self.max_record_bytes {
            return Err(AppError::Send(format!(
                "record of {encoded_len} bytes exceeds limit of {} bytes",
                self.max_record_bytes
            )));
        }

        dst.reserve(encoded_len);
        dst.put_slice(item.as_bytes());
        dst.put_slice(RECORD_TERMINATOR.as_bytes());
        Ok(())
    }
}

impl Encoder<String> for RecordCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&str>::encode(self, item.as_str(), dst)
    }
}

impl RecordCodec {
    fn map_decode_error(&self, err: LinesCodecError) -> AppError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => AppError::Receive(format!(
                "record exceeds limit of {} bytes",
                self.max_record_bytes
            )),
            LinesCodecError::Io(io_err) => AppError::Receive(io_err.to_string()),
        }
    }
}
