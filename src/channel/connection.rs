//! One connected channel stream with record framing on both halves.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use interprocess::local_socket::tokio::{prelude::*, RecvHalf, SendHalf, Stream};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::channel::{bounded, ChannelSettings};
use crate::protocol::RecordCodec;
use crate::{AppError, Result};

/// A connected peer. Dropping it disconnects.
pub struct ChannelConnection {
    reader: FramedRead<RecvHalf, RecordCodec>,
    writer: FramedWrite<SendHalf, RecordCodec>,
    io_timeout: Option<Duration>,
}

impl ChannelConnection {
    pub(crate) fn new(stream: Stream, settings: &ChannelSettings) -> Self {
        let (reader, writer) = stream.split();
        Self {
            reader: FramedRead::new(reader, RecordCodec::new(settings.max_message_bytes)),
            writer: FramedWrite::new(writer, RecordCodec::new(settings.max_message_bytes)),
            io_timeout: settings.io_timeout,
        }
    }

    /// Write one record and flush it to the peer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Send` if the record is oversized, the write fails,
    /// or the write does not complete within the I/O timeout.
    pub async fn send(&mut self, record: &str) -> Result<()> {
        // `SinkExt::send` flushes before resolving.
        bounded(self.io_timeout, self.writer.send(record))
            .await
            .ok_or_else(|| {
                AppError::Send(format!(
                    "write did not complete within {:?}",
                    self.io_timeout.unwrap_or_default()
                ))
            })?
            .map_err(into_send_error)
    }

    /// Read exactly one record, with its terminator removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Receive` if the peer disconnects first, the record
    /// is oversized or not UTF-8, or nothing arrives within the I/O timeout.
    pub async fn receive(&mut self) -> Result<String> {
        match bounded(self.io_timeout, self.reader.next()).await {
            Some(Some(Ok(record))) => Ok(record),
            Some(Some(Err(err))) => Err(into_receive_error(err)),
            Some(None) => Err(AppError::Receive(
                "peer disconnected before a record arrived".into(),
            )),
            None => Err(AppError::Receive(format!(
                "no record within {:?}",
                self.io_timeout.unwrap_or_default()
            ))),
        }
    }
}

impl std::fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

fn into_send_error(err: AppError) -> AppError {
    match err {
        AppError::Io(msg) => AppError::Send(msg),
        other => other,
    }
}

fn into_receive_error(err: AppError) -> AppError {
    match err {
        AppError::Io(msg) => AppError::Receive(msg),
        other => other,
    }
}
