use std::io::{self, Read, Write};

#[cfg(feature = "tokio")]
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{Payload, PromptPay};

const DEFAULT_BUF_CAPACITY: usize = 256;
/// Longest line accepted, terminator included
const MAX_LINE_LEN: usize = 512;

/// A wrapper around a byte stream carrying newline terminated payloads.
pub struct PromptPayStream<S> {
    inner: S,
    buf_capacity: usize,
    /// Bytes read past the last returned payload
    pending: Vec<u8>,
}

impl<S> PromptPayStream<S> {
    /// Creates a new [`PromptPayStream`] from an existing stream.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_BUF_CAPACITY)
    }

    /// Creates a new [`PromptPayStream`] with a custom read buffer capacity.
    pub fn with_capacity(inner: S, buf_capacity: usize) -> Self {
        Self {
            inner,
            buf_capacity: buf_capacity.max(1),
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Tries to parse a payload out of the pending bytes
    ///
    /// `Ok(None)` means more bytes are needed.
    fn parse_pending(&mut self) -> io::Result<Option<Payload>> {
        match crate::parser::line(&self.pending[..]) {
            Ok((rest, payload)) => {
                let consumed = self.pending.len() - rest.len();
                self.pending.drain(..consumed);
                Ok(Some(payload))
            }
            Err(nom::Err::Incomplete(_)) if self.pending.len() > MAX_LINE_LEN => {
                log::warn!("dropping {} bytes without a line terminator", self.pending.len());
                self.pending.clear();
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("payload longer than {MAX_LINE_LEN} bytes"),
                ))
            }
            Err(nom::Err::Incomplete(_)) => Ok(None),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                let err = io::Error::new(
                    io::ErrorKind::InvalidData,
                    nom::Err::Failure(nom::error::Error::new(e.input.to_owned(), e.code)),
                );
                log::warn!("dropping malformed payload: {err}");
                // skip the offending line so the next read can recover
                match self.pending.iter().position(|&b| b == b'\n') {
                    Some(end) => drop(self.pending.drain(..=end)),
                    None => self.pending.clear(),
                }
                Err(err)
            }
        }
    }
}

impl<S: Read + Write> PromptPayStream<S> {
    /// Reads the next payload from the stream.
    ///
    /// # Errors
    ///
    /// If this function encounters any form of I/O or other error, an error variant will be returned as in [`Read::read`].
    ///
    /// If no bytes are read from the stream, an error kind of [`std::io::ErrorKind::ConnectionReset`] is returned.
    /// If the payload cannot be parsed or its checksum does not match, an error kind of [`std::io::ErrorKind::InvalidData`] is returned.
    pub fn read_payload(&mut self) -> io::Result<Payload> {
        // Read bytes until they are enough
        loop {
            if let Some(payload) = self.parse_pending()? {
                return Ok(payload);
            }

            let mut recv_buf = vec![0u8; self.buf_capacity];
            let bytes_read = self.inner.read(&mut recv_buf[..])?;

            if bytes_read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "Connection closed",
                ));
            }

            self.pending.extend_from_slice(&recv_buf[..bytes_read]);
        }
    }

    /// Writes the payload of a request followed by a newline.
    pub fn write_payload(&mut self, promptpay: &PromptPay) -> io::Result<()> {
        self.inner.write_all(promptpay.generate().as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(feature = "tokio")]
impl<S: AsyncReadExt + AsyncWriteExt + Unpin> PromptPayStream<S> {
    /// Reads the next payload from the stream.
    ///
    /// # Errors
    ///
    /// Same as [`PromptPayStream::read_payload`].
    pub async fn read_payload_async(&mut self) -> io::Result<Payload> {
        // Read bytes until they are enough
        loop {
            if let Some(payload) = self.parse_pending()? {
                return Ok(payload);
            }

            let mut recv_buf = vec![0u8; self.buf_capacity];
            let bytes_read = self.inner.read(&mut recv_buf[..]).await?;

            if bytes_read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "Connection closed",
                ));
            }

            self.pending.extend_from_slice(&recv_buf[..bytes_read]);
        }
    }

    /// Writes the payload of a request followed by a newline.
    pub async fn write_payload_async(&mut self, promptpay: &PromptPay) -> io::Result<()> {
        self.inner.write_all(promptpay.generate().as_bytes()).await?;
        self.inner.write_all(b"\n").await?;
        self.inner.flush().await?;
        Ok(())
    }
}
