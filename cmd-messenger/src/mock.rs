//! In-memory stand-ins for a serial port and a delay.

use core::future::pending;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use heapless::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MockError;

impl embedded_io_async::Error for MockError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::OutOfMemory
    }
}

/// A port replaying fed bytes and recording written ones.
///
/// Reading past the fed bytes never completes, like a quiet serial line.
#[derive(Debug, Default)]
pub struct MockPort<const N: usize> {
    rx: Vec<u8, N>,
    rx_cursor: usize,
    tx: Vec<u8, N>,
    chunk: Option<usize>,
}

impl<const N: usize> MockPort<N> {
    pub const fn new() -> Self {
        Self {
            rx: Vec::new(),
            rx_cursor: 0,
            tx: Vec::new(),
            chunk: None,
        }
    }

    /// Hand out at most `size` bytes per read.
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk = Some(size.max(1));
        self
    }

    /// Queue bytes to be read.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), MockError> {
        if self.rx_cursor == self.rx.len() {
            self.rx.clear();
            self.rx_cursor = 0;
        }

        self.rx.extend_from_slice(bytes).map_err(|_| MockError)
    }

    /// Bytes fed but not read yet.
    pub fn pending(&self) -> usize {
        self.rx.len() - self.rx_cursor
    }

    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    pub fn take_written(&mut self) -> Vec<u8, N> {
        core::mem::take(&mut self.tx)
    }
}

impl<const N: usize> ErrorType for MockPort<N> {
    type Error = MockError;
}

impl<const N: usize> Read for MockPort<N> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.pending() == 0 {
            pending::<()>().await;
        }

        let count = self
            .pending()
            .min(buf.len())
            .min(self.chunk.unwrap_or(usize::MAX));

        buf[..count].copy_from_slice(&self.rx[self.rx_cursor..self.rx_cursor + count]);
        self.rx_cursor += count;

        Ok(count)
    }
}

impl<const N: usize> Write for MockPort<N> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf).map_err(|_| MockError)?;

        Ok(buf.len())
    }
}

/// A delay that returns at once and records what was asked of it.
#[derive(Debug, Default)]
pub struct MockDelay {
    requested_ms: Vec<u32, 64>,
}

impl MockDelay {
    pub const fn new() -> Self {
        Self {
            requested_ms: Vec::new(),
        }
    }

    /// Every delay so far, in milliseconds.
    pub fn requested_ms(&self) -> &[u32] {
        &self.requested_ms
    }

    fn record(&mut self, ms: u32) {
        // keep the oldest entries once full
        self.requested_ms.push(ms).ok();
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}
