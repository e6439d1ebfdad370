//! Byte-counting, interruptible reader used by stream copies.

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Wraps a reader, counting the bytes read through it and aborting with
/// `ErrorKind::Interrupted` on the first read after the stop token is
/// cancelled.
///
/// Callers must not feed this into `std::io::copy`, which silently
/// retries `Interrupted` reads; use a manual read/write loop instead.
#[derive(Debug)]
pub struct CounterReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
    stop: CancellationToken,
}

impl<R: Read> CounterReader<R> {
    /// Wrap `inner` with a fresh byte counter.
    pub fn new(inner: R, stop: CancellationToken) -> Self {
        Self::with_counter(inner, Arc::new(AtomicU64::new(0)), stop)
    }

    /// Wrap `inner` around a shared counter, letting another worker
    /// observe the byte count while the copy is in flight.
    pub fn with_counter(inner: R, count: Arc<AtomicU64>, stop: CancellationToken) -> Self {
        Self { inner, count, stop }
    }

    /// Bytes read so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Handle to the shared counter.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.count)
    }
}

impl<R: Read> Read for CounterReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.stop.is_cancelled() {
            return Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "transfer interrupted",
            ));
        }
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
