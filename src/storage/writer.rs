//! Buffered, batched CSV writer. Records are buffered under a mutex and flushed by a
//! background task, on a timer or as soon as a batch fills. The buffer lock is never
//! held across file I/O, so recording never waits on the disk.

use super::{ScoredRecord, StorageError, CSV_HEADER};
use crate::config::StorageConfig;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct RecordWriter {
    path: PathBuf,
    batch_size: usize,
    buffer: Mutex<Vec<ScoredRecord>>,
    /// Held for a whole flush, swap included, so batches reach the file in record order
    io: Mutex<()>,
    batch_full: Notify,
}

impl RecordWriter {
    pub fn new(config: &StorageConfig) -> Self {
        Self::open(config.path.clone(), config.batch_size)
    }

    pub fn open(path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            path: path.into(),
            batch_size,
            buffer: Mutex::new(Vec::new()),
            io: Mutex::new(()),
            batch_full: Notify::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records buffered and not yet flushed.
    pub fn pending(&self) -> usize {
        lock(&self.buffer).len()
    }

    /// Buffer a record. A full batch wakes the flusher task; without one running,
    /// records stay buffered until the next explicit [`flush`](Self::flush).
    pub fn record(&self, record: ScoredRecord) {
        let len = {
            let mut buf = lock(&self.buffer);
            buf.push(record);
            buf.len()
        };
        if len >= self.batch_size {
            self.batch_full.notify_one();
        }
    }

    /// Swap out the buffer and append it to the store. Returns the number of rows written.
    /// On error the swapped-out batch is gone; it is never re-buffered.
    /// Blocking: call it from the blocking pool or a plain thread.
    pub fn flush(&self) -> Result<usize, StorageError> {
        let _io = lock(&self.io);
        let batch = std::mem::take(&mut *lock(&self.buffer));
        if batch.is_empty() {
            return Ok(0);
        }
        self.append(&batch)?;
        info!(count = batch.len(), path = %self.path.display(), "flushed records");
        Ok(batch.len())
    }

    fn append(&self, batch: &[ScoredRecord]) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut block = String::with_capacity(64 * (batch.len() + 1));
        if empty {
            block.push_str(CSV_HEADER);
            block.push('\n');
        }
        for record in batch {
            record.write_row(&mut block);
        }
        file.write_all(block.as_bytes()).map_err(io_err)?;
        Ok(())
    }

    /// Flush from the blocking pool on a fixed period or when a batch fills, forever.
    pub fn spawn_flusher(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let reason = tokio::select! {
                    _ = ticker.tick() => "timed",
                    _ = self.batch_full.notified() => "batch",
                };
                let writer = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || writer.flush()).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(n)) => debug!(count = n, reason, "flush"),
                    Ok(Err(e)) => error!(error = %e, reason, "flush failed; records dropped"),
                    Err(e) => error!(error = %e, "flush task aborted"),
                }
            }
        })
    }
}
