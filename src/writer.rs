use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};

/// Buffers generated rows and persists them in chunk-sized transactions.
/// Each flush commits on its own, so a failure mid-run costs at most the
/// in-flight chunk; the failed chunk is rolled back and the error
/// propagates. Progress is reported once per flush, never per row.
pub struct BatchWriter<'c, T> {
    conn: &'c mut Connection,
    label: &'static str,
    insert: fn(&Transaction, &[T]) -> Result<()>,
    buf: Vec<T>,
    flush_size: usize,
    target: u64,
    written: u64,
    flushes: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteSummary {
    pub written: u64,
    pub flushes: u64,
}

impl<'c, T> BatchWriter<'c, T> {
    /// `target` is display-only; pass 0 when the total is not known up front.
    pub fn new(
        conn: &'c mut Connection,
        label: &'static str,
        target: u64,
        flush_size: usize,
        insert: fn(&Transaction, &[T]) -> Result<()>,
    ) -> Self {
        let flush_size = flush_size.max(1);
        Self {
            conn,
            label,
            insert,
            buf: Vec::with_capacity(flush_size),
            flush_size,
            target,
            written: 0,
            flushes: 0,
        }
    }

    pub fn push(&mut self, row: T) -> Result<()> {
        self.buf.push(row);
        if self.buf.len() >= self.flush_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        (self.insert)(&tx, &self.buf)
            .with_context(|| format!("Failed to write a chunk of {}", self.label))?;
        tx.commit()?;
        self.written += self.buf.len() as u64;
        self.flushes += 1;
        self.buf.clear();
        if self.target > 0 {
            println!("  {}: {}/{}", self.label, self.written, self.target);
        } else {
            println!("  {}: {}", self.label, self.written);
        }
        Ok(())
    }

    /// Rows committed so far (excludes the buffered tail).
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Rows accepted but not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Flush the remainder and return the totals.
    pub fn finish(mut self) -> Result<WriteSummary> {
        self.flush()?;
        Ok(WriteSummary {
            written: self.written,
            flushes: self.flushes,
        })
    }
}
