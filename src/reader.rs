use anyhow::Result;
use rusqlite::{params, Connection, Row};

/// Batched scan over a table that may hold far more rows than fit in
/// memory. The scan owns a dedicated read-only connection, so commits on
/// the writer side never invalidate it; its position is a plain rowid
/// keyset, independent of any transaction boundary.
///
/// The query must select `rowid` as its first column, filter on
/// `rowid > ?1`, and end with `ORDER BY rowid LIMIT ?2`. A sampling
/// predicate may be embedded: rejected rows are skipped permanently, and
/// because LIMIT counts only accepted rows, an empty batch still means the
/// table is exhausted.
pub struct TableScan<T> {
    conn: Connection,
    sql: &'static str,
    map: fn(&Row) -> rusqlite::Result<T>,
    batch_size: usize,
    last_rowid: i64,
    done: bool,
}

impl<T> TableScan<T> {
    pub fn new(
        conn: Connection,
        sql: &'static str,
        batch_size: usize,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Self {
        Self {
            conn,
            sql,
            map,
            batch_size: batch_size.max(1),
            last_rowid: 0,
            done: false,
        }
    }

    /// Next batch of rows; an empty batch signals exhaustion.
    pub fn fetch_batch(&mut self) -> Result<Vec<T>> {
        if self.done {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare_cached(self.sql)?;
        let mut rows = stmt.query(params![self.last_rowid, self.batch_size as i64])?;
        let mut out = Vec::with_capacity(self.batch_size);
        while let Some(row) = rows.next()? {
            self.last_rowid = row.get(0)?;
            out.push((self.map)(row)?);
        }
        if out.is_empty() {
            self.done = true;
        }
        Ok(out)
    }
}
