//! `rusqlite::{ToSql, FromSql}` glue so `cairn-storage`'s SQLite rows can
//! bind and read an embedding directly as an [`EmbeddingBlob`] rather than
//! hand-rolling the `BLOB` conversion at every call site.

use crate::blob;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Newtype around an embedding for `rusqlite` parameter binding and row
/// extraction. Transparent wrapper -- `Vec<f32>` itself can't implement a
/// foreign trait on a foreign type.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBlob(pub Vec<f32>);

impl From<Vec<f32>> for EmbeddingBlob {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

impl From<EmbeddingBlob> for Vec<f32> {
    fn from(b: EmbeddingBlob) -> Self {
        b.0
    }
}

impl ToSql for EmbeddingBlob {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(blob::encode(&self.0)))
    }
}

impl FromSql for EmbeddingBlob {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = value.as_blob()?;
        blob::decode(bytes).map(EmbeddingBlob).ok_or(FromSqlError::InvalidType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn round_trips_through_a_real_connection() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (embedding BLOB)", []).unwrap();
        let original = EmbeddingBlob(vec![0.25, -0.75, 1.0]);
        conn.execute("INSERT INTO t (embedding) VALUES (?1)", [&original]).unwrap();

        let fetched: EmbeddingBlob = conn.query_row("SELECT embedding FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(fetched, original);
    }
}
