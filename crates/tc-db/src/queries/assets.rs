//! Asset catalog operations.

use chrono::Utc;
use rusqlite::Connection;
use tc_core::{AssetId, Error, Result, TranscodeQuality};

use crate::models::AssetRow;

const COLS: &str = "id, source_path, file_signature, sig_low, sig_medium, sig_high, created_at";

/// Insert an asset or update its source path and signature.
///
/// Stored transcode signatures are kept; a changed `file_signature` makes
/// them stale on its own.
pub fn upsert_asset(
    conn: &Connection,
    id: AssetId,
    source_path: &str,
    file_signature: &str,
) -> Result<AssetRow> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO assets (id, source_path, file_signature, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id)
         DO UPDATE SET source_path = excluded.source_path,
                       file_signature = excluded.file_signature",
        rusqlite::params![id.get(), source_path, file_signature, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_asset(conn, id)?.ok_or_else(|| Error::not_found("asset", id))
}

/// Get an asset by id.
pub fn get_asset(conn: &Connection, id: AssetId) -> Result<Option<AssetRow>> {
    let q = format!("SELECT {COLS} FROM assets WHERE id = ?1");
    match conn.query_row(&q, [id.get()], AssetRow::from_row) {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Record the signature a transcode was generated from.
///
/// Returns `false` when no asset has this id.
pub fn update_rendition_signature(
    conn: &Connection,
    id: AssetId,
    quality: TranscodeQuality,
    signature: &str,
) -> Result<bool> {
    let column = match quality {
        TranscodeQuality::Low => "sig_low",
        TranscodeQuality::Medium => "sig_medium",
        TranscodeQuality::High => "sig_high",
    };
    let n = conn
        .execute(
            &format!("UPDATE assets SET {column} = ?1 WHERE id = ?2"),
            rusqlite::params![signature, id.get()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// List every asset ordered by id.
pub fn list_assets(conn: &Connection) -> Result<Vec<AssetRow>> {
    let q = format!("SELECT {COLS} FROM assets ORDER BY id");
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], AssetRow::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn id(n: i64) -> AssetId {
        AssetId::new(n).unwrap()
    }

    #[test]
    fn upsert_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let row = upsert_asset(&conn, id(7), "/music/a.flac", "abc").unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.source_path, "/music/a.flac");
        assert!(row.sig_low.is_none());

        assert!(get_asset(&conn, id(8)).unwrap().is_none());
    }

    #[test]
    fn upsert_keeps_rendition_signatures() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        upsert_asset(&conn, id(1), "/music/a.flac", "abc").unwrap();
        assert!(update_rendition_signature(&conn, id(1), TranscodeQuality::Medium, "abc").unwrap());
        let row = upsert_asset(&conn, id(1), "/music/a2.flac", "def").unwrap();

        assert_eq!(row.source_path, "/music/a2.flac");
        assert_eq!(row.file_signature, "def");
        assert_eq!(row.sig_medium.as_deref(), Some("abc"));

        let asset = row.into_media_asset().unwrap();
        assert!(!asset.transcode_signature_current(TranscodeQuality::Medium));
    }

    #[test]
    fn update_missing_asset_reports_false() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(!update_rendition_signature(&conn, id(3), TranscodeQuality::Low, "x").unwrap());
    }

    #[test]
    fn list_is_ordered() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        upsert_asset(&conn, id(20), "/b.flac", "b").unwrap();
        upsert_asset(&conn, id(10), "/a.flac", "a").unwrap();

        let ids: Vec<i64> = list_assets(&conn).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20]);
    }
}
