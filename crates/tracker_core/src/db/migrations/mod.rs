//! Ordered schema scripts for the tracker database.
//!
//! Script `n` (1-based) upgrades the schema to version `n`; the reached
//! version is stored in `PRAGMA user_version`. Scripts are append-only.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

const SCRIPTS: &[&str] = &[include_str!("0001_parcel.sql")];

/// Schema version produced by running every script.
pub fn latest_version() -> u32 {
    SCRIPTS.len() as u32
}

/// Runs the scripts the database has not seen yet, all in one transaction.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();

    match found.cmp(&supported) {
        Ordering::Greater => return Err(DbError::SchemaTooNew { found, supported }),
        Ordering::Equal => return Ok(()),
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for (version, script) in (1u32..).zip(SCRIPTS).skip(found as usize) {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}
