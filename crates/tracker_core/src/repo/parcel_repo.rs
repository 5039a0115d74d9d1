//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `Parcel` records onto rows of the `parcel` table.
//! - Enforce the registered-only guard on address change and deletion.
//!
//! # Invariants
//! - Guarded mutations check status and write inside one IMMEDIATE transaction.
//! - Updates that touch no row report `NotFound` instead of succeeding.
//! - Read paths reject unknown status text instead of masking it.

use crate::db::DbError;
use crate::model::parcel::{ClientId, NewParcel, Parcel, ParcelNumber, ParcelStatus};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for parcel persistence and guard checks.
#[derive(Debug)]
pub enum RepoError {
    /// No row carries this tracking number.
    NotFound(ParcelNumber),
    /// Address change or deletion attempted outside `registered`.
    NotRegistered {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::NotRegistered { number, status } => write!(
                f,
                "parcel {number} has status `{status}`; only `registered` parcels can be changed or deleted"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::NotRegistered { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data access contract for parcels.
pub trait ParcelStore {
    /// Inserts a parcel and returns the engine-assigned tracking number.
    fn add(&self, parcel: &NewParcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel; `NotFound` when absent.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Loads every parcel of a client in engine order. Empty when none.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Overwrites the status without checking transition legality.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Changes the address of a `registered` parcel.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Deletes a `registered` parcel.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
}

/// SQLite-backed parcel store.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Runs `mutate` only when the parcel exists and is still registered.
    ///
    /// The status read and the mutation share one IMMEDIATE transaction, so a
    /// concurrent writer cannot change the status in between.
    fn with_registered_guard(
        &self,
        number: ParcelNumber,
        mutate: impl FnOnce(&Transaction<'_>) -> RepoResult<()>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let status = read_status(&tx, number)?.ok_or(RepoError::NotFound(number))?;
        if !status.is_mutable() {
            return Err(RepoError::NotRegistered { number, status });
        }

        mutate(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

impl ParcelStore for SqliteParcelStore<'_> {
    fn add(&self, parcel: &NewParcel) -> RepoResult<ParcelNumber> {
        self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        let number = self.conn.last_insert_rowid();
        debug!("event=parcel_insert module=repo status=ok number={number}");
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        match rows.next()? {
            Some(row) => parse_parcel_row(row),
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE client = ?1;"))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2;",
            params![status.as_str(), number],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.with_registered_guard(number, |tx| {
            tx.execute(
                "UPDATE parcel SET address = ?1 WHERE number = ?2;",
                params![address, number],
            )?;
            Ok(())
        })?;

        info!("event=parcel_address module=repo status=ok number={number}");
        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.with_registered_guard(number, |tx| {
            tx.execute("DELETE FROM parcel WHERE number = ?1;", [number])?;
            Ok(())
        })?;

        info!("event=parcel_delete module=repo status=ok number={number}");
        Ok(())
    }
}

fn read_status(tx: &Transaction<'_>, number: ParcelNumber) -> RepoResult<Option<ParcelStatus>> {
    let text: Option<String> = tx
        .query_row(
            "SELECT status FROM parcel WHERE number = ?1;",
            [number],
            |row| row.get(0),
        )
        .optional()?;

    text.map(|value| parse_status(&value)).transpose()
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;

    Ok(Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status: parse_status(&status_text)?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_status(value: &str) -> RepoResult<ParcelStatus> {
    ParcelStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid parcel status `{value}` in parcel.status"))
    })
}
