//! Parcel persistence.
//!
//! [`ParcelStore`] is the storage contract the service is written against;
//! [`SqliteParcelStore`] implements it over a [`SqliteService`].

use std::path::Path;

use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::Row;

use crate::error::StoreError;
use crate::model::{Parcel, ParcelStatus};
use crate::sqlite::{
    ColumnConstraint, ColumnDefinition, DataType, DefaultValue, Schema, SqlQuery, SqliteConfig,
    SqliteService, TableDefinition, Value,
};

const INSERT_PARCEL: &str = "INSERT INTO parcel (client_id, status, address, created_at) \
     VALUES (:client_id, :status, :address, :created_at)";
const SELECT_BY_ID: &str =
    "SELECT id, client_id, status, address, created_at FROM parcel WHERE id = :id";
const SELECT_BY_CLIENT: &str = "SELECT id, client_id, status, address, created_at FROM parcel \
     WHERE client_id = :client_id ORDER BY id";
const UPDATE_STATUS: &str = "UPDATE parcel SET status = :status WHERE id = :id";
const UPDATE_ADDRESS: &str =
    "UPDATE parcel SET address = :address WHERE id = :id AND status = :registered";
const DELETE_REGISTERED: &str = "DELETE FROM parcel WHERE id = :id AND status = :registered";

/// Storage contract for parcels.
///
/// Storage does not enforce the status sequence. Address changes and deletions
/// carry their own guard: they only touch a row whose status is still
/// `registered`, and report whether a row was affected instead of failing.
#[async_trait]
pub trait ParcelStore: Send + Sync {
    /// Insert a new parcel and return its assigned id. `parcel.id` is ignored.
    async fn add(&self, parcel: &Parcel) -> Result<i64, StoreError>;

    /// Fetch one parcel by id.
    async fn get(&self, id: i64) -> Result<Parcel, StoreError>;

    /// All parcels owned by a client, oldest first. Empty when there are none.
    async fn get_by_client(&self, client_id: i64) -> Result<Vec<Parcel>, StoreError>;

    /// Overwrite the status. A missing id is not an error.
    async fn set_status(&self, id: i64, status: ParcelStatus) -> Result<(), StoreError>;

    /// Change the address of a still-registered parcel; `false` when no row matched.
    async fn set_address(&self, id: i64, address: &str) -> Result<bool, StoreError>;

    /// Delete a still-registered parcel; `false` when no row matched.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Definition of the `parcel` table.
pub fn parcel_schema() -> Schema {
    Schema::new().add_table(
        TableDefinition::new("parcel")
            .add_column(
                ColumnDefinition::new("id", DataType::Integer)
                    .with_constraint(ColumnConstraint::PrimaryKey)
                    .with_constraint(ColumnConstraint::AutoIncrement),
            )
            .add_column(
                ColumnDefinition::new("client_id", DataType::Integer)
                    .with_constraint(ColumnConstraint::NotNull),
            )
            .add_column(
                ColumnDefinition::new("status", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull)
                    .with_default(DefaultValue::Text(
                        ParcelStatus::Registered.as_str().to_string(),
                    )),
            )
            .add_column(
                ColumnDefinition::new("address", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull),
            )
            .add_column(
                ColumnDefinition::new("created_at", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull),
            ),
    )
}

impl From<ParcelStatus> for Value {
    fn from(status: ParcelStatus) -> Self {
        Value::Text(status.as_str().to_string())
    }
}

impl FromSql for ParcelStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

fn parcel_from_row(row: &Row<'_>) -> rusqlite::Result<Parcel> {
    Ok(Parcel {
        id: row.get("id")?,
        client_id: row.get("client_id")?,
        status: row.get("status")?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

/// [`ParcelStore`] backed by SQLite.
pub struct SqliteParcelStore {
    sqlite: SqliteService,
}

impl SqliteParcelStore {
    /// Wrap an already opened engine handle. Its schema must contain the `parcel` table.
    pub fn new(sqlite: SqliteService) -> Self {
        Self { sqlite }
    }

    /// Open the database file, creating the `parcel` table if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let config = SqliteConfig::new(path.as_ref().to_string_lossy(), parcel_schema());
        SqliteService::open(config).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        SqliteService::open_in_memory(parcel_schema()).map(Self::new)
    }

    pub fn sqlite(&self) -> &SqliteService {
        &self.sqlite
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.sqlite.close()
    }
}

#[async_trait]
impl ParcelStore for SqliteParcelStore {
    async fn add(&self, parcel: &Parcel) -> Result<i64, StoreError> {
        let query = SqlQuery::new(INSERT_PARCEL)
            .bind("client_id", parcel.client_id)
            .bind("status", parcel.status)
            .bind("address", parcel.address.as_str())
            .bind("created_at", parcel.created_at.as_str());
        self.sqlite
            .insert(&query)
            .await
            .map_err(StoreError::persistence("insert parcel"))
    }

    async fn get(&self, id: i64) -> Result<Parcel, StoreError> {
        let query = SqlQuery::new(SELECT_BY_ID).bind("id", id);
        self.sqlite
            .query_one(&query, parcel_from_row)
            .await
            .map_err(StoreError::persistence("select parcel"))?
            .ok_or(StoreError::NotFound { id })
    }

    async fn get_by_client(&self, client_id: i64) -> Result<Vec<Parcel>, StoreError> {
        let query = SqlQuery::new(SELECT_BY_CLIENT).bind("client_id", client_id);
        self.sqlite
            .query_map(&query, parcel_from_row)
            .await
            .map_err(StoreError::persistence("select client parcels"))
    }

    async fn set_status(&self, id: i64, status: ParcelStatus) -> Result<(), StoreError> {
        let query = SqlQuery::new(UPDATE_STATUS)
            .bind("id", id)
            .bind("status", status);
        self.sqlite
            .execute(&query)
            .await
            .map_err(StoreError::persistence("update parcel status"))?;
        Ok(())
    }

    async fn set_address(&self, id: i64, address: &str) -> Result<bool, StoreError> {
        let query = SqlQuery::new(UPDATE_ADDRESS)
            .bind("id", id)
            .bind("address", address)
            .bind("registered", ParcelStatus::Registered);
        let changed = self
            .sqlite
            .execute(&query)
            .await
            .map_err(StoreError::persistence("update parcel address"))?;
        Ok(changed > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let query = SqlQuery::new(DELETE_REGISTERED)
            .bind("id", id)
            .bind("registered", ParcelStatus::Registered);
        let removed = self
            .sqlite
            .execute(&query)
            .await
            .map_err(StoreError::persistence("delete parcel"))?;
        Ok(removed > 0)
    }
}
