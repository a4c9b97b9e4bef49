//! Parcel use cases on top of a [`ParcelStore`].

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::error::{GuardedAction, ServiceError};
use crate::model::{Parcel, ParcelStatus};
use crate::store::ParcelStore;

/// Owns the status state machine and creation defaults.
///
/// Status only moves through [`ParcelService::next_status`], one step at a time.
pub struct ParcelService<S> {
    store: S,
}

impl<S: ParcelStore> ParcelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Register a new parcel for `client_id`, stamped with the current UTC time.
    pub async fn register(&self, client_id: i64, address: &str) -> Result<Parcel, ServiceError> {
        let mut parcel = Parcel::new(client_id, address, now_utc());
        parcel.id = self
            .store
            .add(&parcel)
            .await
            .map_err(|source| ServiceError::Registration { client_id, source })?;

        info!(
            id = parcel.id,
            client_id,
            address = %parcel.address,
            created_at = %parcel.created_at,
            "parcel registered"
        );
        Ok(parcel)
    }

    pub async fn get(&self, id: i64) -> Result<Parcel, ServiceError> {
        self.store
            .get(id)
            .await
            .map_err(|source| ServiceError::Lookup {
                subject: format!("parcel {id}"),
                source,
            })
    }

    /// Advance the parcel one step along `registered -> sent -> delivered`.
    ///
    /// A delivered parcel is left untouched. Returns the status after the call.
    pub async fn next_status(&self, id: i64) -> Result<ParcelStatus, ServiceError> {
        let parcel = self.get(id).await?;
        let Some(next) = parcel.status.next() else {
            return Ok(parcel.status);
        };

        self.store
            .set_status(id, next)
            .await
            .map_err(|source| ServiceError::Transition {
                id,
                status: next,
                source,
            })?;

        info!(id, from = %parcel.status, to = %next, "parcel status changed");
        Ok(next)
    }

    /// Change the delivery address while the parcel is still registered.
    pub async fn change_address(&self, id: i64, address: &str) -> Result<(), ServiceError> {
        let changed = self
            .store
            .set_address(id, address)
            .await
            .map_err(|source| ServiceError::Update { id, source })?;
        if !changed {
            warn!(id, "address not changed: parcel missing or no longer registered");
            return Err(ServiceError::GuardFailed {
                id,
                action: GuardedAction::ChangeAddress,
            });
        }

        info!(id, address, "parcel address changed");
        Ok(())
    }

    /// Delete the parcel while it is still registered.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|source| ServiceError::Deletion { id, source })?;
        if !removed {
            warn!(id, "parcel not deleted: missing or no longer registered");
            return Err(ServiceError::GuardFailed {
                id,
                action: GuardedAction::Delete,
            });
        }

        info!(id, "parcel deleted");
        Ok(())
    }

    pub async fn list_by_client(&self, client_id: i64) -> Result<Vec<Parcel>, ServiceError> {
        self.store
            .get_by_client(client_id)
            .await
            .map_err(|source| ServiceError::Lookup {
                subject: format!("parcels of client {client_id}"),
                source,
            })
    }

    /// Human-readable listing of a client's parcels, one line each.
    pub async fn client_report(&self, client_id: i64) -> Result<String, ServiceError> {
        let parcels = self.list_by_client(client_id).await?;

        let lines: String = parcels
            .iter()
            .map(|parcel| format!("  {parcel}\n"))
            .collect();
        Ok(format!("Parcels of client {client_id}:\n{lines}"))
    }
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
