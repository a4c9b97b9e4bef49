//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::lock::Mutex;
use parcel_tracker::{Parcel, ParcelStatus, ParcelStore, StoreError};

pub fn test_parcel(client_id: i64) -> Parcel {
    Parcel::new(client_id, "test", "2024-05-01T10:00:00Z")
}

#[derive(Default)]
struct State {
    rows: BTreeMap<i64, Parcel>,
    last_id: i64,
    set_status_calls: usize,
}

/// In-memory [`ParcelStore`] with the same guard semantics as the SQLite store.
///
/// `failing()` builds a store whose every call returns a persistence error;
/// `failing_on(context)` fails only the operation with that error context.
#[derive(Default)]
pub struct MemoryParcelStore {
    state: Mutex<State>,
    failing: bool,
    fail_on: Option<&'static str>,
}

impl MemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            state: Mutex::default(),
            failing: true,
            fail_on: None,
        }
    }

    pub fn failing_on(context: &'static str) -> Self {
        Self {
            fail_on: Some(context),
            ..Self::default()
        }
    }

    pub async fn set_status_calls(&self) -> usize {
        self.state.lock().await.set_status_calls
    }

    fn check(&self, context: &'static str) -> Result<(), StoreError> {
        if self.failing || self.fail_on == Some(context) {
            return Err(StoreError::Persistence {
                context,
                source: rusqlite::Error::InvalidQuery,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ParcelStore for MemoryParcelStore {
    async fn add(&self, parcel: &Parcel) -> Result<i64, StoreError> {
        self.check("insert parcel")?;
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = state.last_id;
        state.rows.insert(id, Parcel { id, ..parcel.clone() });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Parcel, StoreError> {
        self.check("select parcel")?;
        let state = self.state.lock().await;
        state.rows.get(&id).cloned().ok_or(StoreError::NotFound { id })
    }

    async fn get_by_client(&self, client_id: i64) -> Result<Vec<Parcel>, StoreError> {
        self.check("select client parcels")?;
        let state = self.state.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|parcel| parcel.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: i64, status: ParcelStatus) -> Result<(), StoreError> {
        self.check("update parcel status")?;
        let mut state = self.state.lock().await;
        state.set_status_calls += 1;
        if let Some(parcel) = state.rows.get_mut(&id) {
            parcel.status = status;
        }
        Ok(())
    }

    async fn set_address(&self, id: i64, address: &str) -> Result<bool, StoreError> {
        self.check("update parcel address")?;
        let mut state = self.state.lock().await;
        match state.rows.get_mut(&id) {
            Some(parcel) if parcel.status == ParcelStatus::Registered => {
                parcel.address = address.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.check("delete parcel")?;
        let mut state = self.state.lock().await;
        let registered = state
            .rows
            .get(&id)
            .is_some_and(|parcel| parcel.status == ParcelStatus::Registered);
        if registered {
            state.rows.remove(&id);
        }
        Ok(registered)
    }
}
