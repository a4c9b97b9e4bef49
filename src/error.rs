use std::fmt;

use thiserror::Error;

use crate::model::ParcelStatus;

/// Failures raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened.
    #[error("failed to open database at {path}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution, query or row scan failed.
    #[error("{context} failed")]
    Persistence {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A direct lookup by id matched no row.
    #[error("parcel {id} not found")]
    NotFound { id: i64 },
}

impl StoreError {
    pub(crate) fn persistence(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Persistence { context, source }
    }
}

/// Mutations that only apply while a parcel is still registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    ChangeAddress,
    Delete,
}

impl fmt::Display for GuardedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeAddress => f.write_str("change the address of"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Use-case failures returned by [`crate::ParcelService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to register parcel for client {client_id}")]
    Registration {
        client_id: i64,
        #[source]
        source: StoreError,
    },

    #[error("failed to look up {subject}")]
    Lookup {
        subject: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to move parcel {id} to status {status}")]
    Transition {
        id: i64,
        status: ParcelStatus,
        #[source]
        source: StoreError,
    },

    #[error("failed to change address of parcel {id}")]
    Update {
        id: i64,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete parcel {id}")]
    Deletion {
        id: i64,
        #[source]
        source: StoreError,
    },

    /// The guarded statement matched no row: the parcel is absent or no longer registered.
    #[error("cannot {action} parcel {id}: it does not exist or is no longer registered")]
    GuardFailed { id: i64, action: GuardedAction },
}

impl ServiceError {
    /// The storage failure underneath this error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Registration { source, .. }
            | Self::Lookup { source, .. }
            | Self::Transition { source, .. }
            | Self::Update { source, .. }
            | Self::Deletion { source, .. } => Some(source),
            Self::GuardFailed { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound { .. }))
    }
}
