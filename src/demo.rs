//! The fixed demonstration sequence run by the `parcel-tracker` binary.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::service::ParcelService;
use crate::store::ParcelStore;

/// Register a parcel, redirect it, send it, try to delete it, then register and
/// delete a second one. `report` receives the client's parcel listing after
/// each of those three phases.
///
/// The refused deletion of the sent parcel is expected and does not stop the
/// sequence; any other failure does.
pub async fn run<S, F>(
    service: &ParcelService<S>,
    config: &Config,
    mut report: F,
) -> Result<(), ServiceError>
where
    S: ParcelStore,
    F: FnMut(String),
{
    let client = config.client_id;

    let parcel = service.register(client, &config.address).await?;
    service.change_address(parcel.id, &config.new_address).await?;
    service.next_status(parcel.id).await?;
    report(service.client_report(client).await?);

    match service.delete(parcel.id).await {
        Ok(()) => warn!(id = parcel.id, "sent parcel was deleted"),
        Err(ServiceError::GuardFailed { id, .. }) => {
            info!(id, "sent parcel kept: only registered parcels can be deleted")
        }
        Err(err) => return Err(err),
    }
    report(service.client_report(client).await?);

    let parcel = service.register(client, &config.address).await?;
    service.delete(parcel.id).await?;
    report(service.client_report(client).await?);

    Ok(())
}
