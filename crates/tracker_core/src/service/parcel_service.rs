//! Parcel lifecycle service.
//!
//! # Responsibility
//! - Expose register, list, advance, re-address and delete actions.
//! - Advance status one step at a time through `ParcelStatus::next`.
//! - Report state changes through a pluggable notifier.
//!
//! # Invariants
//! - Every action re-reads state from the store; nothing is cached.
//! - Store errors are returned unchanged and stop the action immediately.
//! - No notification is emitted for a delivered parcel's no-op advance.

use crate::model::parcel::{ClientId, NewParcel, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelStore, RepoResult};
use log::info;
use std::fmt::{Display, Formatter};

/// State change reported by `ParcelService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelEvent {
    /// A parcel was stored under a new tracking number.
    Registered(Parcel),
    /// A parcel moved one step along its lifecycle.
    StatusChanged {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Current parcels of a client, in store order.
    ClientListing {
        client: ClientId,
        parcels: Vec<Parcel>,
    },
}

impl Display for ParcelEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered(parcel) => write!(
                f,
                "New parcel #{} to {} from client {} registered at {}",
                parcel.number, parcel.address, parcel.client, parcel.created_at
            ),
            Self::StatusChanged { number, status } => {
                write!(f, "Parcel #{number} has new status: {status}")
            }
            Self::ClientListing { client, parcels } => {
                write!(f, "Parcels of client {client}:")?;
                for parcel in parcels {
                    write!(
                        f,
                        "\nParcel #{} to {} from client {} registered at {}, status {}",
                        parcel.number,
                        parcel.address,
                        parcel.client,
                        parcel.created_at,
                        parcel.status
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Sink for human-readable parcel notifications.
pub trait ParcelNotifier {
    fn notify(&self, event: &ParcelEvent);
}

/// Default notifier writing events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ParcelNotifier for LogNotifier {
    fn notify(&self, event: &ParcelEvent) {
        match event {
            ParcelEvent::Registered(parcel) => info!(
                "event=parcel_register module=service status=ok number={} client={}",
                parcel.number, parcel.client
            ),
            ParcelEvent::StatusChanged { number, status } => info!(
                "event=parcel_status module=service status=ok number={number} new_status={status}"
            ),
            ParcelEvent::ClientListing { client, parcels } => info!(
                "event=parcel_list module=service status=ok client={} count={}",
                client,
                parcels.len()
            ),
        }
    }
}

/// Use-case service over a parcel store.
pub struct ParcelService<S: ParcelStore, N: ParcelNotifier = LogNotifier> {
    store: S,
    notifier: N,
}

impl<S: ParcelStore> ParcelService<S> {
    /// Creates a service that reports through the `log` facade.
    pub fn new(store: S) -> Self {
        Self::with_notifier(store, LogNotifier)
    }
}

impl<S: ParcelStore, N: ParcelNotifier> ParcelService<S, N> {
    pub fn with_notifier(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let payload = NewParcel::registered(client, address);
        let number = self.store.add(&payload)?;
        let parcel = payload.into_parcel(number);

        self.notifier.notify(&ParcelEvent::Registered(parcel.clone()));
        Ok(parcel)
    }

    /// Loads one parcel by tracking number.
    pub fn parcel(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.store.get(number)
    }

    /// Reports every parcel of `client` and returns them.
    ///
    /// The listing is emitted even when the client has no parcels.
    pub fn print_client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let parcels = self.store.get_by_client(client)?;
        self.notifier.notify(&ParcelEvent::ClientListing {
            client,
            parcels: parcels.clone(),
        });
        Ok(parcels)
    }

    /// Advances the parcel one lifecycle step and returns the resulting status.
    ///
    /// A delivered parcel is left untouched and is not reported.
    pub fn next_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
        let parcel = self.store.get(number)?;
        if parcel.status.is_terminal() {
            return Ok(parcel.status);
        }

        let next = parcel.status.next();
        self.store.set_status(number, next)?;
        self.notifier
            .notify(&ParcelEvent::StatusChanged { number, status: next });
        Ok(next)
    }

    /// Changes the delivery address of a registered parcel.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.store.set_address(number, address)
    }

    /// Deletes a registered parcel.
    pub fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.store.delete(number)
    }
}
