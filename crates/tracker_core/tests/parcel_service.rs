use std::cell::RefCell;
use tracker_core::db::open_db_in_memory;
use tracker_core::{
    ClientId, NewParcel, Parcel, ParcelEvent, ParcelNotifier, ParcelNumber, ParcelService,
    ParcelStatus, ParcelStore, RepoError, RepoResult, SqliteParcelStore,
};

const ADDRESS_A: &str = "Pskov, Pushkina st., Kolotushkina bld. 5";
const ADDRESS_B: &str = "Saratov, Verkhnie Zori, Kozlova st., bld. 25";

#[derive(Default)]
struct RecordingNotifier {
    events: RefCell<Vec<ParcelEvent>>,
}

impl RecordingNotifier {
    fn take(&self) -> Vec<ParcelEvent> {
        self.events.take()
    }
}

impl ParcelNotifier for RecordingNotifier {
    fn notify(&self, event: &ParcelEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Store whose status writes always fail.
struct FailingStatusWrites<'conn>(SqliteParcelStore<'conn>);

impl ParcelStore for FailingStatusWrites<'_> {
    fn add(&self, parcel: &NewParcel) -> RepoResult<ParcelNumber> {
        self.0.add(parcel)
    }
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.0.get(number)
    }
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.0.get_by_client(client)
    }
    fn set_status(&self, _number: ParcelNumber, _status: ParcelStatus) -> RepoResult<()> {
        Err(RepoError::InvalidData("status column is read-only".to_string()))
    }
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.0.set_address(number, address)
    }
    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.0.delete(number)
    }
}

fn listing(events: &[ParcelEvent]) -> &[Parcel] {
    match events {
        [ParcelEvent::ClientListing { parcels, .. }] => parcels,
        other => panic!("expected a single listing event, got {other:?}"),
    }
}

#[test]
fn register_stores_registered_parcel_and_notifies() {
    let conn = open_db_in_memory().unwrap();
    let service =
        ParcelService::with_notifier(SqliteParcelStore::new(&conn), RecordingNotifier::default());

    let parcel = service.register(1, ADDRESS_A).unwrap();
    assert_ne!(parcel.number, 0);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(service.parcel(parcel.number).unwrap(), parcel);

    let events = service.notifier().take();
    assert_eq!(events, vec![ParcelEvent::Registered(parcel.clone())]);
    assert_eq!(
        events[0].to_string(),
        format!(
            "New parcel #{} to {ADDRESS_A} from client 1 registered at {}",
            parcel.number, parcel.created_at
        )
    );
}

#[test]
fn next_status_walks_lifecycle_and_stops_at_delivered() {
    let conn = open_db_in_memory().unwrap();
    let service =
        ParcelService::with_notifier(SqliteParcelStore::new(&conn), RecordingNotifier::default());
    let number = service.register(1, ADDRESS_A).unwrap().number;
    service.notifier().take();

    assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Sent);
    assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Delivered);
    assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Delivered);
    assert_eq!(service.parcel(number).unwrap().status, ParcelStatus::Delivered);

    let events = service.notifier().take();
    assert_eq!(
        events,
        vec![
            ParcelEvent::StatusChanged {
                number,
                status: ParcelStatus::Sent
            },
            ParcelEvent::StatusChanged {
                number,
                status: ParcelStatus::Delivered
            },
        ]
    );
    assert_eq!(
        events[0].to_string(),
        format!("Parcel #{number} has new status: sent")
    );
}

#[test]
fn next_status_on_missing_parcel_returns_not_found_without_notifying() {
    let conn = open_db_in_memory().unwrap();
    let service =
        ParcelService::with_notifier(SqliteParcelStore::new(&conn), RecordingNotifier::default());

    assert!(matches!(
        service.next_status(99).unwrap_err(),
        RepoError::NotFound(99)
    ));
    assert!(service.notifier().take().is_empty());
}

#[test]
fn failed_status_write_is_not_announced() {
    let conn = open_db_in_memory().unwrap();
    let store = FailingStatusWrites(SqliteParcelStore::new(&conn));
    let service = ParcelService::with_notifier(store, RecordingNotifier::default());
    let number = service.register(1, ADDRESS_A).unwrap().number;
    service.notifier().take();

    assert!(matches!(
        service.next_status(number).unwrap_err(),
        RepoError::InvalidData(_)
    ));
    assert!(service.notifier().take().is_empty());
    assert_eq!(service.parcel(number).unwrap().status, ParcelStatus::Registered);
}

#[test]
fn change_address_and_delete_are_gated_on_registered() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::new(&conn));
    let number = service.register(3, ADDRESS_A).unwrap().number;

    service.change_address(number, ADDRESS_B).unwrap();
    assert_eq!(service.parcel(number).unwrap().address, ADDRESS_B);

    service.next_status(number).unwrap();
    assert!(matches!(
        service.change_address(number, ADDRESS_A).unwrap_err(),
        RepoError::NotRegistered {
            status: ParcelStatus::Sent,
            ..
        }
    ));
    assert!(matches!(
        service.delete(number).unwrap_err(),
        RepoError::NotRegistered { .. }
    ));
    assert_eq!(service.parcel(number).unwrap().address, ADDRESS_B);
}

#[test]
fn print_client_parcels_emits_header_for_empty_listing() {
    let conn = open_db_in_memory().unwrap();
    let service =
        ParcelService::with_notifier(SqliteParcelStore::new(&conn), RecordingNotifier::default());

    assert!(service.print_client_parcels(12).unwrap().is_empty());

    let events = service.notifier().take();
    assert!(listing(&events).is_empty());
    assert_eq!(events[0].to_string(), "Parcels of client 12:");
}

#[test]
fn client_listing_renders_one_line_per_parcel() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::new(&conn);
    let service = ParcelService::with_notifier(store, RecordingNotifier::default());
    let parcel = service.register(2, ADDRESS_A).unwrap();
    service.notifier().take();

    service.print_client_parcels(2).unwrap();

    let rendered = service.notifier().take()[0].to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Parcels of client 2:".to_string(),
            format!(
                "Parcel #{} to {ADDRESS_A} from client 2 registered at {}, status registered",
                parcel.number, parcel.created_at
            ),
        ]
    );
}

#[test]
fn end_to_end_scenario() {
    let conn = open_db_in_memory().unwrap();
    let service =
        ParcelService::with_notifier(SqliteParcelStore::new(&conn), RecordingNotifier::default());
    let client = 1;

    let first = service.register(client, ADDRESS_A).unwrap();
    service.change_address(first.number, ADDRESS_B).unwrap();
    service.next_status(first.number).unwrap();
    service.notifier().take();

    let parcels = service.print_client_parcels(client).unwrap();
    assert_eq!(listing(&service.notifier().take()), parcels.as_slice());
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].address, ADDRESS_B);
    assert_eq!(parcels[0].status, ParcelStatus::Sent);

    assert!(matches!(
        service.delete(first.number).unwrap_err(),
        RepoError::NotRegistered { .. }
    ));
    assert_eq!(service.print_client_parcels(client).unwrap(), parcels);

    let second = service.register(client, ADDRESS_A).unwrap();
    service.delete(second.number).unwrap();

    let remaining = service.print_client_parcels(client).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].number, first.number);
    assert!(matches!(
        SqliteParcelStore::new(&conn).get(second.number).unwrap_err(),
        RepoError::NotFound(_)
    ));
}
