use std::sync::Arc;

use fleetcal::auth::StaticUser;
use fleetcal::calendar::{classify_day, DateRangeSelector, Endpoint};
use fleetcal::catalog::InMemoryCatalog;
use fleetcal::collection::BookingCollection;
use fleetcal::edit::{EditState, ReservationEditController};
use fleetcal::model::*;
use fleetcal::store::{InMemoryStore, RecordStore};

fn d(s: &str) -> Day {
    s.parse().unwrap()
}

struct App {
    store: Arc<InMemoryStore>,
    collection: BookingCollection,
    controller: ReservationEditController,
}

fn app() -> App {
    let store = Arc::new(InMemoryStore::default());
    let collection = BookingCollection::new(store.clone()).with_notify(store.notify().clone());
    let controller = ReservationEditController::new(
        store.clone(),
        Arc::new(StaticUser::new("client-42")),
        Arc::new(InMemoryCatalog::new().with_price("veh2", 85)),
        collection.refresh_signal(),
        50,
    );
    App {
        store,
        collection,
        controller,
    }
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn edit_reservation_dates_end_to_end() {
    let mut app = app();
    let a = app
        .store
        .create(BookingRecord::reservation(
            "veh1",
            DayRange::new(d("2025-09-10"), d("2025-09-12")),
        ))
        .await
        .unwrap();
    app.collection.load("veh1").await.unwrap();

    app.controller.open(a.clone()).unwrap();
    app.controller
        .change_dates(d("2025-09-15"), d("2025-09-20"))
        .unwrap();
    let outcome = app.controller.save().await.unwrap();

    assert_eq!(app.controller.state(), &EditState::Closed);
    assert!(outcome.message.contains("2025-09-15"));
    // no client on the record, so the signed-in user is used
    assert_eq!(outcome.record.client_id.as_deref(), Some("client-42"));
    assert_eq!(outcome.record.price_per_day, Some(50));

    // cache still shows the old range until the scheduled refresh runs
    assert!(app.collection.index("veh1").is_occupied(d("2025-09-11")));
    assert_eq!(app.collection.apply_refreshes().await.unwrap(), 1);

    let index = app.collection.index("veh1");
    assert!(!index.is_occupied(d("2025-09-11")));
    let occupant = index.occupant(d("2025-09-17")).unwrap();
    assert_eq!(occupant.id, a.id);
    assert_eq!(app.collection.records("veh1").len(), 1);
}

#[tokio::test]
async fn pick_range_then_book_it() {
    let mut app = app();
    app.store
        .create(BookingRecord::maintenance(
            "veh1",
            DayRange::new(d("2025-09-10"), d("2025-09-12")),
        ))
        .await
        .unwrap();
    app.collection.load("veh1").await.unwrap();
    let index = app.collection.index("veh1");
    let today = d("2025-09-01");

    let mut selector = DateRangeSelector::new();
    assert!(selector.click(d("2025-08-30"), today, &index).is_err());
    assert!(selector.click(d("2025-09-11"), today, &index).is_err());
    selector.click(d("2025-09-18"), today, &index).unwrap();
    let emitted = selector.click(d("2025-09-14"), today, &index).unwrap();
    assert_eq!(emitted[0].endpoint, Endpoint::Start);
    assert_eq!(emitted[1].endpoint, Endpoint::End);

    let range = selector.confirmed().unwrap();
    assert_eq!(range, DayRange::new(d("2025-09-14"), d("2025-09-18")));
    let role = classify_day(d("2025-09-14"), &selector.pending(), Some(&range), &index);
    assert_eq!(role, DayRole::SelectedStart);

    let booked = app
        .store
        .create(BookingRecord::reservation("veh1", range))
        .await
        .unwrap();
    app.collection.refresh_signal().schedule("veh1");
    app.collection.apply_refreshes().await.unwrap();

    let index = app.collection.index("veh1");
    assert_eq!(index.occupant(d("2025-09-16")).unwrap().id, booked.id);
    assert_eq!(
        index.free_ranges(&DayRange::new(d("2025-09-01"), d("2025-09-30"))),
        vec![
            DayRange::new(d("2025-09-01"), d("2025-09-09")),
            DayRange::new(d("2025-09-13"), d("2025-09-13")),
            DayRange::new(d("2025-09-19"), d("2025-09-30")),
        ]
    );
}

#[tokio::test]
async fn move_reservation_to_another_vehicle() {
    let mut app = app();
    let a = app
        .store
        .create(BookingRecord::reservation(
            "veh1",
            DayRange::new(d("2025-09-10"), d("2025-09-12")),
        ))
        .await
        .unwrap();
    app.collection.load("veh1").await.unwrap();
    app.collection.load("veh2").await.unwrap();

    app.controller.open(a.clone()).unwrap();
    app.controller.change_resource("veh2").unwrap();
    let outcome = app.controller.save().await.unwrap();
    assert_eq!(outcome.record.price_per_day, Some(85));

    assert_eq!(app.collection.apply_refreshes().await.unwrap(), 2);
    assert!(app.collection.records("veh1").is_empty());
    assert_eq!(app.collection.records("veh2")[0].id, a.id);
}

#[tokio::test]
async fn delete_pending_reservation() {
    let mut app = app();
    let a = app
        .store
        .create(BookingRecord::reservation(
            "veh1",
            DayRange::new(d("2025-09-10"), d("2025-09-12")),
        ))
        .await
        .unwrap();
    app.collection.load("veh1").await.unwrap();

    app.controller.request_delete(a).unwrap();
    app.controller.confirm_delete().await.unwrap();
    app.collection.apply_refreshes().await.unwrap();
    assert!(app.collection.records("veh1").is_empty());
    assert_eq!(app.store.record_count(), 0);
}
