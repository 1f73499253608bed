// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Common tests for any database implementation.

use crate::db::{CarStore, EngineStore, SqlStore, car, engine};
use crate::model::*;
use carmgmt_core::clocks::testutils::{SettableClock, utc_datetime};
use carmgmt_core::db::{Db, DbError, Executor};
use sqlx::Row;
use std::sync::Arc;
use std::time::Duration;

/// Syntactic sugar to build an engine request.
fn engine_request(displacement: i32, no_of_cylinders: i32, car_range: i32) -> EngineRequest {
    EngineRequest { displacement, no_of_cylinders, car_range }
}

/// Syntactic sugar to build valid car details given only the distinguishing fields.
fn car_details(name: &str, brand: &str) -> CarDetails {
    CarDetails {
        name: name.to_owned(),
        year: 2020,
        brand: brand.to_owned(),
        fuel_type: FuelType::Petrol,
        price: 10000.0,
    }
}

/// Creates a store on top of `db` with a clock that the test can control.
fn setup_store(db: &Arc<dyn Db + Send + Sync>) -> (SqlStore, Arc<SettableClock>) {
    let clock = Arc::new(SettableClock::new(utc_datetime(2024, 3, 1, 12, 0, 0)));
    (SqlStore::new(db.clone(), clock.clone()), clock)
}

/// Inserts a new engine directly into the database, outside of any store.
async fn insert_test_engine(db: &Arc<dyn Db + Send + Sync>, displacement: i32) -> Engine {
    let new_engine = Engine::new(EngineId::generate(), displacement, 4, 500);
    engine::insert_engine(&mut db.ex().await.unwrap(), &new_engine).await.unwrap();
    new_engine
}

/// Inserts a new car directly into the database, outside of any store.
async fn insert_test_car(
    db: &Arc<dyn Db + Send + Sync>,
    details: CarDetails,
    with_engine: &Engine,
) -> Car {
    let now = utc_datetime(2023, 5, 6, 7, 8, 9);
    let new_car = Car::new(CarId::generate(), details, *with_engine.engine_id(), now, now)
        .with_engine(with_engine.clone());
    car::insert_car(&mut db.ex().await.unwrap(), &new_car).await.unwrap();
    new_car
}

/// Counts the rows in `table`.
async fn count_rows(db: &Arc<dyn Db + Send + Sync>, table: &str) -> i64 {
    let query_str = format!("SELECT COUNT(*) AS count FROM {}", table);
    match db.ex().await.unwrap() {
        #[cfg(feature = "postgres")]
        Executor::Postgres(mut ex) => {
            let row = sqlx::query(&query_str).fetch_one(&mut *ex).await.unwrap();
            row.try_get("count").unwrap()
        }

        Executor::Sqlite(mut ex) => {
            let row = sqlx::query(&query_str).fetch_one(&mut *ex).await.unwrap();
            row.try_get("count").unwrap()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

pub(crate) async fn test_engine_insert_and_get(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let engine2 = insert_test_engine(&db, 2000).await;

    assert_eq!(
        engine1,
        engine::get_engine(&mut db.ex().await.unwrap(), *engine1.engine_id()).await.unwrap()
    );
    assert_eq!(
        engine2,
        engine::get_engine(&mut db.ex().await.unwrap(), *engine2.engine_id()).await.unwrap()
    );
}

pub(crate) async fn test_engine_insert_duplicate(db: Arc<dyn Db + Send + Sync>) {
    let existing = insert_test_engine(&db, 1200).await;

    assert_eq!(
        DbError::AlreadyExists,
        engine::insert_engine(&mut db.ex().await.unwrap(), &existing).await.unwrap_err()
    );
}

pub(crate) async fn test_engine_get_not_found(db: Arc<dyn Db + Send + Sync>) {
    insert_test_engine(&db, 1200).await;

    let id = EngineId::generate();
    for _ in 0..2 {
        assert_eq!(
            DbError::NotFound,
            engine::get_engine(&mut db.ex().await.unwrap(), id).await.unwrap_err()
        );
    }
}

pub(crate) async fn test_engine_update_ok(db: Arc<dyn Db + Send + Sync>) {
    let original = insert_test_engine(&db, 1200).await;
    let other = insert_test_engine(&db, 3000).await;

    let updated = Engine::from_request(*original.engine_id(), &engine_request(1600, 6, 650));
    engine::update_engine(&mut db.ex().await.unwrap(), &updated).await.unwrap();

    assert_eq!(
        updated,
        engine::get_engine(&mut db.ex().await.unwrap(), *original.engine_id()).await.unwrap()
    );
    assert_eq!(
        other,
        engine::get_engine(&mut db.ex().await.unwrap(), *other.engine_id()).await.unwrap()
    );
}

pub(crate) async fn test_engine_update_not_found(db: Arc<dyn Db + Send + Sync>) {
    let missing = Engine::new(EngineId::generate(), 1, 1, 1);
    assert_eq!(
        DbError::NotFound,
        engine::update_engine(&mut db.ex().await.unwrap(), &missing).await.unwrap_err()
    );
    assert_eq!(0, count_rows(&db, "engine").await);
}

pub(crate) async fn test_engine_delete_ok(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let engine2 = insert_test_engine(&db, 1400).await;

    engine::delete_engine(&mut db.ex().await.unwrap(), *engine1.engine_id()).await.unwrap();

    assert_eq!(
        DbError::NotFound,
        engine::get_engine(&mut db.ex().await.unwrap(), *engine1.engine_id()).await.unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        engine::delete_engine(&mut db.ex().await.unwrap(), *engine1.engine_id())
            .await
            .unwrap_err()
    );
    assert_eq!(
        engine2,
        engine::get_engine(&mut db.ex().await.unwrap(), *engine2.engine_id()).await.unwrap()
    );
}

pub(crate) async fn test_engine_delete_cascades_to_cars(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let engine2 = insert_test_engine(&db, 1400).await;
    let car1 = insert_test_car(&db, car_details("Polo", "Volkswagen"), &engine1).await;
    let car2 = insert_test_car(&db, car_details("Golf", "Volkswagen"), &engine1).await;
    let car3 = insert_test_car(&db, car_details("Passat", "Volkswagen"), &engine2).await;

    engine::delete_engine(&mut db.ex().await.unwrap(), *engine1.engine_id()).await.unwrap();

    for id in [car1.id(), car2.id()] {
        assert_eq!(
            DbError::NotFound,
            car::get_car(&mut db.ex().await.unwrap(), *id).await.unwrap_err()
        );
    }
    assert_eq!(car3, car::get_car(&mut db.ex().await.unwrap(), *car3.id()).await.unwrap());
}

pub(crate) async fn test_car_insert_and_get(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let car1 = insert_test_car(&db, car_details("Polo", "Volkswagen"), &engine1).await;

    let fetched = car::get_car(&mut db.ex().await.unwrap(), *car1.id()).await.unwrap();
    assert_eq!(car1, fetched);
    assert_eq!(Some(&engine1), fetched.engine().as_ref());
}

pub(crate) async fn test_car_insert_unknown_engine(db: Arc<dyn Db + Send + Sync>) {
    let now = utc_datetime(2023, 5, 6, 7, 8, 9);
    let orphan = Car::new(
        CarId::generate(),
        car_details("Polo", "Volkswagen"),
        EngineId::generate(),
        now,
        now,
    );
    assert_eq!(
        DbError::NotFound,
        car::insert_car(&mut db.ex().await.unwrap(), &orphan).await.unwrap_err()
    );
    assert_eq!(0, count_rows(&db, "car").await);
}

pub(crate) async fn test_car_get_not_found(db: Arc<dyn Db + Send + Sync>) {
    let id = CarId::generate();
    for _ in 0..2 {
        assert_eq!(
            DbError::NotFound,
            car::get_car(&mut db.ex().await.unwrap(), id).await.unwrap_err()
        );
    }
}

pub(crate) async fn test_cars_by_brand(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let engine2 = insert_test_engine(&db, 1400).await;
    let polo = insert_test_car(&db, car_details("Polo", "Volkswagen"), &engine1).await;
    let golf = insert_test_car(&db, car_details("Golf", "Volkswagen"), &engine2).await;
    insert_test_car(&db, car_details("Ibiza", "Seat"), &engine1).await;

    let cars =
        car::get_cars_by_brand(&mut db.ex().await.unwrap(), "Volkswagen", true).await.unwrap();
    assert_eq!(vec![golf.clone(), polo.clone()], cars);

    let cars =
        car::get_cars_by_brand(&mut db.ex().await.unwrap(), "Volkswagen", false).await.unwrap();
    assert_eq!(2, cars.len());
    assert_eq!(golf.id(), cars[0].id());
    assert_eq!(polo.id(), cars[1].id());
    assert!(cars.iter().all(|c| c.engine().is_none()));

    assert!(
        car::get_cars_by_brand(&mut db.ex().await.unwrap(), "volkswagen", true)
            .await
            .unwrap()
            .is_empty()
    );
}

pub(crate) async fn test_car_update_and_delete_not_found(db: Arc<dyn Db + Send + Sync>) {
    let engine1 = insert_test_engine(&db, 1200).await;
    let now = utc_datetime(2023, 5, 6, 7, 8, 9);
    let details = car_details("Polo", "Volkswagen");
    let missing = Car::new(CarId::generate(), details, *engine1.engine_id(), now, now);

    assert_eq!(
        DbError::NotFound,
        car::update_car(&mut db.ex().await.unwrap(), &missing).await.unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        car::delete_car(&mut db.ex().await.unwrap(), *missing.id()).await.unwrap_err()
    );
}

pub(crate) async fn test_store_engine_lifecycle(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let created = store.create_engine(&engine_request(1200, 4, 400)).await.unwrap();
    assert_eq!(1200, *created.displacement());
    assert_eq!(4, *created.no_of_cylinders());
    assert_eq!(400, *created.car_range());

    let other = store.create_engine(&engine_request(1200, 4, 400)).await.unwrap();
    assert_ne!(created.engine_id(), other.engine_id());

    assert_eq!(created, store.get_engine(*created.engine_id()).await.unwrap());

    let updated =
        store.update_engine(*created.engine_id(), &engine_request(1300, 3, 450)).await.unwrap();
    assert_eq!(Engine::new(*created.engine_id(), 1300, 3, 450), updated);
    assert_eq!(updated, store.get_engine(*created.engine_id()).await.unwrap());

    assert_eq!(updated, store.delete_engine(*created.engine_id()).await.unwrap());
    assert_eq!(DbError::NotFound, store.delete_engine(*created.engine_id()).await.unwrap_err());
    assert_eq!(DbError::NotFound, store.get_engine(*created.engine_id()).await.unwrap_err());
    assert_eq!(other, store.get_engine(*other.engine_id()).await.unwrap());
}

pub(crate) async fn test_store_engine_not_found(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let id = EngineId::generate();
    assert_eq!(DbError::NotFound, store.get_engine(id).await.unwrap_err());
    assert_eq!(
        DbError::NotFound,
        store.update_engine(id, &engine_request(1, 1, 1)).await.unwrap_err()
    );
    assert_eq!(DbError::NotFound, store.delete_engine(id).await.unwrap_err());
    assert_eq!(0, count_rows(&db, "engine").await);
}

pub(crate) async fn test_store_create_car_with_new_engine(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let choice = EngineChoice::New(engine_request(1400, 4, 800));
    let created = store.create_car(car_details("Golf", "Volkswagen"), choice).await.unwrap();
    assert_eq!("Golf", created.name());
    assert_eq!(utc_datetime(2024, 3, 1, 12, 0, 0), *created.created_at());
    assert_eq!(created.created_at(), created.updated_at());

    let new_engine = created.engine().clone().unwrap();
    assert_eq!(created.engine_id(), new_engine.engine_id());
    assert_eq!(Engine::new(*new_engine.engine_id(), 1400, 4, 800), new_engine);

    assert_eq!(created, store.get_car(*created.id()).await.unwrap());
    assert_eq!(new_engine, store.get_engine(*new_engine.engine_id()).await.unwrap());
}

pub(crate) async fn test_store_create_car_with_existing_engine(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);
    let existing = insert_test_engine(&db, 1200).await;

    let choice = EngineChoice::Existing(*existing.engine_id());
    let created = store.create_car(car_details("Polo", "Volkswagen"), choice).await.unwrap();
    assert_eq!(Some(&existing), created.engine().as_ref());
    assert_eq!(1, count_rows(&db, "engine").await);

    let choice = EngineChoice::Existing(EngineId::generate());
    assert_eq!(
        DbError::NotFound,
        store.create_car(car_details("Up", "Volkswagen"), choice).await.unwrap_err()
    );
    assert_eq!(1, count_rows(&db, "car").await);
}

pub(crate) async fn test_store_create_car_rolls_back_engine(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    // Bypasses validation to make the car insertion fail after the engine was inserted.
    let details = car_details("", "Volkswagen");
    match store.create_car(details, EngineChoice::New(engine_request(1400, 4, 800))).await {
        Err(DbError::BackendError(_)) => (),
        e => panic!("{:?}", e),
    }

    assert_eq!(0, count_rows(&db, "engine").await);
    assert_eq!(0, count_rows(&db, "car").await);
}

pub(crate) async fn test_store_update_car(db: Arc<dyn Db + Send + Sync>) {
    let (store, clock) = setup_store(&db);

    let created = store
        .create_car(car_details("Polo", "Volkswagen"), EngineChoice::New(engine_request(1, 1, 1)))
        .await
        .unwrap();

    clock.advance(Duration::from_secs(3600));
    let mut details = car_details("Polo GTI", "Volkswagen");
    details.fuel_type = FuelType::Hybrid;
    details.price = 25000.5;
    let updated = store
        .update_car(*created.id(), details.clone(), EngineChoice::New(engine_request(2000, 4, 900)))
        .await
        .unwrap();

    let exp_engine = Engine::new(*created.engine_id(), 2000, 4, 900);
    let exp = Car::new(
        *created.id(),
        details,
        *created.engine_id(),
        *created.created_at(),
        utc_datetime(2024, 3, 1, 13, 0, 0),
    )
    .with_engine(exp_engine.clone());
    assert_eq!(exp, updated);
    assert_eq!(exp, store.get_car(*created.id()).await.unwrap());
    assert_eq!(exp_engine, store.get_engine(*created.engine_id()).await.unwrap());

    assert_eq!(
        DbError::NotFound,
        store
            .update_car(
                CarId::generate(),
                car_details("Up", "Volkswagen"),
                EngineChoice::New(engine_request(1, 1, 1))
            )
            .await
            .unwrap_err()
    );
    assert_eq!(1, count_rows(&db, "engine").await);
}

pub(crate) async fn test_store_update_car_with_existing_engine(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);
    let existing = insert_test_engine(&db, 1200).await;

    let created = store
        .create_car(car_details("Polo", "Volkswagen"), EngineChoice::New(engine_request(1, 1, 1)))
        .await
        .unwrap();
    let original_engine = created.engine().clone().unwrap();

    let updated = store
        .update_car(
            *created.id(),
            car_details("Polo", "Volkswagen"),
            EngineChoice::Existing(*existing.engine_id()),
        )
        .await
        .unwrap();
    assert_eq!(existing.engine_id(), updated.engine_id());
    assert_eq!(Some(&existing), updated.engine().as_ref());

    // The previously-referenced engine is left untouched.
    assert_eq!(original_engine, store.get_engine(*original_engine.engine_id()).await.unwrap());
    assert_eq!(2, count_rows(&db, "engine").await);

    assert_eq!(
        DbError::NotFound,
        store
            .update_car(
                *created.id(),
                car_details("Polo", "Volkswagen"),
                EngineChoice::Existing(EngineId::generate()),
            )
            .await
            .unwrap_err()
    );
    assert_eq!(updated, store.get_car(*created.id()).await.unwrap());
}

pub(crate) async fn test_store_update_car_reuses_engine(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let created = store
        .create_car(car_details("Golf", "Volkswagen"), EngineChoice::New(engine_request(1, 1, 1)))
        .await
        .unwrap();

    for displacement in [1000, 1400, 2000] {
        let updated = store
            .update_car(
                *created.id(),
                car_details("Golf", "Volkswagen"),
                EngineChoice::New(engine_request(displacement, 4, 600)),
            )
            .await
            .unwrap();
        assert_eq!(created.engine_id(), updated.engine_id());
        assert_eq!(1, count_rows(&db, "engine").await);
    }

    let current = store.get_engine(*created.engine_id()).await.unwrap();
    assert_eq!(Engine::new(*created.engine_id(), 2000, 4, 600), current);
}

pub(crate) async fn test_store_delete_car(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let created = store
        .create_car(car_details("Golf", "Volkswagen"), EngineChoice::New(engine_request(1, 1, 1)))
        .await
        .unwrap();

    assert_eq!(created, store.delete_car(*created.id()).await.unwrap());
    assert_eq!(DbError::NotFound, store.delete_car(*created.id()).await.unwrap_err());
    assert_eq!(DbError::NotFound, store.get_car(*created.id()).await.unwrap_err());

    let remaining = created.engine().clone().unwrap();
    assert_eq!(remaining, store.get_engine(*remaining.engine_id()).await.unwrap());
}

pub(crate) async fn test_store_cars_by_brand(db: Arc<dyn Db + Send + Sync>) {
    let (store, _clock) = setup_store(&db);

    let a = store
        .create_car(car_details("A4", "Audi"), EngineChoice::New(engine_request(2000, 4, 700)))
        .await
        .unwrap();
    store
        .create_car(car_details("Golf", "Volkswagen"), EngineChoice::New(engine_request(1, 1, 1)))
        .await
        .unwrap();

    assert_eq!(vec![a.clone()], store.get_cars_by_brand("Audi", true).await.unwrap());
    let cars = store.get_cars_by_brand("Audi", false).await.unwrap();
    assert_eq!(1, cars.len());
    assert_eq!(None, *cars[0].engine());
    assert!(store.get_cars_by_brand("Tesla", true).await.unwrap().is_empty());
}

/// Instantiates the database tests for a specific backend.
macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta] )? ) => {
        carmgmt_core::db::testutils::generate_tests!(
            $( #[$extra], )?
            $setup,
            crate::db::tests,
            test_engine_insert_and_get,
            test_engine_insert_duplicate,
            test_engine_get_not_found,
            test_engine_update_ok,
            test_engine_update_not_found,
            test_engine_delete_ok,
            test_engine_delete_cascades_to_cars,
            test_car_insert_and_get,
            test_car_insert_unknown_engine,
            test_car_get_not_found,
            test_cars_by_brand,
            test_car_update_and_delete_not_found,
            test_store_engine_lifecycle,
            test_store_engine_not_found,
            test_store_create_car_with_new_engine,
            test_store_create_car_with_existing_engine,
            test_store_create_car_rolls_back_engine,
            test_store_update_car,
            test_store_update_car_with_existing_engine,
            test_store_update_car_reuses_engine,
            test_store_delete_car,
            test_store_cars_by_brand
        );
    }
];

mod sqlite {
    use super::*;
    use crate::db::init_schema;
    use carmgmt_core::db::sqlite::testutils::setup;

    /// Creates an in-memory database with the schema already in place.
    async fn setup_db() -> Arc<dyn Db + Send + Sync> {
        let db = setup().await;
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(db)
    }

    generate_db_tests!(setup_db().await);
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use crate::db::init_schema;
    use carmgmt_core::db::postgres::testutils::setup;

    /// Connects to the test database and creates the schema in a temporary namespace.
    async fn setup_db() -> Arc<dyn Db + Send + Sync> {
        let db = setup().await;
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(db)
    }

    generate_db_tests!(
        setup_db().await,
        #[ignore = "Requires environment configuration and is expensive"]
    );
}
