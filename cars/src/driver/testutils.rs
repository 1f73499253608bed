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

//! Test utilities for the business layer.

use crate::db::{CarStore, EngineStore, SqlStore, init_schema};
use crate::driver::Driver;
use crate::model::*;
use async_trait::async_trait;
use carmgmt_core::clocks::testutils::{SettableClock, utc_datetime};
use carmgmt_core::db::{Db, DbError, DbResult, Executor, sqlite};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// State of a running test backed by an in-memory database.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver and its store.
    clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver with a fresh database and a clock set to March 1st, 2024.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(Arc::new(SettableClock::new(utc_datetime(2024, 3, 1, 12, 0, 0)))).await
    }

    /// Initializes a driver with a fresh database and the given `clock`.
    pub(crate) async fn setup_with(clock: Arc<SettableClock>) -> Self {
        let db = Arc::new(sqlite::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let db: Arc<dyn Db + Send + Sync> = db;

        let store = Arc::new(SqlStore::new(db.clone(), clock.clone()));
        let driver = Driver::new(clock.clone(), store.clone(), store);
        Self { db, clock, driver }
    }

    /// Gets the clock used by the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}

/// Store that records how many times it was called and fails every call.
/// Store that fails every operation and counts how many times it was called.
#[derive(Default)]
pub(crate) struct CountingStore {
    /// Number of calls received so far.
    calls: AtomicUsize,
}

impl CountingStore {
    /// Returns the number of calls received so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Records a call and returns the error all calls fail with.
    fn record<T>(&self) -> DbResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DbError::BackendError("Unexpected store call".to_owned()))
    }
}

#[async_trait]
impl EngineStore for CountingStore {
    async fn create_engine(&self, _request: &EngineRequest) -> DbResult<Engine> {
        self.record()
    }

    async fn get_engine(&self, _id: EngineId) -> DbResult<Engine> {
        self.record()
    }

    async fn update_engine(&self, _id: EngineId, _request: &EngineRequest) -> DbResult<Engine> {
        self.record()
    }

    async fn delete_engine(&self, _id: EngineId) -> DbResult<Engine> {
        self.record()
    }
}

#[async_trait]
impl CarStore for CountingStore {
    async fn create_car(&self, _details: CarDetails, _engine: EngineChoice) -> DbResult<Car> {
        self.record()
    }

    async fn get_car(&self, _id: CarId) -> DbResult<Car> {
        self.record()
    }

    async fn get_cars_by_brand(&self, _brand: &str, _include_engine: bool) -> DbResult<Vec<Car>> {
        self.record()
    }

    async fn update_car(
        &self,
        _id: CarId,
        _details: CarDetails,
        _engine: EngineChoice,
    ) -> DbResult<Car> {
        self.record()
    }

    async fn delete_car(&self, _id: CarId) -> DbResult<Car> {
        self.record()
    }
}

/// Creates a driver whose stores only count their invocations.  The clock is set to March 1st,
/// 2024.
pub(crate) fn counting_driver() -> (Driver, Arc<CountingStore>) {
    let clock = Arc::new(SettableClock::new(utc_datetime(2024, 3, 1, 12, 0, 0)));
    let store = Arc::new(CountingStore::default());
    (Driver::new(clock, store.clone(), store.clone()), store)
}
