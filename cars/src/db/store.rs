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

//! Transactional stores for engines and cars.

use crate::db::{car, engine};
use crate::model::{Car, CarDetails, CarId, Engine, EngineChoice, EngineId, EngineRequest};
use async_trait::async_trait;
use carmgmt_core::clocks::Clock;
use carmgmt_core::db::{Db, DbError, DbResult, Executor, TxExecutor};
use log::{debug, warn};
use std::sync::Arc;

/// Persistence operations on engines.  Every operation runs in its own transaction.
#[async_trait]
pub trait EngineStore {
    /// Creates a new engine with the properties in `request` and a freshly-generated identity.
    async fn create_engine(&self, request: &EngineRequest) -> DbResult<Engine>;

    /// Gets the engine identified by `id`.
    async fn get_engine(&self, id: EngineId) -> DbResult<Engine>;

    /// Replaces the properties of the engine identified by `id` with those in `request`.
    async fn update_engine(&self, id: EngineId, request: &EngineRequest) -> DbResult<Engine>;

    /// Deletes the engine identified by `id` and returns it as it was before deletion.
    async fn delete_engine(&self, id: EngineId) -> DbResult<Engine>;
}

/// Persistence operations on cars.  Every operation runs in its own transaction.
#[async_trait]
pub trait CarStore {
    /// Creates a new car with `details` and a freshly-generated identity.  The `engine` is
    /// resolved within the same transaction.
    async fn create_car(&self, details: CarDetails, engine: EngineChoice) -> DbResult<Car>;

    /// Gets the car identified by `id` with its engine attached.
    async fn get_car(&self, id: CarId) -> DbResult<Car>;

    /// Gets all cars made by `brand`, attaching their engines only if `include_engine` is true.
    async fn get_cars_by_brand(&self, brand: &str, include_engine: bool) -> DbResult<Vec<Car>>;

    /// Replaces the properties of the car identified by `id`.  An existing `engine` is looked up
    /// and referenced, whereas a new `engine` overwrites the properties of the engine the car
    /// already references.  All of this happens within the same transaction.
    async fn update_car(
        &self,
        id: CarId,
        details: CarDetails,
        engine: EngineChoice,
    ) -> DbResult<Car>;

    /// Deletes the car identified by `id` and returns it as it was before deletion.
    async fn delete_car(&self, id: CarId) -> DbResult<Car>;
}

/// Commits `tx` if `result` holds a value or rolls it back otherwise.
///
/// `op` names the operation for logging purposes.
async fn finish<T>(tx: TxExecutor, op: &'static str, result: DbResult<T>) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            match e {
                DbError::NotFound => debug!("Rolling back {}: {}", op, e),
                _ => warn!("Rolling back {}: {}", op, e),
            }
            if let Err(e2) = tx.rollback().await {
                warn!("Failed to roll back {}: {}", op, e2);
            }
            Err(e)
        }
    }
}

/// Obtains the engine referenced by a car write, creating it if it is new.
async fn resolve_engine(ex: &mut Executor, choice: EngineChoice) -> DbResult<Engine> {
    match choice {
        EngineChoice::Existing(id) => engine::get_engine(ex, id).await,
        EngineChoice::New(request) => {
            let new_engine = Engine::from_request(EngineId::generate(), &request);
            engine::insert_engine(ex, &new_engine).await?;
            Ok(new_engine)
        }
    }
}

/// Store backed by a relational database.
#[derive(Clone)]
pub struct SqlStore {
    /// The database holding the engine and car tables.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock to timestamp car writes with.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SqlStore {
    /// Creates a new store backed by `db`.  The schema must already be initialized.
    pub fn new(db: Arc<dyn Db + Send + Sync>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl EngineStore for SqlStore {
    async fn create_engine(&self, request: &EngineRequest) -> DbResult<Engine> {
        let new_engine = Engine::from_request(EngineId::generate(), request);
        let mut tx = self.db.begin().await?;
        let result = engine::insert_engine(tx.ex(), &new_engine).await.map(|()| new_engine);
        finish(tx, "create_engine", result).await
    }

    async fn get_engine(&self, id: EngineId) -> DbResult<Engine> {
        let mut tx = self.db.begin().await?;
        let result = engine::get_engine(tx.ex(), id).await;
        finish(tx, "get_engine", result).await
    }

    async fn update_engine(&self, id: EngineId, request: &EngineRequest) -> DbResult<Engine> {
        let updated = Engine::from_request(id, request);
        let mut tx = self.db.begin().await?;
        let result = engine::update_engine(tx.ex(), &updated).await.map(|()| updated);
        finish(tx, "update_engine", result).await
    }

    async fn delete_engine(&self, id: EngineId) -> DbResult<Engine> {
        let mut tx = self.db.begin().await?;
        let result: DbResult<Engine> = async {
            let deleted = engine::get_engine(tx.ex(), id).await?;
            engine::delete_engine(tx.ex(), id).await?;
            Ok(deleted)
        }
        .await;
        finish(tx, "delete_engine", result).await
    }
}

#[async_trait]
impl CarStore for SqlStore {
    async fn create_car(&self, details: CarDetails, engine: EngineChoice) -> DbResult<Car> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;
        let result: DbResult<Car> = async {
            let engine = resolve_engine(tx.ex(), engine).await?;
            let new_car = Car::new(CarId::generate(), details, *engine.engine_id(), now, now)
                .with_engine(engine);
            car::insert_car(tx.ex(), &new_car).await?;
            Ok(new_car)
        }
        .await;
        finish(tx, "create_car", result).await
    }

    async fn get_car(&self, id: CarId) -> DbResult<Car> {
        let mut tx = self.db.begin().await?;
        let result = car::get_car(tx.ex(), id).await;
        finish(tx, "get_car", result).await
    }

    async fn get_cars_by_brand(&self, brand: &str, include_engine: bool) -> DbResult<Vec<Car>> {
        let mut tx = self.db.begin().await?;
        let result = car::get_cars_by_brand(tx.ex(), brand, include_engine).await;
        finish(tx, "get_cars_by_brand", result).await
    }

    async fn update_car(
        &self,
        id: CarId,
        details: CarDetails,
        engine: EngineChoice,
    ) -> DbResult<Car> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;
        let result: DbResult<Car> = async {
            let existing = car::get_car(tx.ex(), id).await?;
            let engine = match engine {
                EngineChoice::Existing(engine_id) => engine::get_engine(tx.ex(), engine_id).await?,
                EngineChoice::New(request) => {
                    let updated = Engine::from_request(*existing.engine_id(), &request);
                    engine::update_engine(tx.ex(), &updated).await?;
                    updated
                }
            };
            let updated = Car::new(id, details, *engine.engine_id(), *existing.created_at(), now)
                .with_engine(engine);
            car::update_car(tx.ex(), &updated).await?;
            Ok(updated)
        }
        .await;
        finish(tx, "update_car", result).await
    }

    async fn delete_car(&self, id: CarId) -> DbResult<Car> {
        let mut tx = self.db.begin().await?;
        let result: DbResult<Car> = async {
            let deleted = car::get_car(tx.ex(), id).await?;
            car::delete_car(tx.ex(), id).await?;
            Ok(deleted)
        }
        .await;
        finish(tx, "delete_car", result).await
    }
}
