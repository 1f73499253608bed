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

//! Business logic for the service.
//!
//! The services validate requests before touching the stores, so a request that fails validation
//! never opens a transaction.  The identity of the caller is received explicitly from the REST
//! layer and is only used for logging.

use crate::db::{CarStore, EngineStore};
use crate::model::{Car, CarId, CarRequest, Engine, EngineId, EngineRequest};
use async_trait::async_trait;
use carmgmt_core::clocks::Clock;
use carmgmt_core::driver::DriverResult;
use carmgmt_core::model::Username;
use std::sync::Arc;

mod car;
mod engine;
#[cfg(test)]
pub(crate) mod testutils;

/// Operations on engines.
/// Business operations on engines, performed on behalf of an authenticated caller.
#[async_trait]
pub trait EngineService {
    /// Validates `request` and creates a new engine from it on behalf of `whoami`.
    async fn create_engine(
        &self,
        whoami: &Username,
        request: EngineRequest,
    ) -> DriverResult<Engine>;

    /// Gets the engine identified by `id`.
    async fn get_engine(&self, whoami: &Username, id: EngineId) -> DriverResult<Engine>;

    /// Validates `request` and replaces the properties of the engine identified by `id`.
    async fn update_engine(
        &self,
        whoami: &Username,
        id: EngineId,
        request: EngineRequest,
    ) -> DriverResult<Engine>;

    /// Deletes the engine identified by `id`, along with the cars that use it, and returns the
    /// deleted engine.
    async fn delete_engine(&self, whoami: &Username, id: EngineId) -> DriverResult<Engine>;
}

/// Operations on cars.
/// Business operations on cars, performed on behalf of an authenticated caller.
#[async_trait]
pub trait CarService {
    /// Validates `request` and creates a new car from it on behalf of `whoami`.
    async fn create_car(&self, whoami: &Username, request: CarRequest) -> DriverResult<Car>;

    /// Gets the car identified by `id` with its engine.
    async fn get_car(&self, whoami: &Username, id: CarId) -> DriverResult<Car>;

    /// Gets all cars made by `brand`, with their engines only if `include_engine` is true.
    async fn get_cars_by_brand(
        &self,
        whoami: &Username,
        brand: &str,
        include_engine: bool,
    ) -> DriverResult<Vec<Car>>;

    /// Validates `request` and replaces the properties of the car identified by `id`.
    async fn update_car(
        &self,
        whoami: &Username,
        id: CarId,
        request: CarRequest,
    ) -> DriverResult<Car>;

    /// Deletes the car identified by `id` and returns it.
    async fn delete_car(&self, whoami: &Username, id: CarId) -> DriverResult<Car>;
}

/// Business logic.
///
/// The driver holds no state of its own beyond its dependencies, so it can be cloned freely and
/// shared across requests.
/// Business logic.
#[derive(Clone)]
pub struct Driver {
    /// Clock to determine the latest valid model year.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Persistence for engines.
    engines: Arc<dyn EngineStore + Send + Sync>,

    /// Persistence for cars.
    cars: Arc<dyn CarStore + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        engines: Arc<dyn EngineStore + Send + Sync>,
        cars: Arc<dyn CarStore + Send + Sync>,
    ) -> Self {
        Self { clock, engines, cars }
    }
}
