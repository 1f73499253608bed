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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::driver::{CarService, EngineService};
use crate::model::{Car, CarEngineRequest, CarRequest, Engine, EngineRequest};
use crate::rest::app;
use axum::Router;
use carmgmt_authn::driver::testutils::{
    TEST_USERNAME, TestContext as AuthnTestContext, test_now, test_options,
};
use carmgmt_core::clocks::testutils::SettableClock;
use carmgmt_core::db::Executor;
use carmgmt_core::model::Username;
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;

/// Returns an access token for the test user issued at `now`.
pub(crate) fn test_token_at(now: OffsetDateTime) -> String {
    let authn = AuthnTestContext::setup_with(test_options(), Arc::new(SettableClock::new(now)));
    authn.driver().issue(&Username::from(TEST_USERNAME)).unwrap().as_str().to_owned()
}

/// Returns a valid access token for the test user that any fresh `TestContext` app accepts.
pub(crate) fn test_token() -> String {
    test_token_at(test_now())
}

/// Returns the JSON payload of a car creation request that passes validation.
pub(crate) fn car_json(name: &str, brand: &str) -> Value {
    json!({
        "name": name,
        "year": "2019",
        "brand": brand,
        "fuelType": "Diesel",
        "engine": {"displacement": 2000, "noOfCylinders": 4, "carRange": 800},
        "price": 19999.5,
    })
}

/// State of a running test.
pub(crate) struct TestContext {
    /// Context of the driver backing the app, which owns the database.
    driver: DriverTestContext,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes an app with a fresh database where the authentication layer and the business
    /// logic share the same clock.
    pub(crate) async fn setup() -> Self {
        let clock = Arc::new(SettableClock::new(test_now()));
        let driver = DriverTestContext::setup_with(clock.clone()).await;
        let authn = AuthnTestContext::setup_with(test_options(), clock);
        let app = app(authn.driver(), driver.driver());
        Self { driver, app }
    }

    /// Gets a copy of the app under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Gets the clock shared by all layers of the app.
    pub(crate) fn clock(&self) -> &SettableClock {
        self.driver.clock()
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.driver.ex().await
    }

    /// Creates an engine bypassing the REST layer.
    pub(crate) async fn create_engine(&self, request: EngineRequest) -> Engine {
        self.driver
            .driver()
            .create_engine(&Username::from(TEST_USERNAME), request)
            .await
            .unwrap()
    }

    /// Creates a car named `name` from `brand` with a new engine, bypassing the REST layer.
    pub(crate) async fn create_car(&self, name: &str, brand: &str) -> Car {
        let request = CarRequest {
            name: name.to_owned(),
            year: "2019".to_owned(),
            brand: brand.to_owned(),
            fuel_type: "Diesel".to_owned(),
            engine: CarEngineRequest {
                engine_id: None,
                displacement: 2000,
                no_of_cylinders: 4,
                car_range: 800,
            },
            price: 19999.5,
        };
        self.driver.driver().create_car(&Username::from(TEST_USERNAME), request).await.unwrap()
    }
}
