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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;
use axum::extract::FromRef;
use carmgmt_authn::driver::AuthnDriver;

mod car_delete;
mod car_get;
mod car_post;
mod car_put;
mod cars_get;
mod engine_delete;
mod engine_get;
mod engine_post;
mod engine_put;
#[cfg(test)]
mod testutils;

/// State shared by all API handlers.
#[derive(Clone)]
struct AppState {
    /// Verifier of the access tokens presented by callers.
    authn: AuthnDriver,

    /// Business logic for cars and engines.
    driver: Driver,
}

impl FromRef<AppState> for AuthnDriver {
    fn from_ref(state: &AppState) -> Self {
        state.authn.clone()
    }
}

impl FromRef<AppState> for Driver {
    fn from_ref(state: &AppState) -> Self {
        state.driver.clone()
    }
}

/// Creates the router for the application.
pub(crate) fn app(authn: AuthnDriver, driver: Driver) -> Router {
    use axum::routing::{get, post};

    let state = AppState { authn: authn.clone(), driver };
    Router::new()
        .route("/cars", get(cars_get::handler).post(car_post::handler))
        .route(
            "/cars/:id",
            get(car_get::handler).put(car_put::handler).delete(car_delete::handler),
        )
        .route("/engine", post(engine_post::handler))
        .route(
            "/engine/:id",
            get(engine_get::handler).put(engine_put::handler).delete(engine_delete::handler),
        )
        .with_state(state)
        .merge(carmgmt_authn::rest::app(authn))
}
