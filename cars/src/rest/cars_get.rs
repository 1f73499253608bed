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

//! API to list the cars of a brand.

use crate::driver::{CarService, Driver};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use carmgmt_authn::rest::Authenticated;
use carmgmt_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters accepted by this API.
#[derive(Debug, Deserialize)]
pub(crate) struct CarsQuery {
    /// Brand to filter the cars by.
    #[serde(default)]
    brand: String,

    /// Whether to load the engine of every returned car.
    #[serde(rename = "isEngine", default)]
    is_engine: bool,
}

/// API handler.
pub(crate) async fn handler(
    Authenticated(whoami): Authenticated,
    State(driver): State<Driver>,
    query: Result<Query<CarsQuery>, QueryRejection>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let Query(query) = query.map_err(|e| RestError::InvalidRequest(e.body_text()))?;
    let cars = driver.get_cars_by_brand(&whoami, &query.brand, query.is_engine).await?;
    Ok(Json(cars))
}
