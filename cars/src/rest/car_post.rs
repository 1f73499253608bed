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

//! API to create a car.

use crate::driver::{CarService, Driver};
use crate::model::CarRequest;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, http};
use carmgmt_authn::rest::Authenticated;
use carmgmt_core::rest::{JsonBody, RestError};

/// API handler.
pub(crate) async fn handler(
    Authenticated(whoami): Authenticated,
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<CarRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let car = driver.create_car(&whoami, request).await?;
    Ok((http::StatusCode::CREATED, Json(car)))
}
