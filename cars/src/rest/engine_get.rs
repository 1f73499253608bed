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

//! API to get an engine.

use crate::driver::{Driver, EngineService};
use crate::model::EngineId;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use carmgmt_authn::rest::Authenticated;
use carmgmt_core::rest::{EmptyBody, RestError};
use std::str::FromStr;

/// API handler.
pub(crate) async fn handler(
    Authenticated(whoami): Authenticated,
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let id = EngineId::from_str(&id)?;
    let engine = driver.get_engine(&whoami, id).await?;
    Ok(Json(engine))
}
