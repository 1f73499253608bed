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

//! The `Engine` data type and its request payload.

use crate::model::{EngineId, ValidationError};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Fails with a `ValidationError` on `field` unless `value` is strictly positive.
fn validate_positive(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(field, format!("{} must be greater than zero", field)));
    }
    Ok(())
}

/// Payload to create or update an engine.
///
/// Missing fields default to zero so that they are reported by `validate` instead of by the JSON
/// decoder.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineRequest {
    /// Displacement in cubic centimeters.
    pub displacement: i32,

    /// Number of cylinders.
    pub no_of_cylinders: i32,

    /// Range, in kilometers, that the engine contributes to the car.
    pub car_range: i32,
}

impl EngineRequest {
    /// Checks that all fields are within their valid ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("displacement", self.displacement)?;
        validate_positive("noOfCylinders", self.no_of_cylinders)?;
        validate_positive("carRange", self.car_range)?;
        Ok(())
    }
}

/// A persisted engine.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    /// Identity assigned at creation time.
    engine_id: EngineId,

    /// Displacement in cubic centimeters.
    displacement: i32,

    /// Number of cylinders.
    no_of_cylinders: i32,

    /// Range, in kilometers, that the engine contributes to the car.
    car_range: i32,
}

impl Engine {
    /// Creates a new engine with the given identity and properties.
    pub fn new(
        engine_id: EngineId,
        displacement: i32,
        no_of_cylinders: i32,
        car_range: i32,
    ) -> Self {
        Self { engine_id, displacement, no_of_cylinders, car_range }
    }

    /// Creates a new engine identified by `engine_id` with the properties in `request`.
    pub fn from_request(engine_id: EngineId, request: &EngineRequest) -> Self {
        Self::new(engine_id, request.displacement, request.no_of_cylinders, request.car_range)
    }
}
