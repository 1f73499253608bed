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

//! The `Car` data type and its request payload.

use crate::model::{CarId, Engine, EngineId, EngineRequest, FuelType, ValidationError};
use derive_getters::Getters;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Earliest model year accepted for a car.
pub const MIN_YEAR: i32 = 1886;

/// Visitor to deserialize a model year given either as a number or as a string.
struct YearVisitor;

impl Visitor<'_> for YearVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a year as a number or a string")
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_string())
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.to_owned())
    }
}

/// Deserializes the raw `year` of a `CarRequest`, deferring its interpretation to `validate`.
fn deserialize_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(YearVisitor)
}

/// Engine as embedded in a `CarRequest`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarEngineRequest {
    /// Identity of an existing engine to attach the car to.  A new engine is created from the
    /// remaining fields when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<EngineId>,

    /// Displacement in cubic centimeters.
    pub displacement: i32,

    /// Number of cylinders.
    pub no_of_cylinders: i32,

    /// Range, in kilometers, that the engine contributes to the car.
    pub car_range: i32,
}

impl CarEngineRequest {
    /// Returns the engine properties carried by this request.
    pub fn details(&self) -> EngineRequest {
        EngineRequest {
            displacement: self.displacement,
            no_of_cylinders: self.no_of_cylinders,
            car_range: self.car_range,
        }
    }
}

/// Payload to create or update a car.
///
/// Fields are kept in their wire representation until `validate` runs so that the first
/// offending field, in a fixed order, is the one reported.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarRequest {
    /// Name of the car model.
    pub name: String,

    /// Model year, given either as a number or as a string.
    #[serde(deserialize_with = "deserialize_year")]
    pub year: String,

    /// Manufacturer of the car.
    pub brand: String,

    /// Name of the fuel type.  Must exactly match one of the `FuelType` names.
    pub fuel_type: String,

    /// Engine of the car.
    pub engine: CarEngineRequest,

    /// Price of the car.
    pub price: f64,
}

/// How a car write resolves the engine it references.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineChoice {
    /// Reference an engine that must already exist.
    Existing(EngineId),

    /// Create a new engine with these properties in the same transaction as the car.
    New(EngineRequest),
}

/// Validated properties of a car, excluding its engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CarDetails {
    /// Name of the car model.
    pub name: String,

    /// Model year.
    pub year: i32,

    /// Manufacturer of the car.
    pub brand: String,

    /// Fuel type.
    pub fuel_type: FuelType,

    /// Price of the car.
    pub price: f64,
}

/// Fails with a `ValidationError` on `field` if `value` is empty.
pub(crate) fn validate_not_empty(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", field)));
    }
    Ok(())
}

impl CarRequest {
    /// Checks all fields in a fixed order (name, year, brand, fuel type, engine, price) and
    /// returns the typed properties of the car plus how to resolve its engine.
    ///
    /// `current_year` is the upper bound for the model year.
    pub fn validate(
        &self,
        current_year: i32,
    ) -> Result<(CarDetails, EngineChoice), ValidationError> {
        validate_not_empty("name", &self.name)?;

        validate_not_empty("year", &self.year)?;
        let year = i32::from_str(&self.year)
            .map_err(|_| ValidationError::new("year", "year must be a valid number"))?;
        if !(MIN_YEAR..=current_year).contains(&year) {
            return Err(ValidationError::new(
                "year",
                format!("year must be between {} and {}", MIN_YEAR, current_year),
            ));
        }

        validate_not_empty("brand", &self.brand)?;

        let fuel_type = FuelType::from_str(&self.fuel_type).map_err(|_| {
            ValidationError::new(
                "fuelType",
                "fuelType must be one of Petrol, Diesel, Electric, Hybrid",
            )
        })?;

        let engine = self.engine.details();
        engine.validate()?;

        if self.price.is_nan() || self.price <= 0.0 {
            return Err(ValidationError::new("price", "price must be greater than zero"));
        }

        let details = CarDetails {
            name: self.name.clone(),
            year,
            brand: self.brand.clone(),
            fuel_type,
            price: self.price,
        };
        let engine = match self.engine.engine_id {
            Some(id) => EngineChoice::Existing(id),
            None => EngineChoice::New(engine),
        };
        Ok((details, engine))
    }
}

/// A persisted car.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    /// Identity assigned at creation time.
    id: CarId,

    /// Name of the car model.
    name: String,

    /// Model year.
    year: i32,

    /// Manufacturer of the car.
    brand: String,

    /// Fuel type.
    fuel_type: FuelType,

    /// Identity of the engine of this car.
    engine_id: EngineId,

    /// The engine of this car, if it was loaded alongside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engine: Option<Engine>,

    /// Price of the car.
    price: f64,

    /// Time when the car was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Time when the car was last modified.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Car {
    /// Creates a new car without a loaded engine.
    pub fn new(
        id: CarId,
        details: CarDetails,
        engine_id: EngineId,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        let CarDetails { name, year, brand, fuel_type, price } = details;
        Self {
            id,
            name,
            year,
            brand,
            fuel_type,
            engine_id,
            engine: None,
            price,
            created_at,
            updated_at,
        }
    }

    /// Attaches the loaded `engine` to this car.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        debug_assert_eq!(self.engine_id, *engine.engine_id());
        self.engine = Some(engine);
        self
    }
}
