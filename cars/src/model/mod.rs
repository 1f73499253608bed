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

//! Data types for the car management service.
//!
//! Requests arrive from the REST layer in their wire representation and are turned into validated
//! values by their `validate` methods before anything touches the database.

use carmgmt_core::driver::DriverError;
use carmgmt_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

mod car;
pub(crate) use car::validate_not_empty;
pub use car::{Car, CarDetails, CarEngineRequest, CarRequest, EngineChoice};
mod engine;
pub use engine::{Engine, EngineRequest};

/// Error raised when a request payload does not satisfy the field constraints.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field as it appears in the wire format.
    pub field: &'static str,

    /// Human-readable explanation of the problem.
    pub message: String,
}

impl ValidationError {
    /// Creates a new error for `field` with a `message`.
    pub(crate) fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self { field, message: message.into() }
    }
}

impl From<ValidationError> for DriverError {
    fn from(e: ValidationError) -> Self {
        DriverError::InvalidInput(e.message)
    }
}

/// Generates an opaque identifier type backed by a random UUID.
macro_rules! uuid_id [
    ( $name:ident, $what:literal ) => {
        #[doc = concat!("Identifier of ", $what, ".")]
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the raw UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> ModelResult<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ModelError(format!("Invalid {} id '{}': {}", $what, s, e)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    }
];

uuid_id!(CarId, "car");
uuid_id!(EngineId, "engine");

/// Fuel types a car can run on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FuelType {
    /// Petrol engines.
    Petrol,

    /// Diesel engines.
    Diesel,

    /// Fully electric drivetrains.
    Electric,

    /// Combination of a combustion engine and an electric motor.
    Hybrid,
}

impl FuelType {
    /// All known fuel types.
    pub const ALL: [FuelType; 4] =
        [FuelType::Petrol, FuelType::Diesel, FuelType::Electric, FuelType::Hybrid];

    /// Returns the canonical name of the fuel type, which is also its stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = ModelError;

    /// Parses a fuel type name.  Matching is exact: no case folding and no trimming.
    fn from_str(s: &str) -> ModelResult<Self> {
        FuelType::ALL
            .into_iter()
            .find(|fuel_type| fuel_type.as_str() == s)
            .ok_or_else(|| ModelError(format!("Unknown fuel type '{}'", s)))
    }
}
