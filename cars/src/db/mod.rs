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

//! Database abstraction to manipulate engines and cars.
//!
//! The free functions in the `car` and `engine` modules issue single statements against an
//! `Executor` and know nothing about transactions.  The stores in `store` wrap them into one
//! transaction per operation.

#[cfg(feature = "postgres")]
use carmgmt_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carmgmt_core::db::sqlite;
use carmgmt_core::db::{DbResult, Executor};

pub(crate) mod car;
pub(crate) mod engine;
mod store;
pub use store::{CarStore, EngineStore, SqlStore};

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}
