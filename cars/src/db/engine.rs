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

//! Persistence of engines.

use crate::model::{Engine, EngineId};
#[cfg(feature = "postgres")]
use carmgmt_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carmgmt_core::db::sqlite;
use carmgmt_core::db::{DbResult, Executor, ensure_one_row};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// Builds an `Engine` out of a PostgreSQL `row` whose identity is stored in `id_column`.
#[cfg(feature = "postgres")]
pub(super) fn engine_from_pg_row(row: &PgRow, id_column: &str) -> DbResult<Engine> {
    let id: Uuid = row.try_get(id_column).map_err(postgres::map_sqlx_error)?;
    let displacement: i32 = row.try_get("displacement").map_err(postgres::map_sqlx_error)?;
    let no_of_cylinders: i32 = row.try_get("no_of_cylinders").map_err(postgres::map_sqlx_error)?;
    let car_range: i32 = row.try_get("car_range").map_err(postgres::map_sqlx_error)?;
    Ok(Engine::new(EngineId::from(id), displacement, no_of_cylinders, car_range))
}

/// Builds an `Engine` out of an SQLite `row` whose identity is stored in `id_column`.
#[cfg(any(feature = "sqlite", test))]
pub(super) fn engine_from_sqlite_row(row: &SqliteRow, id_column: &str) -> DbResult<Engine> {
    let id: Uuid = row.try_get(id_column).map_err(sqlite::map_sqlx_error)?;
    let displacement: i32 = row.try_get("displacement").map_err(sqlite::map_sqlx_error)?;
    let no_of_cylinders: i32 = row.try_get("no_of_cylinders").map_err(sqlite::map_sqlx_error)?;
    let car_range: i32 = row.try_get("car_range").map_err(sqlite::map_sqlx_error)?;
    Ok(Engine::new(EngineId::from(id), displacement, no_of_cylinders, car_range))
}

/// Inserts a new `engine`.
pub(crate) async fn insert_engine(ex: &mut Executor, engine: &Engine) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO engine (id, displacement, no_of_cylinders, car_range)
                VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(*engine.engine_id().as_uuid())
                .bind(*engine.displacement())
                .bind(*engine.no_of_cylinders())
                .bind(*engine.car_range())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO engine (id, displacement, no_of_cylinders, car_range)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(*engine.engine_id().as_uuid())
                .bind(*engine.displacement())
                .bind(*engine.no_of_cylinders())
                .bind(*engine.car_range())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(rows_affected)
}

/// Gets the engine identified by `id`.
pub(crate) async fn get_engine(ex: &mut Executor, id: EngineId) -> DbResult<Engine> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM engine WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(*id.as_uuid())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            engine_from_pg_row(&row, "id")
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM engine WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(*id.as_uuid())
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            engine_from_sqlite_row(&row, "id")
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Replaces the properties of an existing `engine`, identified by its identity.
pub(crate) async fn update_engine(ex: &mut Executor, engine: &Engine) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE engine
                SET displacement = $2, no_of_cylinders = $3, car_range = $4
                WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(*engine.engine_id().as_uuid())
                .bind(*engine.displacement())
                .bind(*engine.no_of_cylinders())
                .bind(*engine.car_range())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE engine
                SET displacement = ?, no_of_cylinders = ?, car_range = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(*engine.displacement())
                .bind(*engine.no_of_cylinders())
                .bind(*engine.car_range())
                .bind(*engine.engine_id().as_uuid())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(rows_affected)
}

/// Deletes the engine identified by `id` along with any cars that reference it.
pub(crate) async fn delete_engine(ex: &mut Executor, id: EngineId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM engine WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(*id.as_uuid())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM engine WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(*id.as_uuid())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(rows_affected)
}
