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

//! Persistence of cars.

#[cfg(feature = "postgres")]
use crate::db::engine::engine_from_pg_row;
#[cfg(any(feature = "sqlite", test))]
use crate::db::engine::engine_from_sqlite_row;
use crate::model::{Car, CarDetails, CarId, EngineId, FuelType};
#[cfg(feature = "postgres")]
use carmgmt_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carmgmt_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use carmgmt_core::db::{DbResult, Executor, ensure_one_row};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;
#[cfg(feature = "postgres")]
use time::OffsetDateTime;
use uuid::Uuid;

/// Columns to fetch for a car joined with its engine in PostgreSQL.
#[cfg(feature = "postgres")]
const PG_CAR_COLUMNS: &str = "c.id, c.name, c.year, c.brand, c.fuel_type, c.engine_id, c.price,
    c.created_at, c.updated_at, e.displacement, e.no_of_cylinders, e.car_range";

/// Columns to fetch for a car joined with its engine in SQLite.
#[cfg(any(feature = "sqlite", test))]
const SQLITE_CAR_COLUMNS: &str = "c.id, c.name, c.year, c.brand, c.fuel_type, c.engine_id, c.price,
    c.created_at_secs, c.created_at_nsecs, c.updated_at_secs, c.updated_at_nsecs,
    e.displacement, e.no_of_cylinders, e.car_range";

/// Builds a `Car` out of a PostgreSQL `row` fetched with `PG_CAR_COLUMNS`, attaching its engine
/// only if `include_engine` is true.
#[cfg(feature = "postgres")]
fn car_from_pg_row(row: PgRow, include_engine: bool) -> DbResult<Car> {
    let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
    let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
    let year: i32 = row.try_get("year").map_err(postgres::map_sqlx_error)?;
    let brand: String = row.try_get("brand").map_err(postgres::map_sqlx_error)?;
    let fuel_type: String = row.try_get("fuel_type").map_err(postgres::map_sqlx_error)?;
    let engine_id: Uuid = row.try_get("engine_id").map_err(postgres::map_sqlx_error)?;
    let price: f64 = row.try_get("price").map_err(postgres::map_sqlx_error)?;
    let created_at: OffsetDateTime =
        row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
    let updated_at: OffsetDateTime =
        row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

    let fuel_type = FuelType::from_str(&fuel_type)?;
    let details = CarDetails { name, year, brand, fuel_type, price };
    let car = Car::new(CarId::from(id), details, EngineId::from(engine_id), created_at, updated_at);
    if include_engine {
        Ok(car.with_engine(engine_from_pg_row(&row, "engine_id")?))
    } else {
        Ok(car)
    }
}

/// Builds a `Car` out of an SQLite `row` fetched with `SQLITE_CAR_COLUMNS`, attaching its engine
/// only if `include_engine` is true.
#[cfg(any(feature = "sqlite", test))]
fn car_from_sqlite_row(row: SqliteRow, include_engine: bool) -> DbResult<Car> {
    let id: Uuid = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
    let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
    let year: i32 = row.try_get("year").map_err(sqlite::map_sqlx_error)?;
    let brand: String = row.try_get("brand").map_err(sqlite::map_sqlx_error)?;
    let fuel_type: String = row.try_get("fuel_type").map_err(sqlite::map_sqlx_error)?;
    let engine_id: Uuid = row.try_get("engine_id").map_err(sqlite::map_sqlx_error)?;
    let price: f64 = row.try_get("price").map_err(sqlite::map_sqlx_error)?;
    let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
    let created_at_nsecs: i64 = row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
    let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
    let updated_at_nsecs: i64 = row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;

    let fuel_type = FuelType::from_str(&fuel_type)?;
    let details = CarDetails { name, year, brand, fuel_type, price };
    let car = Car::new(
        CarId::from(id),
        details,
        EngineId::from(engine_id),
        build_timestamp(created_at_secs, created_at_nsecs)?,
        build_timestamp(updated_at_secs, updated_at_nsecs)?,
    );
    if include_engine {
        Ok(car.with_engine(engine_from_sqlite_row(&row, "engine_id")?))
    } else {
        Ok(car)
    }
}

/// Inserts a new `car`.  The engine it references must already exist.
pub(crate) async fn insert_car(ex: &mut Executor, car: &Car) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO car
                (id, name, year, brand, fuel_type, engine_id, price, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
            let done = sqlx::query(query_str)
                .bind(*car.id().as_uuid())
                .bind(car.name())
                .bind(*car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(*car.engine_id().as_uuid())
                .bind(*car.price())
                .bind(*car.created_at())
                .bind(*car.updated_at())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(*car.created_at())?;
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*car.updated_at())?;

            let query_str = "INSERT INTO car
                (id, name, year, brand, fuel_type, engine_id, price,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(*car.id().as_uuid())
                .bind(car.name())
                .bind(*car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(*car.engine_id().as_uuid())
                .bind(*car.price())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
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

/// Gets the car identified by `id` along with its engine.
pub(crate) async fn get_car(ex: &mut Executor, id: CarId) -> DbResult<Car> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT {} FROM car c JOIN engine e ON e.id = c.engine_id WHERE c.id = $1",
                PG_CAR_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(*id.as_uuid())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            car_from_pg_row(row, true)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM car c JOIN engine e ON e.id = c.engine_id WHERE c.id = ?",
                SQLITE_CAR_COLUMNS
            );
            let row = sqlx::query(&query_str)
                .bind(*id.as_uuid())
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            car_from_sqlite_row(row, true)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all cars made by `brand`, sorted by name and then by identity.
///
/// The engine of each car is only attached if `include_engine` is true.
pub(crate) async fn get_cars_by_brand(
    ex: &mut Executor,
    brand: &str,
    include_engine: bool,
) -> DbResult<Vec<Car>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT {} FROM car c JOIN engine e ON e.id = c.engine_id
                    WHERE c.brand = $1 ORDER BY c.name, c.id",
                PG_CAR_COLUMNS
            );
            let rows = sqlx::query(&query_str)
                .bind(brand)
                .fetch_all(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(|row| car_from_pg_row(row, include_engine)).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM car c JOIN engine e ON e.id = c.engine_id
                    WHERE c.brand = ? ORDER BY c.name, c.id",
                SQLITE_CAR_COLUMNS
            );
            let rows = sqlx::query(&query_str)
                .bind(brand)
                .fetch_all(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(|row| car_from_sqlite_row(row, include_engine)).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Replaces the mutable properties of an existing `car`, identified by its identity.
///
/// The creation time of the car is never modified.
pub(crate) async fn update_car(ex: &mut Executor, car: &Car) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE car
                SET name = $2, year = $3, brand = $4, fuel_type = $5, engine_id = $6, price = $7,
                    updated_at = $8
                WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(*car.id().as_uuid())
                .bind(car.name())
                .bind(*car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(*car.engine_id().as_uuid())
                .bind(*car.price())
                .bind(*car.updated_at())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*car.updated_at())?;

            let query_str = "UPDATE car
                SET name = ?, year = ?, brand = ?, fuel_type = ?, engine_id = ?, price = ?,
                    updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(car.name())
                .bind(*car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(*car.engine_id().as_uuid())
                .bind(*car.price())
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .bind(*car.id().as_uuid())
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

/// Deletes the car identified by `id`.  Its engine is left untouched.
pub(crate) async fn delete_car(ex: &mut Executor, id: CarId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM car WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(*id.as_uuid())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM car WHERE id = ?";
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
