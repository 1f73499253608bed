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

//! Operations on cars.

use crate::driver::{CarService, Driver};
use crate::model::{Car, CarId, CarRequest, validate_not_empty};
use async_trait::async_trait;
use carmgmt_core::driver::DriverResult;
use carmgmt_core::model::Username;
use log::{debug, info};

#[async_trait]
impl CarService for Driver {
    async fn create_car(&self, whoami: &Username, request: CarRequest) -> DriverResult<Car> {
        let (details, engine) = request.validate(self.clock.current_year())?;
        let car = self.cars.create_car(details, engine).await?;
        info!("{} created car {} with engine {}", whoami, car.id(), car.engine_id());
        Ok(car)
    }

    async fn get_car(&self, whoami: &Username, id: CarId) -> DriverResult<Car> {
        debug!("{} reading car {}", whoami, id);
        Ok(self.cars.get_car(id).await?)
    }

    async fn get_cars_by_brand(
        &self,
        whoami: &Username,
        brand: &str,
        include_engine: bool,
    ) -> DriverResult<Vec<Car>> {
        validate_not_empty("brand", brand)?;
        debug!("{} listing cars of brand {}", whoami, brand);
        Ok(self.cars.get_cars_by_brand(brand, include_engine).await?)
    }

    async fn update_car(
        &self,
        whoami: &Username,
        id: CarId,
        request: CarRequest,
    ) -> DriverResult<Car> {
        let (details, engine) = request.validate(self.clock.current_year())?;
        let car = self.cars.update_car(id, details, engine).await?;
        info!("{} updated car {}", whoami, id);
        Ok(car)
    }

    async fn delete_car(&self, whoami: &Username, id: CarId) -> DriverResult<Car> {
        let car = self.cars.delete_car(id).await?;
        info!("{} deleted car {}", whoami, id);
        Ok(car)
    }
}
