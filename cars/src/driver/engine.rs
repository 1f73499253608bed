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

//! Operations on engines.

use crate::driver::{Driver, EngineService};
use crate::model::{Engine, EngineId, EngineRequest};
use async_trait::async_trait;
use carmgmt_core::driver::DriverResult;
use carmgmt_core::model::Username;
use log::{debug, info};

#[async_trait]
impl EngineService for Driver {
    async fn create_engine(
        &self,
        whoami: &Username,
        request: EngineRequest,
    ) -> DriverResult<Engine> {
        request.validate()?;
        let engine = self.engines.create_engine(&request).await?;
        info!("{} created engine {}", whoami, engine.engine_id());
        Ok(engine)
    }

    async fn get_engine(&self, whoami: &Username, id: EngineId) -> DriverResult<Engine> {
        debug!("{} reading engine {}", whoami, id);
        Ok(self.engines.get_engine(id).await?)
    }

    async fn update_engine(
        &self,
        whoami: &Username,
        id: EngineId,
        request: EngineRequest,
    ) -> DriverResult<Engine> {
        request.validate()?;
        let engine = self.engines.update_engine(id, &request).await?;
        info!("{} updated engine {}", whoami, id);
        Ok(engine)
    }

    async fn delete_engine(&self, whoami: &Username, id: EngineId) -> DriverResult<Engine> {
        let engine = self.engines.delete_engine(id).await?;
        info!("{} deleted engine {}", whoami, id);
        Ok(engine)
    }
}
