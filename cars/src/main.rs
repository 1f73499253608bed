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

//! Entry point to the car management service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use carmgmt::db::init_schema;
use carmgmt::serve;
use carmgmt_authn::driver::AuthnOptions;
use carmgmt_core::db::Db;
use carmgmt_core::db::postgres::{PostgresDb, PostgresOptions};
use log::error;
use std::env;
use std::error::Error;
use std::net::Ipv4Addr;
use std::process;
use std::sync::Arc;

/// Default port to listen on when `PORT` is not set.
const DEFAULT_PORT: u16 = 8080;

/// Loads the configuration from the environment, prepares the database and serves the app.
async fn run() -> Result<(), Box<dyn Error>> {
    let port = match env::var("PORT") {
        Ok(value) => value.parse::<u16>().map_err(|e| format!("Invalid PORT {}: {}", value, e))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = (Ipv4Addr::UNSPECIFIED, port);

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let authn_opts = AuthnOptions::from_env("AUTHN")?;

    let db = Arc::new(PostgresDb::connect(db_opts)?);
    if let Err(e) = init_schema(&mut db.ex().await?).await {
        db.close().await;
        return Err(e.into());
    }

    serve(addr, db, authn_opts).await
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("carmgmt: {}", e);
        process::exit(1);
    }
}
