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

//! REST service to manage a catalog of cars and their engines.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use carmgmt_authn::driver::{AuthnDriver, AuthnOptions};
use carmgmt_core::clocks::{Clock, SystemClock};
use carmgmt_core::db::Db;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod db;
use db::SqlStore;
pub mod driver;
use driver::Driver;
pub mod model;
mod rest;
use rest::app;

/// Authentication realm advertised to unauthenticated callers.
const REALM: &str = "carmgmt";

/// Instantiates all resources to serve the application on `bind_addr` until Ctrl-C is received.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    authn_opts: AuthnOptions,
) -> Result<(), Box<dyn Error>> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock::default());

    let authn = AuthnDriver::new(clock.clone(), REALM, authn_opts);
    let store = Arc::new(SqlStore::new(db.clone(), clock.clone()));
    let driver = Driver::new(clock, store.clone(), store);
    let app = app(authn, driver);

    let bind_addr = bind_addr.into();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await;

    db.close().await;
    Ok(result?)
}
