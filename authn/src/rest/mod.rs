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

//! REST interface for the authentication service.

use crate::driver::AuthnDriver;
use async_trait::async_trait;
use axum::Router;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use carmgmt_core::driver::DriverError;
use carmgmt_core::model::Username;
use carmgmt_core::rest::RestError;

mod api_login_post;
mod httputils;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use api_login_post::{LoginRequest, LoginResponse};
pub use httputils::get_bearer_auth;

/// Converts a driver error `e` into a REST error, turning authentication failures into 401
/// responses that challenge the caller to authenticate against `realm`.
pub(crate) fn authn_error(e: DriverError, realm: &'static str) -> RestError {
    match e {
        DriverError::Unauthorized(message) => {
            RestError::Unauthorized { scheme: "Bearer", realm, message }
        }
        e => e.into(),
    }
}

/// Extractor that authenticates the caller via a bearer access token.
///
/// Handlers that take this as their first argument only run once the token in the
/// `Authorization` header has been verified.  The wrapped `Username` is the identity the token was
/// issued to and must be passed explicitly to whatever operation needs it.
#[derive(Debug)]
pub struct Authenticated(pub Username);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    AuthnDriver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let driver = AuthnDriver::from_ref(state);
        let token = get_bearer_auth(&parts.headers, driver.realm())?;
        let whoami = driver.verify(&token).map_err(|e| authn_error(e, driver.realm()))?;
        Ok(Authenticated(whoami))
    }
}

/// Creates the router for the authentication endpoints.
///
/// The `driver` is a configured instance of the `AuthnDriver` to issue tokens with.
pub fn app(driver: AuthnDriver) -> Router {
    use axum::routing::post;

    Router::new().route("/login", post(api_login_post::handler)).with_state(driver)
}
