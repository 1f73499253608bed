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

//! API to exchange the configured credentials for an access token.

use crate::driver::AuthnDriver;
use crate::model::AccessToken;
use crate::rest::authn_error;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use carmgmt_core::rest::{JsonBody, RestError};
use serde::{Deserialize, Serialize};

/// Message sent to the server to log in.
///
/// Fields are kept as raw strings so that malformed credentials are rejected like any other
/// mismatch instead of as a bad request.
#[derive(Deserialize)]
#[cfg_attr(any(test, feature = "testutils"), derive(Serialize))]
pub struct LoginRequest {
    /// Username to log in as.
    pub username: String,

    /// Password for `username`.
    pub password: String,
}

/// Message returned by the server after a successful login attempt.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    /// Access token to present as a bearer token in subsequent requests.
    pub token: AccessToken,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = driver
        .login(&request.username, &request.password)
        .map_err(|e| authn_error(e, driver.realm()))?;
    Ok(Json(LoginResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::rest::app;
    use axum::http;
    use carmgmt_core::rest::testutils::OneShotBuilder;
    use carmgmt_core::model::Username;
    use carmgmt_core::test_payload_must_be_json;
    use serde_json::json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/login".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup(test_options());

        let request = LoginRequest {
            username: TEST_USERNAME.to_owned(),
            password: TEST_PASSWORD.to_owned(),
        };
        let response = OneShotBuilder::new(app(context.driver()), route())
            .send_json(request)
            .await
            .expect_json::<LoginResponse>()
            .await;

        let whoami = context.driver().verify(&response.token).unwrap();
        assert_eq!(Username::from(TEST_USERNAME), whoami);
    }

    #[tokio::test]
    async fn test_bad_password() {
        let context = TestContext::setup(test_options());

        OneShotBuilder::new(app(context.driver()), route())
            .send_json(json!({"username": TEST_USERNAME, "password": "wrong"}))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_header("WWW-Authenticate", "Bearer realm=\"the-realm\"")
            .expect_error("Invalid username or password")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let context = TestContext::setup(test_options());

        OneShotBuilder::new(app(context.driver()), route())
            .send_json(json!({"username": "root", "password": TEST_PASSWORD}))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid username or password")
            .await;
    }

    #[tokio::test]
    async fn test_malformed_credentials() {
        let long_password = "x".repeat(1000);
        for (username, password) in [
            ("", TEST_PASSWORD),
            ("not valid", TEST_PASSWORD),
            ("admin!", TEST_PASSWORD),
            (TEST_USERNAME, long_password.as_str()),
        ] {
            let context = TestContext::setup(test_options());

            OneShotBuilder::new(app(context.driver()), route())
                .send_json(json!({"username": username, "password": password}))
                .await
                .expect_status(http::StatusCode::UNAUTHORIZED)
                .expect_header("WWW-Authenticate", "Bearer realm=\"the-realm\"")
                .expect_error("Invalid username or password")
                .await;
        }
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let context = TestContext::setup(test_options());

        OneShotBuilder::new(app(context.driver()), route())
            .send_json(json!({"username": TEST_USERNAME}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("missing field `password`")
            .await;
    }

    test_payload_must_be_json!(app(TestContext::setup(test_options()).driver()), route());
}
