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

//! Utilities to help testing services that integrate with the `authn` features.

use crate::model::AccessToken;
use crate::rest::{LoginRequest, LoginResponse};
use axum::Router;
use carmgmt_core::model::Username;
use carmgmt_core::rest::testutils::OneShotBuilder;

/// Logs `username` in with `password` and returns the access token for the session.
///
/// The `app` is a REST router serving the `authn` interface at its root.
pub async fn do_test_login(
    app: Router,
    username: &Username,
    password: &'static str,
) -> AccessToken {
    let request =
        LoginRequest { username: username.as_str().to_owned(), password: password.to_owned() };
    let response = OneShotBuilder::new(app, (http::Method::POST, "/login"))
        .send_json(request)
        .await
        .expect_json::<LoginResponse>()
        .await;
    response.token
}
