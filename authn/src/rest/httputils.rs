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

//! Utilities to deal with HTTP authorization.

use crate::model::AccessToken;
use carmgmt_core::rest::{RestError, RestResult, get_unique_header};
use http::header::HeaderMap;

/// Authorization scheme for access tokens.
const BEARER: &str = "Bearer";

/// Assumes that the `headers` contain a bearer access token and extracts it.
///
/// This only validates the shape of the token.  Verifying its signature and expiration time is
/// the job of the driver.
pub fn get_bearer_auth(headers: &HeaderMap, exp_realm: &'static str) -> RestResult<AccessToken> {
    let unauthorized =
        |message: String| RestError::Unauthorized { scheme: BEARER, realm: exp_realm, message };

    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized("Missing Authorization header".to_owned())),
        Err(e) => return Err(unauthorized(e.to_string())),
    };

    let authz = authz
        .to_str()
        .map_err(|e| unauthorized(format!("Bad encoding in Authorization header: {}", e)))?;

    let (scheme, payload) = match authz.split_once(' ') {
        Some((scheme, _)) if scheme.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        Some((scheme, payload)) => (scheme, payload.trim()),
        None if authz.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        None => (authz, ""),
    };
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(unauthorized("Unsupported scheme".to_owned()));
    }
    if payload.is_empty() {
        return Err(unauthorized("Bad Authorization header: missing payload".to_owned()));
    }

    AccessToken::new(payload).map_err(|e| unauthorized(format!("Invalid access token: {}", e)))
}
