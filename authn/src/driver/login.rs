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

//! Extends the driver with the `login` and `issue` methods.

use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, TokenClaims};
use carmgmt_core::driver::{DriverError, DriverResult};
use carmgmt_core::model::Username;
use log::{info, warn};

impl AuthnDriver {
    /// Issues a new access token for `username` that expires after the configured TTL.
    pub fn issue(&self, username: &Username) -> DriverResult<AccessToken> {
        let iat = self.clock.now_utc().unix_timestamp();
        let exp = i64::try_from(self.opts.token_ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| DriverError::BackendError("Token TTL is too large".to_owned()))?;

        let claims = TokenClaims { sub: username.clone(), iat, exp };
        AccessToken::sign(&claims, &self.opts.signing_key)
            .map_err(|e| DriverError::BackendError(format!("Cannot sign access token: {}", e)))
    }

    /// Logs `username` in with `password` and returns a new access token on success.
    ///
    /// Credentials that do not even parse as a valid username or password are rejected in the
    /// same way as credentials that do not match.
    pub fn login(&self, username: &str, password: &str) -> DriverResult<AccessToken> {
        let credentials = Username::new(username)
            .and_then(|username| Password::new(password).map(|password| (username, password)));
        let username = match credentials {
            Ok((username, password))
                if username == self.opts.username && password.matches(&self.opts.password) =>
            {
                username
            }
            _ => {
                warn!("Rejected login attempt for {:?}", username);
                return Err(DriverError::Unauthorized("Invalid username or password".to_owned()));
            }
        };

        let token = self.issue(&username)?;
        info!("Issued access token for {}", username);
        Ok(token)
    }
}
