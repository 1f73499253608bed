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

//! The `SigningKey` data type.

use carmgmt_core::model::{ModelError, ModelResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

/// HMAC-SHA256 keyed hash used to sign access tokens.
type HmacSha256 = Hmac<Sha256>;

/// Minimum length of a signing key, in bytes.
const MIN_KEY_LENGTH: usize = 16;

/// A secret used to sign and verify access tokens, protected from leaking into logs.
#[derive(Clone, PartialEq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Creates a new signing key from the raw secret in `s`.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() < MIN_KEY_LENGTH {
            return Err(ModelError(format!(
                "Signing key must be at least {} bytes long",
                MIN_KEY_LENGTH
            )));
        }
        Ok(Self(s.into_bytes()))
    }

    /// Computes the signature of `data`.
    pub fn sign(&self, data: &[u8]) -> ModelResult<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| ModelError(format!("Cannot initialize signer: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Checks in constant time whether `signature` is the signature of `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match HmacSha256::new_from_slice(&self.0) {
            Ok(mut mac) => {
                mac.update(data);
                mac.verify_slice(signature).is_ok()
            }
            Err(_) => false,
        }
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for SigningKey {
    /// Creates a new signing key from a hardcoded string, which must be valid.
    fn from(s: &'static str) -> Self {
        SigningKey::new(s).expect("Hardcoded signing keys must be valid")
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed signing key")
    }
}
