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

//! The `AccessToken` data type.
//!
//! Access tokens are compact JSON Web Signatures (`header.claims.signature`, each segment encoded
//! as unpadded base64url) signed with HMAC-SHA256.  They are self-contained: verifying one only
//! requires the signing keys, never any server-side state.

use crate::model::SigningKey;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use carmgmt_core::model::{ModelError, ModelResult, Username};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of an access token, in bytes.
const MAX_TOKEN_LENGTH: usize = 4096;

/// The only signature algorithm we issue and accept.
const ALGORITHM: &str = "HS256";

/// Header of a token.
#[derive(Debug, Deserialize, Serialize)]
struct TokenHeader {
    /// Signature algorithm.
    alg: String,

    /// Type of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Payload carried by an access token.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TokenClaims {
    /// Identity the token was issued to.
    pub sub: Username,

    /// Issuance time, in seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration time, in seconds since the Unix epoch.
    pub exp: i64,
}

/// An opaque type representing a caller's access token.
#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String")]
pub struct AccessToken(String);

/// Encodes `value` as JSON in a token segment.
fn encode_segment<T: Serialize>(value: &T) -> ModelResult<String> {
    let json =
        serde_json::to_vec(value).map_err(|e| ModelError(format!("Cannot encode token: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes the JSON object of type `T` stored in a token `segment` named `what`.
fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> ModelResult<T> {
    let json = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| ModelError(format!("Invalid token {} encoding: {}", what, e)))?;
    serde_json::from_slice(&json).map_err(|e| ModelError(format!("Invalid token {}: {}", what, e)))
}

impl AccessToken {
    /// Creates a new access token from an untrusted string, validating its shape but not its
    /// contents.
    pub fn new<S: Into<String>>(token: S) -> ModelResult<Self> {
        let token = token.into();
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(ModelError("Access token is too long".to_owned()));
        }

        let segments = token.split('.').collect::<Vec<&str>>();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(ModelError("Access token must have three segments".to_owned()));
        }
        if let Some(ch) =
            token.chars().find(|ch| !(ch.is_ascii_alphanumeric() || "-_.".contains(*ch)))
        {
            return Err(ModelError(format!("Invalid character '{}' in access token", ch)));
        }

        Ok(Self(token))
    }

    /// Creates a new token carrying `claims` signed with `key`.
    pub fn sign(claims: &TokenClaims, key: &SigningKey) -> ModelResult<Self> {
        let header = TokenHeader { alg: ALGORITHM.to_owned(), typ: Some("JWT".to_owned()) };
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(claims)?);
        let signature = key.sign(signing_input.as_bytes())?;
        Self::new(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Checks that the token was signed by any of the `keys` and returns its claims.
    ///
    /// This does not check whether the token has expired, as that depends on the current time.
    pub fn verify<'a, I>(&self, keys: I) -> ModelResult<TokenClaims>
    where
        I: IntoIterator<Item = &'a SigningKey>,
    {
        let (signing_input, signature) = match self.0.rsplit_once('.') {
            Some(parts) => parts,
            None => return Err(ModelError("Access token must have three segments".to_owned())),
        };
        let (header, claims) = match signing_input.split_once('.') {
            Some(parts) => parts,
            None => return Err(ModelError("Access token must have three segments".to_owned())),
        };

        let header: TokenHeader = decode_segment(header, "header")?;
        if header.alg != ALGORITHM {
            return Err(ModelError(format!("Unsupported token algorithm '{}'", header.alg)));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| ModelError(format!("Invalid token signature encoding: {}", e)))?;
        if !keys.into_iter().any(|key| key.verify(signing_input.as_bytes(), &signature)) {
            return Err(ModelError("Invalid token signature".to_owned()));
        }

        decode_segment(claims, "claims")
    }

    /// Returns the string representation of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccessToken {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AccessToken::new(s)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed access token")
    }
}
