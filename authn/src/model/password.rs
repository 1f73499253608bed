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

//! The `Password` data type.

use carmgmt_core::model::{ModelError, ModelResult};
use serde::Deserialize;
use std::fmt;

/// Maximum length of a password, in bytes.
const MAX_PASSWORD_LENGTH: usize = 256;

/// An opaque type to hold a password, protecting it from leaking into logs.
#[derive(Clone, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(try_from = "String")]
pub struct Password(String);

impl Password {
    /// Creates a new password from a literal string.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() > MAX_PASSWORD_LENGTH {
            return Err(ModelError("Password is too long".to_owned()));
        }
        Ok(Password(s))
    }

    /// Returns a string view of the password.
    #[cfg(any(test, feature = "testutils"))]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compares this password against `other` in time that only depends on their lengths.
    pub fn matches(&self, other: &Password) -> bool {
        let (a, b) = (self.0.as_bytes(), other.0.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl TryFrom<String> for Password {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Password::new(s)
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for Password {
    /// Creates a new password from a hardcoded string, which must be valid.
    fn from(s: &'static str) -> Self {
        Password::new(s).expect("Hardcoded passwords must be valid")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed password")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens_error};

    #[test]
    fn test_password_too_long() {
        Password::new("x".repeat(MAX_PASSWORD_LENGTH)).unwrap();
        assert_eq!(
            ModelError("Password is too long".to_owned()),
            Password::new("x".repeat(MAX_PASSWORD_LENGTH + 1)).unwrap_err()
        );
    }

    #[test]
    fn test_password_matches() {
        assert!(Password::from("admin123").matches(&Password::from("admin123")));
        assert!(!Password::from("admin123").matches(&Password::from("admin124")));
        assert!(!Password::from("admin123").matches(&Password::from("admin1234")));
        assert!(!Password::from("admin123").matches(&Password::from("")));
        assert!(Password::from("").is_empty());
    }

    #[test]
    fn test_password_debug_is_scrubbed() {
        assert_eq!("scrubbed password", format!("{:?}", Password::from("secret")));
    }

    #[test]
    fn test_password_de_error() {
        let long: &'static str = Box::leak("x".repeat(MAX_PASSWORD_LENGTH + 1).into_boxed_str());
        assert_de_tokens_error::<Password>(
            &[Token::String(long)],
            "Password is too long",
        );
    }
}
