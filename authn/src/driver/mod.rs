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

//! Business logic for caller authentication.

use crate::model::{AccessToken, Password, SigningKey};
use carmgmt_core::clocks::Clock;
use carmgmt_core::driver::{DriverError, DriverResult};
use carmgmt_core::env::{get_optional_var, get_required_var};
use carmgmt_core::model::Username;
use derivative::Derivative;
use log::warn;
use std::iter;
use std::sync::Arc;
use std::time::Duration;

mod login;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

/// Default value for the `TOKEN_TTL` setting when not specified.
const DEFAULT_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Configuration options for the authentication driver.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct AuthnOptions {
    /// The only username allowed to log in.
    pub username: Username,

    /// Password for `username`.
    #[derivative(Debug = "ignore")]
    pub password: Password,

    /// Key used to sign newly-issued tokens.  Also accepted during verification.
    #[derivative(Debug = "ignore")]
    pub signing_key: SigningKey,

    /// Keys that were active in the past and that are still accepted during verification, so
    /// that tokens issued before a key rotation stay valid until they expire.
    #[derivative(Debug = "ignore")]
    pub previous_signing_keys: Vec<SigningKey>,

    /// The amount of time issued tokens are valid for.
    pub token_ttl: Duration,
}

impl AuthnOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_USERNAME`, `<prefix>_PASSWORD`,
    /// `<prefix>_SIGNING_KEY`, `<prefix>_PREVIOUS_SIGNING_KEYS` (a comma-separated list) and
    /// `<prefix>_TOKEN_TTL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let invalid = |suffix: &str, e: String| format!("Invalid {}_{}: {}", prefix, suffix, e);

        let username = Username::new(get_required_var::<String>(prefix, "USERNAME")?)
            .map_err(|e| invalid("USERNAME", e.to_string()))?;

        let password = Password::new(get_required_var::<String>(prefix, "PASSWORD")?)
            .map_err(|e| invalid("PASSWORD", e.to_string()))?;
        if password.is_empty() {
            return Err(invalid("PASSWORD", "Password cannot be empty".to_owned()));
        }

        let signing_key = SigningKey::new(get_required_var::<String>(prefix, "SIGNING_KEY")?)
            .map_err(|e| invalid("SIGNING_KEY", e.to_string()))?;

        let previous_signing_keys = get_optional_var::<String>(prefix, "PREVIOUS_SIGNING_KEYS")?
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                SigningKey::new(s).map_err(|e| invalid("PREVIOUS_SIGNING_KEYS", e.to_string()))
            })
            .collect::<Result<Vec<SigningKey>, String>>()?;

        let token_ttl = get_optional_var::<Duration>(prefix, "TOKEN_TTL")?
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TOKEN_TTL_SECONDS));
        if token_ttl.is_zero() {
            return Err(invalid("TOKEN_TTL", "Duration must be positive".to_owned()));
        }

        Ok(Self { username, password, signing_key, previous_signing_keys, token_ttl })
    }
}

/// Business logic.
///
/// The driver is stateless beyond its configuration: tokens carry everything needed to verify
/// them, so the driver can be cloned freely and shared across requests.
#[derive(Clone)]
pub struct AuthnDriver {
    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Authentication realm to return to requests.
    realm: &'static str,

    /// Options for the authentication driver.
    opts: Arc<AuthnOptions>,
}

impl AuthnDriver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        realm: &'static str,
        opts: AuthnOptions,
    ) -> Self {
        Self { clock, realm, opts: Arc::from(opts) }
    }

    /// Gets the authentication realm.
    pub fn realm(&self) -> &'static str {
        self.realm
    }

    /// Validates the signature and the expiration time of `token` and returns the identity it
    /// was issued to.
    pub fn verify(&self, token: &AccessToken) -> DriverResult<Username> {
        let keys =
            iter::once(&self.opts.signing_key).chain(self.opts.previous_signing_keys.iter());
        let claims = match token.verify(keys) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Rejected access token: {}", e);
                return Err(DriverError::Unauthorized(format!("Invalid access token: {}", e)));
            }
        };

        let now = self.clock.now_utc().unix_timestamp();
        if now >= claims.exp {
            warn!("Rejected expired access token for {}", claims.sub);
            return Err(DriverError::Unauthorized(
                "Access token expired; please log in again".to_owned(),
            ));
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use carmgmt_core::clocks::testutils::SettableClock;

    /// Returns the environment variables that configure the options returned by
    /// `test_options` under the `PREFIX` prefix.
    fn test_env() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("PREFIX_USERNAME", Some(TEST_USERNAME)),
            ("PREFIX_PASSWORD", Some(TEST_PASSWORD)),
            ("PREFIX_SIGNING_KEY", Some(TEST_SIGNING_KEY)),
            ("PREFIX_PREVIOUS_SIGNING_KEYS", None),
            ("PREFIX_TOKEN_TTL", None),
        ]
    }

    /// Replaces the value of `name` in the `env` returned by `test_env`.
    fn override_env(
        mut env: Vec<(&'static str, Option<&'static str>)>,
        name: &'static str,
        value: Option<&'static str>,
    ) -> Vec<(&'static str, Option<&'static str>)> {
        for (k, v) in env.iter_mut() {
            if *k == name {
                *v = value;
            }
        }
        env
    }

    #[test]
    fn test_options_from_env_required_only() {
        temp_env::with_vars(test_env(), || {
            let opts = AuthnOptions::from_env("PREFIX").unwrap();
            assert_eq!(test_options(), opts);
            assert_eq!(Duration::from_secs(24 * 60 * 60), opts.token_ttl);
        });
    }

    #[test]
    fn test_options_from_env_all_present() {
        let env = override_env(
            override_env(test_env(), "PREFIX_TOKEN_TTL", Some("30m")),
            "PREFIX_PREVIOUS_SIGNING_KEYS",
            Some("the first old signing key, the second old signing key,"),
        );
        temp_env::with_vars(env, || {
            let opts = AuthnOptions::from_env("PREFIX").unwrap();
            assert_eq!(Duration::from_secs(30 * 60), opts.token_ttl);
            assert_eq!(
                vec![
                    SigningKey::from("the first old signing key"),
                    SigningKey::from("the second old signing key"),
                ],
                opts.previous_signing_keys
            );
        });
    }

    #[test]
    fn test_options_from_env_missing() {
        for name in ["PREFIX_USERNAME", "PREFIX_PASSWORD", "PREFIX_SIGNING_KEY"] {
            temp_env::with_vars(override_env(test_env(), name, None), || {
                let err = AuthnOptions::from_env("PREFIX").unwrap_err();
                assert!(err.contains(&format!("{} not present", name)), "Got: {}", err);
            });
        }
    }

    #[test]
    fn test_options_from_env_invalid_values() {
        for (name, value, exp_error) in [
            ("PREFIX_USERNAME", "has spaces", "Invalid PREFIX_USERNAME"),
            ("PREFIX_PASSWORD", "", "Invalid PREFIX_PASSWORD: Password cannot be empty"),
            ("PREFIX_SIGNING_KEY", "short", "Invalid PREFIX_SIGNING_KEY"),
            ("PREFIX_PREVIOUS_SIGNING_KEYS", "short", "Invalid PREFIX_PREVIOUS_SIGNING_KEYS"),
            ("PREFIX_TOKEN_TTL", "0s", "Invalid PREFIX_TOKEN_TTL: Duration must be positive"),
            ("PREFIX_TOKEN_TTL", "soon", "Invalid Duration"),
        ] {
            temp_env::with_vars(override_env(test_env(), name, Some(value)), || {
                let err = AuthnOptions::from_env("PREFIX").unwrap_err();
                assert!(err.contains(exp_error), "Got: {}", err);
            });
        }
    }

    #[test]
    fn test_options_debug_hides_secrets() {
        let text = format!("{:?}", test_options());
        assert!(text.contains(TEST_USERNAME));
        assert!(!text.contains(TEST_PASSWORD));
        assert!(!text.contains(TEST_SIGNING_KEY));
    }

    #[test]
    fn test_verify_within_validity_window() {
        let context = TestContext::setup(test_options());
        let token = context.driver().issue(&Username::from("admin")).unwrap();

        context.clock().advance(Duration::from_secs(60 * 60));
        assert_eq!(Username::from("admin"), context.driver().verify(&token).unwrap());

        context.clock().advance(Duration::from_secs(22 * 60 * 60 + 59 * 60));
        assert_eq!(Username::from("admin"), context.driver().verify(&token).unwrap());
    }

    #[test]
    fn test_verify_expired() {
        let context = TestContext::setup(test_options());
        let token = context.driver().issue(&Username::from("admin")).unwrap();

        context.clock().advance(Duration::from_secs(24 * 60 * 60));
        match context.driver().verify(&token) {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            e => panic!("{:?}", e),
        }

        context.clock().advance(Duration::from_secs(60 * 60));
        match context.driver().verify(&token) {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_verify_custom_ttl() {
        let opts = AuthnOptions { token_ttl: Duration::from_secs(5 * 60), ..test_options() };
        let context = TestContext::setup(opts);
        let token = context.driver().issue(&Username::from("admin")).unwrap();

        context.clock().advance(Duration::from_secs(4 * 60));
        context.driver().verify(&token).unwrap();

        context.clock().advance(Duration::from_secs(60));
        context.driver().verify(&token).unwrap_err();
    }

    #[test]
    fn test_verify_signed_with_other_key() {
        let clock = Arc::from(SettableClock::new(test_now()));
        let opts = AuthnOptions {
            signing_key: SigningKey::from("an unrelated signing key"),
            ..test_options()
        };
        let other = AuthnDriver::new(clock.clone(), "the-realm", opts);
        let token = other.issue(&Username::from("admin")).unwrap();

        let context = TestContext::setup_with(test_options(), clock);
        match context.driver().verify(&token) {
            Err(DriverError::Unauthorized(msg)) => {
                assert!(msg.contains("Invalid token signature"))
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_verify_after_key_rotation() {
        let clock = Arc::from(SettableClock::new(test_now()));
        let before = TestContext::setup_with(test_options(), clock.clone());
        let token = before.driver().issue(&Username::from("admin")).unwrap();

        let rotated = AuthnOptions {
            signing_key: SigningKey::from("the brand new signing key"),
            previous_signing_keys: vec![SigningKey::from(TEST_SIGNING_KEY)],
            ..test_options()
        };
        let after = TestContext::setup_with(rotated.clone(), clock.clone());
        assert_eq!(Username::from("admin"), after.driver().verify(&token).unwrap());

        let new_token = after.driver().issue(&Username::from("admin")).unwrap();
        before.driver().verify(&new_token).unwrap_err();

        let retired = AuthnOptions { previous_signing_keys: vec![], ..rotated };
        let retired = TestContext::setup_with(retired, clock);
        retired.driver().verify(&token).unwrap_err();
        retired.driver().verify(&new_token).unwrap();
    }
}
