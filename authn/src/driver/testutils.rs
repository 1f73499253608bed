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

use crate::driver::{AuthnDriver, AuthnOptions};
use crate::model::{Password, SigningKey};
use carmgmt_core::clocks::testutils::{SettableClock, utc_datetime};
use carmgmt_core::clocks::Clock;
use carmgmt_core::model::Username;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

/// Username accepted by the options returned by `test_options`.
pub const TEST_USERNAME: &str = "admin";

/// Password accepted by the options returned by `test_options`.
pub const TEST_PASSWORD: &str = "admin123";

/// Signing key used by the options returned by `test_options`.
pub const TEST_SIGNING_KEY: &str = "test-signing-key-0123456789abcdef";

/// Returns the fixed time at which test clocks start.
pub fn test_now() -> OffsetDateTime {
    utc_datetime(2024, 3, 1, 12, 0, 0)
}

/// Returns a set of options suitable for tests.
pub fn test_options() -> AuthnOptions {
    AuthnOptions {
        username: Username::from(TEST_USERNAME),
        password: Password::from(TEST_PASSWORD),
        signing_key: SigningKey::from(TEST_SIGNING_KEY),
        previous_signing_keys: vec![],
        token_ttl: Duration::from_secs(24 * 60 * 60),
    }
}

/// State of a running test.
pub struct TestContext {
    /// The clock used by the driver, which the test can move forward.
    clock: Arc<SettableClock>,

    /// The driver to handle authentication flows.
    driver: AuthnDriver,
}

impl TestContext {
    /// Initializes the driver with `opts` and a settable clock starting at `test_now`.
    pub fn setup(opts: AuthnOptions) -> Self {
        Self::setup_with(opts, Arc::from(SettableClock::new(test_now())))
    }

    /// Initializes the driver with `opts` and an existing `clock`.
    pub fn setup_with(opts: AuthnOptions, clock: Arc<SettableClock>) -> Self {
        let driver = AuthnDriver::new(clock.clone(), "the-realm", opts);
        Self { clock, driver }
    }

    /// Gets the clock used by the driver.
    pub fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Gets the current time as seen by the driver.
    pub fn clock_now(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Gets a copy of the driver in this test context.
    pub fn driver(&self) -> AuthnDriver {
        self.driver.clone()
    }
}
